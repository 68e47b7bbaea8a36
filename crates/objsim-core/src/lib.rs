//! objsim core - values, metamodel, object graph and statements
//!
//! This crate holds everything the simulation engine operates on:
//! - Runtime values and types, and the read-only metamodel
//! - The object graph (`SystemState`) with cancelling change tracking
//! - Variable frames and the reproducible name generator
//! - Operation call records and condition-check policies
//! - The closed `Statement` sum type with apply, inverse and describe
//! - The error taxonomy and logging facility shared with the engine

pub mod call;
pub mod errors;
pub mod expression;
pub mod logging_facility;
pub mod model;
pub mod names;
pub mod policy;
pub mod state;
pub mod statement;
pub mod value;
pub mod variables;

// Re-export commonly used types
pub use call::{ConditionOutcome, OperationCall, PreState};
pub use errors::{ExError, ExErrorKind, Result, SimError};
pub use expression::{Expression, ExpressionEvaluator};
pub use model::{Association, Class, Model, Operation};
pub use policy::{ConditionPolicy, ContractFailure, ContractHost, ReportingPolicy, StrictPolicy};
pub use state::{Link, StateChangeEvent, StateDifference, SystemState};
pub use statement::{EvaluationMode, EvaluationResult, Event, Operand, Statement};
pub use value::{ObjectRef, Type, Value};
pub use variables::{VarBindings, VariableEnvironment};
