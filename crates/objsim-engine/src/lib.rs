//! objsim engine - the simulation runtime
//!
//! [`System`] executes statements against a live object graph, runs the
//! operation call protocol with its pre/postcondition contracts, keeps the
//! undo/redo history and notifies state-change listeners.

pub mod config;
pub mod system;

pub use config::SystemConfig;
pub use system::{EvaluationOptions, ListenerId, StateChangeListener, System};
