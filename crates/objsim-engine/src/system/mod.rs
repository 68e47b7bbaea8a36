//! The simulation engine
//!
//! [`System`] owns the current state, the call stack with its variable
//! frames, the name generator, the undo/redo history, the listener set and
//! the policy override. Everything is mutated only through the operations
//! of this module:
//!
//! - `call_protocol`: operation enter/exit with condition contracts
//! - `pipeline`: evaluation of one statement, with compensation on failure
//! - `history`: evaluate/undo/redo on top of the pipeline
//! - `notify`: state-change listeners
//!
//! ## Example
//!
//! ```
//! use objsim_core::model::{Class, Model};
//! use objsim_core::statement::{Operand, Statement};
//! use objsim_core::value::{Type, Value};
//! use objsim_core::{Expression, SystemState, VarBindings};
//! use objsim_engine::System;
//!
//! let model = Model::new("Demo").with_class(Class::new("C").with_attribute("a", Type::Integer));
//! let evaluator = |_: &Expression, _: &SystemState, _: Option<&SystemState>, _: &VarBindings| {
//!     Value::Undefined
//! };
//! let mut system = System::new(model, evaluator);
//!
//! system
//!     .evaluate_statement(&Statement::create_object("C", None, Some("o1")))
//!     .unwrap();
//! system
//!     .evaluate_statement(&Statement::set_attribute(Operand::var("o1"), "a", Value::Integer(5)))
//!     .unwrap();
//! assert_eq!(system.state().attribute_value("C1", "a"), Value::Integer(5));
//!
//! system.undo_last_statement().unwrap();
//! assert_eq!(system.state().attribute_value("C1", "a"), Value::Undefined);
//! ```

mod call_protocol;
mod history;
mod lock;
mod notify;
mod pipeline;

pub use history::EvaluationOptions;
pub use notify::{ListenerId, StateChangeListener};

use std::collections::VecDeque;
use std::io;
use std::rc::Rc;

use objsim_core::call::OperationCall;
use objsim_core::errors::{Result, SimError};
use objsim_core::expression::ExpressionEvaluator;
use objsim_core::model::Model;
use objsim_core::names::UniqueNameGenerator;
use objsim_core::policy::ConditionPolicy;
use objsim_core::state::SystemState;
use objsim_core::statement::{EvaluationResult, Event, Statement};
use objsim_core::variables::{VarBindings, VariableEnvironment};

use crate::config::SystemConfig;
use lock::StateLock;
use pipeline::ActiveEvaluation;

const INITIAL_STATE_ID: &str = "state#1";

pub struct System {
    model: Rc<Model>,
    evaluator: Box<dyn ExpressionEvaluator>,
    config: SystemConfig,
    state: SystemState,
    names: UniqueNameGenerator,
    variables: VariableEnvironment,
    call_stack: Vec<OperationCall>,
    done: VecDeque<EvaluationResult>,
    redo: Vec<Statement>,
    lock: StateLock,
    policy_override: Option<Rc<dyn ConditionPolicy>>,
    listeners: Vec<(ListenerId, Box<dyn StateChangeListener>)>,
    next_listener_id: u64,
    active: Vec<ActiveEvaluation>,
    last_operation_call: Option<OperationCall>,
}

impl System {
    pub fn new(model: impl Into<Rc<Model>>, evaluator: impl ExpressionEvaluator + 'static) -> Self {
        Self::with_config(model, evaluator, SystemConfig::default())
    }

    pub fn with_config(
        model: impl Into<Rc<Model>>,
        evaluator: impl ExpressionEvaluator + 'static,
        config: SystemConfig,
    ) -> Self {
        let model = model.into();
        tracing::debug!(model = %model.name(), ?config, "system created");
        Self {
            model,
            evaluator: Box::new(evaluator),
            config,
            state: SystemState::new(INITIAL_STATE_ID),
            names: UniqueNameGenerator::new(),
            variables: VariableEnvironment::new(),
            call_stack: Vec::new(),
            done: VecDeque::new(),
            redo: Vec::new(),
            lock: StateLock::default(),
            policy_override: None,
            listeners: Vec::new(),
            next_listener_id: 0,
            active: Vec::new(),
            last_operation_call: None,
        }
    }

    /// Reinitialise state, stacks, variables, names, listeners and the
    /// policy override
    pub fn reset(&mut self) {
        self.state = SystemState::new(INITIAL_STATE_ID);
        self.names = UniqueNameGenerator::new();
        self.variables = VariableEnvironment::new();
        self.call_stack.clear();
        self.done.clear();
        self.redo.clear();
        self.lock = StateLock::default();
        self.policy_override = None;
        self.listeners.clear();
        self.active.clear();
        self.last_operation_call = None;
        tracing::info!(model = %self.model.name(), "system reset");
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn state(&self) -> &SystemState {
        &self.state
    }

    pub fn variables(&self) -> &VariableEnvironment {
        &self.variables
    }

    pub fn var_bindings(&self) -> VarBindings {
        self.variables.bindings()
    }

    /// Active calls, outermost first
    pub fn call_stack(&self) -> &[OperationCall] {
        &self.call_stack
    }

    pub fn current_operation(&self) -> Option<&OperationCall> {
        self.call_stack.last()
    }

    pub fn has_active_operation(&self, object: &str) -> bool {
        self.call_stack.iter().any(|c| c.receiver().name == object)
    }

    /// The call most recently exited
    pub fn last_operation_call(&self) -> Option<&OperationCall> {
        self.last_operation_call.as_ref()
    }

    pub fn is_locked(&self) -> bool {
        self.lock.is_held()
    }

    /// Register the engine-wide policy, taking precedence over every call's
    /// own policies
    ///
    /// # Errors
    ///
    /// Returns `PolicyOverrideAlreadySet` if one is already registered;
    /// `reset` clears it.
    pub fn register_policy_override(&mut self, policy: Rc<dyn ConditionPolicy>) -> Result<()> {
        if self.policy_override.is_some() {
            return Err(SimError::PolicyOverrideAlreadySet);
        }
        tracing::debug!(policy = policy.name(), "policy override registered");
        self.policy_override = Some(policy);
        Ok(())
    }

    /// Mint the next unused generated name for a class
    pub fn unique_object_name_for_class(&mut self, class: &str) -> String {
        let state = &self.state;
        self.names.generate_unused(class, |n| state.has_object(n))
    }

    /// Name-generator checkpoints held for undoable evaluations
    pub fn num_name_checkpoints(&self) -> usize {
        self.names.num_checkpoints()
    }

    /// Shell command of the statement `undo_last_statement` would revert
    pub fn undo_description(&self) -> Option<String> {
        self.done.back().map(EvaluationResult::shell_command)
    }

    pub fn redo_description(&self) -> Option<String> {
        self.redo.last().map(Statement::shell_command)
    }

    pub fn next_to_redo(&self) -> Option<&Statement> {
        self.redo.last()
    }

    pub fn num_evaluated_statements(&self) -> usize {
        self.done.len()
    }

    /// Stored statements, oldest first
    pub fn evaluated_statements(&self) -> Vec<&Statement> {
        self.done.iter().map(EvaluationResult::statement).collect()
    }

    pub fn statement_log(&self) -> Vec<String> {
        self.done.iter().map(EvaluationResult::shell_command).collect()
    }

    /// Write the stored statements as shell commands, one per line
    ///
    /// # Errors
    ///
    /// Returns any error of the underlying writer.
    pub fn write_statement_log<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
        for command in self.statement_log() {
            writeln!(out, "{}", command)?;
        }
        Ok(())
    }

    /// Events of every stored evaluation, oldest first, followed by those
    /// of the statement currently being evaluated
    pub fn all_events(&self) -> Vec<&Event> {
        let running = self.active.last().map(ActiveEvaluation::events);
        self.done
            .iter()
            .flat_map(|r| r.events())
            .chain(running.into_iter().flatten())
            .collect()
    }

    fn store_result(&mut self, result: EvaluationResult) {
        self.done.push_back(result);
        if let Some(limit) = self.config.history_limit {
            while self.done.len() > limit {
                self.done.pop_front();
                self.names.drop_oldest_checkpoint();
            }
        }
    }

    /// Call stack and pushed variable frames move in lockstep
    fn debug_assert_aligned(&self) {
        debug_assert_eq!(
            self.call_stack.len(),
            self.variables.depth(),
            "call stack and variable frames out of step"
        );
    }
}

impl std::fmt::Debug for System {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("System")
            .field("model", &self.model.name())
            .field("state", &self.state.id())
            .field("call_depth", &self.call_stack.len())
            .field("history_len", &self.done.len())
            .field("redo_len", &self.redo.len())
            .field("locked", &self.lock.is_held())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
