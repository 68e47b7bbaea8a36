use super::result::Event;
use super::Statement;
use crate::call::OperationCall;
use crate::errors::Result;
use crate::expression::Expression;
use crate::model::Model;
use crate::state::{StateDifference, SystemState};
use crate::value::Value;
use crate::variables::VariableEnvironment;

/// One primitive change as recorded by a statement
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Change {
    pub difference: StateDifference,
    pub events: Vec<Event>,
    /// Statement restoring the situation before this change
    pub inverse: Option<Statement>,
}

impl Change {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_difference(mut self, difference: StateDifference) -> Self {
        self.difference = difference;
        self
    }

    pub fn with_event(mut self, event: Event) -> Self {
        self.events.push(event);
        self
    }

    pub fn with_inverse(mut self, inverse: Statement) -> Self {
        self.inverse = Some(inverse);
        self
    }
}

/// What a statement sees of the engine while it applies
pub trait ExecutionContext {
    fn model(&self) -> &Model;

    fn state(&self) -> &SystemState;

    fn state_mut(&mut self) -> &mut SystemState;

    fn variables(&self) -> &VariableEnvironment;

    fn variables_mut(&mut self) -> &mut VariableEnvironment;

    /// Evaluate an expression operand against the current state and bindings
    fn evaluate(&self, expr: &Expression) -> Value;

    /// A generated object name not used in the current state
    fn unique_object_name(&mut self, class: &str) -> String;

    /// Record a change into the running evaluation
    fn record(&mut self, change: Change);

    /// Whether variable assignments happen in the frame the evaluation
    /// started in; only those are undone
    fn tracks_variable_changes(&self) -> bool;

    fn has_active_operation(&self, object: &str) -> bool;

    /// # Errors
    ///
    /// Returns the call protocol's entry failures.
    fn enter_operation(&mut self, call: OperationCall, is_reentry: bool) -> Result<()>;

    /// # Errors
    ///
    /// Returns the call protocol's exit failures.
    fn exit_operation(&mut self, result: Option<Value>, force_exit: bool)
        -> Result<OperationCall>;

    /// Mark the innermost call as failed so exit skips its checks
    fn fail_current_operation(&mut self);
}
