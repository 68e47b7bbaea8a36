//! Statement evaluation pipeline
//!
//! One evaluation: lock check, active-evaluation bookkeeping, name scope,
//! apply, optional storage, broadcast, and compensation on failure.

use objsim_core::call::OperationCall;
use objsim_core::errors::{Result, SimError};
use objsim_core::expression::Expression;
use objsim_core::model::Model;
use objsim_core::policy::ContractHost;
use objsim_core::state::{StateDifference, SystemState};
use objsim_core::statement::{
    compose_inverse, Change, EvaluationMode, EvaluationResult, Event, ExecutionContext, Statement,
};
use objsim_core::value::Value;
use objsim_core::variables::VariableEnvironment;

use super::System;

/// Bookkeeping of a statement while it applies
#[derive(Debug)]
pub(crate) struct ActiveEvaluation {
    shell_command: String,
    difference: StateDifference,
    inverses: Vec<Statement>,
    events: Vec<Event>,
    /// Variable depth at start; only assignments at this depth are undone
    base_depth: usize,
}

impl ActiveEvaluation {
    fn new(shell_command: String, base_depth: usize) -> Self {
        Self {
            shell_command,
            difference: StateDifference::new(),
            inverses: Vec::new(),
            events: Vec::new(),
            base_depth,
        }
    }

    pub(crate) fn record(&mut self, change: Change) {
        self.difference.merge(&change.difference);
        self.events.extend(change.events);
        if let Some(inverse) = change.inverse {
            self.inverses.push(inverse);
        }
    }

    pub(crate) fn events(&self) -> &[Event] {
        &self.events
    }

    pub(crate) fn take_difference(&mut self) -> StateDifference {
        std::mem::take(&mut self.difference)
    }
}

/// What happens to the name generator's checkpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NameScope {
    Push,
    Pop,
    Keep,
}

impl System {
    /// Evaluate one statement
    ///
    /// Forward evaluations that are stored or may be compensated open a
    /// name scope; undo evaluations close one, so names minted by the
    /// original evaluation are minted again on redo.
    pub(crate) fn evaluate_with_mode(
        &mut self,
        statement: &Statement,
        mode: EvaluationMode,
        undo_on_failure: bool,
        store_result: bool,
    ) -> Result<EvaluationResult> {
        let names = match mode {
            EvaluationMode::Undo => NameScope::Pop,
            _ if store_result || undo_on_failure => NameScope::Push,
            _ => NameScope::Keep,
        };
        self.run(statement, mode, names, undo_on_failure, store_result)
    }

    fn run(
        &mut self,
        statement: &Statement,
        mode: EvaluationMode,
        names: NameScope,
        undo_on_failure: bool,
        store_result: bool,
    ) -> Result<EvaluationResult> {
        if self.lock.is_held() {
            return Err(SimError::SystemLocked);
        }

        let shell_command = statement.shell_command();
        tracing::debug!(statement = %shell_command, %mode, "evaluating");
        self.active.push(ActiveEvaluation::new(
            shell_command.clone(),
            self.variables.depth(),
        ));
        match names {
            NameScope::Push => self.names.push_state(),
            NameScope::Pop => self.names.pop_state(),
            NameScope::Keep => {}
        }

        let outcome = statement.apply(self);

        let active = self.active.pop().ok_or_else(|| SimError::Internal {
            message: "active evaluation stack underflow".to_string(),
        })?;
        debug_assert_eq!(active.shell_command, shell_command);
        let mut result = EvaluationResult::new(
            statement.clone(),
            compose_inverse(active.inverses),
            active.difference,
            active.events,
            outcome.err(),
        );

        let difference = result.take_difference();
        if store_result {
            self.store_result(result.clone());
        }
        self.fire_state_changed(&difference);

        let Some(cause) = result.failure().cloned() else {
            // only stored results keep their checkpoint for a later undo
            if names == NameScope::Push && !store_result {
                self.names.discard_state();
            }
            return Ok(result);
        };

        if undo_on_failure {
            if store_result {
                self.done.pop_back();
            }
            let scope = if names == NameScope::Push {
                NameScope::Pop
            } else {
                NameScope::Keep
            };
            tracing::debug!(statement = %shell_command, inverse = %result.inverse(), "compensating failed statement");
            if let Err(err) = self.run(result.inverse(), EvaluationMode::Undo, scope, false, false) {
                tracing::warn!(
                    statement = %shell_command,
                    error = %err,
                    "compensation of failed statement failed"
                );
            }
        }

        Err(SimError::statement_failed(shell_command, cause))
    }
}

impl ExecutionContext for System {
    fn model(&self) -> &Model {
        &self.model
    }

    fn state(&self) -> &SystemState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut SystemState {
        &mut self.state
    }

    fn variables(&self) -> &VariableEnvironment {
        &self.variables
    }

    fn variables_mut(&mut self) -> &mut VariableEnvironment {
        &mut self.variables
    }

    fn evaluate(&self, expr: &Expression) -> Value {
        self.evaluator
            .eval(expr, &self.state, None, &self.variables.bindings())
    }

    fn unique_object_name(&mut self, class: &str) -> String {
        self.unique_object_name_for_class(class)
    }

    fn record(&mut self, change: Change) {
        match self.active.last_mut() {
            Some(active) => active.record(change),
            None => tracing::trace!("change outside of an evaluation not recorded"),
        }
    }

    fn tracks_variable_changes(&self) -> bool {
        self.active
            .last()
            .is_some_and(|a| a.base_depth == self.variables.depth())
    }

    fn has_active_operation(&self, object: &str) -> bool {
        System::has_active_operation(self, object)
    }

    fn enter_operation(&mut self, call: OperationCall, is_reentry: bool) -> Result<()> {
        System::enter_operation(self, call, is_reentry)
    }

    fn exit_operation(&mut self, result: Option<Value>, force_exit: bool) -> Result<OperationCall> {
        System::exit_operation(self, result, force_exit)
    }

    fn fail_current_operation(&mut self) {
        System::fail_current_operation(self)
    }
}

impl ContractHost for System {
    fn is_locked(&self) -> bool {
        System::is_locked(self)
    }

    fn state(&self) -> &SystemState {
        &self.state
    }

    fn evaluate_statement_in_expression(&mut self, statement: &Statement) -> Result<Value> {
        System::evaluate_statement_in_expression(self, statement)
    }

    fn update_listeners(&mut self) {
        System::update_listeners(self)
    }

    fn all_events(&self) -> Vec<&Event> {
        System::all_events(self)
    }
}
