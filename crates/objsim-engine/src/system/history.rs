//! Undo/redo history
//!
//! Every host-facing history operation runs in its own span carrying a
//! fresh request id.

use objsim_core::errors::{Result, SimError};
use objsim_core::statement::{EvaluationMode, EvaluationResult, Statement};
use objsim_core::value::Value;
use objsim_core::{log_op_end, log_op_error, log_op_start};
use objsim_core_types::RequestId;

use super::System;

/// How `evaluate_statement_with` treats a statement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvaluationOptions {
    /// Apply the inverse of a failed statement before reporting the failure
    pub rollback_on_failure: bool,
    /// Push the result onto the undo history
    pub store_result: bool,
}

impl Default for EvaluationOptions {
    fn default() -> Self {
        Self {
            rollback_on_failure: true,
            store_result: true,
        }
    }
}

impl System {
    /// Evaluate a statement and record it for undo
    ///
    /// Clears the redo stack first. Rollback on failure follows
    /// [`SystemConfig::rollback_on_failure`](crate::SystemConfig).
    ///
    /// # Errors
    ///
    /// `SystemLocked` during precondition dispatch, or `StatementFailed`
    /// wrapping the statement's own failure.
    pub fn evaluate_statement(&mut self, statement: &Statement) -> Result<EvaluationResult> {
        let options = EvaluationOptions {
            rollback_on_failure: self.config.rollback_on_failure,
            store_result: true,
        };
        self.evaluate_statement_with(statement, options)
    }

    /// Evaluate a statement with explicit rollback and storage settings
    ///
    /// # Errors
    ///
    /// Same as [`evaluate_statement`](Self::evaluate_statement).
    pub fn evaluate_statement_with(
        &mut self,
        statement: &Statement,
        options: EvaluationOptions,
    ) -> Result<EvaluationResult> {
        self.redo.clear();
        let description = statement.shell_command();
        self.traced("evaluate_statement", &description, |sys| {
            sys.evaluate_with_mode(
                statement,
                EvaluationMode::Do,
                options.rollback_on_failure,
                options.store_result,
            )
        })
    }

    /// Revert the most recent stored evaluation
    ///
    /// The original statement moves to the redo stack. A failing undo is
    /// not compensated.
    ///
    /// # Errors
    ///
    /// `NothingToUndo` with an empty history, otherwise the inverse's
    /// failure.
    pub fn undo_last_statement(&mut self) -> Result<EvaluationResult> {
        let description = self.undo_description().unwrap_or_default();
        self.traced("undo_last_statement", &description, |sys| {
            let last = sys.done.pop_back().ok_or(SimError::NothingToUndo)?;
            sys.redo.push(last.statement().clone());
            sys.evaluate_with_mode(last.inverse(), EvaluationMode::Undo, false, false)
        })
    }

    /// Re-evaluate the most recently undone statement
    ///
    /// # Errors
    ///
    /// `NothingToRedo` with an empty redo stack, otherwise the statement's
    /// failure.
    pub fn redo_statement(&mut self) -> Result<EvaluationResult> {
        let description = self.redo_description().unwrap_or_default();
        self.traced("redo_statement", &description, |sys| {
            let statement = sys.redo.pop().ok_or(SimError::NothingToRedo)?;
            sys.evaluate_with_mode(&statement, EvaluationMode::Redo, false, true)
        })
    }

    /// Evaluate a statement triggered from inside an expression and return
    /// the `result` variable
    ///
    /// Outside any evaluation the statement runs untracked. Inside one, its
    /// changes become part of the running evaluation.
    ///
    /// # Errors
    ///
    /// `SystemLocked` during precondition dispatch, or `StatementFailed`.
    pub fn evaluate_statement_in_expression(&mut self, statement: &Statement) -> Result<Value> {
        if self.lock.is_held() {
            return Err(SimError::SystemLocked);
        }
        if self.active.is_empty() {
            self.evaluate_with_mode(statement, EvaluationMode::Do, false, false)?;
        } else {
            statement
                .apply(self)
                .map_err(|e| SimError::statement_failed(statement.shell_command(), e))?;
        }
        Ok(self
            .variables
            .lookup("result")
            .cloned()
            .unwrap_or_default())
    }

    fn traced<F>(&mut self, op: &'static str, statement: &str, f: F) -> Result<EvaluationResult>
    where
        F: FnOnce(&mut Self) -> Result<EvaluationResult>,
    {
        let request_id = RequestId::new();
        let span = tracing::info_span!("history", op, request_id = %request_id);
        let _entered = span.enter();

        log_op_start!(op, request_id = %request_id, statement = statement);
        let start = std::time::Instant::now();

        let result = f(self).map_err(|e| {
            log_op_error!(
                op,
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64,
                request_id = %request_id
            );
            e
        })?;

        log_op_end!(
            op,
            duration_ms = start.elapsed().as_millis() as u64,
            request_id = %request_id,
            history_len = self.done.len()
        );
        Ok(result)
    }
}
