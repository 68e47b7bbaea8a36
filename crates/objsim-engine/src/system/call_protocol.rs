//! Operation call protocol
//!
//! Entry validates and binds the call, checks preconditions under the
//! modification lock and rolls the entry back if the policy rejects them.
//! Exit checks the result, evaluates postconditions against pre- and
//! post-state and always removes the call; a rejected postcondition is
//! reported but the call's effects stand.

use std::rc::Rc;

use objsim_core::call::{ConditionOutcome, OperationCall, PreState};
use objsim_core::errors::{Result, SimError};
use objsim_core::policy::ConditionPolicy;
use objsim_core::statement::{Change, Event};
use objsim_core::value::Value;
use objsim_core::{log_op_end, log_op_error, log_op_start};

use super::System;

impl System {
    /// Enter an operation call
    ///
    /// A host re-entry keeps the caller's variables visible; any other call
    /// gets a restricted frame.
    ///
    /// # Errors
    ///
    /// - `ArityMismatch` / `TypeMismatch` before anything changes
    /// - `PreconditionViolation` after the call and its frame were removed
    ///   again
    pub fn enter_operation(&mut self, call: OperationCall, is_reentry: bool) -> Result<()> {
        let operation = call.operation().qualified_name();
        log_op_start!("enter_operation", operation = %operation, receiver = %call.receiver().name);
        let start = std::time::Instant::now();

        self.enter_operation_impl(call, is_reentry).map_err(|e| {
            log_op_error!(
                "enter_operation",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64,
                operation = %operation
            );
            e
        })?;

        log_op_end!(
            "enter_operation",
            duration_ms = start.elapsed().as_millis() as u64,
            call_depth = self.call_stack.len()
        );
        Ok(())
    }

    fn enter_operation_impl(&mut self, mut call: OperationCall, is_reentry: bool) -> Result<()> {
        let op = Rc::clone(call.operation());
        let params = op.parameters();

        if params.len() != call.arguments().len() {
            return Err(SimError::ArityMismatch {
                operation: op.name().to_string(),
                class: op.owner().to_string(),
                expected: params.len(),
                found: call.arguments().len(),
            });
        }
        for (idx, (param, arg)) in params.iter().zip(call.arguments()).enumerate() {
            let found = arg.type_of();
            if !self.model.conforms(&found, &param.ty) {
                return Err(SimError::TypeMismatch {
                    operation: op.name().to_string(),
                    position: idx,
                    expected: param.ty.to_string(),
                    found: found.to_string(),
                });
            }
        }

        self.variables.push_frame(!is_reentry);
        self.variables
            .assign("self", Value::Object(call.receiver().clone()));
        for (param, arg) in params.iter().zip(call.arguments()) {
            self.variables.assign(param.name.clone(), arg.clone());
        }

        let policy = self.resolve_policy(&call);
        self.record_call_event(Event::OperationEntered {
            receiver: call.receiver().name.clone(),
            operation: op.name().to_string(),
        });

        let bindings = self.variables.bindings();
        for condition in op.preconditions() {
            let value = self
                .evaluator
                .eval(&condition.expression, &self.state, None, &bindings);
            call.record_precondition(ConditionOutcome::new(&condition.name, value.is_true()));
        }
        self.call_stack.push(call.clone());
        self.debug_assert_aligned();

        let verdict = {
            let _guard = self.lock.acquire();
            policy.handle_preconditions(self, &call)
        };

        if let Err(failure) = verdict {
            tracing::debug!(
                operation = %op.qualified_name(),
                policy = policy.name(),
                "precondition rejected, unwinding call"
            );
            self.call_stack.pop();
            self.variables.pop_frame();
            self.debug_assert_aligned();
            return Err(SimError::PreconditionViolation {
                operation: op.name().to_string(),
                message: failure.message,
            });
        }

        let pre_state = if !op.postconditions().is_empty() && op.postconditions_require_pre_state()
        {
            PreState::Snapshot(Box::new(
                self.state.snapshot(format!("{}@pre", self.state.id())),
            ))
        } else {
            PreState::Shared
        };

        let top = self
            .call_stack
            .last_mut()
            .ok_or_else(|| SimError::Internal {
                message: "call vanished during precondition dispatch".to_string(),
            })?;
        top.set_pre_state(pre_state);
        top.mark_entered();
        Ok(())
    }

    /// Exit the innermost call
    ///
    /// With `force_exit` a result error still removes the call. A result
    /// for an operation without result type is only warned about.
    ///
    /// # Errors
    ///
    /// - `EmptyCallStack` when no call is active
    /// - `MissingResult` / `ResultTypeMismatch` for a bad result
    /// - `PostconditionViolation` after the call was removed; its effects
    ///   are kept
    pub fn exit_operation(
        &mut self,
        result: Option<Value>,
        force_exit: bool,
    ) -> Result<OperationCall> {
        let operation = self
            .call_stack
            .last()
            .map(|c| c.operation().qualified_name())
            .unwrap_or_default();
        log_op_start!("exit_operation", operation = %operation, force_exit = force_exit);
        let start = std::time::Instant::now();

        let call = self.exit_operation_impl(result, force_exit).map_err(|e| {
            log_op_error!(
                "exit_operation",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64,
                operation = %operation
            );
            e
        })?;

        log_op_end!(
            "exit_operation",
            duration_ms = start.elapsed().as_millis() as u64,
            call_depth = self.call_stack.len()
        );
        Ok(call)
    }

    fn exit_operation_impl(
        &mut self,
        result: Option<Value>,
        force_exit: bool,
    ) -> Result<OperationCall> {
        let top = self.call_stack.last().ok_or(SimError::EmptyCallStack)?;
        if top.execution_failed() {
            return self.pop_call(false);
        }
        let op = Rc::clone(top.operation());

        match (op.result_type(), result) {
            (Some(expected), None) => {
                let err = SimError::MissingResult {
                    operation: op.name().to_string(),
                    expected: expected.to_string(),
                    still_active: !force_exit,
                };
                if force_exit {
                    self.pop_call(false)?;
                }
                return Err(err);
            }
            (Some(expected), Some(value)) => {
                let found = value.type_of();
                if !self.model.conforms(&found, expected) {
                    let err = SimError::ResultTypeMismatch {
                        operation: op.name().to_string(),
                        expected: expected.to_string(),
                        found: found.to_string(),
                        still_active: !force_exit,
                    };
                    if force_exit {
                        self.pop_call(false)?;
                    }
                    return Err(err);
                }
                self.variables.assign("result", value.clone());
                if let Some(top) = self.call_stack.last_mut() {
                    top.set_result(value);
                }
            }
            (None, Some(value)) => {
                tracing::warn!(
                    operation = %op.qualified_name(),
                    value = %value,
                    "result value supplied for operation without result type"
                );
            }
            (None, None) => {}
        }

        let bindings = self.variables.bindings();
        let outcomes: Vec<ConditionOutcome> = match self.call_stack.last() {
            Some(top) => {
                let pre = top.pre_state().resolve(&self.state);
                op.postconditions()
                    .iter()
                    .map(|condition| {
                        let value = self.evaluator.eval(
                            &condition.expression,
                            &self.state,
                            Some(pre),
                            &bindings,
                        );
                        ConditionOutcome::new(&condition.name, value.is_true())
                    })
                    .collect()
            }
            None => return Err(SimError::EmptyCallStack),
        };

        let snapshot = match self.call_stack.last_mut() {
            Some(top) => {
                for outcome in outcomes {
                    top.record_postcondition(outcome);
                }
                top.set_bindings(bindings);
                top.clone()
            }
            None => return Err(SimError::EmptyCallStack),
        };

        let policy = self.resolve_policy(&snapshot);
        let verdict = policy.handle_postconditions(self, &snapshot);

        let call = self.pop_call(verdict.is_ok())?;
        match verdict {
            Ok(()) => Ok(call),
            Err(failure) => Err(SimError::PostconditionViolation {
                operation: op.name().to_string(),
                message: failure.message,
            }),
        }
    }

    /// Mark the innermost call as failed; its exit then skips all checks
    pub fn fail_current_operation(&mut self) {
        if let Some(top) = self.call_stack.last_mut() {
            top.mark_execution_failed();
        }
    }

    /// Policy precedence: engine override, call's preferred, call's default
    fn resolve_policy(&self, call: &OperationCall) -> Rc<dyn ConditionPolicy> {
        self.policy_override
            .clone()
            .or_else(|| call.preferred_policy().cloned())
            .unwrap_or_else(|| Rc::clone(call.default_policy()))
    }

    fn pop_call(&mut self, successfully: bool) -> Result<OperationCall> {
        let mut call = self.call_stack.pop().ok_or(SimError::EmptyCallStack)?;
        self.variables.pop_frame();
        self.debug_assert_aligned();
        call.mark_exited(successfully);
        self.record_call_event(Event::OperationExited {
            receiver: call.receiver().name.clone(),
            operation: call.operation().name().to_string(),
            successful: successfully,
        });
        self.last_operation_call = Some(call.clone());
        Ok(call)
    }

    /// Tell the running evaluation about call entry/exit, unless locked
    fn record_call_event(&mut self, event: Event) {
        if self.lock.is_held() {
            return;
        }
        if let Some(active) = self.active.last_mut() {
            active.record(Change::new().with_event(event));
        }
    }
}
