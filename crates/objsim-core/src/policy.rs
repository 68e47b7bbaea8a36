//! Condition-check policies
//!
//! A policy turns the ordered pass/fail results of a call's pre- or
//! postconditions into an accept/reject decision. Policies are resolved per
//! call: engine-wide override, then the call's preferred policy, then the
//! call's default ([`StrictPolicy`]).

use std::fmt;

use crate::call::OperationCall;
use crate::errors::Result;
use crate::state::SystemState;
use crate::statement::{Event, Statement};
use crate::value::Value;

/// Rejection signalled by a policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractFailure {
    pub message: String,
}

impl ContractFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for ContractFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// The engine as seen from inside a policy handler
///
/// During precondition dispatch the engine is locked: any attempt to
/// evaluate a statement fails with `SystemLocked`.
pub trait ContractHost {
    fn is_locked(&self) -> bool;

    fn state(&self) -> &SystemState;

    /// Evaluate a statement inline and return the `result` variable
    ///
    /// # Errors
    ///
    /// Returns `SystemLocked` while locked, or the statement's failure.
    fn evaluate_statement_in_expression(&mut self, statement: &Statement) -> Result<Value>;

    /// Re-broadcast the active evaluation's accumulated difference
    fn update_listeners(&mut self);

    /// Events of the history plus those of the running evaluation
    fn all_events(&self) -> Vec<&Event>;
}

/// Decides whether a call's condition results are acceptable
pub trait ConditionPolicy {
    fn name(&self) -> &'static str;

    /// # Errors
    ///
    /// Returns a [`ContractFailure`] to reject the call.
    fn handle_preconditions(
        &self,
        host: &mut dyn ContractHost,
        call: &OperationCall,
    ) -> std::result::Result<(), ContractFailure>;

    /// # Errors
    ///
    /// Returns a [`ContractFailure`] to report the call's postconditions as
    /// violated. The call has already taken effect either way.
    fn handle_postconditions(
        &self,
        host: &mut dyn ContractHost,
        call: &OperationCall,
    ) -> std::result::Result<(), ContractFailure>;
}

fn failed_conditions(kind: &str, outcomes: &[crate::call::ConditionOutcome]) -> Option<String> {
    let failed: Vec<String> = outcomes
        .iter()
        .filter(|o| !o.passed)
        .map(|o| format!("{} `{}' is false", kind, o.condition))
        .collect();
    if failed.is_empty() {
        None
    } else {
        Some(failed.join("; "))
    }
}

/// Rejects a call as soon as one condition is false
#[derive(Debug, Clone, Copy, Default)]
pub struct StrictPolicy;

impl ConditionPolicy for StrictPolicy {
    fn name(&self) -> &'static str {
        "strict"
    }

    fn handle_preconditions(
        &self,
        _host: &mut dyn ContractHost,
        call: &OperationCall,
    ) -> std::result::Result<(), ContractFailure> {
        match failed_conditions("precondition", call.precondition_results()) {
            Some(message) => Err(ContractFailure::new(message)),
            None => Ok(()),
        }
    }

    fn handle_postconditions(
        &self,
        _host: &mut dyn ContractHost,
        call: &OperationCall,
    ) -> std::result::Result<(), ContractFailure> {
        match failed_conditions("postcondition", call.postcondition_results()) {
            Some(message) => Err(ContractFailure::new(message)),
            None => Ok(()),
        }
    }
}

/// Logs false conditions and lets the call proceed
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportingPolicy;

impl ConditionPolicy for ReportingPolicy {
    fn name(&self) -> &'static str {
        "reporting"
    }

    fn handle_preconditions(
        &self,
        _host: &mut dyn ContractHost,
        call: &OperationCall,
    ) -> std::result::Result<(), ContractFailure> {
        if let Some(message) = failed_conditions("precondition", call.precondition_results()) {
            tracing::warn!(operation = %call.operation().qualified_name(), "{}", message);
        }
        Ok(())
    }

    fn handle_postconditions(
        &self,
        _host: &mut dyn ContractHost,
        call: &OperationCall,
    ) -> std::result::Result<(), ContractFailure> {
        if let Some(message) = failed_conditions("postcondition", call.postcondition_results()) {
            tracing::warn!(operation = %call.operation().qualified_name(), "{}", message);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call::ConditionOutcome;
    use crate::model::{Class, Operation};
    use crate::value::ObjectRef;

    struct NullHost(SystemState);

    impl ContractHost for NullHost {
        fn is_locked(&self) -> bool {
            true
        }
        fn state(&self) -> &SystemState {
            &self.0
        }
        fn evaluate_statement_in_expression(&mut self, _: &Statement) -> Result<Value> {
            Err(crate::errors::SimError::SystemLocked)
        }
        fn update_listeners(&mut self) {}
        fn all_events(&self) -> Vec<&Event> {
            Vec::new()
        }
    }

    fn call_with(pre: &[(&str, bool)]) -> OperationCall {
        let class = Class::new("C").with_operation(Operation::new("op"));
        let mut call = OperationCall::new(
            class.operations()[0].clone(),
            ObjectRef::new("c1", "C"),
            vec![],
        );
        for (name, passed) in pre {
            call.record_precondition(ConditionOutcome::new(*name, *passed));
        }
        call
    }

    #[test]
    fn test_strict_rejects_false_conditions() {
        let mut host = NullHost(SystemState::new("state#1"));
        let call = call_with(&[("p1", true), ("p2", false), ("p3", false)]);
        let failure = StrictPolicy
            .handle_preconditions(&mut host, &call)
            .unwrap_err();
        assert_eq!(
            failure.message,
            "precondition `p2' is false; precondition `p3' is false"
        );
        assert!(StrictPolicy.handle_postconditions(&mut host, &call).is_ok());
    }

    #[test]
    fn test_reporting_never_rejects() {
        let mut host = NullHost(SystemState::new("state#1"));
        let call = call_with(&[("p1", false)]);
        assert!(ReportingPolicy.handle_preconditions(&mut host, &call).is_ok());
    }
}
