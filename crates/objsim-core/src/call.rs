//! Operation call records

use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

use crate::model::Operation;
use crate::policy::{ConditionPolicy, StrictPolicy};
use crate::state::SystemState;
use crate::value::{ObjectRef, Value};
use crate::variables::VarBindings;

/// Pass/fail outcome of one named condition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionOutcome {
    pub condition: String,
    pub passed: bool,
}

impl ConditionOutcome {
    pub fn new(condition: impl Into<String>, passed: bool) -> Self {
        Self {
            condition: condition.into(),
            passed,
        }
    }
}

/// The state postconditions compare against
#[derive(Debug, Clone, Default, PartialEq)]
pub enum PreState {
    /// Alias of the engine's current state
    #[default]
    Shared,
    /// Private copy taken on entry
    Snapshot(Box<SystemState>),
}

impl PreState {
    /// Resolve against the engine's current state
    pub fn resolve<'a>(&'a self, current: &'a SystemState) -> &'a SystemState {
        match self {
            PreState::Shared => current,
            PreState::Snapshot(state) => state,
        }
    }

    pub fn is_snapshot(&self) -> bool {
        matches!(self, PreState::Snapshot(_))
    }
}

/// One invocation of an operation
///
/// Created by the caller, then filled in by the engine as the call moves
/// through enter and exit.
#[derive(Clone)]
pub struct OperationCall {
    operation: Rc<Operation>,
    receiver: ObjectRef,
    arguments: Vec<Value>,
    bindings: VarBindings,
    pre_state: PreState,
    result: Option<Value>,
    precondition_results: Vec<ConditionOutcome>,
    postcondition_results: Vec<ConditionOutcome>,
    preferred_policy: Option<Rc<dyn ConditionPolicy>>,
    default_policy: Rc<dyn ConditionPolicy>,
    entered: bool,
    exited: bool,
    exited_successfully: bool,
    execution_failed: bool,
}

impl OperationCall {
    pub fn new(operation: Rc<Operation>, receiver: ObjectRef, arguments: Vec<Value>) -> Self {
        Self {
            operation,
            receiver,
            arguments,
            bindings: VarBindings::new(),
            pre_state: PreState::Shared,
            result: None,
            precondition_results: Vec::new(),
            postcondition_results: Vec::new(),
            preferred_policy: None,
            default_policy: Rc::new(StrictPolicy),
            entered: false,
            exited: false,
            exited_successfully: false,
            execution_failed: false,
        }
    }

    pub fn with_preferred_policy(mut self, policy: Rc<dyn ConditionPolicy>) -> Self {
        self.preferred_policy = Some(policy);
        self
    }

    pub fn operation(&self) -> &Rc<Operation> {
        &self.operation
    }

    pub fn receiver(&self) -> &ObjectRef {
        &self.receiver
    }

    pub fn arguments(&self) -> &[Value] {
        &self.arguments
    }

    /// Bindings captured when postconditions were evaluated
    pub fn bindings(&self) -> &VarBindings {
        &self.bindings
    }

    pub fn pre_state(&self) -> &PreState {
        &self.pre_state
    }

    pub fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    pub fn precondition_results(&self) -> &[ConditionOutcome] {
        &self.precondition_results
    }

    pub fn postcondition_results(&self) -> &[ConditionOutcome] {
        &self.postcondition_results
    }

    pub fn preferred_policy(&self) -> Option<&Rc<dyn ConditionPolicy>> {
        self.preferred_policy.as_ref()
    }

    pub fn default_policy(&self) -> &Rc<dyn ConditionPolicy> {
        &self.default_policy
    }

    pub fn entered(&self) -> bool {
        self.entered
    }

    pub fn exited(&self) -> bool {
        self.exited
    }

    pub fn exited_successfully(&self) -> bool {
        self.exited_successfully
    }

    pub fn execution_failed(&self) -> bool {
        self.execution_failed
    }

    // Engine-side transitions of the call protocol.

    pub fn set_bindings(&mut self, bindings: VarBindings) {
        self.bindings = bindings;
    }

    pub fn set_pre_state(&mut self, pre_state: PreState) {
        self.pre_state = pre_state;
    }

    pub fn set_result(&mut self, result: Value) {
        self.result = Some(result);
    }

    pub fn record_precondition(&mut self, outcome: ConditionOutcome) {
        self.precondition_results.push(outcome);
    }

    pub fn record_postcondition(&mut self, outcome: ConditionOutcome) {
        self.postcondition_results.push(outcome);
    }

    pub fn mark_entered(&mut self) {
        self.entered = true;
    }

    pub fn mark_exited(&mut self, successfully: bool) {
        self.exited = true;
        self.exited_successfully = successfully;
    }

    pub fn mark_execution_failed(&mut self) {
        self.execution_failed = true;
    }
}

impl fmt::Debug for OperationCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationCall")
            .field("operation", &self.operation.qualified_name())
            .field("receiver", &self.receiver)
            .field("arguments", &self.arguments)
            .field("result", &self.result)
            .field("pre_state_snapshot", &self.pre_state.is_snapshot())
            .field("precondition_results", &self.precondition_results)
            .field("postcondition_results", &self.postcondition_results)
            .field(
                "preferred_policy",
                &self.preferred_policy.as_ref().map(|p| p.name()),
            )
            .field("default_policy", &self.default_policy.name())
            .field("entered", &self.entered)
            .field("exited", &self.exited)
            .field("exited_successfully", &self.exited_successfully)
            .field("execution_failed", &self.execution_failed)
            .finish()
    }
}

impl fmt::Display for OperationCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}(", self.receiver.name, self.operation.name())?;
        for (i, arg) in self.arguments.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", arg)?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Class;
    use crate::policy::ReportingPolicy;
    use crate::value::Type;

    fn inc_call() -> OperationCall {
        let class = Class::new("C")
            .with_operation(Operation::new("inc").with_parameter("n", Type::Integer));
        OperationCall::new(
            class.operations()[0].clone(),
            ObjectRef::new("c1", "C"),
            vec![Value::Integer(2)],
        )
    }

    #[test]
    fn test_defaults() {
        let call = inc_call();
        assert_eq!(call.default_policy().name(), "strict");
        assert!(call.preferred_policy().is_none());
        assert!(!call.entered() && !call.exited() && !call.execution_failed());
        assert!(!call.pre_state().is_snapshot());
        assert_eq!(call.to_string(), "c1.inc(2)");
    }

    #[test]
    fn test_preferred_policy_and_transitions() {
        let mut call = inc_call().with_preferred_policy(Rc::new(ReportingPolicy));
        assert_eq!(call.preferred_policy().map(|p| p.name()), Some("reporting"));
        call.mark_entered();
        call.set_result(Value::Integer(3));
        call.mark_exited(true);
        assert!(call.exited_successfully());
        assert_eq!(call.result(), Some(&Value::Integer(3)));
        assert!(format!("{:?}", call).contains("C::inc"));
    }

    #[test]
    fn test_shared_pre_state_resolves_to_current() {
        let current = SystemState::new("state#1");
        let shared = PreState::Shared;
        assert_eq!(shared.resolve(&current).id(), "state#1");
        let snap = PreState::Snapshot(Box::new(current.snapshot("state#1@pre")));
        assert_eq!(snap.resolve(&current).id(), "state#1@pre");
    }
}
