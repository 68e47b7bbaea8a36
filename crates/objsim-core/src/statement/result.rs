use serde::{Deserialize, Serialize};
use std::fmt;
use std::mem;

use super::Statement;
use crate::errors::SimError;
use crate::state::{Link, StateDifference};
use crate::value::Value;

/// Direction of an evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EvaluationMode {
    Do,
    Undo,
    Redo,
}

impl fmt::Display for EvaluationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvaluationMode::Do => write!(f, "do"),
            EvaluationMode::Undo => write!(f, "undo"),
            EvaluationMode::Redo => write!(f, "redo"),
        }
    }
}

/// Something that happened during an evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Event {
    ObjectCreated {
        object: String,
        class: String,
    },
    ObjectDestroyed {
        object: String,
        class: String,
    },
    AttributeAssigned {
        object: String,
        attribute: String,
        value: Value,
    },
    LinkInserted {
        link: Link,
    },
    LinkDeleted {
        link: Link,
    },
    OperationEntered {
        receiver: String,
        operation: String,
    },
    OperationExited {
        receiver: String,
        operation: String,
        successful: bool,
    },
}

/// Combine recorded inverses, most recent first
pub fn compose_inverse(mut inverses: Vec<Statement>) -> Statement {
    inverses.reverse();
    if inverses.len() == 1 {
        if let Some(only) = inverses.pop() {
            return only;
        }
    }
    Statement::Sequence(inverses)
}

/// Outcome of evaluating one statement
#[derive(Debug, Clone)]
pub struct EvaluationResult {
    statement: Statement,
    inverse: Statement,
    difference: StateDifference,
    events: Vec<Event>,
    failure: Option<SimError>,
}

impl EvaluationResult {
    pub fn new(
        statement: Statement,
        inverse: Statement,
        difference: StateDifference,
        events: Vec<Event>,
        failure: Option<SimError>,
    ) -> Self {
        Self {
            statement,
            inverse,
            difference,
            events,
            failure,
        }
    }

    pub fn statement(&self) -> &Statement {
        &self.statement
    }

    /// Statement undoing everything this evaluation changed
    pub fn inverse(&self) -> &Statement {
        &self.inverse
    }

    /// Difference not yet broadcast; empty once listeners were notified
    pub fn difference(&self) -> &StateDifference {
        &self.difference
    }

    /// Drain the difference; it is consumed by a single broadcast
    pub fn take_difference(&mut self) -> StateDifference {
        mem::take(&mut self.difference)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn failure(&self) -> Option<&SimError> {
        self.failure.as_ref()
    }

    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }

    pub fn shell_command(&self) -> String {
        self.statement.shell_command()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_inverse() {
        let a = Statement::assign("x", Value::Integer(1));
        let b = Statement::assign("y", Value::Integer(2));
        assert_eq!(compose_inverse(vec![]), Statement::Sequence(vec![]));
        assert_eq!(compose_inverse(vec![a.clone()]), a);
        assert_eq!(
            compose_inverse(vec![a.clone(), b.clone()]),
            Statement::Sequence(vec![b, a])
        );
    }

    #[test]
    fn test_take_difference_drains() {
        let mut diff = StateDifference::new();
        diff.add_modified("c1", "a");
        let mut result = EvaluationResult::new(
            Statement::Sequence(vec![]),
            Statement::Sequence(vec![]),
            diff,
            vec![],
            None,
        );
        assert!(result.succeeded());
        assert_eq!(result.take_difference().num_attribute_changes(), 1);
        assert!(result.difference().is_empty());
    }

    #[test]
    fn test_event_serialization_is_tagged() {
        let event = Event::ObjectCreated {
            object: "C1".into(),
            class: "C".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "object_created");
        assert_eq!(json["object"], "C1");
    }
}
