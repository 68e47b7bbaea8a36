//! Statements: the closed set of state-changing commands
//!
//! Each [`Statement`] applies itself against an [`ExecutionContext`] and
//! records every primitive change together with the statement that undoes
//! it. The inverse of a whole evaluation is the reversed sequence of the
//! recorded inverses, so composites and nested operation calls need no
//! special handling.
//!
//! ## Example
//!
//! ```
//! use objsim_core::statement::{Operand, Statement};
//! use objsim_core::value::Value;
//!
//! let stmt = Statement::Sequence(vec![
//!     Statement::create_object("C", None, Some("o1")),
//!     Statement::set_attribute(Operand::var("o1"), "a", Value::Integer(5)),
//! ]);
//! assert_eq!(stmt.shell_command(), "!begin o1 := new C; o1.a := 5 end");
//! ```

mod apply;
pub mod context;
pub mod result;

pub use context::{Change, ExecutionContext};
pub use result::{compose_inverse, EvaluationMode, EvaluationResult, Event};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::expression::Expression;
use crate::state::Link;
use crate::value::Value;

/// A statement argument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operand {
    Literal(Value),
    Variable(String),
    /// Evaluated with the host's expression evaluator
    Expression(Expression),
}

impl Operand {
    pub fn var(name: impl Into<String>) -> Self {
        Operand::Variable(name.into())
    }

    pub fn expr(text: impl Into<String>) -> Self {
        Operand::Expression(Expression::new(text))
    }
}

impl From<Value> for Operand {
    fn from(value: Value) -> Self {
        Operand::Literal(value)
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Literal(v) => write!(f, "{}", v),
            Operand::Variable(name) => f.write_str(name),
            Operand::Expression(e) => write!(f, "{}", e),
        }
    }
}

/// Everything needed to bring a destroyed object back
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectSnapshot {
    pub name: String,
    pub class: String,
    pub attributes: BTreeMap<String, Value>,
    pub links: Vec<Link>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    Assign {
        variable: String,
        value: Operand,
    },
    Unassign {
        variable: String,
    },
    /// Create an object; without a name one is generated from the class
    CreateObject {
        class: String,
        name: Option<String>,
        variable: Option<String>,
    },
    /// Destroy an object along with its links
    DestroyObject {
        object: Operand,
    },
    /// Recreate a destroyed object with its attributes and links
    RestoreObject {
        snapshot: ObjectSnapshot,
    },
    SetAttribute {
        object: Operand,
        attribute: String,
        value: Operand,
    },
    InsertLink {
        association: String,
        participants: Vec<Operand>,
    },
    DeleteLink {
        association: String,
        participants: Vec<Operand>,
    },
    Sequence(Vec<Statement>),
    /// Invoke an operation, running its body inside the call
    CallOperation {
        receiver: Operand,
        operation: String,
        arguments: Vec<Operand>,
    },
}

impl Statement {
    pub fn assign(variable: impl Into<String>, value: impl Into<Operand>) -> Self {
        Statement::Assign {
            variable: variable.into(),
            value: value.into(),
        }
    }

    pub fn create_object(class: &str, name: Option<&str>, variable: Option<&str>) -> Self {
        Statement::CreateObject {
            class: class.to_string(),
            name: name.map(str::to_string),
            variable: variable.map(str::to_string),
        }
    }

    pub fn set_attribute(
        object: impl Into<Operand>,
        attribute: impl Into<String>,
        value: impl Into<Operand>,
    ) -> Self {
        Statement::SetAttribute {
            object: object.into(),
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    pub fn call(
        receiver: impl Into<Operand>,
        operation: impl Into<String>,
        arguments: Vec<Operand>,
    ) -> Self {
        Statement::CallOperation {
            receiver: receiver.into(),
            operation: operation.into(),
            arguments,
        }
    }

    /// The statement as typed at the shell, e.g. `!o1.a := 5`
    pub fn shell_command(&self) -> String {
        format!("!{}", self)
    }

    /// True for a sequence with nothing in it
    pub fn is_empty(&self) -> bool {
        matches!(self, Statement::Sequence(s) if s.iter().all(Statement::is_empty))
    }
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Assign { variable, value } => write!(f, "{} := {}", variable, value),
            Statement::Unassign { variable } => write!(f, "unset {}", variable),
            Statement::CreateObject {
                class,
                name,
                variable,
            } => {
                if let Some(v) = variable {
                    write!(f, "{} := ", v)?;
                }
                write!(f, "new {}", class)?;
                if let Some(n) = name {
                    write!(f, "('{}')", n)?;
                }
                Ok(())
            }
            Statement::DestroyObject { object } => write!(f, "destroy {}", object),
            Statement::RestoreObject { snapshot } => {
                write!(f, "restore {} : {}", snapshot.name, snapshot.class)
            }
            Statement::SetAttribute {
                object,
                attribute,
                value,
            } => write!(f, "{}.{} := {}", object, attribute, value),
            Statement::InsertLink {
                association,
                participants,
            } => {
                write!(f, "insert (")?;
                write_list(f, participants)?;
                write!(f, ") into {}", association)
            }
            Statement::DeleteLink {
                association,
                participants,
            } => {
                write!(f, "delete (")?;
                write_list(f, participants)?;
                write!(f, ") from {}", association)
            }
            Statement::Sequence(statements) => {
                if statements.is_empty() {
                    return write!(f, "begin end");
                }
                write!(f, "begin ")?;
                for (i, s) in statements.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{}", s)?;
                }
                write!(f, " end")
            }
            Statement::CallOperation {
                receiver,
                operation,
                arguments,
            } => {
                write!(f, "{}.{}(", receiver, operation)?;
                write_list(f, arguments)?;
                write!(f, ")")
            }
        }
    }
}
