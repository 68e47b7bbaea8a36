//! Runtime values and their types
//!
//! Values are what variables, attributes, arguments and condition results
//! hold. Conformance between types needs the class hierarchy, so it lives
//! on [`Model::conforms`](crate::model::Model::conforms).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reference to an object of the object graph
///
/// Objects are identified by name; the class is carried along so a value
/// can be typed without consulting the state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectRef {
    pub name: String,
    pub class: String,
}

impl ObjectRef {
    pub fn new(name: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            class: class.into(),
        }
    }
}

/// A runtime value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum Value {
    /// The undefined value (`null`)
    #[default]
    Undefined,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    String(String),
    Object(ObjectRef),
}

impl Value {
    /// Shorthand for an object reference value
    pub fn object(name: impl Into<String>, class: impl Into<String>) -> Self {
        Value::Object(ObjectRef::new(name, class))
    }

    /// Shorthand for a string value
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    pub fn is_defined(&self) -> bool {
        !matches!(self, Value::Undefined)
    }

    /// Condition rule: defined, boolean-typed and true
    pub fn is_true(&self) -> bool {
        matches!(self, Value::Boolean(true))
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(r) => Some(r),
            _ => None,
        }
    }

    pub fn type_of(&self) -> Type {
        match self {
            Value::Undefined => Type::Void,
            Value::Boolean(_) => Type::Boolean,
            Value::Integer(_) => Type::Integer,
            Value::Real(_) => Type::Real,
            Value::String(_) => Type::String,
            Value::Object(r) => Type::Object(r.class.clone()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Real(r) => write!(f, "{:?}", r),
            Value::String(s) => write!(f, "'{}'", s),
            Value::Object(r) => write!(f, "{}", r.name),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(r: f64) -> Self {
        Value::Real(r)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

/// A type of the object model
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    Boolean,
    Integer,
    Real,
    String,
    /// Instances of the named class (or its subclasses)
    Object(String),
    /// The type of the undefined value; conforms to every type
    Void,
    /// The top type
    Any,
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Boolean => write!(f, "Boolean"),
            Type::Integer => write!(f, "Integer"),
            Type::Real => write!(f, "Real"),
            Type::String => write!(f, "String"),
            Type::Object(class) => write!(f, "{}", class),
            Type::Void => write!(f, "OclVoid"),
            Type::Any => write!(f, "OclAny"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_true_requires_defined_boolean_true() {
        assert!(Value::Boolean(true).is_true());
        assert!(!Value::Boolean(false).is_true());
        assert!(!Value::Undefined.is_true());
        assert!(!Value::Integer(1).is_true());
        assert!(!Value::string("true").is_true());
    }

    #[test]
    fn test_type_of() {
        assert_eq!(Value::Undefined.type_of(), Type::Void);
        assert_eq!(Value::Integer(3).type_of(), Type::Integer);
        assert_eq!(
            Value::object("c1", "C").type_of(),
            Type::Object("C".to_string())
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Undefined.to_string(), "null");
        assert_eq!(Value::string("abc").to_string(), "'abc'");
        assert_eq!(Value::Real(1.5).to_string(), "1.5");
        assert_eq!(Value::object("c1", "C").to_string(), "c1");
        assert_eq!(Type::Void.to_string(), "OclVoid");
    }

    #[test]
    fn test_serde_shape() {
        let json = serde_json::to_string(&Value::Integer(5)).unwrap();
        assert_eq!(json, r#"{"Integer":5}"#);
        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Value::Integer(5));
    }
}
