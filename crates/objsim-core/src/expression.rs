//! Expression seam
//!
//! Expressions are opaque text to the engine. Evaluation is delegated to an
//! [`ExpressionEvaluator`] supplied by the host; conditions and expression
//! operands go through it.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::state::SystemState;
use crate::value::Value;
use crate::variables::VarBindings;

/// An opaque expression of the constraint language
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Expression {
    text: String,
}

impl Expression {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<&str> for Expression {
    fn from(text: &str) -> Self {
        Expression::new(text)
    }
}

impl From<String> for Expression {
    fn from(text: String) -> Self {
        Expression::new(text)
    }
}

/// Evaluates expressions against a state
///
/// `pre_state` is only supplied for postconditions. Evaluation never fails:
/// an expression that cannot be evaluated yields [`Value::Undefined`].
pub trait ExpressionEvaluator {
    fn eval(
        &self,
        expr: &Expression,
        state: &SystemState,
        pre_state: Option<&SystemState>,
        bindings: &VarBindings,
    ) -> Value;
}

impl<F> ExpressionEvaluator for F
where
    F: Fn(&Expression, &SystemState, Option<&SystemState>, &VarBindings) -> Value,
{
    fn eval(
        &self,
        expr: &Expression,
        state: &SystemState,
        pre_state: Option<&SystemState>,
        bindings: &VarBindings,
    ) -> Value {
        self(expr, state, pre_state, bindings)
    }
}
