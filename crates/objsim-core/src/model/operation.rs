use std::fmt;

use crate::expression::Expression;
use crate::statement::Statement;
use crate::value::Type;

/// A declared parameter or variable
#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub name: String,
    pub ty: Type,
}

/// A named pre- or postcondition
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub name: String,
    pub expression: Expression,
}

impl Condition {
    pub fn new(name: impl Into<String>, expression: impl Into<Expression>) -> Self {
        Self {
            name: name.into(),
            expression: expression.into(),
        }
    }
}

/// An operation declared by a class
///
/// `postconditions_require_pre_state` comes from the model (the
/// postconditions mention `@pre` values); the engine never derives it.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    name: String,
    owner: String,
    parameters: Vec<VarDecl>,
    result_type: Option<Type>,
    preconditions: Vec<Condition>,
    postconditions: Vec<Condition>,
    postconditions_require_pre_state: bool,
    body: Option<Statement>,
}

impl Operation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            owner: String::new(),
            parameters: Vec::new(),
            result_type: None,
            preconditions: Vec::new(),
            postconditions: Vec::new(),
            postconditions_require_pre_state: false,
            body: None,
        }
    }

    pub fn with_parameter(mut self, name: impl Into<String>, ty: Type) -> Self {
        self.parameters.push(VarDecl {
            name: name.into(),
            ty,
        });
        self
    }

    pub fn with_result_type(mut self, ty: Type) -> Self {
        self.result_type = Some(ty);
        self
    }

    pub fn with_precondition(
        mut self,
        name: impl Into<String>,
        expression: impl Into<Expression>,
    ) -> Self {
        self.preconditions.push(Condition::new(name, expression));
        self
    }

    pub fn with_postcondition(
        mut self,
        name: impl Into<String>,
        expression: impl Into<Expression>,
    ) -> Self {
        self.postconditions.push(Condition::new(name, expression));
        self
    }

    /// Mark the postconditions as referring to pre-state values
    pub fn requiring_pre_state(mut self) -> Self {
        self.postconditions_require_pre_state = true;
        self
    }

    /// Body executed by a `CallOperation` statement
    pub fn with_body(mut self, body: Statement) -> Self {
        self.body = Some(body);
        self
    }

    pub(crate) fn owned_by(mut self, owner: String) -> Self {
        self.owner = owner;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the declaring class
    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn parameters(&self) -> &[VarDecl] {
        &self.parameters
    }

    pub fn result_type(&self) -> Option<&Type> {
        self.result_type.as_ref()
    }

    pub fn preconditions(&self) -> &[Condition] {
        &self.preconditions
    }

    pub fn postconditions(&self) -> &[Condition] {
        &self.postconditions
    }

    pub fn postconditions_require_pre_state(&self) -> bool {
        self.postconditions_require_pre_state
    }

    pub fn body(&self) -> Option<&Statement> {
        self.body.as_ref()
    }

    /// `Owner::name`
    pub fn qualified_name(&self) -> String {
        format!("{}::{}", self.owner, self.name)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.qualified_name())?;
        for (i, p) in self.parameters.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} : {}", p.name, p.ty)?;
        }
        write!(f, ")")?;
        if let Some(ty) = &self.result_type {
            write!(f, " : {}", ty)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Class;

    #[test]
    fn test_signature_display() {
        let class = Class::new("Counter").with_operation(
            Operation::new("add")
                .with_parameter("n", Type::Integer)
                .with_parameter("m", Type::Real)
                .with_result_type(Type::Integer),
        );
        let op = &class.operations()[0];
        assert_eq!(op.owner(), "Counter");
        assert_eq!(
            op.to_string(),
            "Counter::add(n : Integer, m : Real) : Integer"
        );
    }

    #[test]
    fn test_pre_state_flag_is_opaque() {
        let op = Operation::new("touch").with_postcondition("p", "a = a@pre");
        assert!(!op.postconditions_require_pre_state());
        assert!(op.requiring_pre_state().postconditions_require_pre_state());
    }
}
