use std::rc::Rc;

use super::operation::Operation;
use crate::value::Type;

/// A declared attribute
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub ty: Type,
}

/// A class of the model
#[derive(Debug, Clone, PartialEq)]
pub struct Class {
    name: String,
    is_abstract: bool,
    parents: Vec<String>,
    attributes: Vec<Attribute>,
    operations: Vec<Rc<Operation>>,
}

impl Class {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_abstract: false,
            parents: Vec::new(),
            attributes: Vec::new(),
            operations: Vec::new(),
        }
    }

    pub fn abstract_class(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parents.push(parent.into());
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, ty: Type) -> Self {
        self.attributes.push(Attribute {
            name: name.into(),
            ty,
        });
        self
    }

    /// Add an operation; its owner is set to this class
    pub fn with_operation(mut self, operation: Operation) -> Self {
        self.operations
            .push(Rc::new(operation.owned_by(self.name.clone())));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    pub fn parents(&self) -> &[String] {
        &self.parents
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn operations(&self) -> &[Rc<Operation>] {
        &self.operations
    }

    pub(crate) fn own_attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub(crate) fn own_operation(&self, name: &str) -> Option<&Rc<Operation>> {
        self.operations.iter().find(|op| op.name() == name)
    }
}
