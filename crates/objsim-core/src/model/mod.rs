//! Read-only metamodel: classes, attributes, operations, associations
//!
//! The engine only looks things up here. Models are assembled up front
//! with the `with_*` builders and shared behind an `Rc` afterwards.

pub mod association;
pub mod class;
pub mod operation;

pub use association::{Association, AssociationEnd};
pub use class::{Attribute, Class};
pub use operation::{Condition, Operation, VarDecl};

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::rc::Rc;

use crate::value::Type;

/// A complete object model
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    name: String,
    classes: BTreeMap<String, Class>,
    associations: BTreeMap<String, Association>,
}

impl Model {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            classes: BTreeMap::new(),
            associations: BTreeMap::new(),
        }
    }

    /// Add a class, replacing any class of the same name
    pub fn with_class(mut self, class: Class) -> Self {
        self.classes.insert(class.name().to_string(), class);
        self
    }

    /// Add an association, replacing any association of the same name
    pub fn with_association(mut self, association: Association) -> Self {
        self.associations
            .insert(association.name.clone(), association);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn class(&self, name: &str) -> Option<&Class> {
        self.classes.get(name)
    }

    pub fn classes(&self) -> impl Iterator<Item = &Class> {
        self.classes.values()
    }

    pub fn association(&self, name: &str) -> Option<&Association> {
        self.associations.get(name)
    }

    /// Class and its ancestors, nearest first, each visited once
    fn lineage<'a>(&'a self, class: &str) -> Vec<&'a Class> {
        let mut seen: HashSet<&'a str> = HashSet::new();
        let mut queue: VecDeque<&'a str> = self
            .classes
            .get_key_value(class)
            .map(|(name, _)| name.as_str())
            .into_iter()
            .collect();
        let mut out = Vec::new();
        while let Some(name) = queue.pop_front() {
            if !seen.insert(name) {
                continue;
            }
            if let Some(cls) = self.classes.get(name) {
                out.push(cls);
                queue.extend(cls.parents().iter().map(String::as_str));
            }
        }
        out
    }

    /// True if `class` is `ancestor` or inherits from it
    pub fn is_subclass_of(&self, class: &str, ancestor: &str) -> bool {
        class == ancestor || self.lineage(class).iter().any(|c| c.name() == ancestor)
    }

    /// Attribute declared by the class or inherited from a parent
    pub fn attribute(&self, class: &str, attribute: &str) -> Option<&Attribute> {
        self.lineage(class)
            .into_iter()
            .find_map(|c| c.own_attribute(attribute))
    }

    /// All attributes visible on a class, own attributes first
    pub fn all_attributes(&self, class: &str) -> Vec<&Attribute> {
        let mut names = HashSet::new();
        self.lineage(class)
            .into_iter()
            .flat_map(|c| c.attributes().iter())
            .filter(|a| names.insert(a.name.as_str()))
            .collect()
    }

    /// Operation declared by the class or inherited; the nearest declaration wins
    pub fn operation(&self, class: &str, operation: &str) -> Option<&Rc<Operation>> {
        self.lineage(class)
            .into_iter()
            .find_map(|c| c.own_operation(operation))
    }

    /// Type conformance: is a value of type `found` acceptable where
    /// `expected` is declared?
    pub fn conforms(&self, found: &Type, expected: &Type) -> bool {
        match (found, expected) {
            (a, b) if a == b => true,
            (Type::Void, _) | (_, Type::Any) => true,
            (Type::Integer, Type::Real) => true,
            (Type::Object(c), Type::Object(d)) => self.is_subclass_of(c, d),
            _ => false,
        }
    }
}
