use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::value::{ObjectRef, Value};

/// A live object: its class and its defined attribute values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectState {
    pub class: String,
    pub attributes: BTreeMap<String, Value>,
}

/// An instance of an association; participants are ordered by association end
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Link {
    pub association: String,
    pub participants: Vec<String>,
}

impl Link {
    pub fn new(association: impl Into<String>, participants: Vec<String>) -> Self {
        Self {
            association: association.into(),
            participants,
        }
    }

    pub fn involves(&self, object: &str) -> bool {
        self.participants.iter().any(|p| p == object)
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}) in `{}'", self.participants.join(", "), self.association)
    }
}

/// The current object graph
///
/// Read access is public. Mutation is restricted to statement application
/// inside this crate, so every change is recorded with its inverse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemState {
    id: String,
    objects: BTreeMap<String, ObjectState>,
    links: BTreeSet<Link>,
}

impl SystemState {
    /// An empty state
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            objects: BTreeMap::new(),
            links: BTreeSet::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// A copy of this state under a new id, used as a call's private pre-state
    pub fn snapshot(&self, id: impl Into<String>) -> SystemState {
        SystemState {
            id: id.into(),
            objects: self.objects.clone(),
            links: self.links.clone(),
        }
    }

    pub fn object(&self, name: &str) -> Option<&ObjectState> {
        self.objects.get(name)
    }

    pub fn has_object(&self, name: &str) -> bool {
        self.objects.contains_key(name)
    }

    /// Reference value for a live object
    pub fn object_ref(&self, name: &str) -> Option<ObjectRef> {
        self.objects
            .get(name)
            .map(|o| ObjectRef::new(name, o.class.clone()))
    }

    pub fn object_names(&self) -> impl Iterator<Item = &str> {
        self.objects.keys().map(String::as_str)
    }

    /// Objects whose class is exactly `class`
    pub fn objects_of_class<'a>(&'a self, class: &'a str) -> impl Iterator<Item = &'a str> {
        self.objects
            .iter()
            .filter(move |(_, o)| o.class == class)
            .map(|(n, _)| n.as_str())
    }

    pub fn num_objects(&self) -> usize {
        self.objects.len()
    }

    /// Attribute value; unset attributes and unknown objects read as undefined
    pub fn attribute_value(&self, object: &str, attribute: &str) -> Value {
        self.objects
            .get(object)
            .and_then(|o| o.attributes.get(attribute))
            .cloned()
            .unwrap_or_default()
    }

    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.iter()
    }

    pub fn links_of<'a>(&'a self, object: &'a str) -> impl Iterator<Item = &'a Link> {
        self.links.iter().filter(move |l| l.involves(object))
    }

    pub fn has_link(&self, link: &Link) -> bool {
        self.links.contains(link)
    }

    pub(crate) fn create_object(&mut self, name: &str, class: &str) {
        self.objects.insert(
            name.to_string(),
            ObjectState {
                class: class.to_string(),
                attributes: BTreeMap::new(),
            },
        );
    }

    /// Remove an object and every link it participates in
    pub(crate) fn destroy_object(&mut self, name: &str) -> Option<ObjectState> {
        let removed = self.objects.remove(name)?;
        self.links.retain(|l| !l.involves(name));
        Some(removed)
    }

    /// Set an attribute and return the previous value
    pub(crate) fn set_attribute(&mut self, object: &str, attribute: &str, value: Value) -> Value {
        let Some(obj) = self.objects.get_mut(object) else {
            return Value::Undefined;
        };
        let previous = if value.is_defined() {
            obj.attributes.insert(attribute.to_string(), value)
        } else {
            obj.attributes.remove(attribute)
        };
        previous.unwrap_or_default()
    }

    pub(crate) fn insert_link(&mut self, link: Link) -> bool {
        self.links.insert(link)
    }

    pub(crate) fn delete_link(&mut self, link: &Link) -> bool {
        self.links.remove(link)
    }
}
