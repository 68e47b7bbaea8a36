use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::system_state::Link;

/// Net changes made to a state since the difference was last cleared
///
/// Recording is cancelling: an object created and deleted again leaves no
/// trace, and a link inserted then deleted (or the reverse) cancels out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateDifference {
    created: BTreeSet<String>,
    deleted: BTreeSet<String>,
    modified: BTreeMap<String, BTreeSet<String>>,
    inserted_links: BTreeSet<Link>,
    deleted_links: BTreeSet<Link>,
}

impl StateDifference {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_created(&mut self, object: &str) {
        if self.deleted.remove(object) {
            // existed before and after: a replacement, not a creation
            self.modified.entry(object.to_string()).or_default();
        } else {
            self.created.insert(object.to_string());
        }
    }

    pub fn add_deleted(&mut self, object: &str) {
        self.modified.remove(object);
        if !self.created.remove(object) {
            self.deleted.insert(object.to_string());
        }
    }

    pub fn add_modified(&mut self, object: &str, attribute: &str) {
        if self.created.contains(object) {
            return;
        }
        self.modified
            .entry(object.to_string())
            .or_default()
            .insert(attribute.to_string());
    }

    pub fn add_inserted_link(&mut self, link: &Link) {
        if !self.deleted_links.remove(link) {
            self.inserted_links.insert(link.clone());
        }
    }

    pub fn add_deleted_link(&mut self, link: &Link) {
        if !self.inserted_links.remove(link) {
            self.deleted_links.insert(link.clone());
        }
    }

    /// Fold a later difference into this one
    pub fn merge(&mut self, later: &StateDifference) {
        for o in &later.created {
            self.add_created(o);
        }
        for (o, attrs) in &later.modified {
            if attrs.is_empty() && !self.created.contains(o) {
                self.modified.entry(o.clone()).or_default();
            }
            for a in attrs {
                self.add_modified(o, a);
            }
        }
        for o in &later.deleted {
            self.add_deleted(o);
        }
        for l in &later.inserted_links {
            self.add_inserted_link(l);
        }
        for l in &later.deleted_links {
            self.add_deleted_link(l);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.created.is_empty()
            && self.deleted.is_empty()
            && self.modified.is_empty()
            && self.inserted_links.is_empty()
            && self.deleted_links.is_empty()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn created(&self) -> &BTreeSet<String> {
        &self.created
    }

    pub fn deleted(&self) -> &BTreeSet<String> {
        &self.deleted
    }

    pub fn modified(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.modified
    }

    pub fn inserted_links(&self) -> &BTreeSet<Link> {
        &self.inserted_links
    }

    pub fn deleted_links(&self) -> &BTreeSet<Link> {
        &self.deleted_links
    }

    /// Number of modified attribute slots
    pub fn num_attribute_changes(&self) -> usize {
        self.modified.values().map(BTreeSet::len).sum()
    }

    pub fn to_event(&self, state_id: impl Into<String>) -> StateChangeEvent {
        StateChangeEvent {
            state_id: state_id.into(),
            difference: self.clone(),
        }
    }
}

/// What change listeners receive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateChangeEvent {
    pub state_id: String,
    pub difference: StateDifference,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link() -> Link {
        Link::new("R", vec!["a".into(), "b".into()])
    }

    #[test]
    fn test_create_then_delete_leaves_no_trace() {
        let mut diff = StateDifference::new();
        diff.add_created("c1");
        diff.add_modified("c1", "a");
        diff.add_deleted("c1");
        assert!(diff.is_empty());
    }

    #[test]
    fn test_modified_of_created_is_not_reported() {
        let mut diff = StateDifference::new();
        diff.add_created("c1");
        diff.add_modified("c1", "a");
        diff.add_modified("c2", "a");
        diff.add_modified("c2", "b");
        assert_eq!(diff.created().len(), 1);
        assert_eq!(diff.modified().len(), 1);
        assert_eq!(diff.num_attribute_changes(), 2);
    }

    #[test]
    fn test_delete_then_create_is_a_modification() {
        let mut diff = StateDifference::new();
        diff.add_deleted("c1");
        diff.add_created("c1");
        assert!(diff.created().is_empty());
        assert!(diff.deleted().is_empty());
        assert!(diff.modified().contains_key("c1"));
    }

    #[test]
    fn test_link_changes_cancel() {
        let mut diff = StateDifference::new();
        diff.add_inserted_link(&link());
        diff.add_deleted_link(&link());
        assert!(diff.is_empty());

        diff.add_deleted_link(&link());
        diff.add_inserted_link(&link());
        assert!(diff.is_empty());
    }

    #[test]
    fn test_merge_applies_cancelling_rules() {
        let mut first = StateDifference::new();
        first.add_created("c1");
        first.add_inserted_link(&link());

        let mut second = StateDifference::new();
        second.add_deleted("c1");
        second.add_deleted_link(&link());
        second.add_modified("c2", "a");

        first.merge(&second);
        assert!(first.created().is_empty());
        assert!(first.deleted().is_empty());
        assert!(first.inserted_links().is_empty());
        assert_eq!(first.num_attribute_changes(), 1);
    }

    #[test]
    fn test_event_serializes() {
        let mut diff = StateDifference::new();
        diff.add_modified("c1", "a");
        let event = diff.to_event("state#1");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["state_id"], "state#1");
        assert_eq!(json["difference"]["modified"]["c1"][0], "a");

        diff.clear();
        assert!(diff.is_empty());
    }
}
