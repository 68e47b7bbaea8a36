//! Variable environment
//!
//! A stack of frames over a global frame. Operation calls push a restricted
//! frame: lookups from inside it see its own bindings and the global frame,
//! never the caller's locals.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::value::Value;

/// A flat view of visible variable bindings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VarBindings(BTreeMap<String, Value>);

impl VarBindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.0.insert(name.into(), value);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Frame {
    bindings: BTreeMap<String, Value>,
    restricted: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableEnvironment {
    // frames[0] is the global frame and is never popped
    frames: Vec<Frame>,
}

impl Default for VariableEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

impl VariableEnvironment {
    pub fn new() -> Self {
        Self {
            frames: vec![Frame::default()],
        }
    }

    /// Number of frames pushed on top of the global frame
    pub fn depth(&self) -> usize {
        self.frames.len() - 1
    }

    pub fn push_frame(&mut self, restricted: bool) {
        self.frames.push(Frame {
            bindings: BTreeMap::new(),
            restricted,
        });
    }

    /// Pop the top frame; returns false if only the global frame is left
    pub fn pop_frame(&mut self) -> bool {
        if self.frames.len() > 1 {
            self.frames.pop();
            true
        } else {
            false
        }
    }

    fn top(&mut self) -> &mut Frame {
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    /// Bind in the top frame, returning the value it shadowed there
    pub fn assign(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.top().bindings.insert(name.into(), value)
    }

    /// Remove a binding from the top frame
    pub fn unassign(&mut self, name: &str) -> Option<Value> {
        self.top().bindings.remove(name)
    }

    /// Indices of the frames visible from the top, innermost first
    fn visible(&self) -> Vec<usize> {
        let mut out = Vec::new();
        for idx in (1..self.frames.len()).rev() {
            out.push(idx);
            if self.frames[idx].restricted {
                break;
            }
        }
        out.push(0);
        out
    }

    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.visible()
            .into_iter()
            .find_map(|idx| self.frames[idx].bindings.get(name))
    }

    /// Lookup in the top frame only
    pub fn lookup_local(&self, name: &str) -> Option<&Value> {
        self.frames.last().and_then(|f| f.bindings.get(name))
    }

    /// Every visible binding, inner frames shadowing outer ones
    pub fn bindings(&self) -> VarBindings {
        let mut out = VarBindings::new();
        for idx in self.visible().into_iter().rev() {
            for (name, value) in &self.frames[idx].bindings {
                out.insert(name.clone(), value.clone());
            }
        }
        out
    }

    /// Drop every frame and binding
    pub fn clear(&mut self) {
        *self = Self::new();
    }
}
