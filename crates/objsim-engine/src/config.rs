//! Engine configuration

use serde::{Deserialize, Serialize};

/// Settings of a [`System`](crate::System)
///
/// Logging is configured separately through
/// [`Profile`](objsim_core::logging_facility::Profile) and `RUST_LOG`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    /// Apply a failed statement's inverse before reporting the failure
    pub rollback_on_failure: bool,
    /// Keep at most this many results on the undo history; oldest go first
    pub history_limit: Option<usize>,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            rollback_on_failure: true,
            history_limit: None,
        }
    }
}

impl SystemConfig {
    pub fn with_rollback_on_failure(mut self, rollback: bool) -> Self {
        self.rollback_on_failure = rollback;
        self
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = Some(limit);
        self
    }
}
