//! Correlation identifiers for log tracking
//!
//! Every host-level history operation (evaluate, undo, redo) runs inside a
//! tracing span tagged with a fresh [`RequestId`], so nested operation
//! entries and exits can be attributed to the command that caused them.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of one host-level request
///
/// UUIDv7, so ids sort by creation time in log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for RequestId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
