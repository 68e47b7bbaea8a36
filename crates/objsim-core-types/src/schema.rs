//! Canonical schema constants for structured logging and events
//!
//! These constants keep field names consistent between the logging
//! macros, the engine boundary and the tests that assert on captured events.

// Canonical field keys for structured logging
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";
pub const FIELD_REQUEST_ID: &str = "request_id";

// Engine identifiers
pub const FIELD_STATEMENT: &str = "statement";
pub const FIELD_OPERATION: &str = "operation";
pub const FIELD_RECEIVER: &str = "receiver";
pub const FIELD_MODE: &str = "mode";

// Stack sizes
pub const FIELD_CALL_DEPTH: &str = "call_depth";
pub const FIELD_HISTORY_LEN: &str = "history_len";

// Error fields
pub const FIELD_ERR_KIND: &str = "err_kind";
pub const FIELD_ERR_CODE: &str = "err_code";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
