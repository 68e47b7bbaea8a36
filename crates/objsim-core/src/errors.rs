use objsim_core_types::RequestId;
use thiserror::Error;

/// Result type alias using SimError
pub type Result<T> = std::result::Result<T, SimError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// This taxonomy provides a stable, structured classification of every
/// error the engine surfaces. Each kind maps to a stable error code that
/// hosts can match on and that the logging macros attach to error events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Call protocol
    ArityMismatch,
    TypeMismatch,
    PreconditionViolation,
    MissingResult,
    ResultTypeMismatch,
    PostconditionViolation,
    EmptyCallStack,

    // Pipeline / history
    StatementFailed,
    SystemLocked,
    NothingToUndo,
    NothingToRedo,

    // Object graph
    NotFound,
    AlreadyExists,
    InvalidInput,
    ActiveOperation,

    // Configuration
    AlreadyRegistered,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::ArityMismatch => "ERR_ARITY_MISMATCH",
            ExErrorKind::TypeMismatch => "ERR_TYPE_MISMATCH",
            ExErrorKind::PreconditionViolation => "ERR_PRECONDITION_VIOLATION",
            ExErrorKind::MissingResult => "ERR_MISSING_RESULT",
            ExErrorKind::ResultTypeMismatch => "ERR_RESULT_TYPE_MISMATCH",
            ExErrorKind::PostconditionViolation => "ERR_POSTCONDITION_VIOLATION",
            ExErrorKind::EmptyCallStack => "ERR_EMPTY_CALL_STACK",
            ExErrorKind::StatementFailed => "ERR_STATEMENT_FAILED",
            ExErrorKind::SystemLocked => "ERR_SYSTEM_LOCKED",
            ExErrorKind::NothingToUndo => "ERR_NOTHING_TO_UNDO",
            ExErrorKind::NothingToRedo => "ERR_NOTHING_TO_REDO",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::AlreadyExists => "ERR_ALREADY_EXISTS",
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::ActiveOperation => "ERR_ACTIVE_OPERATION",
            ExErrorKind::AlreadyRegistered => "ERR_ALREADY_REGISTERED",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Carries classification fields for programmatic handling plus context
/// for debugging. Built from a [`SimError`] at logging and host boundaries.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    entity_id: Option<String>,
    request_id: Option<RequestId>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            entity_id: None,
            request_id: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add entity context (object name, class name or statement text)
    pub fn with_entity_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }

    /// Add request ID context
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the entity context, if any
    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    /// Get the request ID context, if any
    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the source error, if any
    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(entity_id) = &self.entity_id {
            write!(f, " (entity: {})", entity_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Error taxonomy for engine operations
///
/// Messages are written for a command-log / shell echo: they name the
/// operation or object involved and, for call-protocol errors, whether the
/// call is still on the stack.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    // ===== Call protocol =====
    /// Argument count differs from the declared parameter count
    #[error("Number of arguments does not match declaration of operation `{operation}' in class `{class}'. Expected {expected} argument{}, found {found}.", plural(.expected))]
    ArityMismatch {
        operation: String,
        class: String,
        expected: usize,
        found: usize,
    },

    /// An argument does not conform to its parameter type
    #[error("Type mismatch in argument {position} of operation `{operation}'. Expected type `{expected}', found `{found}'.")]
    TypeMismatch {
        operation: String,
        /// Zero-based index of the first non-conforming argument
        position: usize,
        expected: String,
        found: String,
    },

    /// The resolved policy rejected the precondition results
    #[error("Precondition violation in operation `{operation}': {message}")]
    PreconditionViolation { operation: String, message: String },

    /// A result value is required on exit but none was supplied
    #[error("Result value of type `{expected}' required on exit of operation `{operation}'.{}", still_active_note(.still_active))]
    MissingResult {
        operation: String,
        expected: String,
        still_active: bool,
    },

    /// The supplied result value does not conform to the result type
    #[error("Result value type `{found}' does not match operation result type `{expected}' of `{operation}'.{}", still_active_note(.still_active))]
    ResultTypeMismatch {
        operation: String,
        expected: String,
        found: String,
        still_active: bool,
    },

    /// The resolved policy rejected the postcondition results
    #[error("Postcondition violation in operation `{operation}': {message}")]
    PostconditionViolation { operation: String, message: String },

    /// Exit was requested with no active operation call
    #[error("Call stack is empty.")]
    EmptyCallStack,

    // ===== Pipeline / history =====
    /// A statement failed during application
    #[error("{cause}")]
    StatementFailed {
        statement: String,
        cause: Box<SimError>,
    },

    /// A statement was submitted while condition policy dispatch holds the lock
    #[error("The system currently cannot be modified.")]
    SystemLocked,

    /// Undo requested with an empty history
    #[error("nothing to undo")]
    NothingToUndo,

    /// Redo requested with an empty redo stack
    #[error("nothing to redo")]
    NothingToRedo,

    // ===== Object graph =====
    /// Class is not part of the model
    #[error("Class `{class}' does not exist.")]
    UnknownClass { class: String },

    /// Abstract classes cannot be instantiated
    #[error("The abstract class `{class}' cannot be instantiated.")]
    AbstractClass { class: String },

    /// Object does not exist in the current state
    #[error("Object `{object}' does not exist.")]
    ObjectNotFound { object: String },

    /// Object name already taken
    #[error("An object with name `{object}' already exists.")]
    ObjectAlreadyExists { object: String },

    /// Object still has an operation call on the call stack
    #[error("Object `{object}' cannot be destroyed while it has an active operation.")]
    ObjectHasActiveOperation { object: String },

    /// Attribute is not declared by the class or its parents
    #[error("Class `{class}' has no attribute `{attribute}'.")]
    UnknownAttribute { class: String, attribute: String },

    /// Assigned value does not conform to the attribute type
    #[error("Type mismatch in assignment to `{object}.{attribute}'. Expected type `{expected}', found `{found}'.")]
    AttributeTypeMismatch {
        object: String,
        attribute: String,
        expected: String,
        found: String,
    },

    /// Operation is not declared by the class or its parents
    #[error("Class `{class}' has no operation `{operation}'.")]
    UnknownOperation { class: String, operation: String },

    /// Association is not part of the model
    #[error("Association `{association}' does not exist.")]
    UnknownAssociation { association: String },

    /// Link participant count differs from the association's end count
    #[error("Association `{association}' has {expected} ends, found {found} participants.")]
    LinkArityMismatch {
        association: String,
        expected: usize,
        found: usize,
    },

    /// Link participant does not conform to its association end
    #[error("Participant `{object}' does not conform to end `{role}' of association `{association}'.")]
    LinkEndTypeMismatch {
        association: String,
        role: String,
        object: String,
    },

    /// Link already present
    #[error("Link {link} already exists.")]
    LinkAlreadyExists { link: String },

    /// Link not present
    #[error("Link {link} does not exist.")]
    LinkNotFound { link: String },

    /// A value used as an object reference is not an object
    #[error("Expected an object, found `{found}'.")]
    NotAnObject { found: String },

    /// Variable lookup failed
    #[error("Undefined variable `{variable}'.")]
    UnboundVariable { variable: String },

    // ===== Configuration =====
    /// The session-wide policy override may only be registered once
    #[error("A condition policy override is already registered.")]
    PolicyOverrideAlreadySet,

    // ===== Generic =====
    /// Generic internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

fn plural(count: &usize) -> &'static str {
    if *count == 1 {
        ""
    } else {
        "s"
    }
}

fn still_active_note(still_active: &bool) -> &'static str {
    if *still_active {
        " Operation is still active."
    } else {
        ""
    }
}

impl SimError {
    /// Wrap a failure cause with the statement that produced it
    pub fn statement_failed(statement: impl Into<String>, cause: SimError) -> Self {
        SimError::StatementFailed {
            statement: statement.into(),
            cause: Box::new(cause),
        }
    }

    /// The innermost cause, skipping `StatementFailed` wrappers
    pub fn root_cause(&self) -> &SimError {
        match self {
            SimError::StatementFailed { cause, .. } => cause.root_cause(),
            other => other,
        }
    }
}

/// Conversion from SimError to ExError
///
/// Used by the logging macros and by hosts that want stable codes.
impl From<SimError> for ExError {
    fn from(err: SimError) -> Self {
        let message = err.to_string();
        match err {
            SimError::ArityMismatch { operation, .. } => {
                ExError::new(ExErrorKind::ArityMismatch)
                    .with_entity_id(operation)
                    .with_message(message)
            }
            SimError::TypeMismatch { operation, .. } => ExError::new(ExErrorKind::TypeMismatch)
                .with_entity_id(operation)
                .with_message(message),
            SimError::PreconditionViolation { operation, .. } => {
                ExError::new(ExErrorKind::PreconditionViolation)
                    .with_entity_id(operation)
                    .with_message(message)
            }
            SimError::MissingResult { operation, .. } => ExError::new(ExErrorKind::MissingResult)
                .with_entity_id(operation)
                .with_message(message),
            SimError::ResultTypeMismatch { operation, .. } => {
                ExError::new(ExErrorKind::ResultTypeMismatch)
                    .with_entity_id(operation)
                    .with_message(message)
            }
            SimError::PostconditionViolation { operation, .. } => {
                ExError::new(ExErrorKind::PostconditionViolation)
                    .with_entity_id(operation)
                    .with_message(message)
            }
            SimError::EmptyCallStack => {
                ExError::new(ExErrorKind::EmptyCallStack).with_message(message)
            }
            SimError::StatementFailed { statement, cause } => {
                ExError::new(ExErrorKind::StatementFailed)
                    .with_entity_id(statement)
                    .with_message(message)
                    .with_source(ExError::from(*cause))
            }
            SimError::SystemLocked => ExError::new(ExErrorKind::SystemLocked).with_message(message),
            SimError::NothingToUndo => {
                ExError::new(ExErrorKind::NothingToUndo).with_message(message)
            }
            SimError::NothingToRedo => {
                ExError::new(ExErrorKind::NothingToRedo).with_message(message)
            }
            SimError::UnknownClass { class } => ExError::new(ExErrorKind::NotFound)
                .with_entity_id(class)
                .with_message(message),
            SimError::UnknownOperation { class, .. } | SimError::UnknownAttribute { class, .. } => {
                ExError::new(ExErrorKind::NotFound)
                    .with_entity_id(class)
                    .with_message(message)
            }
            SimError::UnknownAssociation { association } => ExError::new(ExErrorKind::NotFound)
                .with_entity_id(association)
                .with_message(message),
            SimError::ObjectNotFound { object } => ExError::new(ExErrorKind::NotFound)
                .with_entity_id(object)
                .with_message(message),
            SimError::LinkNotFound { link } => ExError::new(ExErrorKind::NotFound)
                .with_entity_id(link)
                .with_message(message),
            SimError::UnboundVariable { variable } => ExError::new(ExErrorKind::NotFound)
                .with_entity_id(variable)
                .with_message(message),
            SimError::ObjectAlreadyExists { object } => ExError::new(ExErrorKind::AlreadyExists)
                .with_entity_id(object)
                .with_message(message),
            SimError::LinkAlreadyExists { link } => ExError::new(ExErrorKind::AlreadyExists)
                .with_entity_id(link)
                .with_message(message),
            SimError::ObjectHasActiveOperation { object } => {
                ExError::new(ExErrorKind::ActiveOperation)
                    .with_entity_id(object)
                    .with_message(message)
            }
            SimError::AbstractClass { class } => ExError::new(ExErrorKind::InvalidInput)
                .with_entity_id(class)
                .with_message(message),
            SimError::AttributeTypeMismatch { object, .. } => {
                ExError::new(ExErrorKind::TypeMismatch)
                    .with_entity_id(object)
                    .with_message(message)
            }
            SimError::LinkArityMismatch { association, .. }
            | SimError::LinkEndTypeMismatch { association, .. } => {
                ExError::new(ExErrorKind::InvalidInput)
                    .with_entity_id(association)
                    .with_message(message)
            }
            SimError::NotAnObject { .. } => {
                ExError::new(ExErrorKind::InvalidInput).with_message(message)
            }
            SimError::PolicyOverrideAlreadySet => {
                ExError::new(ExErrorKind::AlreadyRegistered).with_message(message)
            }
            SimError::Internal { .. } => ExError::new(ExErrorKind::Internal).with_message(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arity_message_pluralises() {
        let one = SimError::ArityMismatch {
            operation: "inc".to_string(),
            class: "C".to_string(),
            expected: 1,
            found: 2,
        };
        assert!(one.to_string().contains("Expected 1 argument, found 2"));

        let two = SimError::ArityMismatch {
            operation: "inc".to_string(),
            class: "C".to_string(),
            expected: 2,
            found: 0,
        };
        assert!(two.to_string().contains("Expected 2 arguments, found 0"));
    }

    #[test]
    fn test_still_active_suffix() {
        let err = SimError::MissingResult {
            operation: "C::get()".to_string(),
            expected: "Integer".to_string(),
            still_active: true,
        };
        assert!(err.to_string().ends_with("Operation is still active."));

        let forced = SimError::MissingResult {
            operation: "C::get()".to_string(),
            expected: "Integer".to_string(),
            still_active: false,
        };
        assert!(!forced.to_string().contains("still active"));
    }

    #[test]
    fn test_statement_failed_displays_cause() {
        let err = SimError::statement_failed(
            "!destroy x",
            SimError::ObjectNotFound {
                object: "x".to_string(),
            },
        );
        assert_eq!(err.to_string(), "Object `x' does not exist.");
        assert!(matches!(err.root_cause(), SimError::ObjectNotFound { .. }));
    }

    #[test]
    fn test_ex_error_conversion_keeps_source_chain() {
        let err = SimError::statement_failed("!o.a := 1", SimError::SystemLocked);
        let ex: ExError = err.into();
        assert_eq!(ex.kind(), ExErrorKind::StatementFailed);
        assert_eq!(ex.entity_id(), Some("!o.a := 1"));
        assert_eq!(
            ex.source_error().map(|s| s.kind()),
            Some(ExErrorKind::SystemLocked)
        );
    }

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(ExErrorKind::NothingToUndo.code(), "ERR_NOTHING_TO_UNDO");
        assert_eq!(ExErrorKind::SystemLocked.code(), "ERR_SYSTEM_LOCKED");
        assert_eq!(
            ExErrorKind::PostconditionViolation.code(),
            "ERR_POSTCONDITION_VIOLATION"
        );
    }

    #[test]
    fn test_ex_error_display() {
        let ex = ExError::new(ExErrorKind::NotFound)
            .with_op("destroy")
            .with_entity_id("c9")
            .with_message("Object `c9' does not exist.");
        assert_eq!(
            ex.to_string(),
            "[ERR_NOT_FOUND] in operation 'destroy': Object `c9' does not exist. (entity: c9)"
        );
    }
}
