//! Error types for the evaluator

use thiserror::Error;

use crate::value::JsValue;

/// Coarse classification handed to hosts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Reference,
    Type,
    Syntax,
    Range,
    Thrown,
    SuspendNotAllowed,
    Cancelled,
    Internal,
}

/// Main error type for the evaluator
///
/// Cloneable because the result of an asynchronous unit is shared by every
/// awaiter.
#[derive(Debug, Clone, Error)]
pub enum JsError {
    /// Unresolvable name, or a property read on `undefined`
    #[error("ReferenceError: {message}")]
    ReferenceError { message: String },

    #[error("TypeError: {message}")]
    TypeError { message: String },

    /// Malformed tree, raised when a definition is created
    #[error("SyntaxError: {message}")]
    SyntaxError { message: String },

    #[error("RangeError: {message}")]
    RangeError { message: String },

    /// A value raised by a user `throw`
    #[error("Uncaught {0:?}")]
    Thrown(JsValue),

    /// Evaluation tried to suspend while the scope forbids it
    #[error("SuspendNotAllowed: {message}")]
    SuspendNotAllowed { message: String },

    /// The owning runtime was reset while the unit was pending
    #[error("Cancelled: runtime was reset")]
    Cancelled,

    #[error("InternalError: {0}")]
    Internal(String),
}

impl JsError {
    pub fn reference_error(message: impl Into<String>) -> Self {
        JsError::ReferenceError {
            message: message.into(),
        }
    }

    pub fn not_defined(name: &str) -> Self {
        JsError::ReferenceError {
            message: format!("{} is not defined", name),
        }
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        JsError::TypeError {
            message: message.into(),
        }
    }

    pub fn syntax_error(message: impl Into<String>) -> Self {
        JsError::SyntaxError {
            message: message.into(),
        }
    }

    pub fn range_error(message: impl Into<String>) -> Self {
        JsError::RangeError {
            message: message.into(),
        }
    }

    pub fn suspend_not_allowed(message: impl Into<String>) -> Self {
        JsError::SuspendNotAllowed {
            message: message.into(),
        }
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        JsError::Internal(message.into())
    }

    pub fn thrown(value: JsValue) -> Self {
        JsError::Thrown(value)
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            JsError::ReferenceError { .. } => ErrorKind::Reference,
            JsError::TypeError { .. } => ErrorKind::Type,
            JsError::SyntaxError { .. } => ErrorKind::Syntax,
            JsError::RangeError { .. } => ErrorKind::Range,
            JsError::Thrown(_) => ErrorKind::Thrown,
            JsError::SuspendNotAllowed { .. } => ErrorKind::SuspendNotAllowed,
            JsError::Cancelled => ErrorKind::Cancelled,
            JsError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Whether a script `try/catch` may observe this error.
    ///
    /// Suspension refusals, cancellation and internal failures always abort
    /// the whole invocation.
    pub fn is_catchable(&self) -> bool {
        !matches!(
            self,
            JsError::SuspendNotAllowed { .. } | JsError::Cancelled | JsError::Internal(_)
        )
    }

    /// Name used for the `name` property of a caught error object
    pub fn name(&self) -> &'static str {
        match self {
            JsError::ReferenceError { .. } => "ReferenceError",
            JsError::TypeError { .. } => "TypeError",
            JsError::SyntaxError { .. } => "SyntaxError",
            JsError::RangeError { .. } => "RangeError",
            JsError::Thrown(_) => "Error",
            JsError::SuspendNotAllowed { .. } => "SuspendNotAllowed",
            JsError::Cancelled => "Cancelled",
            JsError::Internal(_) => "InternalError",
        }
    }

    /// Message without the error name prefix
    pub fn message(&self) -> String {
        match self {
            JsError::ReferenceError { message }
            | JsError::TypeError { message }
            | JsError::SyntaxError { message }
            | JsError::RangeError { message }
            | JsError::SuspendNotAllowed { message } => message.clone(),
            JsError::Thrown(value) => format!("{:?}", value),
            JsError::Cancelled => "runtime was reset".to_string(),
            JsError::Internal(message) => message.clone(),
        }
    }
}
