//! Hub error codes and error type.

use crate::types::ErrorBody;

// ── Error code constants ────────────────────────────────────────────

/// Connection registry is at its configured limit.
pub const CAPACITY_EXCEEDED: &str = "CAPACITY_EXCEEDED";
/// No handler registered under the invoked method name.
pub const UNKNOWN_METHOD: &str = "UNKNOWN_METHOD";
/// Argument count or shape does not match the method's signature,
/// or the invocation frame itself was malformed.
pub const ARGUMENT_MISMATCH: &str = "ARGUMENT_MISMATCH";
/// Handler faulted while executing; surfaced to the one caller.
pub const REMOTE_ERROR: &str = "REMOTE_ERROR";
/// Unexpected internal error.
pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";

/// Error produced while admitting connections or dispatching invocations.
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    /// No handler is registered under the invoked method name.
    #[error("method '{method}' is not registered")]
    UnknownMethod {
        /// The method name as received.
        method: String,
    },

    /// Arguments do not match the method's declared signature.
    #[error("{message}")]
    ArgumentMismatch {
        /// What part of the argument list is wrong.
        message: String,
    },

    /// The connection registry is full.
    #[error("connection limit reached ({limit})")]
    CapacityExceeded {
        /// The configured connection limit.
        limit: usize,
    },

    /// A handler faulted while executing.
    #[error("{message}")]
    Handler {
        /// Description of the fault.
        message: String,
    },

    /// Unexpected internal error.
    #[error("{message}")]
    Internal {
        /// Description.
        message: String,
    },
}

impl HubError {
    /// Machine-readable wire code for this variant.
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownMethod { .. } => UNKNOWN_METHOD,
            Self::ArgumentMismatch { .. } => ARGUMENT_MISMATCH,
            Self::CapacityExceeded { .. } => CAPACITY_EXCEEDED,
            Self::Handler { .. } => REMOTE_ERROR,
            Self::Internal { .. } => INTERNAL_ERROR,
        }
    }

    /// Convert to the wire-format error body.
    pub fn to_error_body(&self) -> ErrorBody {
        ErrorBody {
            code: self.code().to_owned(),
            message: self.to_string(),
            details: None,
        }
    }
}
