//! Error types for netpush-exec

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::framing::FramingError;
use crate::rpc::RpcParseError;

/// Session primitive an error or timeout refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Open,
    Lock,
    Apply,
    Unlock,
    Close,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Open => "open",
            Operation::Lock => "lock",
            Operation::Apply => "apply",
            Operation::Unlock => "unlock",
            Operation::Close => "close",
        };
        f.write_str(name)
    }
}

/// Errors that can occur on a management session
#[derive(Error, Debug, Clone)]
pub enum SessionError {
    /// Transport could not be established
    #[error("connection failed: {0}")]
    Connect(String),

    /// Authentication failed
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Credential could not be resolved
    #[error("credential error: {0}")]
    Credential(String),

    /// Malformed or unexpected protocol data
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The device answered with an `rpc-error`
    #[error("{operation} rejected: {message}")]
    Rpc {
        /// Operation that was rejected
        operation: Operation,
        /// Device-supplied error message
        message: String,
    },

    /// Operation did not complete within its budget
    #[error("{operation} timed out after {timeout:?}")]
    Timeout {
        /// Operation that timed out
        operation: Operation,
        /// Budget that was exceeded
        timeout: Duration,
    },

    /// The session or its transport is gone
    #[error("session closed")]
    Closed,

    /// I/O error on the transport
    #[error("I/O error: {0}")]
    Io(String),
}

impl SessionError {
    /// Cause text recorded in a device outcome
    #[must_use]
    pub fn detail(&self) -> String {
        match self {
            SessionError::Connect(msg)
            | SessionError::Protocol(msg)
            | SessionError::Io(msg)
            | SessionError::Rpc { message: msg, .. } => msg.clone(),
            other => other.to_string(),
        }
    }

    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, SessionError::Timeout { .. })
    }
}

impl From<FramingError> for SessionError {
    fn from(err: FramingError) -> Self {
        SessionError::Protocol(err.to_string())
    }
}

impl From<RpcParseError> for SessionError {
    fn from(err: RpcParseError) -> Self {
        SessionError::Protocol(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rpc_detail_is_bare_message() {
        let err = SessionError::Rpc {
            operation: Operation::Apply,
            message: "invalid syntax".to_string(),
        };
        assert_eq!(err.detail(), "invalid syntax");
        assert_eq!(err.to_string(), "apply rejected: invalid syntax");
    }

    #[test]
    fn test_timeout_detail_names_operation() {
        let err = SessionError::Timeout {
            operation: Operation::Lock,
            timeout: Duration::from_secs(5),
        };
        assert!(err.is_timeout());
        assert_eq!(err.detail(), "lock timed out after 5s");
    }
}
