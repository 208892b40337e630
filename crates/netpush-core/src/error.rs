//! Core error types for netpush-core

use thiserror::Error;

use crate::state::TransactionState;

/// Errors that can occur in core actor operations
#[derive(Error, Debug, Clone)]
pub enum CoreError {
    /// Invalid state transition attempted
    #[error("invalid state transition from {from} to {to}")]
    InvalidTransition {
        /// Current state
        from: TransactionState,
        /// Attempted target state
        to: TransactionState,
    },

    /// Actor communication error
    #[error("actor communication error: {0}")]
    ActorError(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    ConfigError(String),
}
