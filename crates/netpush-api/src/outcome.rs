//! Per-device terminal outcome types

use std::fmt;

use serde::{Deserialize, Serialize};

/// Terminal status of one device transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutcomeStatus {
    /// Lock, apply and release all completed
    Success,
    /// The lock was never acquired within the retry budget
    LockUnavailable,
    /// The configuration edit was rejected or errored
    ApplyFailed,
    /// The management session could not be opened
    ConnectFailed,
}

impl OutcomeStatus {
    /// Label written to the report
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            OutcomeStatus::Success => "Success",
            OutcomeStatus::LockUnavailable => "LockUnavailable",
            OutcomeStatus::ApplyFailed => "ApplyFailed",
            OutcomeStatus::ConnectFailed => "ConnectFailed",
        }
    }

    #[must_use]
    pub fn is_success(self) -> bool {
        matches!(self, OutcomeStatus::Success)
    }
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The reportable result of one device's transaction attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    /// Device hostname
    pub hostname: String,
    /// Terminal status
    pub status: OutcomeStatus,
    /// Error text, empty on success
    pub detail: String,
}

impl Outcome {
    /// Create an outcome
    pub fn new(hostname: impl Into<String>, status: OutcomeStatus, detail: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            status,
            detail: detail.into(),
        }
    }

    /// Successful outcome with empty detail
    pub fn success(hostname: impl Into<String>) -> Self {
        Self::new(hostname, OutcomeStatus::Success, String::new())
    }

    pub fn connect_failed(hostname: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(hostname, OutcomeStatus::ConnectFailed, detail)
    }

    pub fn lock_unavailable(hostname: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(hostname, OutcomeStatus::LockUnavailable, detail)
    }

    pub fn apply_failed(hostname: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(hostname, OutcomeStatus::ApplyFailed, detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_has_empty_detail() {
        let outcome = Outcome::success("SW1");
        assert_eq!(outcome.status, OutcomeStatus::Success);
        assert!(outcome.detail.is_empty());
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(OutcomeStatus::LockUnavailable.to_string(), "LockUnavailable");
        assert_eq!(OutcomeStatus::ConnectFailed.label(), "ConnectFailed");
        assert!(!OutcomeStatus::ApplyFailed.is_success());
    }
}
