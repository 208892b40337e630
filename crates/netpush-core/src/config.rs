//! Configuration types for transactions and fleet runs

use std::time::Duration;

use netpush_exec::Operation;
use tokio::time::Instant;

use crate::error::CoreError;

/// How hard to try for the running-datastore lock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockRetryPolicy {
    /// Total lock attempts, including the first
    pub max_attempts: u32,
    /// Wait between consecutive attempts
    pub delay: Duration,
}

impl Default for LockRetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 6,
            delay: Duration::from_secs(30),
        }
    }
}

/// Fleet run configuration
#[derive(Debug, Clone)]
pub struct FleetRunConfig {
    /// Devices processed at the same time
    pub concurrency: usize,
    pub lock_retry: LockRetryPolicy,
    /// Upper bound for each session primitive
    pub call_timeout: Option<Duration>,
    /// Wall-clock budget for the whole run
    pub run_deadline: Option<Duration>,
}

impl Default for FleetRunConfig {
    fn default() -> Self {
        Self {
            concurrency: 1,
            lock_retry: LockRetryPolicy::default(),
            call_timeout: None,
            run_deadline: None,
        }
    }
}

impl FleetRunConfig {
    /// Reject settings that cannot drive a run
    ///
    /// # Errors
    /// Returns `CoreError::ConfigError` for zero concurrency or zero lock
    /// attempts.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.concurrency == 0 {
            return Err(CoreError::ConfigError(
                "concurrency must be at least 1".to_string(),
            ));
        }
        if self.lock_retry.max_attempts == 0 {
            return Err(CoreError::ConfigError(
                "lock retry max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Per-transaction policy for a run starting now
    #[must_use]
    pub fn policy_from_now(&self) -> TransactionPolicy {
        TransactionPolicy {
            lock_retry: self.lock_retry,
            call_timeout: self.call_timeout,
            deadline: self.run_deadline.map(|d| Instant::now() + d),
        }
    }
}

/// Timing rules handed to each `DeviceActor`
#[derive(Debug, Clone, Copy, Default)]
pub struct TransactionPolicy {
    pub lock_retry: LockRetryPolicy,
    pub call_timeout: Option<Duration>,
    /// Absolute run deadline
    pub deadline: Option<Instant>,
}

impl TransactionPolicy {
    /// Time left before the run deadline, `None` when there is no deadline
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    #[must_use]
    pub fn expired(&self) -> bool {
        self.remaining().is_some_and(|r| r.is_zero())
    }

    /// Time limit for one primitive
    ///
    /// Open, lock and apply are clipped to the run deadline. Unlock and
    /// close only honour the call timeout.
    #[must_use]
    pub fn budget(&self, operation: Operation) -> Option<Duration> {
        let clipped = matches!(
            operation,
            Operation::Open | Operation::Lock | Operation::Apply
        );
        let remaining = if clipped { self.remaining() } else { None };

        match (self.call_timeout, remaining) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }
}
