//! Message types for actor communication
//!
//! Message handlers are implemented in their respective actor modules.

use chrono::{DateTime, Utc};
use kameo_macros::Reply;
use netpush_api::{DeviceDescriptor, Outcome};

use crate::state::TransactionState;

// ============================================================================
// DeviceActor Messages
// ============================================================================

/// Run the configuration transaction once
#[derive(Debug)]
pub struct RunTransaction;

/// Transaction result
#[derive(Debug, Clone, Reply)]
pub struct TransactionResult {
    pub outcome: Outcome,
    /// Terminal state the transaction ended in
    pub final_state: TransactionState,
    /// Lock attempts made, zero if never connected
    pub lock_attempts: u32,
    /// Unlock failure text; never affects the outcome
    pub unlock_warning: Option<String>,
}

// ============================================================================
// FleetActor Messages
// ============================================================================

/// Run transactions for every device, in order
#[derive(Debug)]
pub struct RunFleet {
    pub devices: Vec<DeviceDescriptor>,
}

/// Fleet run report
#[derive(Debug, Clone, Reply)]
pub struct FleetReport {
    /// One outcome per input device, in input order
    pub outcomes: Vec<Outcome>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl FleetReport {
    #[must_use]
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status.is_success())
            .count()
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.total() - self.succeeded()
    }
}
