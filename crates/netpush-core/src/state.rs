//! Transaction state machine types

use std::fmt;

use netpush_api::OutcomeStatus;

/// Why a transaction ended without applying its document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    ConnectFailed,
    LockUnavailable,
    ApplyFailed,
}

impl FailureKind {
    #[must_use]
    pub fn status(self) -> OutcomeStatus {
        match self {
            FailureKind::ConnectFailed => OutcomeStatus::ConnectFailed,
            FailureKind::LockUnavailable => OutcomeStatus::LockUnavailable,
            FailureKind::ApplyFailed => OutcomeStatus::ApplyFailed,
        }
    }
}

/// States of a `DeviceActor` transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    Start,
    Connected,
    Locked,
    Applied,
    Unlocked,
    Done,
    Failed(FailureKind),
}

impl TransactionState {
    /// Check if a transition to `next` is allowed
    #[must_use]
    pub fn can_transition_to(self, next: TransactionState) -> bool {
        use FailureKind::{ApplyFailed, ConnectFailed, LockUnavailable};
        use TransactionState::{Applied, Connected, Done, Failed, Locked, Start, Unlocked};

        matches!(
            (self, next),
            (Start, Connected | Failed(ConnectFailed))
                | (Connected, Locked | Failed(LockUnavailable))
                // Locked -> Unlocked when apply failed
                | (Locked, Applied | Unlocked)
                | (Applied, Unlocked)
                | (Unlocked, Done | Failed(ApplyFailed))
        )
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, TransactionState::Done | TransactionState::Failed(_))
    }

    /// Outcome status for a terminal state
    #[must_use]
    pub fn outcome_status(self) -> Option<OutcomeStatus> {
        match self {
            TransactionState::Done => Some(OutcomeStatus::Success),
            TransactionState::Failed(kind) => Some(kind.status()),
            _ => None,
        }
    }
}

impl fmt::Display for TransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionState::Start => write!(f, "start"),
            TransactionState::Connected => write!(f, "connected"),
            TransactionState::Locked => write!(f, "locked"),
            TransactionState::Applied => write!(f, "applied"),
            TransactionState::Unlocked => write!(f, "unlocked"),
            TransactionState::Done => write!(f, "done"),
            TransactionState::Failed(FailureKind::ConnectFailed) => write!(f, "failed(connect)"),
            TransactionState::Failed(FailureKind::LockUnavailable) => write!(f, "failed(lock)"),
            TransactionState::Failed(FailureKind::ApplyFailed) => write!(f, "failed(apply)"),
        }
    }
}
