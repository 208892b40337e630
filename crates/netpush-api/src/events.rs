//! Fleet progress event types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::outcome::OutcomeStatus;

/// Progress events broadcast while a fleet run is in flight
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FleetEvent {
    DeviceStateChanged {
        host: String,
        from: String,
        to: String,
    },
    LockAttemptFailed {
        host: String,
        attempt: u32,
        max_attempts: u32,
        error: String,
    },
    UnlockFailed {
        host: String,
        error: String,
    },
    DeviceCompleted {
        host: String,
        status: OutcomeStatus,
        finished_at: DateTime<Utc>,
    },
    FleetCompleted {
        total: usize,
        succeeded: usize,
        failed: usize,
    },
}

impl FleetEvent {
    /// Hostname the event refers to, if any
    #[must_use]
    pub fn host(&self) -> Option<&str> {
        match self {
            FleetEvent::DeviceStateChanged { host, .. }
            | FleetEvent::LockAttemptFailed { host, .. }
            | FleetEvent::UnlockFailed { host, .. }
            | FleetEvent::DeviceCompleted { host, .. } => Some(host),
            FleetEvent::FleetCompleted { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_is_tagged() {
        let event = FleetEvent::UnlockFailed {
            host: "SW1".to_string(),
            error: "not locked".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "UnlockFailed");
        assert_eq!(event.host(), Some("SW1"));
    }
}
