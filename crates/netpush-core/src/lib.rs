//! netpush-core: Transaction orchestration and fleet runs
//!
//! Implements the `DeviceActor` (one configuration transaction against one
//! device) and the `FleetActor` (ordered, bounded runs over many devices)
//! using the kameo framework.

pub mod actor;
pub mod config;
pub mod error;
pub mod message;
pub mod state;

pub use actor::device::{DeviceActor, DeviceActorArgs};
pub use actor::fleet::{FleetActor, FleetActorArgs, InterfaceResolver};
pub use config::{FleetRunConfig, LockRetryPolicy, TransactionPolicy};
pub use error::CoreError;
pub use message::{FleetReport, RunFleet, RunTransaction, TransactionResult};
pub use state::{FailureKind, TransactionState};
