//! netpush-api: Shared data model
//!
//! Contains the device, payload, outcome and event types exchanged between
//! the inventory, session, template and orchestration crates.

pub mod device;
pub mod events;
pub mod outcome;

pub use device::{ConfigDocument, DeviceDescriptor, InterfaceSelection};
pub use events::FleetEvent;
pub use outcome::{Outcome, OutcomeStatus};
