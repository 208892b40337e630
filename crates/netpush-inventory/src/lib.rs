//! netpush-inventory: Device inventory resolution
//!
//! Loads the seed hostname list, resolves descriptors from the controller
//! API and selects the access interfaces a port template is rendered for.

pub mod client;
pub mod error;
pub mod seed;
pub mod selector;
pub mod types;

pub use client::{ClientContext, ControllerClient, Endpoints};
pub use error::{InventoryError, SeedError};
pub use seed::load_seed_hostnames;
pub use selector::{InterfaceRules, select_interfaces};
pub use types::{InterfaceRecord, NetworkDeviceRecord};
