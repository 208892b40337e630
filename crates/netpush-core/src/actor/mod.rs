//! Actor implementations

pub mod device;
pub mod fleet;

pub use device::{DeviceActor, DeviceActorArgs};
pub use fleet::{FleetActor, FleetActorArgs, InterfaceResolver};
