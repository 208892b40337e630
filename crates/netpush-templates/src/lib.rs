//! netpush-templates: Configuration payload builders
//!
//! Provides the `PayloadBuilder` trait and the baseline and port-security
//! templates rendering Cisco IOS-XE native YANG documents for `edit-config`.

pub mod baseline;
pub mod port_security;
pub mod traits;
pub mod types;
mod xml;

pub use baseline::BaselineTemplate;
pub use port_security::PortSecurityTemplate;
pub use traits::PayloadBuilder;
pub use types::{AclEntry, BaselineProfile, PortSecurityProfile, TemplateKind, UnknownTemplate, VtyRange};
