//! Payload builder trait

use netpush_api::{ConfigDocument, DeviceDescriptor, InterfaceSelection};

use crate::types::TemplateKind;

/// Renders the configuration document for one device
///
/// Rendering is pure: the same inputs always produce the same document, and
/// every input shape (including an empty selection) yields a well-formed
/// document.
pub trait PayloadBuilder: Send + Sync {
    fn build(&self, device: &DeviceDescriptor, interfaces: &InterfaceSelection) -> ConfigDocument;

    /// Whether the fleet runner must resolve interfaces before building
    fn requires_interfaces(&self) -> bool {
        false
    }

    fn kind(&self) -> TemplateKind;
}
