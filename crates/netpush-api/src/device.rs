//! Device, interface selection and configuration document types

use std::fmt;

use serde::{Deserialize, Serialize};

/// A switch resolved from the controller inventory
///
/// Immutable once resolved. Identity is `id`; `hostname` is used for
/// reporting and for matching against the seed list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    /// Controller-assigned device identifier
    pub id: String,
    /// Device hostname
    pub hostname: String,
    /// Address used to open the management session
    pub management_address: String,
    /// Platform identifier (e.g. `C9300-48P`)
    pub platform: String,
}

impl DeviceDescriptor {
    /// Create a new descriptor
    pub fn new(
        id: impl Into<String>,
        hostname: impl Into<String>,
        management_address: impl Into<String>,
        platform: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            hostname: hostname.into(),
            management_address: management_address.into(),
            platform: platform.into(),
        }
    }
}

impl fmt::Display for DeviceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.hostname, self.management_address)
    }
}

/// Ordered interface names selected for one device
///
/// An empty selection is valid and yields a document with no interface
/// stanzas.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceSelection {
    /// Device the selection belongs to
    pub device_id: String,
    /// Interface names in selection order
    pub interfaces: Vec<String>,
}

impl InterfaceSelection {
    /// Create a selection for a device
    pub fn new(device_id: impl Into<String>, interfaces: Vec<String>) -> Self {
        Self {
            device_id: device_id.into(),
            interfaces,
        }
    }

    /// Create an empty selection for a device
    pub fn empty(device_id: impl Into<String>) -> Self {
        Self::new(device_id, Vec::new())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.interfaces.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.interfaces.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.interfaces.iter().map(String::as_str)
    }
}

/// Opaque configuration payload applied verbatim by a session
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigDocument(String);

impl ConfigDocument {
    /// Wrap rendered document text
    pub fn new(body: impl Into<String>) -> Self {
        Self(body.into())
    }

    /// Document text
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Document size in bytes
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consume into the inner text
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl AsRef<str> for ConfigDocument {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
