//! Controller API response types

use netpush_api::DeviceDescriptor;
use serde::{Deserialize, Serialize};

/// Token exchange response
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    #[serde(rename = "Token")]
    pub token: String,
}

/// Standard `{"response": [...]}` envelope
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    pub response: Vec<T>,
}

/// Network device record from the device API
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkDeviceRecord {
    pub id: String,
    pub hostname: String,
    pub management_ip_address: String,
    #[serde(default)]
    pub platform_id: Option<String>,
}

impl From<NetworkDeviceRecord> for DeviceDescriptor {
    fn from(record: NetworkDeviceRecord) -> Self {
        DeviceDescriptor::new(
            record.id,
            record.hostname,
            record.management_ip_address,
            record.platform_id.unwrap_or_default(),
        )
    }
}

/// Interface record from the interface API
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceRecord {
    pub interface_type: String,
    pub port_name: String,
    #[serde(default)]
    pub port_mode: Option<String>,
}

impl InterfaceRecord {
    pub fn new(interface_type: &str, port_name: &str, port_mode: Option<&str>) -> Self {
        Self {
            interface_type: interface_type.to_string(),
            port_name: port_name.to_string(),
            port_mode: port_mode.map(str::to_string),
        }
    }
}
