//! Process-wide connection profile for device sessions

use serde::{Deserialize, Serialize};

use crate::credentials::CredentialSource;

/// Connection settings shared by every device session in a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionProfile {
    /// Login user
    pub username: String,
    /// NETCONF port (default 830)
    #[serde(default = "default_port")]
    pub port: u16,
    /// Login secret
    pub credential: CredentialSource,
}

fn default_port() -> u16 {
    830
}

impl ConnectionProfile {
    /// Create a profile on the default NETCONF port
    pub fn new(username: impl Into<String>, credential: CredentialSource) -> Self {
        Self {
            username: username.into(),
            port: default_port(),
            credential,
        }
    }

    /// Set custom port
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }
}
