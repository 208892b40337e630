//! Template data types

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which standard configuration to push
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TemplateKind {
    /// ACL, vty hardening and NTP servers
    Baseline,
    /// Port-security and 802.1X on selected access ports
    PortSecurity,
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateKind::Baseline => f.write_str("baseline"),
            TemplateKind::PortSecurity => f.write_str("port-security"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown template: {0} (expected baseline or port-security)")]
pub struct UnknownTemplate(pub String);

impl FromStr for TemplateKind {
    type Err = UnknownTemplate;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "baseline" => Ok(TemplateKind::Baseline),
            "port-security" | "port_security" => Ok(TemplateKind::PortSecurity),
            other => Err(UnknownTemplate(other.to_string())),
        }
    }
}

/// One standard ACL permit rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclEntry {
    /// Sequence number
    pub sequence: u32,
    /// Permitted host prefix
    pub prefix: String,
    /// Optional remark
    #[serde(default)]
    pub remark: Option<String>,
}

impl AclEntry {
    pub fn new(sequence: u32, prefix: impl Into<String>, remark: Option<&str>) -> Self {
        Self {
            sequence,
            prefix: prefix.into(),
            remark: remark.map(str::to_string),
        }
    }
}

/// A vty line range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VtyRange {
    pub first: u32,
    pub last: u32,
}

/// Baseline hardening contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaselineProfile {
    /// Standard ACL name
    pub acl_name: String,
    /// ACL rules in order
    pub acl_entries: Vec<AclEntry>,
    /// vty line ranges to replace
    pub vty_ranges: Vec<VtyRange>,
    /// Terminal length on vty lines
    pub exec_length: u32,
    /// vty session timeout in minutes
    pub session_timeout_minutes: u32,
    /// Allowed inbound transport
    pub transport_input: String,
    /// NTP servers
    pub ntp_servers: Vec<String>,
}

impl Default for BaselineProfile {
    fn default() -> Self {
        Self {
            acl_name: "21".to_string(),
            acl_entries: vec![
                AclEntry::new(10, "10.18.87.89", Some("CISCO_Collector")),
                AclEntry::new(20, "10.20.16.41", Some("DNA Center")),
                AclEntry::new(30, "10.20.16.42", None),
                AclEntry::new(40, "10.20.16.43", None),
                AclEntry::new(50, "10.0.0.130", Some("Nagios")),
                AclEntry::new(60, "10.0.32.155", Some("Cisco_ISE")),
                AclEntry::new(70, "10.0.32.156", None),
                AclEntry::new(80, "10.100.185.30", Some("Consola ART")),
                AclEntry::new(90, "10.1.213.39", Some("Area de Monitoreo")),
                AclEntry::new(100, "10.1.213.41", None),
                AclEntry::new(110, "10.1.213.54", None),
                AclEntry::new(120, "10.1.213.56", None),
                AclEntry::new(130, "10.1.213.57", None),
            ],
            vty_ranges: vec![VtyRange { first: 0, last: 4 }, VtyRange { first: 5, last: 15 }],
            exec_length: 0,
            session_timeout_minutes: 5,
            transport_input: "ssh".to_string(),
            ntp_servers: vec![
                "10.150.0.68".to_string(),
                "10.18.87.31".to_string(),
                "10.0.15.9".to_string(),
                "10.0.15.13".to_string(),
            ],
        }
    }
}

/// Port-security / 802.1X access port contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortSecurityProfile {
    /// Maximum secure MAC addresses per port
    pub max_mac_addresses: u32,
    /// dot1x EAP tx-period in seconds
    pub dot1x_tx_period: u32,
    /// Device class trusted on the port
    pub trust_device: String,
    /// Input QoS service policy
    pub input_policy: String,
    /// Output QoS service policy
    pub output_policy: String,
    /// Subscriber control policy
    pub subscriber_policy: String,
}

impl Default for PortSecurityProfile {
    fn default() -> Self {
        Self {
            max_mac_addresses: 3,
            dot1x_tx_period: 5,
            trust_device: "cisco-phone".to_string(),
            input_policy: "AutoQos-4.0-CiscoPhone-Input-Policy".to_string(),
            output_policy: "AutoQos-4.0-Output-Policy".to_string(),
            subscriber_policy: "DOT1X-MAB".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_kind_parsing() {
        assert_eq!("baseline".parse::<TemplateKind>(), Ok(TemplateKind::Baseline));
        assert_eq!(
            "Port-Security".parse::<TemplateKind>(),
            Ok(TemplateKind::PortSecurity)
        );
        assert!("nat".parse::<TemplateKind>().is_err());
    }

    #[test]
    fn test_partial_profile_keeps_defaults() {
        let profile: BaselineProfile = toml::from_str(
            r#"
ntp_servers = ["192.0.2.1"]
"#,
        )
        .unwrap();
        assert_eq!(profile.ntp_servers, vec!["192.0.2.1"]);
        assert_eq!(profile.acl_name, "21");
        assert_eq!(profile.acl_entries.len(), 13);
    }

    #[test]
    fn test_acl_entry_from_toml() {
        let entry: AclEntry = toml::from_str("sequence = 10\nprefix = \"192.0.2.10\"").unwrap();
        assert_eq!(entry.remark, None);
    }
}
