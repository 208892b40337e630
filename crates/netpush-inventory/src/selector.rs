//! Access interface selection

use serde::{Deserialize, Serialize};

use crate::types::InterfaceRecord;

/// Rules deciding which interfaces receive the port template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterfaceRules {
    pub interface_type: String,
    /// Name prefix; the remainder must be a port number
    pub name_prefix: String,
    pub first_port: u32,
    pub last_port: u32,
    pub port_mode: String,
    /// Names containing any of these are never selected
    pub excluded: Vec<String>,
}

impl Default for InterfaceRules {
    fn default() -> Self {
        Self {
            interface_type: "Physical".to_string(),
            name_prefix: "GigabitEthernet1/0/".to_string(),
            first_port: 1,
            last_port: 48,
            port_mode: "access".to_string(),
            excluded: ["Loopback", "Vlan", "Bluetooth", "App"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl InterfaceRules {
    /// Whether a single record is selected
    pub fn matches(&self, record: &InterfaceRecord) -> bool {
        let name = record.port_name.as_str();

        if record.interface_type != self.interface_type {
            return false;
        }
        if self.excluded.iter().any(|s| name.contains(s.as_str())) {
            return false;
        }
        if record.port_mode.as_deref() != Some(self.port_mode.as_str()) {
            return false;
        }

        name.strip_prefix(self.name_prefix.as_str())
            .filter(|port| !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|port| port.parse::<u32>().ok())
            .is_some_and(|port| (self.first_port..=self.last_port).contains(&port))
    }
}

/// Select matching interface names, preserving controller order
pub fn select_interfaces(records: &[InterfaceRecord], rules: &InterfaceRules) -> Vec<String> {
    records
        .iter()
        .filter(|r| rules.matches(r))
        .map(|r| r.port_name.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn access(name: &str) -> InterfaceRecord {
        InterfaceRecord::new("Physical", name, Some("access"))
    }

    #[test]
    fn test_selects_access_ports_in_range() {
        let records = vec![
            access("GigabitEthernet1/0/1"),
            access("GigabitEthernet1/0/48"),
            access("GigabitEthernet1/0/49"),
            access("GigabitEthernet1/0/0"),
            access("GigabitEthernet1/1/1"),
        ];

        let selected = select_interfaces(&records, &InterfaceRules::default());
        assert_eq!(selected, vec!["GigabitEthernet1/0/1", "GigabitEthernet1/0/48"]);
    }

    #[test]
    fn test_rejects_trunk_and_missing_mode() {
        let rules = InterfaceRules::default();
        assert!(!rules.matches(&InterfaceRecord::new(
            "Physical",
            "GigabitEthernet1/0/3",
            Some("trunk")
        )));
        assert!(!rules.matches(&InterfaceRecord::new("Physical", "GigabitEthernet1/0/3", None)));
    }

    #[test]
    fn test_rejects_virtual_and_excluded_names() {
        let rules = InterfaceRules::default();
        assert!(!rules.matches(&InterfaceRecord::new("Virtual", "Vlan10", Some("access"))));
        assert!(!rules.matches(&access("AppGigabitEthernet1/0/1")));
        assert!(!rules.matches(&access("Bluetooth0/4")));
    }

    #[test]
    fn test_rejects_non_numeric_suffix() {
        let rules = InterfaceRules::default();
        assert!(!rules.matches(&access("GigabitEthernet1/0/1.100")));
        assert!(!rules.matches(&access("GigabitEthernet1/0/")));
        assert!(!rules.matches(&access("GigabitEthernet1/0/+5")));
    }

    #[test]
    fn test_preserves_order() {
        let records = vec![
            access("GigabitEthernet1/0/10"),
            access("GigabitEthernet1/0/2"),
        ];
        let selected = select_interfaces(&records, &InterfaceRules::default());
        assert_eq!(selected, vec!["GigabitEthernet1/0/10", "GigabitEthernet1/0/2"]);
    }

    #[test]
    fn test_custom_range() {
        let rules = InterfaceRules {
            name_prefix: "TenGigabitEthernet1/0/".to_string(),
            last_port: 24,
            ..InterfaceRules::default()
        };
        assert!(rules.matches(&access("TenGigabitEthernet1/0/24")));
        assert!(!rules.matches(&access("TenGigabitEthernet1/0/25")));
    }
}
