//! Port-security / 802.1X template for access ports

use std::fmt::{self, Write};

use netpush_api::{ConfigDocument, DeviceDescriptor, InterfaceSelection};
use tracing::debug;

use crate::traits::PayloadBuilder;
use crate::types::{PortSecurityProfile, TemplateKind};
use crate::xml;

const NATIVE_NS: &str = "http://cisco.com/ns/yang/Cisco-IOS-XE-native";
const SWITCH_NS: &str = "http://cisco.com/ns/yang/Cisco-IOS-XE-switch";
const CDP_NS: &str = "http://cisco.com/ns/yang/Cisco-IOS-XE-cdp";
const DOT1X_NS: &str = "http://cisco.com/ns/yang/Cisco-IOS-XE-dot1x";
const POLICY_NS: &str = "http://cisco.com/ns/yang/Cisco-IOS-XE-policy";
const SANET_NS: &str = "http://cisco.com/ns/yang/Cisco-IOS-XE-sanet";
const STP_NS: &str = "http://cisco.com/ns/yang/Cisco-IOS-XE-spanning-tree";

/// Interface type used when a name carries only its number (`1/0/12`)
const DEFAULT_INTERFACE_TYPE: &str = "GigabitEthernet";

/// Split `GigabitEthernet1/0/12` into `("GigabitEthernet", "1/0/12")`
#[must_use]
pub fn split_interface_name(name: &str) -> (&str, &str) {
    let name = name.trim();
    match name.find(|c: char| c.is_ascii_digit()) {
        Some(0) | None => (DEFAULT_INTERFACE_TYPE, name),
        Some(idx) => (&name[..idx], &name[idx..]),
    }
}

/// Renders one access-port stanza per selected interface
#[derive(Debug, Clone, Default)]
pub struct PortSecurityTemplate {
    profile: PortSecurityProfile,
}

impl PortSecurityTemplate {
    pub fn new(profile: PortSecurityProfile) -> Self {
        Self { profile }
    }

    fn render_interface(&self, out: &mut String, interface: &str) -> fmt::Result {
        let p = &self.profile;
        let (kind, number) = split_interface_name(interface);
        let kind = xml::element_name(kind);
        let max = p.max_mac_addresses;

        out.push_str("    <interface>\n");
        writeln!(out, "      <{kind}>")?;
        writeln!(out, "        <name>{}</name>", xml::text(number))?;
        out.push_str("        <switchport>\n");
        writeln!(out, "          <mode xmlns=\"{SWITCH_NS}\"><access/></mode>")?;
        writeln!(out, "          <nonegotiate xmlns=\"{SWITCH_NS}\"/>")?;
        writeln!(out, "          <port-security-cfg xmlns=\"{SWITCH_NS}\"/>")?;
        writeln!(
            out,
            "          <port-security-conf xmlns=\"{SWITCH_NS}\"><port-security><maximum><max-addresses>{max}</max-addresses></maximum></port-security></port-security-conf>"
        )?;
        writeln!(
            out,
            "          <port-security xmlns=\"{SWITCH_NS}\"><maximum><max-addresses>{max}</max-addresses></maximum></port-security>"
        )?;
        out.push_str("        </switchport>\n");
        out.push_str("        <logging><event><link-status/></event></logging>\n");
        out.push_str("        <access-session>\n");
        out.push_str("          <closed/>\n");
        out.push_str("          <port-control-config>auto</port-control-config>\n");
        out.push_str("          <port-control><auto/></port-control>\n");
        out.push_str("          <control-direction-config>in</control-direction-config>\n");
        out.push_str("          <control-direction><in/></control-direction>\n");
        out.push_str("        </access-session>\n");
        writeln!(
            out,
            "        <trust><device>{}</device></trust>",
            xml::text(&p.trust_device)
        )?;
        writeln!(
            out,
            "        <cdp xmlns=\"{CDP_NS}\"><tlv><app/><server-location/><location/></tlv></cdp>"
        )?;
        writeln!(
            out,
            "        <dot1x xmlns=\"{DOT1X_NS}\"><pae>authenticator</pae><timeout><tx-period>{}</tx-period></timeout></dot1x>",
            p.dot1x_tx_period
        )?;
        writeln!(out, "        <service-policy xmlns=\"{POLICY_NS}\">")?;
        writeln!(out, "          <input>{}</input>", xml::text(&p.input_policy))?;
        writeln!(out, "          <output>{}</output>", xml::text(&p.output_policy))?;
        writeln!(
            out,
            "          <type><control><subscriber>{}</subscriber></control></type>",
            xml::text(&p.subscriber_policy)
        )?;
        out.push_str("        </service-policy>\n");
        writeln!(
            out,
            "        <authentication xmlns=\"{SANET_NS}\"><periodic/></authentication>"
        )?;
        writeln!(out, "        <mab xmlns=\"{SANET_NS}\"/>")?;
        writeln!(
            out,
            "        <spanning-tree xmlns=\"{STP_NS}\"><portfast/></spanning-tree>"
        )?;
        writeln!(
            out,
            "        <auto xmlns=\"{SWITCH_NS}\"><qos><voip><cisco-phone/></voip></qos></auto>"
        )?;
        writeln!(out, "        <device-tracking xmlns=\"{SWITCH_NS}\"/>")?;
        writeln!(out, "      </{kind}>")?;
        out.push_str("    </interface>\n");
        Ok(())
    }

    fn render(&self, out: &mut String, interfaces: &InterfaceSelection) -> fmt::Result {
        out.push_str("<config>\n");
        writeln!(out, "  <native xmlns=\"{NATIVE_NS}\">")?;
        for interface in interfaces.iter() {
            self.render_interface(out, interface)?;
        }
        out.push_str("  </native>\n</config>\n");
        Ok(())
    }
}

impl PayloadBuilder for PortSecurityTemplate {
    fn build(&self, device: &DeviceDescriptor, interfaces: &InterfaceSelection) -> ConfigDocument {
        let mut out = String::with_capacity(256 + interfaces.len() * 2048);
        let _ = self.render(&mut out, interfaces);

        debug!(
            host = %device.hostname,
            interfaces = interfaces.len(),
            bytes = out.len(),
            "rendered port-security document"
        );
        ConfigDocument::new(out)
    }

    fn requires_interfaces(&self) -> bool {
        true
    }

    fn kind(&self) -> TemplateKind {
        TemplateKind::PortSecurity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device() -> DeviceDescriptor {
        DeviceDescriptor::new("7", "SW7", "10.0.0.7", "C9200L-48P")
    }

    fn selection(names: &[&str]) -> InterfaceSelection {
        InterfaceSelection::new("7", names.iter().map(|n| (*n).to_string()).collect())
    }

    #[test]
    fn test_split_interface_name() {
        assert_eq!(
            split_interface_name("GigabitEthernet1/0/12"),
            ("GigabitEthernet", "1/0/12")
        );
        assert_eq!(
            split_interface_name("TenGigabitEthernet1/1/1"),
            ("TenGigabitEthernet", "1/1/1")
        );
        assert_eq!(split_interface_name("1/0/3"), ("GigabitEthernet", "1/0/3"));
    }

    #[test]
    fn test_one_stanza_per_interface() {
        let template = PortSecurityTemplate::default();
        let doc = template.build(
            &device(),
            &selection(&["GigabitEthernet1/0/1", "GigabitEthernet1/0/2"]),
        );
        let body = doc.as_str();

        assert_eq!(body.matches("<interface>").count(), 2);
        assert!(body.contains("<GigabitEthernet>\n        <name>1/0/1</name>"));
        assert!(body.contains("<name>1/0/2</name>"));
        assert!(body.contains("<max-addresses>3</max-addresses>"));
        assert!(body.contains("<subscriber>DOT1X-MAB</subscriber>"));
        assert!(body.contains("<tx-period>5</tx-period>"));
        assert!(template.requires_interfaces());
    }

    #[test]
    fn test_empty_selection_is_well_formed() {
        let template = PortSecurityTemplate::default();
        let doc = template.build(&device(), &InterfaceSelection::empty("7"));

        assert_eq!(
            doc.as_str(),
            format!("<config>\n  <native xmlns=\"{NATIVE_NS}\">\n  </native>\n</config>\n")
        );
    }

    #[test]
    fn test_build_is_deterministic() {
        let template = PortSecurityTemplate::new(PortSecurityProfile {
            max_mac_addresses: 2,
            ..PortSecurityProfile::default()
        });
        let ports = selection(&["GigabitEthernet1/0/5"]);
        let first = template.build(&device(), &ports);
        let second = template.build(&device(), &ports);

        assert_eq!(first.as_str().as_bytes(), second.as_str().as_bytes());
        assert!(first.as_str().contains("<max-addresses>2</max-addresses>"));
    }
}
