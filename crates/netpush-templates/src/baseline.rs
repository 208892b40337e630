//! Baseline hardening template: standard ACL, vty lines, NTP servers

use std::fmt::{self, Write};

use netpush_api::{ConfigDocument, DeviceDescriptor, InterfaceSelection};
use tracing::debug;

use crate::traits::PayloadBuilder;
use crate::types::{BaselineProfile, TemplateKind};
use crate::xml;

const NATIVE_NS: &str = "http://cisco.com/ns/yang/Cisco-IOS-XE-native";
const ACL_NS: &str = "http://cisco.com/ns/yang/Cisco-IOS-XE-acl";
const NTP_NS: &str = "http://cisco.com/ns/yang/Cisco-IOS-XE-ntp";
const NC_NS: &str = "urn:ietf:params:xml:ns:netconf:base:1.0";

/// Renders the same hardening document for every device
#[derive(Debug, Clone, Default)]
pub struct BaselineTemplate {
    profile: BaselineProfile,
}

impl BaselineTemplate {
    pub fn new(profile: BaselineProfile) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> &BaselineProfile {
        &self.profile
    }

    fn render_acl(&self, out: &mut String) -> fmt::Result {
        let p = &self.profile;
        if p.acl_entries.is_empty() {
            return Ok(());
        }

        out.push_str("    <ip>\n      <access-list>\n");
        writeln!(out, "        <standard xmlns=\"{ACL_NS}\">")?;
        writeln!(out, "          <name>{}</name>", xml::text(&p.acl_name))?;
        for entry in &p.acl_entries {
            out.push_str("          <access-list-seq-rule>\n");
            writeln!(out, "            <sequence>{}</sequence>", entry.sequence)?;
            writeln!(
                out,
                "            <permit><std-ace><ipv4-prefix>{}</ipv4-prefix></std-ace></permit>",
                xml::text(&entry.prefix)
            )?;
            if let Some(remark) = &entry.remark {
                writeln!(out, "            <remark>{}</remark>", xml::text(remark))?;
            }
            out.push_str("          </access-list-seq-rule>\n");
        }
        out.push_str("        </standard>\n      </access-list>\n    </ip>\n");
        Ok(())
    }

    fn render_vty(&self, out: &mut String) -> fmt::Result {
        let p = &self.profile;
        if p.vty_ranges.is_empty() {
            return Ok(());
        }

        out.push_str("    <line>\n");
        for range in &p.vty_ranges {
            writeln!(out, "      <vty xmlns:nc=\"{NC_NS}\" nc:operation=\"replace\">")?;
            writeln!(out, "        <first nc:operation=\"replace\">{}</first>", range.first)?;
            writeln!(out, "        <last nc:operation=\"replace\">{}</last>", range.last)?;
            writeln!(
                out,
                "        <length nc:operation=\"replace\">{}</length>",
                p.exec_length
            )?;
            out.push_str("        <logging><synchronous/></logging>\n");
            writeln!(
                out,
                "        <session-timeout nc:operation=\"replace\"><session-timeout-value>{}</session-timeout-value></session-timeout>",
                p.session_timeout_minutes
            )?;
            writeln!(
                out,
                "        <transport><input><input>{}</input></input></transport>",
                xml::text(&p.transport_input)
            )?;
            out.push_str("      </vty>\n");
        }
        out.push_str("    </line>\n");
        Ok(())
    }

    fn render_ntp(&self, out: &mut String) -> fmt::Result {
        let p = &self.profile;
        if p.ntp_servers.is_empty() {
            return Ok(());
        }

        out.push_str("    <ntp>\n");
        writeln!(out, "      <server xmlns=\"{NTP_NS}\">")?;
        for server in &p.ntp_servers {
            writeln!(
                out,
                "        <server-list xmlns:nc=\"{NC_NS}\" nc:operation=\"replace\"><ip-address>{}</ip-address></server-list>",
                xml::text(server)
            )?;
        }
        out.push_str("      </server>\n    </ntp>\n");
        Ok(())
    }

    fn render(&self, out: &mut String) -> fmt::Result {
        out.push_str("<config>\n");
        writeln!(out, "  <native xmlns=\"{NATIVE_NS}\">")?;
        self.render_acl(out)?;
        self.render_vty(out)?;
        self.render_ntp(out)?;
        out.push_str("  </native>\n</config>\n");
        Ok(())
    }
}

impl PayloadBuilder for BaselineTemplate {
    fn build(&self, device: &DeviceDescriptor, _interfaces: &InterfaceSelection) -> ConfigDocument {
        let mut out = String::with_capacity(4096);
        // Writing into a String cannot fail
        let _ = self.render(&mut out);

        debug!(host = %device.hostname, bytes = out.len(), "rendered baseline document");
        ConfigDocument::new(out)
    }

    fn kind(&self) -> TemplateKind {
        TemplateKind::Baseline
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AclEntry;

    fn device() -> DeviceDescriptor {
        DeviceDescriptor::new("1", "SW1", "10.0.0.1", "C9300-48P")
    }

    #[test]
    fn test_default_profile_renders_all_sections() {
        let template = BaselineTemplate::default();
        let doc = template.build(&device(), &InterfaceSelection::empty("1"));
        let body = doc.as_str();

        assert!(body.starts_with("<config>"));
        assert!(body.contains("<name>21</name>"));
        assert_eq!(body.matches("<access-list-seq-rule>").count(), 13);
        assert!(body.contains("<remark>DNA Center</remark>"));
        assert_eq!(body.matches("<vty ").count(), 2);
        assert!(body.contains("<first nc:operation=\"replace\">5</first>"));
        assert!(body.contains("<ip-address>10.0.15.13</ip-address>"));
        assert!(!template.requires_interfaces());
    }

    #[test]
    fn test_build_is_deterministic() {
        let template = BaselineTemplate::default();
        let first = template.build(&device(), &InterfaceSelection::empty("1"));
        let second = template.build(&device(), &InterfaceSelection::empty("1"));
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_sections_are_omitted() {
        let template = BaselineTemplate::new(BaselineProfile {
            acl_entries: vec![],
            vty_ranges: vec![],
            ntp_servers: vec![],
            ..BaselineProfile::default()
        });
        let doc = template.build(&device(), &InterfaceSelection::empty("1"));
        assert_eq!(
            doc.as_str(),
            format!("<config>\n  <native xmlns=\"{NATIVE_NS}\">\n  </native>\n</config>\n")
        );
    }

    #[test]
    fn test_remarks_are_escaped() {
        let template = BaselineTemplate::new(BaselineProfile {
            acl_entries: vec![AclEntry::new(10, "192.0.2.1", Some("R&D <lab>"))],
            ..BaselineProfile::default()
        });
        let doc = template.build(&device(), &InterfaceSelection::empty("1"));
        assert!(doc.as_str().contains("<remark>R&amp;D &lt;lab&gt;</remark>"));
    }
}
