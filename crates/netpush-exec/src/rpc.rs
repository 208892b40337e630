//! NETCONF RPC rendering and reply parsing

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use thiserror::Error;

/// NETCONF base namespace
pub const BASE_NS: &str = "urn:ietf:params:xml:ns:netconf:base:1.0";
/// base:1.0 capability URN
pub const CAP_BASE_10: &str = "urn:ietf:params:netconf:base:1.0";
/// base:1.1 capability URN
pub const CAP_BASE_11: &str = "urn:ietf:params:netconf:base:1.1";

const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// Errors raised while parsing device messages
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RpcParseError {
    #[error("malformed XML: {0}")]
    Xml(String),

    #[error("unexpected root element: {0}")]
    UnexpectedRoot(String),

    #[error("empty message")]
    Empty,
}

/// Client hello advertising base:1.0 and base:1.1
#[must_use]
pub fn client_hello() -> String {
    format!(
        "{XML_DECL}<hello xmlns=\"{BASE_NS}\"><capabilities>\
         <capability>{CAP_BASE_10}</capability>\
         <capability>{CAP_BASE_11}</capability>\
         </capabilities></hello>"
    )
}

/// Wrap an operation body in an `<rpc>` envelope
#[must_use]
pub fn render_rpc(message_id: u64, operation: &str) -> String {
    format!("{XML_DECL}<rpc message-id=\"{message_id}\" xmlns=\"{BASE_NS}\">{operation}</rpc>")
}

#[must_use]
pub fn lock_running() -> String {
    "<lock><target><running/></target></lock>".to_string()
}

#[must_use]
pub fn unlock_running() -> String {
    "<unlock><target><running/></target></unlock>".to_string()
}

/// `edit-config` against running; `config` must carry its own `<config>` root
#[must_use]
pub fn edit_config_running(config: &str) -> String {
    format!(
        "<edit-config><target><running/></target>{}</edit-config>",
        config.trim()
    )
}

#[must_use]
pub fn close_session() -> String {
    "<close-session/>".to_string()
}

/// Parsed server hello
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerHello {
    /// Server-assigned session id
    pub session_id: Option<String>,
    /// Advertised capability URNs
    pub capabilities: Vec<String>,
}

impl ServerHello {
    /// Whether the server supports chunked framing
    #[must_use]
    pub fn supports_base_11(&self) -> bool {
        self.capabilities.iter().any(|c| c == CAP_BASE_11)
    }
}

/// One `<rpc-error>` entry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RpcError {
    pub error_type: Option<String>,
    pub tag: Option<String>,
    pub severity: Option<String>,
    pub message: Option<String>,
}

impl RpcError {
    /// Warnings do not fail the operation
    #[must_use]
    pub fn is_warning(&self) -> bool {
        self.severity.as_deref() == Some("warning")
    }

    /// Best human-readable text for this error
    #[must_use]
    pub fn summary(&self) -> String {
        self.message
            .clone()
            .or_else(|| self.tag.clone())
            .unwrap_or_else(|| "unspecified rpc-error".to_string())
    }
}

/// Parsed `<rpc-reply>`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RpcReply {
    pub message_id: Option<String>,
    pub ok: bool,
    pub errors: Vec<RpcError>,
}

impl RpcReply {
    /// First error with `error` severity, if any
    #[must_use]
    pub fn failure(&self) -> Option<&RpcError> {
        self.errors.iter().find(|e| !e.is_warning())
    }

    /// Whether the reply answers the given request id
    ///
    /// Replies without a `message-id` are accepted.
    #[must_use]
    pub fn answers(&self, message_id: u64) -> bool {
        self.message_id
            .as_deref()
            .is_none_or(|id| id == message_id.to_string())
    }
}

fn local_name(start: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(start.local_name().as_ref()).into_owned()
}

fn attribute(start: &BytesStart<'_>, name: &str) -> Result<Option<String>, RpcParseError> {
    let attr = start
        .try_get_attribute(name)
        .map_err(|e| RpcParseError::Xml(e.to_string()))?;
    attr.map(|a| {
        a.unescape_value()
            .map(|v| v.into_owned())
            .map_err(|e| RpcParseError::Xml(e.to_string()))
    })
    .transpose()
}

/// Parse a server `<hello>`
///
/// # Errors
/// Returns `RpcParseError` if the message is not well-formed or the root is
/// not `hello`.
pub fn parse_hello(xml: &str) -> Result<ServerHello, RpcParseError> {
    let mut reader = Reader::from_str(xml);
    let mut hello = ServerHello::default();
    let mut path: Vec<String> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = local_name(&e);
                if path.is_empty() && name != "hello" {
                    return Err(RpcParseError::UnexpectedRoot(name));
                }
                path.push(name);
            }
            Ok(Event::Empty(e)) => {
                let name = local_name(&e);
                if path.is_empty() {
                    return Err(RpcParseError::UnexpectedRoot(name));
                }
            }
            Ok(Event::Text(t)) => {
                let text = t.unescape().map_err(|e| RpcParseError::Xml(e.to_string()))?;
                let text = text.trim();
                if text.is_empty() {
                    continue;
                }
                match path.last().map(String::as_str) {
                    Some("capability") => hello.capabilities.push(text.to_string()),
                    Some("session-id") => hello.session_id = Some(text.to_string()),
                    _ => {}
                }
            }
            Ok(Event::End(_)) => {
                path.pop();
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(RpcParseError::Xml(e.to_string())),
        }
    }

    if hello.capabilities.is_empty() && hello.session_id.is_none() {
        return Err(RpcParseError::Empty);
    }

    Ok(hello)
}

/// Parse an `<rpc-reply>`
///
/// # Errors
/// Returns `RpcParseError` if the message is not well-formed or the root is
/// not `rpc-reply`.
pub fn parse_reply(xml: &str) -> Result<RpcReply, RpcParseError> {
    let mut reader = Reader::from_str(xml);
    let mut reply = RpcReply::default();
    let mut path: Vec<String> = Vec::new();
    let mut current: Option<RpcError> = None;
    let mut seen_root = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = local_name(&e);
                if path.is_empty() {
                    if name != "rpc-reply" {
                        return Err(RpcParseError::UnexpectedRoot(name));
                    }
                    seen_root = true;
                    reply.message_id = attribute(&e, "message-id")?;
                } else if name == "rpc-error" {
                    current = Some(RpcError::default());
                }
                path.push(name);
            }
            Ok(Event::Empty(e)) => {
                let name = local_name(&e);
                if path.is_empty() {
                    if name != "rpc-reply" {
                        return Err(RpcParseError::UnexpectedRoot(name));
                    }
                    seen_root = true;
                    reply.message_id = attribute(&e, "message-id")?;
                } else if name == "ok" && path.len() == 1 {
                    reply.ok = true;
                }
            }
            Ok(Event::Text(t)) => {
                let text = t.unescape().map_err(|e| RpcParseError::Xml(e.to_string()))?;
                let text = text.trim();
                if text.is_empty() {
                    continue;
                }
                if let Some(error) = current.as_mut() {
                    let value = Some(text.to_string());
                    match path.last().map(String::as_str) {
                        Some("error-type") => error.error_type = value,
                        Some("error-tag") => error.tag = value,
                        Some("error-severity") => error.severity = value,
                        Some("error-message") => error.message = value,
                        _ => {}
                    }
                }
            }
            Ok(Event::End(_)) => {
                if path.pop().as_deref() == Some("rpc-error")
                    && let Some(error) = current.take()
                {
                    reply.errors.push(error);
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(RpcParseError::Xml(e.to_string())),
        }
    }

    if !seen_root {
        return Err(RpcParseError::Empty);
    }

    Ok(reply)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_lock_rpc() {
        let rpc = render_rpc(7, &lock_running());
        assert!(rpc.contains("message-id=\"7\""));
        assert!(rpc.contains("<lock><target><running/></target></lock>"));
        assert!(rpc.ends_with("</rpc>"));
    }

    #[test]
    fn test_edit_config_trims_document() {
        let op = edit_config_running("\n   <config><native/></config>\n  ");
        assert_eq!(
            op,
            "<edit-config><target><running/></target><config><native/></config></edit-config>"
        );
    }

    #[test]
    fn test_parse_server_hello() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<hello xmlns="urn:ietf:params:xml:ns:netconf:base:1.0">
  <capabilities>
    <capability>urn:ietf:params:netconf:base:1.0</capability>
    <capability>urn:ietf:params:netconf:base:1.1</capability>
    <capability>urn:ietf:params:netconf:capability:writable-running:1.0</capability>
  </capabilities>
  <session-id>2417</session-id>
</hello>"#;

        let hello = parse_hello(xml).unwrap();
        assert_eq!(hello.session_id.as_deref(), Some("2417"));
        assert_eq!(hello.capabilities.len(), 3);
        assert!(hello.supports_base_11());
    }

    #[test]
    fn test_parse_ok_reply() {
        let xml = r#"<rpc-reply message-id="3" xmlns="urn:ietf:params:xml:ns:netconf:base:1.0"><ok/></rpc-reply>"#;
        let reply = parse_reply(xml).unwrap();
        assert!(reply.ok);
        assert!(reply.failure().is_none());
        assert!(reply.answers(3));
        assert!(!reply.answers(4));
    }

    #[test]
    fn test_parse_lock_denied_reply() {
        let xml = r#"<nc:rpc-reply xmlns:nc="urn:ietf:params:xml:ns:netconf:base:1.0" message-id="12">
  <nc:rpc-error>
    <nc:error-type>protocol</nc:error-type>
    <nc:error-tag>lock-denied</nc:error-tag>
    <nc:error-severity>error</nc:error-severity>
    <nc:error-info><nc:session-id>55</nc:session-id></nc:error-info>
  </nc:rpc-error>
</nc:rpc-reply>"#;

        let reply = parse_reply(xml).unwrap();
        assert!(!reply.ok);
        let failure = reply.failure().unwrap();
        assert_eq!(failure.tag.as_deref(), Some("lock-denied"));
        assert_eq!(failure.summary(), "lock-denied");
    }

    #[test]
    fn test_parse_error_message_and_warning() {
        let xml = r#"<rpc-reply message-id="5">
  <rpc-error>
    <error-severity>warning</error-severity>
    <error-message>deprecated leaf</error-message>
  </rpc-error>
  <rpc-error>
    <error-type>application</error-type>
    <error-tag>invalid-value</error-tag>
    <error-severity>error</error-severity>
    <error-message xml:lang="en">invalid syntax</error-message>
  </rpc-error>
</rpc-reply>"#;

        let reply = parse_reply(xml).unwrap();
        assert_eq!(reply.errors.len(), 2);
        assert_eq!(reply.failure().unwrap().summary(), "invalid syntax");
    }

    #[test]
    fn test_unexpected_root_rejected() {
        let xml = "<notification><eventTime>now</eventTime></notification>";
        assert_eq!(
            parse_reply(xml),
            Err(RpcParseError::UnexpectedRoot("notification".to_string()))
        );
    }
}
