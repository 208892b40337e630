//! Small helpers for rendering XML text

use std::borrow::Cow;

/// Escape text for use in element content or attribute values
pub(crate) fn text(value: &str) -> Cow<'_, str> {
    quick_xml::escape::escape(value)
}

/// Restrict a string to characters valid in an element name
pub(crate) fn element_name(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_escaping() {
        assert_eq!(text("a<b & \"c\""), "a&lt;b &amp; &quot;c&quot;");
        assert_eq!(text("plain"), "plain");
    }

    #[test]
    fn test_element_name_filtering() {
        assert_eq!(element_name("Gigabit Ethernet<"), "GigabitEthernet");
    }
}
