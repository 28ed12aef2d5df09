//! Message header handling.

use crate::encoding::decode_header_value;
use std::collections::HashMap;

/// Collection of message headers, keyed case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct Headers {
    headers: HashMap<String, Vec<String>>,
}

impl Headers {
    /// Creates a new empty header collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a header value.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into().to_lowercase();
        self.headers.entry(name).or_default().push(value.into());
    }

    /// Gets the first raw value for a header.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_lowercase())
            .and_then(|v| v.first().map(String::as_str))
    }

    /// Gets the first value for a header with encoded words decoded.
    #[must_use]
    pub fn get_decoded(&self, name: &str) -> Option<String> {
        self.get(name).map(decode_header_value)
    }

    /// Returns true when no headers were parsed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Parses a header block.
    ///
    /// Parsing stops at the first empty line. Folded continuation lines are
    /// joined with a single space; lines without a colon are ignored.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut headers = Self::new();
        let mut current: Option<(String, String)> = None;

        for line in text.lines() {
            if line.is_empty() {
                break;
            }

            if line.starts_with(' ') || line.starts_with('\t') {
                if let Some((_, value)) = current.as_mut() {
                    value.push(' ');
                    value.push_str(line.trim());
                }
                continue;
            }

            if let Some((name, value)) = current.take() {
                headers.add(name, value.trim().to_string());
            }

            if let Some((name, value)) = line.split_once(':') {
                current = Some((name.trim().to_string(), value.trim().to_string()));
            }
        }

        if let Some((name, value)) = current {
            headers.add(name, value.trim().to_string());
        }

        headers
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive_lookup() {
        let headers = Headers::parse("Message-ID: <a@b>\r\n");
        assert_eq!(headers.get("message-id"), Some("<a@b>"));
        assert_eq!(headers.get("MESSAGE-ID"), Some("<a@b>"));
    }

    #[test]
    fn test_folded_lines() {
        let text = "Subject: a long\r\n  subject line\r\nFrom: x@y.z\r\n\r\nbody: not a header";
        let headers = Headers::parse(text);
        assert_eq!(headers.get("subject"), Some("a long subject line"));
        assert_eq!(headers.get("from"), Some("x@y.z"));
        assert!(headers.get("body").is_none());
    }

    #[test]
    fn test_decoded_value() {
        let headers = Headers::parse("Subject: =?utf-8?B?SMOpbGxv?=\n");
        assert_eq!(headers.get_decoded("subject").unwrap(), "Héllo");
    }

    #[test]
    fn test_empty_block() {
        assert!(Headers::parse("\r\nbody").is_empty());
    }
}
