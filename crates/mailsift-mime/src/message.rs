//! Message structure and parsing.

use crate::content_type::ContentType;
use crate::encoding::{decode_base64, decode_quoted_printable};
use crate::error::{Error, Result};
use crate::header::Headers;

/// Nesting limit for multipart containers.
const MAX_DEPTH: usize = 16;

/// Transfer encoding types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEncoding {
    /// 7-bit ASCII.
    SevenBit,
    /// 8-bit data.
    EightBit,
    /// Base64 encoding.
    Base64,
    /// Quoted-Printable encoding.
    QuotedPrintable,
    /// Binary (no encoding).
    Binary,
}

impl TransferEncoding {
    /// Parses transfer encoding from string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "8bit" => Self::EightBit,
            "base64" => Self::Base64,
            "quoted-printable" => Self::QuotedPrintable,
            "binary" => Self::Binary,
            _ => Self::SevenBit,
        }
    }
}

/// A leaf body part.
#[derive(Debug, Clone)]
pub struct Part {
    /// Part headers.
    pub headers: Headers,
    /// Part body (raw, still transfer-encoded).
    pub body: Vec<u8>,
}

impl Part {
    /// Creates a new part.
    #[must_use]
    pub const fn new(headers: Headers, body: Vec<u8>) -> Self {
        Self { headers, body }
    }

    /// Gets the content type, falling back to `text/plain` when the header
    /// is absent or unparsable.
    #[must_use]
    pub fn content_type(&self) -> ContentType {
        self.headers
            .get("content-type")
            .and_then(|value| ContentType::parse(value).ok())
            .unwrap_or_default()
    }

    /// Gets the transfer encoding.
    #[must_use]
    pub fn transfer_encoding(&self) -> TransferEncoding {
        self.headers
            .get("content-transfer-encoding")
            .map_or(TransferEncoding::SevenBit, TransferEncoding::parse)
    }

    /// Returns true when the part is marked as an attachment.
    #[must_use]
    pub fn is_attachment(&self) -> bool {
        self.headers
            .get("content-disposition")
            .is_some_and(|value| value.trim().to_lowercase().starts_with("attachment"))
    }

    /// Decodes the body according to the transfer encoding.
    ///
    /// # Errors
    ///
    /// Returns an error if decoding fails.
    pub fn decode_body(&self) -> Result<Vec<u8>> {
        match self.transfer_encoding() {
            TransferEncoding::Base64 => decode_base64(&String::from_utf8_lossy(&self.body)),
            TransferEncoding::QuotedPrintable => decode_quoted_printable(&self.body),
            _ => Ok(self.body.clone()),
        }
    }

    /// Gets the decoded body as text.
    ///
    /// Latin-1 family charsets are mapped byte-for-byte; anything else is
    /// read as UTF-8 with invalid sequences replaced.
    ///
    /// # Errors
    ///
    /// Returns an error if transfer decoding fails.
    pub fn body_text(&self) -> Result<String> {
        let decoded = self.decode_body()?;
        let charset = self.content_type().charset().map(str::to_lowercase);
        Ok(match charset.as_deref() {
            Some("iso-8859-1" | "latin1" | "windows-1252") => {
                decoded.iter().map(|&b| char::from(b)).collect()
            }
            _ => String::from_utf8_lossy(&decoded).into_owned(),
        })
    }

    /// Decoded text, or the raw body read lossily if decoding fails.
    fn text_or_raw(&self) -> String {
        self.body_text()
            .unwrap_or_else(|_| String::from_utf8_lossy(&self.body).into_owned())
    }
}

/// A parsed message with its leaf parts flattened in document order.
#[derive(Debug, Clone)]
pub struct Message {
    /// Top-level headers.
    pub headers: Headers,
    /// Leaf parts. A single-part message has exactly one.
    pub parts: Vec<Part>,
}

impl Message {
    /// Parses a raw RFC 5322 message.
    ///
    /// # Errors
    ///
    /// Returns `Error::Empty` for blank input and `Error::MissingBoundary`
    /// for a multipart container without a boundary parameter.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        if raw.iter().all(u8::is_ascii_whitespace) {
            return Err(Error::Empty);
        }

        let (head, body) = split_head_body(raw);
        let headers = Headers::parse(&String::from_utf8_lossy(head));

        let mut parts = Vec::new();
        collect_leaves(headers.clone(), body, 0, &mut parts)?;

        Ok(Self { headers, parts })
    }

    /// Decoded Subject header.
    #[must_use]
    pub fn subject(&self) -> Option<String> {
        self.headers.get_decoded("subject")
    }

    /// Decoded From header.
    #[must_use]
    pub fn from(&self) -> Option<String> {
        self.headers.get_decoded("from")
    }

    /// Raw Date header.
    #[must_use]
    pub fn date(&self) -> Option<&str> {
        self.headers.get("date")
    }

    /// Message-ID header, trimmed.
    #[must_use]
    pub fn message_id(&self) -> Option<&str> {
        self.headers
            .get("message-id")
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    /// Concatenation of every inline `text/plain` part, separated by newlines.
    #[must_use]
    pub fn text_body(&self) -> Option<String> {
        self.join_parts("text", "plain")
    }

    /// Concatenation of every inline `text/html` part.
    #[must_use]
    pub fn html_body(&self) -> Option<String> {
        self.join_parts("text", "html")
    }

    fn join_parts(&self, main_type: &str, sub_type: &str) -> Option<String> {
        let texts: Vec<String> = self
            .parts
            .iter()
            .filter(|part| !part.is_attachment() && part.content_type().is(main_type, sub_type))
            .map(Part::text_or_raw)
            .collect();

        if texts.is_empty() {
            None
        } else {
            Some(texts.join("\n"))
        }
    }
}

fn collect_leaves(headers: Headers, body: &[u8], depth: usize, out: &mut Vec<Part>) -> Result<()> {
    let content_type = headers
        .get("content-type")
        .and_then(|value| ContentType::parse(value).ok())
        .unwrap_or_default();

    if !content_type.is_multipart() || depth >= MAX_DEPTH {
        out.push(Part::new(headers, body.to_vec()));
        return Ok(());
    }

    let boundary = content_type.boundary().ok_or(Error::MissingBoundary)?;
    for section in split_multipart(body, boundary) {
        let (head, sub_body) = split_head_body(section);
        let sub_headers = Headers::parse(&String::from_utf8_lossy(head));
        collect_leaves(sub_headers, sub_body, depth + 1, out)?;
    }
    Ok(())
}

/// Splits at the first blank line into (header block, body).
fn split_head_body(raw: &[u8]) -> (&[u8], &[u8]) {
    if let Some(rest) = raw.strip_prefix(b"\r\n") {
        return (&[], rest);
    }
    if let Some(rest) = raw.strip_prefix(b"\n") {
        return (&[], rest);
    }

    let crlf = find(raw, b"\r\n\r\n");
    let lf = find(raw, b"\n\n");
    match (crlf, lf) {
        (Some(c), Some(l)) if c < l => (&raw[..c], &raw[c + 4..]),
        (_, Some(l)) => (&raw[..l], &raw[l + 2..]),
        (Some(c), None) => (&raw[..c], &raw[c + 4..]),
        (None, None) => (raw, &[]),
    }
}

/// Returns the sections between `--boundary` delimiter lines.
fn split_multipart<'a>(body: &'a [u8], boundary: &str) -> Vec<&'a [u8]> {
    let delimiter = format!("--{boundary}");
    let mut sections = Vec::new();
    let mut start: Option<usize> = None;
    let mut offset = 0;

    for line in body.split_inclusive(|&b| b == b'\n') {
        let trimmed = trim_line_end(line);
        if let Some(rest) = trimmed.strip_prefix(delimiter.as_bytes()) {
            let closing = rest.starts_with(b"--");
            if closing || rest.iter().all(u8::is_ascii_whitespace) {
                if let Some(s) = start {
                    sections.push(trim_line_end(&body[s..offset]));
                }
                if closing {
                    return sections;
                }
                start = Some(offset + line.len());
            }
        }
        offset += line.len();
    }

    // Unterminated container
    if let Some(s) = start {
        sections.push(&body[s..]);
    }
    sections
}

fn trim_line_end(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const MULTIPART: &[u8] = b"From: Alice <alice@example.com>\r\n\
Subject: Quarterly numbers\r\n\
Message-ID: <q1@example.com>\r\n\
Content-Type: multipart/mixed; boundary=\"outer\"\r\n\
\r\n\
preamble\r\n\
--outer\r\n\
Content-Type: multipart/alternative; boundary=inner\r\n\
\r\n\
--inner\r\n\
Content-Type: text/plain; charset=utf-8\r\n\
Content-Transfer-Encoding: quoted-printable\r\n\
\r\n\
Revenue is up =E2=9C=93\r\n\
--inner\r\n\
Content-Type: text/html\r\n\
\r\n\
<p>Revenue is up</p>\r\n\
--inner--\r\n\
--outer\r\n\
Content-Type: text/plain\r\n\
Content-Disposition: attachment; filename=notes.txt\r\n\
\r\n\
attached notes\r\n\
--outer--\r\n";

    #[test]
    fn test_transfer_encoding_parse() {
        assert_eq!(TransferEncoding::parse("7bit"), TransferEncoding::SevenBit);
        assert_eq!(TransferEncoding::parse("BASE64"), TransferEncoding::Base64);
        assert_eq!(
            TransferEncoding::parse("quoted-printable"),
            TransferEncoding::QuotedPrintable
        );
        assert_eq!(TransferEncoding::parse("x-unknown"), TransferEncoding::SevenBit);
    }

    #[test]
    fn test_single_part_message() {
        let raw = b"From: bob@example.com\nSubject: Hi\n\nHello there\n";
        let message = Message::parse(raw).unwrap();
        assert_eq!(message.parts.len(), 1);
        assert_eq!(message.subject().unwrap(), "Hi");
        assert_eq!(message.text_body().unwrap(), "Hello there\n");
        assert!(message.message_id().is_none());
    }

    #[test]
    fn test_nested_multipart_flattens_leaves() {
        let message = Message::parse(MULTIPART).unwrap();
        assert_eq!(message.parts.len(), 3);
        assert_eq!(message.message_id(), Some("<q1@example.com>"));
        assert_eq!(message.text_body().unwrap(), "Revenue is up ✓");
        assert_eq!(message.html_body().unwrap(), "<p>Revenue is up</p>");
    }

    #[test]
    fn test_base64_part() {
        let raw = b"Content-Type: text/plain\r\nContent-Transfer-Encoding: base64\r\n\r\nSGVsbG8s\r\nIFdvcmxkIQ==\r\n";
        let message = Message::parse(raw).unwrap();
        assert_eq!(message.text_body().unwrap(), "Hello, World!");
    }

    #[test]
    fn test_latin1_part() {
        let raw = b"Content-Type: text/plain; charset=iso-8859-1\n\ncaf\xe9";
        let message = Message::parse(raw).unwrap();
        assert_eq!(message.text_body().unwrap(), "café");
    }

    #[test]
    fn test_html_only_message() {
        let raw = b"Content-Type: text/html\n\n<b>hi</b>";
        let message = Message::parse(raw).unwrap();
        assert!(message.text_body().is_none());
        assert_eq!(message.html_body().unwrap(), "<b>hi</b>");
    }

    #[test]
    fn test_missing_boundary() {
        let raw = b"Content-Type: multipart/mixed\n\nbody";
        assert!(matches!(Message::parse(raw), Err(Error::MissingBoundary)));
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(Message::parse(b" \r\n"), Err(Error::Empty)));
    }

    #[test]
    fn test_headers_only() {
        let message = Message::parse(b"Subject: nothing else").unwrap();
        assert_eq!(message.subject().unwrap(), "nothing else");
        assert_eq!(message.text_body().unwrap(), "");
    }
}
