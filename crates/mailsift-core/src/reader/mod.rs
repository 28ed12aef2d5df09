//! Turns a stored message file into a structured record.

mod cleanup;

use chrono::{DateTime, FixedOffset};

pub use cleanup::{TRUNCATION_MARKER, clean_body, html_to_text};

use crate::Result;
use crate::store::{Folder, MailStore};

/// Default cleaned-body length.
pub const DEFAULT_BODY_LIMIT: usize = 1000;

const NO_SUBJECT: &str = "No Subject";
const UNKNOWN_SENDER: &str = "Unknown Sender";
const UNKNOWN_DATE: &str = "Unknown Date";

/// A parsed message and where it currently lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Filename within its folder.
    pub file: String,
    /// Folder holding the file when it was read.
    pub folder: Folder,
    /// From header, decoded.
    pub sender: String,
    /// Subject header, decoded.
    pub subject: String,
    /// Cleaned, truncated plain-text body.
    pub body: String,
    /// Parsed Date header; `None` when missing or unparsable.
    pub date: Option<DateTime<FixedOffset>>,
    /// `%Y-%m-%d %H:%M:%S`, or the raw header when it did not parse.
    pub date_display: String,
    /// Message-ID header used for remote deletion.
    pub message_id: Option<String>,
}

impl Message {
    /// Reads and parses a message file with the default body limit.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub async fn load(store: &MailStore, folder: Folder, file: &str) -> Result<Self> {
        Self::load_with_limit(store, folder, file, DEFAULT_BODY_LIMIT).await
    }

    /// Reads and parses a message file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub async fn load_with_limit(
        store: &MailStore,
        folder: Folder,
        file: &str,
        body_limit: usize,
    ) -> Result<Self> {
        let raw = store.read_raw(folder, file).await?;
        Self::parse(file, folder, &raw, body_limit)
    }

    /// Parses raw message bytes.
    ///
    /// # Errors
    ///
    /// Returns an error for empty input or a multipart body without boundary.
    pub fn parse(file: &str, folder: Folder, raw: &[u8], body_limit: usize) -> Result<Self> {
        let mime = mailsift_mime::Message::parse(raw)?;

        let body = match (mime.text_body(), mime.html_body()) {
            (Some(text), _) if !text.trim().is_empty() => text,
            (_, Some(html)) => html_to_text(&html),
            (text, None) => text.unwrap_or_default(),
        };

        let raw_date = mime.date().map(str::trim).filter(|d| !d.is_empty());
        let date = raw_date.and_then(parse_date);
        let date_display = match (date, raw_date) {
            (Some(parsed), _) => parsed.format("%Y-%m-%d %H:%M:%S").to_string(),
            (None, Some(raw)) => raw.to_string(),
            (None, None) => UNKNOWN_DATE.to_string(),
        };

        Ok(Self {
            file: file.to_string(),
            folder,
            sender: non_empty(mime.from()).unwrap_or_else(|| UNKNOWN_SENDER.to_string()),
            subject: non_empty(mime.subject()).unwrap_or_else(|| NO_SUBJECT.to_string()),
            body: clean_body(&body, body_limit),
            date,
            date_display,
            message_id: mime.message_id().map(str::to_string),
        })
    }

    /// Sender, subject, date and body joined for full-text rule matching.
    #[must_use]
    pub fn full_text(&self) -> String {
        format!(
            "{}\n{}\n{}\n{}",
            self.sender, self.subject, self.date_display, self.body
        )
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// RFC 2822 date, tolerating a trailing `(Zone)` comment.
fn parse_date(raw: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc2822(raw).ok().or_else(|| {
        let without_comment = raw.split_once(" (").map_or(raw, |(head, _)| head);
        DateTime::parse_from_rfc2822(without_comment.trim()).ok()
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_message() {
        let raw = b"From: =?utf-8?Q?Zo=C3=AB?= <zoe@example.com>\r\n\
Subject: Standup notes\r\n\
Date: Tue, 5 Mar 2024 09:15:00 +0100 (CET)\r\n\
Message-ID: <notes-1@example.com>\r\n\
\r\n\
Notes attached.\r\n\
> previous thread\r\n";
        let message = Message::parse("m1", Folder::Inbox, raw, DEFAULT_BODY_LIMIT).unwrap();

        assert_eq!(message.sender, "Zoë <zoe@example.com>");
        assert_eq!(message.subject, "Standup notes");
        assert_eq!(message.body, "Notes attached.");
        assert_eq!(message.date_display, "2024-03-05 09:15:00");
        assert_eq!(message.message_id.as_deref(), Some("<notes-1@example.com>"));
    }

    #[test]
    fn test_missing_headers_use_defaults() {
        let message = Message::parse("m2", Folder::Inbox, b"\r\njust a body", 1000).unwrap();
        assert_eq!(message.sender, "Unknown Sender");
        assert_eq!(message.subject, "No Subject");
        assert_eq!(message.date_display, "Unknown Date");
        assert!(message.date.is_none());
    }

    #[test]
    fn test_unparsable_date_keeps_raw_string() {
        let raw = b"Date: sometime last week\n\nhello";
        let message = Message::parse("m3", Folder::Inbox, raw, 1000).unwrap();
        assert!(message.date.is_none());
        assert_eq!(message.date_display, "sometime last week");
    }

    #[test]
    fn test_html_only_body_is_converted() {
        let raw = b"Content-Type: text/html\n\n<p>Your package has shipped</p>";
        let message = Message::parse("m4", Folder::Inbox, raw, 1000).unwrap();
        assert!(message.body.contains("Your package has shipped"));
        assert!(!message.body.contains("<p>"));
    }

    #[test]
    fn test_full_text_joins_fields() {
        let raw = b"From: a@b.c\nSubject: Hi\n\nbody text";
        let message = Message::parse("m5", Folder::Inbox, raw, 1000).unwrap();
        assert_eq!(message.full_text(), "a@b.c\nHi\nUnknown Date\nbody text");
    }

    #[tokio::test]
    async fn test_load_from_store() {
        let (_dir, store) = crate::store::tests::temp_store().await;
        crate::store::tests::put(&store, Folder::Inbox, "m6", "Subject: On disk\n\nx").await;
        let message = Message::load(&store, Folder::Inbox, "m6").await.unwrap();
        assert_eq!(message.subject, "On disk");
        assert_eq!(message.folder, Folder::Inbox);
    }
}
