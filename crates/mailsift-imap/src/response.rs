//! Server response parsing.
//!
//! Only the response shapes the client acts on are decoded. Everything else
//! is surfaced as [`Untagged::Other`] and ignored by callers.

use crate::{Error, Result};

/// Status of a tagged or untagged status response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Command completed.
    Ok,
    /// Command failed.
    No,
    /// Command was malformed.
    Bad,
    /// Connection already authenticated.
    PreAuth,
    /// Server is closing the connection.
    Bye,
}

impl Status {
    fn parse(word: &str) -> Option<Self> {
        match word.to_ascii_uppercase().as_str() {
            "OK" => Some(Self::Ok),
            "NO" => Some(Self::No),
            "BAD" => Some(Self::Bad),
            "PREAUTH" => Some(Self::PreAuth),
            "BYE" => Some(Self::Bye),
            _ => None,
        }
    }
}

/// Untagged server data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Untagged {
    /// `* OK/NO/BAD/PREAUTH/BYE text`.
    Status {
        /// Status keyword.
        status: Status,
        /// Human-readable text, including any response code.
        text: String,
    },
    /// `* SEARCH n n n`.
    Search(Vec<u32>),
    /// `* n EXISTS`.
    Exists(u32),
    /// `* n EXPUNGE`.
    Expunge(u32),
    /// `* CAPABILITY atom atom ...`, atoms upper-cased.
    Capability(Vec<String>),
    /// Anything else.
    Other(String),
}

/// A single server response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Completion result for a tagged command.
    Tagged {
        /// Tag of the command.
        tag: String,
        /// Completion status.
        status: Status,
        /// Human-readable text.
        text: String,
    },
    /// Untagged data.
    Untagged(Untagged),
    /// `+ text` continuation request.
    Continuation(String),
}

impl Response {
    /// Parses a CRLF-terminated response line.
    ///
    /// # Errors
    ///
    /// Returns `Error::Protocol` for an empty line or a tagged line without
    /// a recognizable status.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let line = String::from_utf8_lossy(bytes);
        let line = line.trim_end_matches(['\r', '\n']);

        if let Some(rest) = line.strip_prefix("+") {
            return Ok(Self::Continuation(rest.trim().to_string()));
        }

        if let Some(rest) = line.strip_prefix("* ") {
            return Ok(Self::Untagged(parse_untagged(rest)));
        }

        let (tag, rest) = line
            .split_once(' ')
            .ok_or_else(|| Error::Protocol(format!("unparsable response: {line}")))?;
        let (word, text) = rest.split_once(' ').unwrap_or((rest, ""));
        let status = Status::parse(word)
            .ok_or_else(|| Error::Protocol(format!("unknown status in: {line}")))?;

        Ok(Self::Tagged {
            tag: tag.to_string(),
            status,
            text: text.to_string(),
        })
    }
}

fn parse_untagged(rest: &str) -> Untagged {
    let (first, tail) = rest.split_once(' ').unwrap_or((rest, ""));

    if let Some(status) = Status::parse(first) {
        return Untagged::Status {
            status,
            text: tail.to_string(),
        };
    }

    if first.eq_ignore_ascii_case("CAPABILITY") {
        let atoms = tail.split_whitespace().map(str::to_ascii_uppercase).collect();
        return Untagged::Capability(atoms);
    }

    if first.eq_ignore_ascii_case("SEARCH") {
        let ids = tail
            .split_whitespace()
            .filter_map(|n| n.parse().ok())
            .collect();
        return Untagged::Search(ids);
    }

    if let Ok(n) = first.parse::<u32>() {
        let keyword = tail.split_whitespace().next().unwrap_or_default();
        if keyword.eq_ignore_ascii_case("EXISTS") {
            return Untagged::Exists(n);
        }
        if keyword.eq_ignore_ascii_case("EXPUNGE") {
            return Untagged::Expunge(n);
        }
    }

    Untagged::Other(rest.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_tagged_ok() {
        let response = Response::parse(b"A0001 OK LOGIN completed\r\n").unwrap();
        assert_eq!(
            response,
            Response::Tagged {
                tag: "A0001".to_string(),
                status: Status::Ok,
                text: "LOGIN completed".to_string(),
            }
        );
    }

    #[test]
    fn test_search_results() {
        let response = Response::parse(b"* SEARCH 3 17\r\n").unwrap();
        assert_eq!(response, Response::Untagged(Untagged::Search(vec![3, 17])));

        let empty = Response::parse(b"* SEARCH\r\n").unwrap();
        assert_eq!(empty, Response::Untagged(Untagged::Search(Vec::new())));
    }

    #[test]
    fn test_counts() {
        assert_eq!(
            Response::parse(b"* 12 EXISTS\r\n").unwrap(),
            Response::Untagged(Untagged::Exists(12))
        );
        assert_eq!(
            Response::parse(b"* 4 EXPUNGE\r\n").unwrap(),
            Response::Untagged(Untagged::Expunge(4))
        );
    }

    #[test]
    fn test_capability_list() {
        let response = Response::parse(b"* CAPABILITY IMAP4rev1 uidplus IDLE\r\n").unwrap();
        assert_eq!(
            response,
            Response::Untagged(Untagged::Capability(vec![
                "IMAP4REV1".to_string(),
                "UIDPLUS".to_string(),
                "IDLE".to_string(),
            ]))
        );
    }

    #[test]
    fn test_greeting_and_bye() {
        let greeting = Response::parse(b"* OK [CAPABILITY IMAP4rev1] ready\r\n").unwrap();
        assert!(matches!(
            greeting,
            Response::Untagged(Untagged::Status { status: Status::Ok, .. })
        ));
        let bye = Response::parse(b"* BYE shutting down\r\n").unwrap();
        assert!(matches!(
            bye,
            Response::Untagged(Untagged::Status { status: Status::Bye, .. })
        ));
    }

    #[test]
    fn test_garbage_tagged_line() {
        assert!(Response::parse(b"A0001 MAYBE\r\n").is_err());
        assert!(Response::parse(b"\r\n").is_err());
    }
}
