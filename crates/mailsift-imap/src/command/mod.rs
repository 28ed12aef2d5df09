//! IMAP command serialization.

mod tag_generator;

pub use tag_generator::TagGenerator;

/// The subset of IMAP commands the client issues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// STARTTLS upgrade request.
    StartTls,
    /// LOGIN with plaintext credentials.
    Login {
        /// Username.
        username: String,
        /// Password.
        password: String,
    },
    /// SELECT a mailbox read-write.
    Select {
        /// Mailbox name.
        mailbox: String,
    },
    /// `UID SEARCH HEADER <field> <value>`.
    UidSearchHeader {
        /// Header field name.
        field: String,
        /// Substring to match.
        value: String,
    },
    /// `UID STORE <uids> +FLAGS.SILENT (\Deleted)`.
    UidStoreDeleted {
        /// UIDs to flag.
        uids: Vec<u32>,
    },
    /// CAPABILITY listing.
    Capability,
    /// EXPUNGE deleted messages.
    Expunge,
    /// `UID EXPUNGE <uids>` (UIDPLUS): expunge only these flagged messages.
    UidExpunge {
        /// UIDs to expunge.
        uids: Vec<u32>,
    },
    /// LOGOUT.
    Logout,
}

impl Command {
    /// Serializes the command with the given tag, including the trailing CRLF.
    #[must_use]
    pub fn serialize(&self, tag: &str) -> Vec<u8> {
        let mut buf = Vec::with_capacity(64);
        buf.extend_from_slice(tag.as_bytes());
        buf.push(b' ');

        match self {
            Self::StartTls => buf.extend_from_slice(b"STARTTLS"),
            Self::Login { username, password } => {
                buf.extend_from_slice(b"LOGIN ");
                write_astring(&mut buf, username);
                buf.push(b' ');
                write_astring(&mut buf, password);
            }
            Self::Select { mailbox } => {
                buf.extend_from_slice(b"SELECT ");
                write_astring(&mut buf, mailbox);
            }
            Self::UidSearchHeader { field, value } => {
                buf.extend_from_slice(b"UID SEARCH HEADER ");
                write_astring(&mut buf, field);
                buf.push(b' ');
                write_quoted(&mut buf, value);
            }
            Self::UidStoreDeleted { uids } => {
                buf.extend_from_slice(b"UID STORE ");
                write_uid_set(&mut buf, uids);
                buf.extend_from_slice(b" +FLAGS.SILENT (\\Deleted)");
            }
            Self::Capability => buf.extend_from_slice(b"CAPABILITY"),
            Self::Expunge => buf.extend_from_slice(b"EXPUNGE"),
            Self::UidExpunge { uids } => {
                buf.extend_from_slice(b"UID EXPUNGE ");
                write_uid_set(&mut buf, uids);
            }
            Self::Logout => buf.extend_from_slice(b"LOGOUT"),
        }

        buf.extend_from_slice(b"\r\n");
        buf
    }
}

fn write_uid_set(buf: &mut Vec<u8>, uids: &[u32]) {
    let set: Vec<String> = uids.iter().map(u32::to_string).collect();
    buf.extend_from_slice(set.join(",").as_bytes());
}

/// Writes an astring (atom or quoted string).
fn write_astring(buf: &mut Vec<u8>, s: &str) {
    if s.is_empty() || s.bytes().any(needs_quoting) {
        write_quoted(buf, s);
    } else {
        buf.extend_from_slice(s.as_bytes());
    }
}

fn write_quoted(buf: &mut Vec<u8>, s: &str) {
    buf.push(b'"');
    for b in s.bytes() {
        if b == b'"' || b == b'\\' {
            buf.push(b'\\');
        }
        buf.push(b);
    }
    buf.push(b'"');
}

const fn needs_quoting(b: u8) -> bool {
    matches!(b, b' ' | b'"' | b'\\' | b'(' | b')' | b'{' | b'%' | b'*') || b < 0x20 || b == 0x7F
}
