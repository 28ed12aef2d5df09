//! # mailsift-imap
//!
//! A small async IMAP client covering what remote deletion needs: connect
//! (implicit TLS, STARTTLS or plaintext), LOGIN, SELECT, `UID SEARCH HEADER`,
//! `UID STORE +FLAGS (\Deleted)`, CAPABILITY, EXPUNGE or `UID EXPUNGE`, and
//! LOGOUT.
//!
//! ## Type-state connection
//!
//! ```ignore
//! use mailsift_imap::{connect, Config};
//!
//! let client = connect(&Config::new("imap.example.com")).await?;
//! let client = client.login("user", "password").await?;
//! let mut inbox = client.select("INBOX").await?;
//!
//! let uids = inbox.uid_search_header("Message-ID", "<abc@example.com>").await?;
//! inbox.uid_store_deleted(&uids).await?;
//! inbox.expunge_uids(&uids).await?;
//! inbox.logout().await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
mod error;
pub mod response;

pub use command::{Command, TagGenerator};
pub use connection::{
    Authenticated, Client, Config, FramedStream, ImapStream, NotAuthenticated, Security, Selected,
    connect,
};
pub use error::{Error, Result};
pub use response::{Response, Status, Untagged};
