//! Error types for the IMAP client.

use std::time::Duration;

use thiserror::Error;

use crate::response::Status;

/// Errors that can occur while talking to the server.
#[derive(Debug, Error)]
pub enum Error {
    /// Network read or write failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TLS handshake failed.
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    /// Host name cannot be used for certificate verification.
    #[error("invalid server name: {0}")]
    InvalidHost(#[from] rustls::pki_types::InvalidDnsNameError),

    /// Tagged completion was NO or BAD.
    #[error("server rejected command ({status:?}): {text}")]
    Rejected {
        /// Completion status.
        status: Status,
        /// Human-readable text after the status.
        text: String,
    },

    /// Server closed the session with BYE.
    #[error("server closed the connection: {0}")]
    Closed(String),

    /// No greeting within the connect timeout.
    #[error("no response within {0:?}")]
    Timeout(Duration),

    /// Unexpected or unparsable server data.
    #[error("protocol error: {0}")]
    Protocol(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
