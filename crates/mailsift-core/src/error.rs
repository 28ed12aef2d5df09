//! Error types for the core library.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// IMAP operation failed.
    #[error("IMAP error: {0}")]
    Imap(#[from] mailsift_imap::Error),

    /// Message could not be parsed.
    #[error("MIME error: {0}")]
    Mime(#[from] mailsift_mime::Error),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A store directory is missing or unwritable. Aborts the run.
    #[error("Message store unavailable at {path}: {reason}")]
    StoreUnavailable {
        /// Directory that failed the check.
        path: PathBuf,
        /// What went wrong.
        reason: String,
    },
}

impl Error {
    /// Returns true for conditions that must abort the whole run.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::StoreUnavailable { .. })
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
