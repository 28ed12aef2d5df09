//! Errors raised while reading a stored message.

/// Result type alias for MIME parsing.
pub type Result<T> = std::result::Result<T, Error>;

/// Why a message file could not be parsed.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Content-Type header has no `type/subtype`.
    #[error("malformed Content-Type: {0}")]
    InvalidContentType(String),

    /// Transfer-encoded data is corrupt.
    #[error("undecodable transfer encoding: {0}")]
    InvalidEncoding(String),

    /// Base64 payload is corrupt.
    #[error("undecodable base64: {0}")]
    Base64Decode(#[from] base64::DecodeError),

    /// Multipart body without a boundary parameter.
    #[error("multipart body has no boundary")]
    MissingBoundary,

    /// File holds no headers and no body.
    #[error("message is empty")]
    Empty,
}
