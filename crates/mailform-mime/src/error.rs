//! Error types for MIME document operations.

use std::string::FromUtf8Error;

/// Result type alias for MIME operations.
pub type Result<T> = std::result::Result<T, Error>;

/// MIME error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid content type.
    #[error("Invalid content type: {0}")]
    InvalidContentType(String),

    /// Invalid transfer or header encoding.
    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),

    /// Base64 decode error.
    #[error("Base64 decode error: {0}")]
    Base64Decode(#[from] base64::DecodeError),

    /// UTF-8 decode error.
    #[error("UTF-8 decode error: {0}")]
    Utf8Decode(#[from] FromUtf8Error),

    /// Unknown charset label on a text part.
    #[error("Unsupported charset: {0}")]
    UnsupportedCharset(String),

    /// Missing boundary in multipart part.
    #[error("Missing boundary in multipart part")]
    MissingBoundary,

    /// Invalid multipart structure.
    #[error("Invalid multipart structure: {0}")]
    InvalidMultipart(String),

    /// The part does not hold the kind of content requested.
    #[error("Unexpected content: {0}")]
    UnexpectedContent(String),

    /// Parse error.
    #[error("Parse error: {0}")]
    Parse(String),
}
