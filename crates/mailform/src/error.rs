//! Error types for message conversion and sending.

use thiserror::Error;

/// Errors that can occur when converting or sending messages.
#[derive(Debug, Error)]
pub enum Error {
    /// A From or Reply-To header was present but held no address.
    #[error("Address parse error: {0}")]
    AddressParse(String),

    /// A document does not have one of the shapes produced by encoding.
    #[error("Unsupported document structure: {0}")]
    StructuralDecode(String),

    /// Content could not be converted between text and bytes.
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Error from the document layer.
    #[error("MIME error: {0}")]
    Mime(#[from] mailform_mime::Error),

    /// A handler failed to deliver messages.
    #[error("Handler error: {0}")]
    Handler(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Handler configuration could not be deserialized.
    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),

    /// No handler is registered under the requested name.
    #[error("Unknown handler: {0}")]
    UnknownHandler(String),
}

impl Error {
    /// Wraps a transport error as a handler failure.
    pub fn handler(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Handler(Box::new(error))
    }

    pub(crate) fn structural(message: impl Into<String>) -> Self {
        Self::StructuralDecode(message.into())
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
