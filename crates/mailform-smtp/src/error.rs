//! Error types for SMTP delivery.

use std::io;
use std::time::Duration;

/// Result type alias for SMTP operations.
pub type Result<T> = std::result::Result<T, Error>;

/// SMTP error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The server name is not usable for TLS.
    #[error("Invalid TLS server name: {0}")]
    ServerName(String),

    /// The server answered with an unexpected reply code.
    #[error("SMTP error {code}: {message}")]
    Reply {
        /// Reply code (e.g., 550).
        code: u16,
        /// Reply text from the server.
        message: String,
    },

    /// The server sent something that is not an SMTP reply.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The server closed the connection mid-reply.
    #[error("Connection closed by server")]
    ConnectionClosed,

    /// Connecting took longer than the configured timeout.
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// The server lacks an extension the operation needs.
    #[error("Server does not support {0}")]
    NotSupported(String),

    /// Every recipient of a transaction was refused, or there were none.
    #[error("No recipient was accepted: {0}")]
    RecipientsRefused(String),
}

impl Error {
    /// Creates an error from a reply code and its text.
    #[must_use]
    pub fn reply(code: u16, message: impl Into<String>) -> Self {
        Self::Reply {
            code,
            message: message.into(),
        }
    }

    /// Returns true if this is a permanent error (5xx).
    #[must_use]
    pub const fn is_permanent(&self) -> bool {
        matches!(self, Self::Reply { code, .. } if *code >= 500 && *code < 600)
    }

    /// Returns true if this is a transient error (4xx).
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Reply { code, .. } if *code >= 400 && *code < 500)
    }
}

impl From<Error> for mailform::Error {
    fn from(error: Error) -> Self {
        Self::handler(error)
    }
}
