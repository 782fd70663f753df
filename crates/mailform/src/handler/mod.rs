//! Sending messages through pluggable handlers.
//!
//! An [`EmailHandler`] delivers a batch of [`Outgoing`] items. Handlers are
//! usually picked by name from configuration through a [`HandlerRegistry`].

mod outbox;
mod registry;

pub use outbox::TestEmailHandler;
pub use registry::{HandlerFactory, HandlerRegistry};

use crate::error::Result;
use crate::message::Message;
use async_trait::async_trait;
use mailform_mime::Part;

/// An item to send.
///
/// Most callers send [`Message`] values. A hand-built document can be sent
/// as is when a message needs a structure the codec does not produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outgoing {
    /// A structured message, encoded when sent.
    Message(Message),
    /// A finished MIME document.
    Document(Part),
}

impl Outgoing {
    /// Returns the document to transmit, encoding messages.
    #[must_use]
    pub fn into_document(self) -> Part {
        match self {
            Self::Message(message) => message.to_document(),
            Self::Document(document) => document,
        }
    }

    /// Returns the message if this is a structured message.
    #[must_use]
    pub const fn as_message(&self) -> Option<&Message> {
        match self {
            Self::Message(message) => Some(message),
            Self::Document(_) => None,
        }
    }
}

impl From<Message> for Outgoing {
    fn from(message: Message) -> Self {
        Self::Message(message)
    }
}

impl From<Part> for Outgoing {
    fn from(document: Part) -> Self {
        Self::Document(document)
    }
}

/// A way of delivering messages, such as SMTP or a provider's API.
#[async_trait]
pub trait EmailHandler: Send + Sync {
    /// Sends a batch of messages.
    ///
    /// # Errors
    ///
    /// Returns an error if delivery fails. Messages earlier in the batch may
    /// already have been sent.
    async fn send(&self, messages: Vec<Outgoing>) -> Result<()>;
}
