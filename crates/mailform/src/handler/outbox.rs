//! Handler that records messages instead of sending them.

use super::{EmailHandler, Outgoing};
use crate::error::Result;
use async_trait::async_trait;
use tokio::sync::Mutex;

/// Appends sent messages to an outbox. Useful in tests.
#[derive(Debug, Default)]
pub struct TestEmailHandler {
    outbox: Mutex<Vec<Outgoing>>,
}

impl TestEmailHandler {
    /// Creates a handler with an empty outbox.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a handler from configuration. The configuration is ignored.
    ///
    /// # Errors
    ///
    /// Never fails; returns `Result` to match other handler factories.
    pub fn from_config(_config: &serde_json::Value) -> Result<Self> {
        Ok(Self::new())
    }

    /// Returns a copy of everything sent so far, in order.
    pub async fn outbox(&self) -> Vec<Outgoing> {
        self.outbox.lock().await.clone()
    }

    /// Removes and returns everything sent so far.
    pub async fn take_outbox(&self) -> Vec<Outgoing> {
        std::mem::take(&mut *self.outbox.lock().await)
    }
}

#[async_trait]
impl EmailHandler for TestEmailHandler {
    async fn send(&self, messages: Vec<Outgoing>) -> Result<()> {
        tracing::debug!(count = messages.len(), "Recording messages in outbox");
        self.outbox.lock().await.extend(messages);
        Ok(())
    }
}
