//! Email handler that delivers over SMTP.

use crate::client::{Client, Connected};
use crate::config::SmtpConfig;
use crate::envelope::{Envelope, transmitted_bytes};
use crate::error::{Error, Result};
use crate::stream::{self, SmtpStream};
use async_trait::async_trait;
use mailform::handler::{EmailHandler, HandlerRegistry, Outgoing};
use mailform::local_hostname;
use serde::Deserialize;
use tracing::{debug, info};

/// Sends each batch over one SMTP session.
///
/// The session is opened when a batch arrives and closed after its last
/// message. Empty batches never connect.
#[derive(Debug, Clone, Default)]
pub struct SmtpEmailHandler {
    config: SmtpConfig,
}

impl SmtpEmailHandler {
    /// Creates a handler from settings.
    #[must_use]
    pub const fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    /// Creates a handler from a loosely shaped config value.
    ///
    /// # Errors
    ///
    /// Returns an error if a known key has the wrong type.
    pub fn from_config(config: &serde_json::Value) -> mailform::Result<Self> {
        Ok(Self::new(SmtpConfig::deserialize(config)?))
    }

    /// Returns the settings.
    #[must_use]
    pub const fn config(&self) -> &SmtpConfig {
        &self.config
    }

    /// Connects to the configured server and prepares the session.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`] if connecting exceeds the configured
    /// timeout, or any error from [`setup`](Self::setup).
    pub async fn connect(&self) -> Result<Client<Connected>> {
        let (host, port) = (self.config.host(), self.config.port());
        debug!(host, port, tls = self.config.use_tls(), "Connecting to SMTP server");

        let connecting = async {
            let stream = stream::connect(host, port, self.config.use_tls()).await?;
            self.setup(stream).await
        };
        match self.config.timeout() {
            Some(limit) => tokio::time::timeout(limit, connecting)
                .await
                .map_err(|_| Error::Timeout(limit))?,
            None => connecting.await,
        }
    }

    /// Greets, says EHLO, upgrades with STARTTLS and logs in as configured.
    ///
    /// # Errors
    ///
    /// Returns an error if any step is refused.
    pub async fn setup(&self, stream: SmtpStream) -> Result<Client<Connected>> {
        let client_hostname = local_hostname();
        let mut client = Client::greet(stream).await?.ehlo(client_hostname).await?;

        if self.config.use_starttls() {
            client = client.starttls(self.config.host(), client_hostname).await?;
        }
        if let Some((username, password)) = self.config.credentials() {
            client = client.login(username, password).await?;
        }
        Ok(client)
    }

    /// Sends every item over an established session.
    ///
    /// # Errors
    ///
    /// Stops at the first item the server refuses.
    pub async fn send_with(
        &self,
        mut client: Client<Connected>,
        messages: Vec<Outgoing>,
    ) -> Result<Client<Connected>> {
        for item in messages {
            let document = item.into_document();
            let envelope = Envelope::from_document(&document, self.config.default_from.as_deref());
            let content = transmitted_bytes(&document);

            for batch in envelope.batched(self.config.batch_size()) {
                client = client.send_mail(&batch, &content).await?;
            }
            info!(
                from = %envelope.from,
                recipients = envelope.recipients.len(),
                "Message sent"
            );
        }
        Ok(client)
    }
}

#[async_trait]
impl EmailHandler for SmtpEmailHandler {
    async fn send(&self, messages: Vec<Outgoing>) -> mailform::Result<()> {
        if messages.is_empty() {
            return Ok(());
        }

        debug!(count = messages.len(), "Sending batch over SMTP");
        let client = self.connect().await?;
        self.send_with(client, messages).await?.quit().await?;
        Ok(())
    }
}

/// Returns a registry with the built-in handlers and `smtp`.
#[must_use]
pub fn registry() -> HandlerRegistry {
    let mut registry = HandlerRegistry::with_defaults();
    registry.register("smtp", |config| {
        Ok(Box::new(SmtpEmailHandler::from_config(config)?))
    });
    registry
}
