//! Handler configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Port for implicit TLS.
pub const TLS_PORT: u16 = 465;

/// Port for plain SMTP.
pub const PLAIN_PORT: u16 = 25;

/// How the connection is protected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Security {
    /// No encryption.
    None,
    /// TLS from the first byte.
    Tls,
    /// Plain connection upgraded with STARTTLS.
    StartTls,
}

/// Settings for [`SmtpEmailHandler`](crate::SmtpEmailHandler).
///
/// Every key is optional and unknown keys are ignored, so the handler can be
/// built from a loosely shaped application config:
///
/// ```
/// use mailform_smtp::SmtpConfig;
///
/// let config: SmtpConfig = serde_json::from_value(serde_json::json!({
///     "host": "smtp.example.com",
///     "port": 465,
///     "use_starttls": true,
/// }))?;
/// assert!(config.use_tls());
/// assert!(!config.use_starttls());
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmtpConfig {
    /// Host to connect to (default: `localhost`).
    pub host: Option<String>,
    /// Port to connect to (default: 465 with TLS, 25 otherwise).
    pub port: Option<u16>,
    /// Connect with TLS (default: true when the port is 465).
    #[serde(rename = "use_tls")]
    pub tls: Option<bool>,
    /// Upgrade a plain connection with STARTTLS. Ignored with TLS.
    #[serde(rename = "use_starttls")]
    pub starttls: bool,
    /// Connection timeout in seconds (default: none).
    pub timeout: Option<f64>,
    /// Username to log in with.
    pub username: Option<String>,
    /// Password to log in with.
    pub password: Option<String>,
    /// Envelope sender when a message has neither `Sender` nor `From`.
    pub default_from: Option<String>,
    /// Most recipients per transaction; larger sends are split.
    pub recipients_per_message: Option<usize>,
}

impl SmtpConfig {
    /// Returns the host to connect to.
    #[must_use]
    pub fn host(&self) -> &str {
        self.host.as_deref().unwrap_or("localhost")
    }

    /// Returns true if the connection starts with TLS.
    #[must_use]
    pub fn use_tls(&self) -> bool {
        self.tls.unwrap_or(self.port == Some(TLS_PORT))
    }

    /// Returns true if a plain connection is upgraded with STARTTLS.
    #[must_use]
    pub fn use_starttls(&self) -> bool {
        !self.use_tls() && self.starttls
    }

    /// Returns the resolved security mode.
    #[must_use]
    pub fn security(&self) -> Security {
        if self.use_tls() {
            Security::Tls
        } else if self.starttls {
            Security::StartTls
        } else {
            Security::None
        }
    }

    /// Returns the port to connect to.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port.unwrap_or(match self.security() {
            Security::Tls => TLS_PORT,
            Security::None | Security::StartTls => PLAIN_PORT,
        })
    }

    /// Returns the connection timeout, if a positive one is set.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
            .filter(|secs| secs.is_finite() && *secs > 0.0)
            .map(Duration::from_secs_f64)
    }

    /// Returns the credentials when both parts are set.
    #[must_use]
    pub fn credentials(&self) -> Option<(&str, &str)> {
        self.username.as_deref().zip(self.password.as_deref())
    }

    /// Returns the batch size, zero meaning no batching.
    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.recipients_per_message.unwrap_or(0)
    }
}

impl fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("tls", &self.tls)
            .field("starttls", &self.starttls)
            .field("timeout", &self.timeout)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("default_from", &self.default_from)
            .field("recipients_per_message", &self.recipients_per_message)
            .finish()
    }
}
