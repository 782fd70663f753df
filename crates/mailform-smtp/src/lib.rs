//! # mailform-smtp
//!
//! Delivers [`mailform`] messages over SMTP (RFC 5321).
//!
//! ## Features
//!
//! - **Handler**: [`SmtpEmailHandler`] sends each batch over one session,
//!   built from a JSON config by name through [`registry`]
//! - **Envelope**: sender from `Sender` or `From`, recipients from `To`,
//!   `CC` and `BCC`, with BCC stripped from the transmitted bytes and
//!   optional recipient batching
//! - **TLS**: implicit TLS (port 465) and STARTTLS, with webpki roots
//! - **Authentication**: PLAIN and LOGIN
//! - **Type-state client**: compile-time ordering of SMTP commands
//!
//! ## Quick Start
//!
//! ```no_run
//! use mailform::{EmailHandler, Message};
//!
//! # async fn run() -> mailform::Result<()> {
//! let handler = mailform_smtp::registry().build(
//!     "smtp",
//!     &serde_json::json!({
//!         "host": "smtp.example.com",
//!         "use_starttls": true,
//!         "username": "reports@example.com",
//!         "password": "secret",
//!     }),
//! )?;
//!
//! let message = Message::new()
//!     .with_subject("Weekly report")
//!     .with_from_addr("reports@example.com")
//!     .with_to(["team@example.com"])
//!     .with_text("All green.");
//!
//! handler.send(vec![message.into()]).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`client`]: Type-state client over any [`Transport`]
//! - [`command`]: Command lines
//! - [`config`]: Handler settings
//! - [`envelope`]: Envelope sender and recipients of a document
//! - [`extension`]: EHLO extensions
//! - [`reply`]: Server replies

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod client;
pub mod command;
pub mod config;
pub mod envelope;
mod error;
pub mod extension;
mod handler;
pub mod reply;
mod stream;

pub use client::{Client, Connected, Data, MailTransaction};
pub use config::{Security, SmtpConfig};
pub use envelope::Envelope;
pub use error::{Error, Result};
pub use extension::{AuthMechanism, Extension, ServerInfo};
pub use handler::{SmtpEmailHandler, registry};
pub use reply::{Reply, ReplyCode};
pub use stream::{SmtpStream, Transport, connect};
