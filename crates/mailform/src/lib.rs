//! # mailform
//!
//! Structured email messages that convert to and from MIME documents.
//!
//! ## Features
//!
//! - **Addresses**: lenient parsing with IDNA-encoded domains, so
//!   `a@bücher.example` and `a@xn--bcher-kva.example` compare equal
//! - **Address lists**: ordered lists that normalize every value written
//! - **Attachments**: text or bytes with guessed mimetypes and stable
//!   content-ids for inline use
//! - **Codec**: one fixed document shape, produced by [`encode`] and
//!   accepted by [`decode`]
//! - **Handlers**: an async sending interface with a recording test handler
//!   and a registry of handlers by name
//!
//! ## Quick Start
//!
//! ```
//! use mailform::{Attachment, Message};
//!
//! let message = Message::new()
//!     .with_subject("Report")
//!     .with_from_addr("Reports <reports@bücher.example>")
//!     .with_to(["team@example.com"])
//!     .with_html("<p>See <b>attached</b>.</p>")
//!     .with_attachment(Attachment::builder("null").filename("report.json").build());
//!
//! let document = message.to_document();
//! assert!(document.is_multipart_of("mixed"));
//!
//! let decoded = mailform::decode(&document)?;
//! assert_eq!(decoded.text.as_deref(), Some("See attached."));
//! assert_eq!(decoded.from_addr().map(|a| a.domain()), Some("xn--bcher-kva.example"));
//! # Ok::<(), mailform::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod address;
pub mod address_list;
pub mod attachment;
pub mod codec;
pub mod handler;
pub mod html;
pub mod message;

mod error;
mod hostname;

pub use address::{Address, IntoAddress, normalize, parse_address_list};
pub use address_list::AddressList;
pub use attachment::{Attachment, AttachmentBuilder, AttachmentData};
pub use codec::{decode, encode};
pub use error::{Error, Result};
pub use handler::{EmailHandler, HandlerRegistry, Outgoing, TestEmailHandler};
pub use hostname::local_hostname;
pub use message::Message;

pub use mailform_mime as mime;
