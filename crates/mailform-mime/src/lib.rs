//! # mailform-mime
//!
//! Tree-shaped MIME document library used by `mailform`.
//!
//! A [`Part`] is a node with [`Headers`] and a [`Body`]. Leaf bodies are
//! kept decoded (text or bytes), multipart bodies hold child parts. Transfer
//! encodings only appear on the wire: [`Part::to_bytes`] applies them and
//! [`Part::parse`] removes them.
//!
//! ## Building a document
//!
//! ```
//! use mailform_mime::Part;
//!
//! let mut doc = Part::text("plain", "Hello");
//! doc.set_header("Subject", "Greeting");
//! doc.add_alternative(Part::text("html", "<p>Hello</p>"));
//!
//! assert!(doc.is_multipart_of("alternative"));
//! assert_eq!(doc.children().len(), 2);
//! ```
//!
//! ## Wire format
//!
//! ```
//! use mailform_mime::{Body, Part};
//!
//! let doc = Part::text("plain", "Héllo, Wørld!\n");
//! let bytes = doc.to_bytes();
//!
//! let parsed = Part::parse(&bytes)?;
//! assert_eq!(parsed.body, Body::Text("Héllo, Wørld!\n".to_string()));
//! # Ok::<(), mailform_mime::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod content_type;
mod error;
mod header;
mod part;
mod wire;

pub mod encoding;

pub use content_type::{ContentDisposition, ContentType, Parameters};
pub use error::{Error, Result};
pub use header::Headers;
pub use part::{Body, Part, TransferEncoding, is_content_header};
