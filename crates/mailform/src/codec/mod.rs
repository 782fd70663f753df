//! Conversion between [`Message`](crate::Message) and MIME documents.
//!
//! Documents always have this shape, outermost first, with every level
//! optional:
//!
//! ```text
//! multipart/mixed [body, attachment...]
//!   multipart/alternative [text/plain, html]
//!     multipart/related [text/html, inline attachment...]
//! ```
//!
//! Decoding only accepts documents of this shape.

mod decode;
mod encode;

pub use decode::decode;
pub use encode::encode;

/// Header names written and read by the codec.
pub(crate) mod header {
    pub const SUBJECT: &str = "Subject";
    pub const FROM: &str = "From";
    pub const REPLY_TO: &str = "Reply-To";
    pub const TO: &str = "To";
    pub const CC: &str = "CC";
    pub const BCC: &str = "BCC";
}
