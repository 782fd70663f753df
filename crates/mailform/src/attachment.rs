//! File attachments and inline content.

use crate::hostname::local_hostname;
use mailform_mime::{ContentDisposition, Part};
use std::sync::OnceLock;
use uuid::Uuid;

/// Attachment payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentData {
    /// Text content.
    Text(String),
    /// Binary content.
    Binary(Vec<u8>),
}

impl AttachmentData {
    /// Returns the payload as bytes, UTF-8 encoding text.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::Binary(bytes) => bytes,
        }
    }

    /// Returns the text if this is a text payload.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Binary(_) => None,
        }
    }

    const fn default_mimetype(&self) -> &'static str {
        match self {
            Self::Text(_) => "text/plain",
            Self::Binary(_) => "application/octet-stream",
        }
    }
}

impl From<String> for AttachmentData {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for AttachmentData {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<Vec<u8>> for AttachmentData {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Binary(bytes)
    }
}

impl From<&[u8]> for AttachmentData {
    fn from(bytes: &[u8]) -> Self {
        Self::Binary(bytes.to_vec())
    }
}

/// A file attached to a message, either for download or for display
/// inside the HTML content.
///
/// The mimetype is fixed at construction: an explicit value wins, then a
/// guess from the filename extension, then `text/plain` for text or
/// `application/octet-stream` for bytes.
///
/// The content-id used to reference an inline attachment from HTML is
/// generated on first access and stays the same afterwards. Clones share
/// the content-id that was set at the time of cloning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    data: AttachmentData,
    filename: Option<String>,
    mimetype: String,
    content_id: OnceLock<String>,
}

impl Attachment {
    /// Creates an attachment with no filename and the default mimetype.
    #[must_use]
    pub fn new(data: impl Into<AttachmentData>) -> Self {
        Self::builder(data).build()
    }

    /// Starts building an attachment.
    pub fn builder(data: impl Into<AttachmentData>) -> AttachmentBuilder {
        AttachmentBuilder {
            data: data.into(),
            filename: None,
            mimetype: None,
            content_id: None,
        }
    }

    /// Returns the payload.
    #[must_use]
    pub const fn data(&self) -> &AttachmentData {
        &self.data
    }

    /// Returns the filename shown to recipients.
    #[must_use]
    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    /// Returns the mimetype, such as `application/pdf`.
    #[must_use]
    pub fn mimetype(&self) -> &str {
        &self.mimetype
    }

    /// Returns the content-id, generating `<unique@hostname>` on first use.
    pub fn content_id(&self) -> &str {
        self.content_id.get_or_init(generate_content_id)
    }

    /// Sets the content-id explicitly. No id will be generated.
    pub fn set_content_id(&mut self, content_id: impl Into<String>) {
        self.content_id = OnceLock::from(content_id.into());
    }

    /// Adds this attachment to `container`.
    ///
    /// Inline attachments carry their content-id and go into the
    /// container's related group. Others carry their filename and go into
    /// its mixed group. Text whose mimetype is not `text/*` is added as
    /// UTF-8 bytes.
    pub fn render(&self, container: &mut Part, inline: bool) {
        let (main_type, sub_type) = self.mimetype.split_once('/').unwrap_or((&self.mimetype, ""));
        let is_text = main_type.eq_ignore_ascii_case("text");

        let mut part = match &self.data {
            AttachmentData::Text(text) if is_text => {
                Part::text(non_empty_or(sub_type, "plain"), text.as_str())
            }
            data => Part::binary(
                main_type,
                non_empty_or(sub_type, "octet-stream"),
                data.as_bytes().to_vec(),
            ),
        };

        if inline {
            part.set_header("Content-ID", self.content_id());
            part.set_header("Content-Disposition", ContentDisposition::inline().to_string());
            container.add_related(part);
        } else {
            let mut disposition = ContentDisposition::attachment();
            if let Some(filename) = self.filename.as_deref().filter(|f| !f.is_empty()) {
                disposition = disposition.with_filename(filename);
            }
            part.set_header("Content-Disposition", disposition.to_string());
            container.add_attachment(part);
        }
    }
}

/// Builder for [`Attachment`].
#[derive(Debug, Clone)]
#[must_use]
pub struct AttachmentBuilder {
    data: AttachmentData,
    filename: Option<String>,
    mimetype: Option<String>,
    content_id: Option<String>,
}

impl AttachmentBuilder {
    /// Sets the filename, also used to guess the mimetype.
    pub fn filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Sets the mimetype explicitly.
    pub fn mimetype(mut self, mimetype: impl Into<String>) -> Self {
        self.mimetype = Some(mimetype.into());
        self
    }

    /// Sets the content-id explicitly.
    pub fn content_id(mut self, content_id: impl Into<String>) -> Self {
        self.content_id = Some(content_id.into());
        self
    }

    /// Builds the attachment, resolving its mimetype.
    pub fn build(self) -> Attachment {
        let mimetype = self
            .mimetype
            .or_else(|| {
                self.filename
                    .as_deref()
                    .and_then(|name| mime_guess::from_path(name).first_raw())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| self.data.default_mimetype().to_string());

        Attachment {
            data: self.data,
            filename: self.filename,
            mimetype,
            content_id: self.content_id.map_or_else(OnceLock::new, OnceLock::from),
        }
    }
}

fn generate_content_id() -> String {
    format!("<{}@{}>", Uuid::new_v4().simple(), local_hostname())
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() { fallback } else { value }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use mailform_mime::Body;

    #[test]
    fn test_default_mimetypes() {
        assert_eq!(Attachment::new("hello").mimetype(), "text/plain");
        assert_eq!(
            Attachment::new(vec![0u8, 1]).mimetype(),
            "application/octet-stream"
        );
    }

    #[test]
    fn test_mimetype_from_filename() {
        let attachment = Attachment::builder("null").filename("f.json").build();
        assert_eq!(attachment.mimetype(), "application/json");

        let attachment = Attachment::builder(vec![1u8]).filename("unknown.zzzz").build();
        assert_eq!(attachment.mimetype(), "application/octet-stream");
    }

    #[test]
    fn test_explicit_mimetype_wins() {
        let attachment = Attachment::builder("a,b")
            .filename("data.json")
            .mimetype("text/csv")
            .build();
        assert_eq!(attachment.mimetype(), "text/csv");
    }

    #[test]
    fn test_content_id_is_stable() {
        let attachment = Attachment::new("x");
        let first = attachment.content_id().to_string();
        assert_eq!(attachment.content_id(), first);
        assert!(first.starts_with('<'));
        assert!(first.ends_with(&format!("@{}>", local_hostname())));
    }

    #[test]
    fn test_content_ids_are_unique() {
        let a = Attachment::new("x");
        let b = Attachment::new("x");
        assert_ne!(a.content_id(), b.content_id());
    }

    #[test]
    fn test_explicit_content_id() {
        let mut attachment = Attachment::new("x");
        attachment.set_content_id("<logo@example.com>");
        assert_eq!(attachment.content_id(), "<logo@example.com>");

        let built = Attachment::builder("x").content_id("<a@b>").build();
        assert_eq!(built.content_id(), "<a@b>");
    }

    #[test]
    fn test_render_download() {
        let attachment = Attachment::builder("null").filename("f.json").build();
        let mut container = Part::text("plain", "body");
        attachment.render(&mut container, false);

        assert!(container.is_multipart_of("mixed"));
        let part = &container.children()[1];
        assert!(part.content_type().unwrap().is("application", "json"));
        assert_eq!(part.body, Body::Binary(b"null".to_vec()));
        assert_eq!(part.filename().as_deref(), Some("f.json"));
        assert!(part.content_id().is_none());
    }

    #[test]
    fn test_render_inline() {
        let attachment = Attachment::builder(vec![137u8, 80, 78, 71])
            .filename("logo.png")
            .build();
        let mut container = Part::text("html", "<img src=\"cid:logo\">");
        attachment.render(&mut container, true);

        assert!(container.is_multipart_of("related"));
        let part = &container.children()[1];
        assert_eq!(part.content_id(), Some(attachment.content_id()));
        assert_eq!(part.disposition().unwrap().kind, "inline");
        assert!(part.content_type().unwrap().is("image", "png"));
    }

    #[test]
    fn test_render_text_keeps_text() {
        let attachment = Attachment::builder("a,b").filename("data.csv").build();
        let mut container = Part::new();
        container.set_header("Content-Type", "multipart/mixed");
        container.body = Body::Multipart(Vec::new());
        attachment.render(&mut container, false);

        let part = &container.children()[0];
        assert!(part.content_type().unwrap().is("text", "csv"));
        assert_eq!(part.body, Body::Text("a,b".to_string()));
    }
}
