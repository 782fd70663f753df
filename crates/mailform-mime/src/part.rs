//! MIME document tree.

use crate::content_type::{ContentDisposition, ContentType};
use crate::encoding::decode_charset;
use crate::error::{Error, Result};
use crate::header::Headers;
use std::borrow::Cow;

/// Transfer encoding types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEncoding {
    /// 7-bit ASCII.
    SevenBit,
    /// 8-bit binary.
    EightBit,
    /// Base64 encoding.
    Base64,
    /// Quoted-Printable encoding.
    QuotedPrintable,
    /// Binary (no encoding).
    Binary,
}

impl TransferEncoding {
    /// Parses transfer encoding from string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "8bit" => Self::EightBit,
            "base64" => Self::Base64,
            "quoted-printable" => Self::QuotedPrintable,
            "binary" => Self::Binary,
            _ => Self::SevenBit, // Default (includes "7bit")
        }
    }

    /// Returns the header value for this encoding.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SevenBit => "7bit",
            Self::EightBit => "8bit",
            Self::Base64 => "base64",
            Self::QuotedPrintable => "quoted-printable",
            Self::Binary => "binary",
        }
    }
}

/// Decoded content of a part.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Body {
    /// No content at all.
    #[default]
    Empty,
    /// Text content, stored decoded.
    Text(String),
    /// Binary content, stored decoded.
    Binary(Vec<u8>),
    /// Ordered child parts of a multipart.
    Multipart(Vec<Part>),
}

/// A node of a MIME document: headers plus a body.
///
/// The root part carries the message headers (Subject, From, ...) as well
/// as its own content headers. Child parts carry only content headers.
/// Bodies are kept decoded; transfer encodings are applied when the part
/// is written with [`Part::to_bytes`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Part {
    /// Part headers.
    pub headers: Headers,
    /// Part body.
    pub body: Body,
}

impl Part {
    /// Creates a part with no headers and no content.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a `text/<sub_type>; charset=utf-8` leaf part.
    #[must_use]
    pub fn text(sub_type: &str, text: impl Into<String>) -> Self {
        let mut headers = Headers::new();
        headers.set("Content-Type", ContentType::text(sub_type).to_string());
        Self {
            headers,
            body: Body::Text(text.into()),
        }
    }

    /// Creates a `<main_type>/<sub_type>` leaf part holding bytes.
    #[must_use]
    pub fn binary(main_type: &str, sub_type: &str, data: impl Into<Vec<u8>>) -> Self {
        let mut headers = Headers::new();
        headers.set(
            "Content-Type",
            ContentType::new(main_type, sub_type).to_string(),
        );
        Self {
            headers,
            body: Body::Binary(data.into()),
        }
    }

    /// Creates a `multipart/<sub_type>` part with the given children.
    #[must_use]
    pub fn multipart(sub_type: &str, children: Vec<Self>) -> Self {
        let mut headers = Headers::new();
        headers.set("Content-Type", ContentType::multipart(sub_type).to_string());
        Self {
            headers,
            body: Body::Multipart(children),
        }
    }

    /// Gets the first value of a header.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// Sets a header, replacing existing values.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.set(name, value);
    }

    /// Gets the content type, defaulting to `text/plain` when absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the content type header is invalid.
    pub fn content_type(&self) -> Result<ContentType> {
        self.headers
            .get("content-type")
            .map_or_else(|| Ok(ContentType::text_plain()), ContentType::parse)
    }

    /// Returns true if the content type is `multipart/<sub_type>`.
    #[must_use]
    pub fn is_multipart_of(&self, sub_type: &str) -> bool {
        matches!(self.body, Body::Multipart(_))
            && self
                .content_type()
                .is_ok_and(|ct| ct.is("multipart", sub_type))
    }

    /// Returns the parsed Content-Disposition, if any.
    #[must_use]
    pub fn disposition(&self) -> Option<ContentDisposition> {
        self.headers
            .get("content-disposition")
            .map(ContentDisposition::parse)
    }

    /// Returns the filename from Content-Disposition, falling back to the
    /// `name` parameter of Content-Type.
    #[must_use]
    pub fn filename(&self) -> Option<String> {
        if let Some(name) = self
            .disposition()
            .and_then(|d| d.filename().map(str::to_string))
        {
            return Some(name);
        }

        self.content_type()
            .ok()
            .and_then(|ct| ct.parameters.get("name").map(str::to_string))
    }

    /// Returns the Content-ID header value.
    #[must_use]
    pub fn content_id(&self) -> Option<&str> {
        self.headers.get("content-id")
    }

    /// Returns the child parts of a multipart, or an empty slice.
    #[must_use]
    pub fn children(&self) -> &[Self] {
        match &self.body {
            Body::Multipart(children) => children,
            _ => &[],
        }
    }

    /// Returns true if this part has no content.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self.body, Body::Empty)
    }

    /// Returns the content of a leaf part as text.
    ///
    /// Binary content is decoded using the charset parameter.
    ///
    /// # Errors
    ///
    /// Returns an error for multipart or empty parts, or if the bytes are
    /// not valid in the declared charset.
    pub fn text_content(&self) -> Result<Cow<'_, str>> {
        match &self.body {
            Body::Text(text) => Ok(Cow::Borrowed(text)),
            Body::Binary(bytes) => {
                let content_type = self.content_type()?;
                decode_charset(bytes.clone(), content_type.charset()).map(Cow::Owned)
            }
            Body::Empty => Err(Error::UnexpectedContent("empty part".to_string())),
            Body::Multipart(_) => Err(Error::UnexpectedContent(
                "multipart part has no text".to_string(),
            )),
        }
    }

    /// Returns the content of a leaf part as bytes.
    ///
    /// # Errors
    ///
    /// Returns an error for multipart or empty parts.
    pub fn bytes(&self) -> Result<Cow<'_, [u8]>> {
        match &self.body {
            Body::Text(text) => Ok(Cow::Borrowed(text.as_bytes())),
            Body::Binary(bytes) => Ok(Cow::Borrowed(bytes)),
            Body::Empty => Err(Error::UnexpectedContent("empty part".to_string())),
            Body::Multipart(_) => Err(Error::UnexpectedContent(
                "multipart part has no bytes".to_string(),
            )),
        }
    }

    /// Turns this part into an alternative group and appends `part`.
    pub fn add_alternative(&mut self, part: Self) {
        self.push_into("alternative", part);
    }

    /// Turns this part into a related group and appends `part`.
    pub fn add_related(&mut self, part: Self) {
        self.push_into("related", part);
    }

    /// Turns this part into a mixed group and appends `part`.
    pub fn add_attachment(&mut self, part: Self) {
        self.push_into("mixed", part);
    }

    fn push_into(&mut self, sub_type: &str, part: Self) {
        self.make_multipart(sub_type);
        if let Body::Multipart(children) = &mut self.body {
            children.push(part);
        }
    }

    /// Converts this part into `multipart/<sub_type>` unless it already is.
    ///
    /// The current content and its `Content-*` headers move into a new
    /// first child; other headers stay on this part. An empty part becomes
    /// an empty group.
    pub fn make_multipart(&mut self, sub_type: &str) {
        if self.is_multipart_of(sub_type) {
            return;
        }

        let content_headers = self.headers.drain_matching(is_content_header);
        let body = std::mem::take(&mut self.body);

        let children = if matches!(body, Body::Empty) {
            Vec::new()
        } else {
            vec![Self {
                headers: content_headers,
                body,
            }]
        };

        self.headers
            .set("Content-Type", ContentType::multipart(sub_type).to_string());
        self.body = Body::Multipart(children);
    }
}

/// Returns true for headers that describe content rather than the message.
#[must_use]
pub fn is_content_header(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    name.starts_with("content-") || name == "mime-version"
}
