//! Writing parts to RFC 5322/2045 bytes and parsing them back.

use crate::content_type::ContentType;
use crate::encoding::{
    decode_base64, decode_charset, decode_quoted_printable, encode_base64_wrapped,
    encode_quoted_printable, encode_rfc2047,
};
use crate::error::{Error, Result};
use crate::header::Headers;
use crate::part::{Body, Part, TransferEncoding};

/// Longest line written as 7bit before switching to quoted-printable.
const MAX_7BIT_LINE: usize = 76;

/// Headers whose values are free text and get RFC 2047 encoding.
const UNSTRUCTURED: &[&str] = &["subject", "comments", "keywords"];

impl Part {
    /// Writes this part as a complete message.
    ///
    /// Adds `MIME-Version` when missing, generates multipart boundaries
    /// that were not set explicitly, and chooses a transfer encoding for
    /// every leaf: 7bit or quoted-printable for text, base64 for bytes.
    /// Line breaks in text are written as CRLF.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.write_to(&mut out, true);
        out
    }

    fn write_to(&self, out: &mut Vec<u8>, is_root: bool) {
        if is_root && !self.headers.contains("mime-version") {
            out.extend_from_slice(b"MIME-Version: 1.0\r\n");
        }

        let content_type = self.content_type().ok();
        let boundary = match &self.body {
            Body::Multipart(_) => Some(
                content_type
                    .as_ref()
                    .and_then(ContentType::boundary)
                    .map_or_else(generate_boundary, str::to_string),
            ),
            _ => None,
        };

        for (name, value) in self.headers.iter() {
            if name.eq_ignore_ascii_case("content-transfer-encoding") {
                continue;
            }
            if name.eq_ignore_ascii_case("content-type")
                && let Some(boundary) = &boundary
            {
                let ct = content_type
                    .clone()
                    .unwrap_or_else(|| ContentType::multipart("mixed"))
                    .with_parameter("boundary", boundary.as_str());
                write_header(out, name, &ct.to_string());
                continue;
            }
            write_header(out, name, value);
        }

        match &self.body {
            Body::Empty => out.extend_from_slice(b"\r\n"),
            Body::Text(text) => {
                let (encoding, encoded) = encode_text(text);
                write_header(out, "Content-Transfer-Encoding", encoding.as_str());
                out.extend_from_slice(b"\r\n");
                out.extend_from_slice(encoded.as_bytes());
            }
            Body::Binary(bytes) => {
                write_header(
                    out,
                    "Content-Transfer-Encoding",
                    TransferEncoding::Base64.as_str(),
                );
                out.extend_from_slice(b"\r\n");
                out.extend_from_slice(encode_base64_wrapped(bytes).as_bytes());
            }
            Body::Multipart(children) => {
                if !self.headers.contains("content-type") {
                    let ct = ContentType::multipart("mixed")
                        .with_parameter("boundary", boundary.as_deref().unwrap_or_default());
                    write_header(out, "Content-Type", &ct.to_string());
                }
                out.extend_from_slice(b"\r\n");

                let boundary = boundary.unwrap_or_default();
                for child in children {
                    out.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
                    child.write_to(out, false);
                    out.extend_from_slice(b"\r\n");
                }
                out.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
            }
        }
    }

    /// Parses a message or part from raw bytes.
    ///
    /// Transfer encodings are removed and text parts are decoded from their
    /// charset, so the result holds the same decoded content a part built
    /// in memory would. CRLF line breaks in text become `\n`.
    ///
    /// # Errors
    ///
    /// Returns an error if a multipart has no usable boundary, or if a
    /// header or transfer encoding cannot be decoded.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        let (head, body) = split_head_body(raw);
        let mut headers = Headers::parse(&String::from_utf8_lossy(head))?;
        let has_content_type = headers.contains("content-type");

        let content_type = headers
            .get("content-type")
            .map_or_else(|| Ok(ContentType::text_plain()), ContentType::parse)?;

        if content_type.is_multipart() {
            let boundary = content_type.boundary().ok_or(Error::MissingBoundary)?;
            let children = split_multipart(body, boundary)?
                .into_iter()
                .map(Self::parse)
                .collect::<Result<Vec<_>>>()?;
            return Ok(Self {
                headers,
                body: Body::Multipart(children),
            });
        }

        let encoding = headers
            .get("content-transfer-encoding")
            .map_or(TransferEncoding::SevenBit, TransferEncoding::parse);
        headers.remove("content-transfer-encoding");

        let bytes = match encoding {
            TransferEncoding::Base64 => decode_base64(&String::from_utf8_lossy(body))?,
            TransferEncoding::QuotedPrintable => {
                decode_quoted_printable(&String::from_utf8_lossy(body))?
            }
            _ => body.to_vec(),
        };

        let body = if bytes.is_empty() && !has_content_type {
            Body::Empty
        } else if content_type.is_text() {
            match decode_charset(bytes.clone(), content_type.charset()) {
                Ok(text) => Body::Text(normalize_newlines(&text)),
                // Left for the caller to reject
                Err(_) => Body::Binary(bytes),
            }
        } else {
            Body::Binary(bytes)
        };

        Ok(Self { headers, body })
    }
}

/// Writes one header line.
///
/// Free text values are RFC 2047 encoded when needed. Line breaks in any
/// other value become spaces so a value never starts a new header.
fn write_header(out: &mut Vec<u8>, name: &str, value: &str) {
    let value = if UNSTRUCTURED.iter().any(|u| name.eq_ignore_ascii_case(u)) {
        encode_rfc2047(value, "utf-8")
    } else {
        value.replace(['\r', '\n'], " ")
    };
    out.extend_from_slice(name.as_bytes());
    out.extend_from_slice(b": ");
    out.extend_from_slice(value.as_bytes());
    out.extend_from_slice(b"\r\n");
}

/// Chooses 7bit when the text survives transport as is, quoted-printable
/// otherwise.
fn encode_text(text: &str) -> (TransferEncoding, String) {
    let normalized = normalize_newlines(text);
    let plain = normalized.is_ascii()
        && !normalized.contains('\r')
        && normalized.lines().all(|line| {
            line.len() <= MAX_7BIT_LINE && !line.ends_with(' ') && !line.ends_with('\t')
        });

    if plain {
        (
            TransferEncoding::SevenBit,
            normalized.replace('\n', "\r\n"),
        )
    } else {
        (
            TransferEncoding::QuotedPrintable,
            encode_quoted_printable(&normalized),
        )
    }
}

fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n")
}

fn generate_boundary() -> String {
    format!("=_{}", uuid::Uuid::new_v4().simple())
}

/// Splits raw bytes at the blank line ending the header block.
fn split_head_body(raw: &[u8]) -> (&[u8], &[u8]) {
    if let Some(rest) = raw.strip_prefix(b"\r\n") {
        return (&[], rest);
    }
    if let Some(rest) = raw.strip_prefix(b"\n") {
        return (&[], rest);
    }
    if let Some(i) = find(raw, b"\r\n\r\n") {
        return (&raw[..i], &raw[i + 4..]);
    }
    if let Some(i) = find(raw, b"\n\n") {
        return (&raw[..i], &raw[i + 2..]);
    }
    (raw, &[])
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Returns the raw content of each part between boundary delimiters.
///
/// The line break before a delimiter belongs to the delimiter and is not
/// part of the content. The preamble and epilogue are dropped.
fn split_multipart<'a>(body: &'a [u8], boundary: &str) -> Result<Vec<&'a [u8]>> {
    let delimiter = format!("--{boundary}");
    let close = format!("--{boundary}--");

    let mut parts = Vec::new();
    let mut current: Option<usize> = None;
    let mut found = false;
    let mut pos = 0;

    while pos < body.len() {
        let line_end = body[pos..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(body.len(), |i| pos + i);
        let next = (line_end + 1).min(body.len());

        let line = &body[pos..line_end];
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        let line = trim_end_whitespace(line);

        if line == close.as_bytes() {
            if let Some(start) = current.take() {
                parts.push(content_before(body, start, pos));
            }
            found = true;
            break;
        }
        if line == delimiter.as_bytes() {
            if let Some(start) = current {
                parts.push(content_before(body, start, pos));
            }
            current = Some(next);
            found = true;
        }
        pos = next;
    }

    if !found {
        return Err(Error::InvalidMultipart(format!(
            "Boundary {boundary} not found"
        )));
    }

    // Missing close delimiter: keep what was collected
    if let Some(start) = current {
        parts.push(&body[start.min(body.len())..]);
    }

    Ok(parts)
}

fn content_before(body: &[u8], start: usize, delimiter_start: usize) -> &[u8] {
    if delimiter_start <= start {
        return &[];
    }
    let content = &body[start..delimiter_start];
    content
        .strip_suffix(b"\r\n")
        .or_else(|| content.strip_suffix(b"\n"))
        .unwrap_or(content)
}

fn trim_end_whitespace(line: &[u8]) -> &[u8] {
    let end = line
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(0, |i| i + 1);
    &line[..end]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::content_type::ContentDisposition;

    fn round_trip(part: &Part) -> Part {
        Part::parse(&part.to_bytes()).unwrap()
    }

    #[test]
    fn test_single_text_part() {
        let mut part = Part::text("plain", "hello");
        part.set_header("Subject", "greeting");

        let bytes = part.to_bytes();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("MIME-Version: 1.0\r\n"));
        assert!(text.contains("Content-Transfer-Encoding: 7bit\r\n"));
        assert!(text.ends_with("\r\n\r\nhello"));

        let parsed = round_trip(&part);
        assert_eq!(parsed.header("subject"), Some("greeting"));
        assert_eq!(parsed.body, Body::Text("hello".to_string()));
        assert!(parsed.header("content-transfer-encoding").is_none());
    }

    #[test]
    fn test_text_keeps_line_breaks() {
        let part = Part::text("plain", "line one\nline two\n");
        let bytes = part.to_bytes();
        assert!(String::from_utf8_lossy(&bytes).contains("line one\r\nline two\r\n"));
        assert_eq!(
            round_trip(&part).body,
            Body::Text("line one\nline two\n".to_string())
        );
    }

    #[test]
    fn test_non_ascii_text_uses_quoted_printable() {
        let part = Part::text("plain", "grüße\n");
        let text = String::from_utf8(part.to_bytes()).unwrap();
        assert!(text.contains("Content-Transfer-Encoding: quoted-printable"));
        assert_eq!(round_trip(&part).body, Body::Text("grüße\n".to_string()));
    }

    #[test]
    fn test_binary_uses_base64() {
        let data: Vec<u8> = (0..=255).collect();
        let part = Part::binary("application", "octet-stream", data.clone());
        let text = String::from_utf8(part.to_bytes()).unwrap();
        assert!(text.contains("Content-Transfer-Encoding: base64"));
        assert_eq!(round_trip(&part).body, Body::Binary(data));
    }

    #[test]
    fn test_subject_rfc2047() {
        let mut part = Part::text("plain", "x");
        part.set_header("Subject", "Grüße aus Köln");
        let text = String::from_utf8(part.to_bytes()).unwrap();
        assert!(text.contains("Subject: =?utf-8?B?"));
        assert_eq!(round_trip(&part).header("Subject"), Some("Grüße aus Köln"));
    }

    #[test]
    fn test_subject_line_break_stays_in_subject() {
        let mut part = Part::text("plain", "x");
        part.set_header("Subject", "Hello\r\nBcc: victim@evil.example");
        let text = String::from_utf8(part.to_bytes()).unwrap();
        assert!(!text.contains("\r\nBcc:"));

        let parsed = round_trip(&part);
        assert!(parsed.header("Bcc").is_none());
        assert_eq!(
            parsed.header("Subject"),
            Some("Hello\r\nBcc: victim@evil.example")
        );
    }

    #[test]
    fn test_structured_line_break_is_flattened() {
        let mut part = Part::text("plain", "x");
        part.set_header("From", "e@example.com\r\nBcc: x@evil.example");
        let parsed = round_trip(&part);
        assert!(parsed.header("Bcc").is_none());
        assert_eq!(
            parsed.header("From"),
            Some("e@example.com  Bcc: x@evil.example")
        );
    }

    #[test]
    fn test_nested_multipart() {
        let mut html = Part::text("html", "<p>hi</p>");
        let mut image = Part::binary("image", "png", vec![137, 80, 78, 71]);
        image.set_header("Content-ID", "<img@example.com>");
        image.set_header("Content-Disposition", ContentDisposition::inline().to_string());
        html.add_related(image);

        let mut root = Part::text("plain", "hi");
        root.set_header("Subject", "nested");
        root.add_alternative(html);

        let parsed = round_trip(&root);
        assert!(parsed.is_multipart_of("alternative"));
        assert_eq!(parsed.header("Subject"), Some("nested"));

        let children = parsed.children();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].body, Body::Text("hi".to_string()));
        assert!(children[1].is_multipart_of("related"));

        let related = children[1].children();
        assert_eq!(related.len(), 2);
        assert_eq!(related[0].body, Body::Text("<p>hi</p>".to_string()));
        assert_eq!(related[1].content_id(), Some("<img@example.com>"));
        assert_eq!(related[1].body, Body::Binary(vec![137, 80, 78, 71]));
    }

    #[test]
    fn test_empty_child_survives() {
        let root = Part::multipart(
            "mixed",
            vec![Part::new(), Part::binary("application", "pdf", vec![1])],
        );
        let parsed = round_trip(&root);
        assert_eq!(parsed.children().len(), 2);
        assert!(parsed.children()[0].is_empty());
    }

    #[test]
    fn test_explicit_boundary_is_kept() {
        let mut root = Part::multipart("mixed", vec![Part::text("plain", "a")]);
        root.set_header("Content-Type", "multipart/mixed; boundary=fixed");
        let text = String::from_utf8(root.to_bytes()).unwrap();
        assert!(text.contains("--fixed\r\n"));
        assert!(text.ends_with("--fixed--\r\n"));
    }

    #[test]
    fn test_parse_lf_only_message() {
        let raw = b"Content-Type: multipart/alternative; boundary=b\n\npreamble\n--b\nContent-Type: text/plain\n\nplain\n--b\nContent-Type: text/html\n\n<b>x</b>\n--b--\n";
        let parsed = Part::parse(raw).unwrap();
        assert_eq!(parsed.children().len(), 2);
        assert_eq!(parsed.children()[0].text_content().unwrap(), "plain");
        assert_eq!(parsed.children()[1].text_content().unwrap(), "<b>x</b>");
    }

    #[test]
    fn test_parse_missing_boundary() {
        let raw = b"Content-Type: multipart/mixed\r\n\r\nbody";
        assert!(matches!(Part::parse(raw), Err(Error::MissingBoundary)));
    }

    #[test]
    fn test_parse_latin1_text() {
        let raw = b"Content-Type: text/plain; charset=iso-8859-1\r\n\r\ncaf\xe9";
        let parsed = Part::parse(raw).unwrap();
        assert_eq!(parsed.body, Body::Text("café".to_string()));
    }

    #[test]
    fn test_parse_invalid_utf8_kept_as_bytes() {
        let raw = b"Content-Type: text/plain; charset=utf-8\r\n\r\n\xff\xfe";
        let parsed = Part::parse(raw).unwrap();
        assert_eq!(parsed.body, Body::Binary(vec![0xff, 0xfe]));
        assert!(parsed.text_content().is_err());
    }
}
