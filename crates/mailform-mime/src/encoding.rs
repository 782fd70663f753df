//! MIME encoding and decoding utilities.
//!
//! Supports Base64, Quoted-Printable, RFC 2047 header encoding and
//! charset decoding of text bodies.

use crate::error::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::fmt::Write as _;

/// Maximum encoded line length, excluding CRLF (RFC 2045).
const MAX_LINE_LENGTH: usize = 76;

/// Largest chunk of UTF-8 put into a single encoded-word.
const ENCODED_WORD_CHUNK: usize = 45;

/// Encodes data as Base64.
#[must_use]
pub fn encode_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Encodes data as Base64 wrapped to 76 columns with CRLF line breaks.
#[must_use]
pub fn encode_base64_wrapped(data: &[u8]) -> String {
    let encoded = encode_base64(data);
    let mut result = String::with_capacity(encoded.len() + encoded.len() / MAX_LINE_LENGTH * 2);

    // Base64 output is ASCII, so byte chunks are valid str boundaries
    for (i, chunk) in encoded.as_bytes().chunks(MAX_LINE_LENGTH).enumerate() {
        if i > 0 {
            result.push_str("\r\n");
        }
        result.push_str(&String::from_utf8_lossy(chunk));
    }
    result
}

/// Decodes Base64 data, ignoring embedded whitespace.
///
/// # Errors
///
/// Returns an error if the input is not valid Base64.
pub fn decode_base64(data: &str) -> Result<Vec<u8>> {
    let cleaned: String = data.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD.decode(cleaned).map_err(Into::into)
}

/// Encodes text using Quoted-Printable encoding (RFC 2045).
///
/// `\n` (optionally preceded by `\r`) becomes a hard CRLF line break.
/// Long lines get soft breaks, and whitespace at the end of a line is
/// encoded so it survives transport.
#[must_use]
pub fn encode_quoted_printable(text: &str) -> String {
    let mut result = String::with_capacity(text.len());

    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            result.push_str("\r\n");
        }
        let line = line.strip_suffix('\r').unwrap_or(line);
        encode_quoted_printable_line(line.as_bytes(), &mut result);
    }

    result
}

fn encode_quoted_printable_line(bytes: &[u8], out: &mut String) {
    let mut line_length = 0;

    for (i, &byte) in bytes.iter().enumerate() {
        let is_last = i + 1 == bytes.len();
        let literal = match byte {
            b'!'..=b'<' | b'>'..=b'~' => true,
            b' ' | b'\t' => !is_last,
            _ => false,
        };
        let width = if literal { 1 } else { 3 };

        // Keep room for the trailing '=' of a soft break
        if line_length + width > MAX_LINE_LENGTH - 1 {
            out.push_str("=\r\n");
            line_length = 0;
        }

        if literal {
            out.push(char::from(byte));
        } else {
            let _ = write!(out, "={byte:02X}");
        }
        line_length += width;
    }
}

/// Decodes Quoted-Printable text (RFC 2045) into raw bytes.
///
/// # Errors
///
/// Returns an error if the input contains invalid escape sequences.
pub fn decode_quoted_printable(text: &str) -> Result<Vec<u8>> {
    let bytes = text.as_bytes();
    let mut result = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        let byte = bytes[i];
        if byte != b'=' {
            result.push(byte);
            i += 1;
            continue;
        }

        match bytes.get(i + 1..i + 3) {
            // Soft line breaks
            Some([b'\r', b'\n']) => i += 3,
            Some([b'\n', _]) => i += 2,
            Some(hex) => {
                let hex = std::str::from_utf8(hex)
                    .map_err(|_| Error::InvalidEncoding("Invalid hex escape".to_string()))?;
                let value = u8::from_str_radix(hex, 16)
                    .map_err(|e| Error::InvalidEncoding(format!("Invalid hex: {e}")))?;
                result.push(value);
                i += 3;
            }
            None if bytes.get(i + 1) == Some(&b'\n') => i += 2,
            None if i + 1 == bytes.len() => i += 1,
            None => {
                return Err(Error::InvalidEncoding(
                    "Incomplete escape sequence".to_string(),
                ));
            }
        }
    }

    Ok(result)
}

/// Decodes bytes in the named charset into a string.
///
/// `utf-8` and `us-ascii` are decoded strictly; other labels are looked
/// up in the WHATWG encoding registry.
///
/// # Errors
///
/// Returns an error if the charset is unknown or the bytes are not valid
/// UTF-8 when UTF-8 is requested.
pub fn decode_charset(bytes: Vec<u8>, charset: Option<&str>) -> Result<String> {
    let label = charset.unwrap_or("utf-8").trim();
    if label.eq_ignore_ascii_case("utf-8")
        || label.eq_ignore_ascii_case("utf8")
        || label.eq_ignore_ascii_case("us-ascii")
    {
        return String::from_utf8(bytes).map_err(Into::into);
    }

    let encoding = encoding_rs::Encoding::for_label(label.as_bytes())
        .ok_or_else(|| Error::UnsupportedCharset(label.to_string()))?;
    let (decoded, _, _) = encoding.decode(&bytes);
    Ok(decoded.into_owned())
}

/// Encodes a header value using RFC 2047 encoded-words.
///
/// Values that are printable ASCII and do not look like an encoded-word
/// are returned unchanged. Values with line breaks or other control
/// characters are always encoded. Longer values are split into several
/// encoded-words separated by folding whitespace.
#[must_use]
pub fn encode_rfc2047(text: &str, charset: &str) -> String {
    if !needs_rfc2047(text) {
        return text.to_string();
    }

    let mut words = Vec::new();
    let mut chunk = String::new();
    for c in text.chars() {
        if chunk.len() + c.len_utf8() > ENCODED_WORD_CHUNK {
            words.push(format!("=?{charset}?B?{}?=", encode_base64(chunk.as_bytes())));
            chunk.clear();
        }
        chunk.push(c);
    }
    if !chunk.is_empty() {
        words.push(format!("=?{charset}?B?{}?=", encode_base64(chunk.as_bytes())));
    }

    words.join("\r\n ")
}

/// Returns true if `text` cannot be written as a header value as is.
#[must_use]
pub fn needs_rfc2047(text: &str) -> bool {
    !text.is_ascii()
        || text.contains("=?")
        || text.contains(|c: char| c.is_ascii_control() && c != '\t')
}

/// Decodes RFC 2047 encoded-words embedded in a header value.
///
/// Whitespace between two adjacent encoded-words is dropped. Text that is
/// not an encoded-word is kept as is.
///
/// # Errors
///
/// Returns an error if an encoded-word uses an unknown encoding or
/// contains invalid data.
pub fn decode_rfc2047(text: &str) -> Result<String> {
    let mut result = String::with_capacity(text.len());
    let mut rest = text;
    let mut pending_whitespace = String::new();
    let mut after_word = false;

    while !rest.is_empty() {
        if let Some((decoded, consumed)) = parse_encoded_word(rest)? {
            if !after_word {
                result.push_str(&pending_whitespace);
            }
            pending_whitespace.clear();
            result.push_str(&decoded);
            rest = &rest[consumed..];
            after_word = true;
            continue;
        }

        let Some(c) = rest.chars().next() else {
            break;
        };
        if c.is_whitespace() {
            pending_whitespace.push(c);
        } else {
            result.push_str(&pending_whitespace);
            pending_whitespace.clear();
            result.push(c);
            after_word = false;
        }
        rest = &rest[c.len_utf8()..];
    }

    result.push_str(&pending_whitespace);
    Ok(result)
}

/// Parses `=?charset?enc?text?=` at the start of `s`.
///
/// Returns the decoded text and the number of bytes consumed, or `None`
/// if `s` does not start with an encoded-word.
fn parse_encoded_word(s: &str) -> Result<Option<(String, usize)>> {
    let Some(inner) = s.strip_prefix("=?") else {
        return Ok(None);
    };

    let mut fields = inner.splitn(3, '?');
    let (Some(charset), Some(encoding), Some(tail)) = (fields.next(), fields.next(), fields.next())
    else {
        return Ok(None);
    };
    let Some(end) = tail.find("?=") else {
        return Ok(None);
    };
    let encoded_text = &tail[..end];
    if encoded_text.contains(char::is_whitespace) {
        return Ok(None);
    }

    // RFC 2231 language suffix: charset*lang
    let label = charset.split('*').next().unwrap_or(charset);

    let bytes = match encoding.to_ascii_uppercase().as_str() {
        "B" => decode_base64(encoded_text)?,
        "Q" => decode_quoted_printable(&encoded_text.replace('_', " "))?,
        other => {
            return Err(Error::InvalidEncoding(format!("Unknown encoding: {other}")));
        }
    };

    // "=?" charset "?" encoding "?" text "?="
    let consumed = 2 + charset.len() + 1 + encoding.len() + 1 + end + 2;
    Ok(Some((decode_charset(bytes, Some(label))?, consumed)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_base64_encode_decode() {
        let data = b"Hello, World!";
        let encoded = encode_base64(data);
        assert_eq!(encoded, "SGVsbG8sIFdvcmxkIQ==");
        assert_eq!(decode_base64(&encoded).unwrap(), data);
    }

    #[test]
    fn test_base64_wrapped() {
        let data = vec![0u8; 100];
        let encoded = encode_base64_wrapped(&data);
        assert!(encoded.lines().all(|l| l.trim_end().len() <= 76));
        assert_eq!(decode_base64(&encoded).unwrap(), data);
    }

    #[test]
    fn test_quoted_printable_encode() {
        assert_eq!(encode_quoted_printable("Hello, World!"), "Hello, World!");
        assert!(encode_quoted_printable("Héllo").contains("=C3=A9"));
        assert_eq!(encode_quoted_printable("a=b"), "a=3Db");
    }

    #[test]
    fn test_quoted_printable_hard_breaks_and_trailing_space() {
        assert_eq!(encode_quoted_printable("a \nb"), "a=20\r\nb");
        assert_eq!(encode_quoted_printable("a\r\nb\n"), "a\r\nb\r\n");
    }

    #[test]
    fn test_quoted_printable_soft_breaks() {
        let line = "x".repeat(200);
        let encoded = encode_quoted_printable(&line);
        assert!(encoded.split("\r\n").all(|l| l.len() <= 76));
        assert_eq!(decode_quoted_printable(&encoded).unwrap(), line.as_bytes());
    }

    #[test]
    fn test_quoted_printable_decode() {
        assert_eq!(decode_quoted_printable("H=C3=A9llo").unwrap(), "Héllo".as_bytes());
        assert_eq!(decode_quoted_printable("Hello=\r\nWorld").unwrap(), b"HelloWorld");
        assert!(decode_quoted_printable("bad=ZZ").is_err());
    }

    #[test]
    fn test_decode_charset() {
        assert_eq!(decode_charset(b"abc".to_vec(), None).unwrap(), "abc");
        assert_eq!(
            decode_charset(vec![0x48, 0xE9], Some("iso-8859-1")).unwrap(),
            "Hé"
        );
        assert!(decode_charset(vec![0xFF], Some("utf-8")).is_err());
        assert!(decode_charset(b"a".to_vec(), Some("x-unknown")).is_err());
    }

    #[test]
    fn test_rfc2047_encode() {
        assert_eq!(encode_rfc2047("Hello", "utf-8"), "Hello");

        let encoded = encode_rfc2047("Héllo", "utf-8");
        assert!(encoded.starts_with("=?utf-8?B?"));
        assert!(encoded.ends_with("?="));
    }

    #[test]
    fn test_rfc2047_encodes_line_breaks() {
        let encoded = encode_rfc2047("Hello\r\nBcc: x@example.com", "utf-8");
        assert!(encoded.starts_with("=?utf-8?B?"));
        assert!(!encoded.contains('\n'));
        assert_eq!(
            decode_rfc2047(&encoded).unwrap(),
            "Hello\r\nBcc: x@example.com"
        );
        assert_eq!(encode_rfc2047("a\tb", "utf-8"), "a\tb");
    }

    #[test]
    fn test_rfc2047_decode() {
        assert_eq!(decode_rfc2047("Hello").unwrap(), "Hello");
        assert_eq!(decode_rfc2047("=?utf-8?B?SMOpbGxv?=").unwrap(), "Héllo");
        assert_eq!(decode_rfc2047("=?utf-8?Q?H=C3=A9llo_you?=").unwrap(), "Héllo you");
        assert_eq!(
            decode_rfc2047("Re: =?utf-8?B?SMOpbGxv?= there").unwrap(),
            "Re: Héllo there"
        );
    }

    #[test]
    fn test_rfc2047_long_value_round_trip() {
        let text = "ünïcødé ".repeat(20);
        let encoded = encode_rfc2047(&text, "utf-8");
        assert!(encoded.contains("\r\n "));
        // Header unfolding turns CRLF + space into a single space
        let unfolded = encoded.replace("\r\n ", " ");
        assert_eq!(decode_rfc2047(&unfolded).unwrap(), text);
    }
}
