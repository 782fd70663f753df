//! Server replies.

use crate::error::{Error, Result};
use std::fmt;

/// A complete, possibly multi-line, server reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Reply code.
    pub code: ReplyCode,
    /// Text of each line, without the code and separator.
    pub lines: Vec<String>,
}

impl Reply {
    /// Assembles a reply from its raw lines.
    ///
    /// Every line must start with the same three digit code:
    ///
    /// - Single: `250 OK`
    /// - Multi: `250-first`, `250-second`, `250 last`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if a line is malformed or the codes differ.
    pub fn from_lines(raw: &[String]) -> Result<Self> {
        let first = raw
            .first()
            .ok_or_else(|| Error::Protocol("empty reply".into()))?;
        let code = line_code(first)?;

        let mut lines = Vec::with_capacity(raw.len());
        for line in raw {
            if line_code(line)? != code {
                return Err(Error::Protocol(format!("mixed reply codes: {line}")));
            }
            lines.push(line.get(4..).unwrap_or_default().to_string());
        }

        Ok(Self { code, lines })
    }

    /// Returns true if this is a success reply (2xx).
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.code.is_success()
    }

    /// Returns the full text as a single string.
    #[must_use]
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// Converts the reply into an error unless its code is `expected`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Reply`] for any other code.
    pub fn require(self, expected: ReplyCode) -> Result<Self> {
        if self.code == expected {
            Ok(self)
        } else {
            Err(self.into_error())
        }
    }

    /// Converts the reply into an error unless it is a success.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Reply`] for non-2xx codes.
    pub fn require_success(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(self.into_error())
        }
    }

    /// Converts the reply into an [`Error::Reply`].
    #[must_use]
    pub fn into_error(self) -> Error {
        Error::reply(self.code.as_u16(), self.text())
    }
}

/// Returns true if `line` ends a reply.
///
/// Continuation lines use `-` after the code; the last line uses a space or
/// nothing at all.
#[must_use]
pub fn is_last_line(line: &str) -> bool {
    match line.as_bytes().get(3) {
        Some(b' ') | None => true,
        Some(_) => false,
    }
}

fn line_code(line: &str) -> Result<ReplyCode> {
    let digits = line
        .get(..3)
        .filter(|d| d.bytes().all(|b| b.is_ascii_digit()))
        .ok_or_else(|| Error::Protocol(format!("malformed reply line: {line}")))?;
    if !matches!(line.as_bytes().get(3), None | Some(b' ' | b'-')) {
        return Err(Error::Protocol(format!("malformed reply line: {line}")));
    }
    digits
        .parse()
        .map(ReplyCode)
        .map_err(|_| Error::Protocol(format!("invalid reply code: {digits}")))
}

/// SMTP reply code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ReplyCode(u16);

impl ReplyCode {
    /// 220 Service ready
    pub const SERVICE_READY: Self = Self(220);
    /// 221 Closing transmission channel
    pub const CLOSING: Self = Self(221);
    /// 235 Authentication succeeded
    pub const AUTH_SUCCEEDED: Self = Self(235);
    /// 250 Requested action completed
    pub const OK: Self = Self(250);
    /// 334 Continue with authentication
    pub const AUTH_CONTINUE: Self = Self(334);
    /// 354 Start mail input
    pub const START_DATA: Self = Self(354);

    /// Creates a reply code.
    #[must_use]
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Returns the numeric code.
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// Returns true for 2xx codes.
    #[must_use]
    pub const fn is_success(self) -> bool {
        self.0 >= 200 && self.0 < 300
    }
}

impl fmt::Display for ReplyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_single_line() {
        let reply = Reply::from_lines(&lines(&["250 OK"])).unwrap();
        assert_eq!(reply.code, ReplyCode::OK);
        assert_eq!(reply.lines, vec!["OK"]);
        assert!(reply.is_success());
    }

    #[test]
    fn test_multi_line() {
        let reply =
            Reply::from_lines(&lines(&["250-mx.example.com", "250-SIZE 1000", "250 SMTPUTF8"]))
                .unwrap();
        assert_eq!(reply.lines, vec!["mx.example.com", "SIZE 1000", "SMTPUTF8"]);
        assert_eq!(reply.text(), "mx.example.com\nSIZE 1000\nSMTPUTF8");
    }

    #[test]
    fn test_bare_code() {
        let reply = Reply::from_lines(&lines(&["354"])).unwrap();
        assert_eq!(reply.code, ReplyCode::START_DATA);
        assert_eq!(reply.lines, vec![""]);
    }

    #[test]
    fn test_malformed() {
        assert!(Reply::from_lines(&[]).is_err());
        assert!(Reply::from_lines(&lines(&["25"])).is_err());
        assert!(Reply::from_lines(&lines(&["ABC OK"])).is_err());
        assert!(Reply::from_lines(&lines(&["250xOK"])).is_err());
        assert!(Reply::from_lines(&lines(&["250-a", "251 b"])).is_err());
    }

    #[test]
    fn test_last_line() {
        assert!(is_last_line("250 OK"));
        assert!(is_last_line("250"));
        assert!(!is_last_line("250-more"));
    }

    #[test]
    fn test_require() {
        let reply = Reply::from_lines(&lines(&["550 no such user"])).unwrap();
        let error = reply.require_success().unwrap_err();
        assert!(error.is_permanent());
        assert_eq!(error.to_string(), "SMTP error 550: no such user");

        let reply = Reply::from_lines(&lines(&["250 OK"])).unwrap();
        assert!(reply.require(ReplyCode::START_DATA).is_err());
    }
}
