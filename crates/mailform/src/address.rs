//! Email addresses with IDNA-normalized domains.

use mailform_mime::encoding::{encode_rfc2047, needs_rfc2047};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Characters that force a display name to be quoted.
const SPECIALS: &[char] = &['(', ')', '<', '>', '[', ']', ':', ';', '@', '\\', ',', '.', '"'];

/// A mailbox: optional display name, username and domain.
///
/// The domain is always ASCII. Non-ASCII domains are IDNA encoded when the
/// address is created, so `a@bücher.example` and `a@xn--bcher-kva.example`
/// are the same address. Equality and hashing compare all three fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address {
    display_name: Option<String>,
    username: String,
    domain: String,
}

impl Address {
    /// Creates an address from its parts, encoding the domain if needed.
    ///
    /// An empty display name is stored as no display name.
    #[must_use]
    pub fn new(
        display_name: impl Into<String>,
        username: impl Into<String>,
        domain: impl AsRef<str>,
    ) -> Self {
        let display_name = display_name.into();
        Self {
            display_name: (!display_name.is_empty()).then_some(display_name),
            username: username.into(),
            domain: encode_domain(domain.as_ref()),
        }
    }

    /// Parses `Name <user@domain>` or `user@domain` leniently.
    ///
    /// Never fails: input that cannot be understood produces empty fields.
    /// The address is split at the last `@`. Without an `@` the username is
    /// empty and the whole address becomes the domain.
    #[must_use]
    pub fn parse(input: &str) -> Self {
        let (name, addr_spec) = split_mailbox(input);
        let (username, domain) = addr_spec.rsplit_once('@').unwrap_or(("", addr_spec.as_str()));
        Self::new(name, username, domain)
    }

    /// Returns the display name.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// Returns the part before the `@`.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns the ASCII domain.
    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Returns `username@domain`, without the display name.
    #[must_use]
    pub fn addr_spec(&self) -> String {
        match (self.username.is_empty(), self.domain.is_empty()) {
            (_, true) => self.username.clone(),
            (true, false) => self.domain.clone(),
            (false, false) => format!("{}@{}", self.username, self.domain),
        }
    }

    /// Returns true if every field is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.display_name.is_none() && self.username.is_empty() && self.domain.is_empty()
    }
}

/// Formats the address for a header.
///
/// Display names with non-ASCII text or control characters are written as
/// RFC 2047 encoded-words, so a display name never adds a line break.
impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let addr_spec = self.addr_spec();
        match &self.display_name {
            None => f.write_str(&addr_spec),
            Some(name) if needs_rfc2047(name) => {
                let encoded = encode_rfc2047(name, "utf-8").replace("\r\n ", " ");
                write!(f, "{encoded} <{addr_spec}>")
            }
            Some(name) if name.contains(SPECIALS) || name.trim() != name => {
                let escaped = name.replace('\\', "\\\\").replace('"', "\\\"");
                write!(f, "\"{escaped}\" <{addr_spec}>")
            }
            Some(name) => write!(f, "{name} <{addr_spec}>"),
        }
    }
}

impl FromStr for Address {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

/// Values that can be turned into a normalized [`Address`].
///
/// Implemented for strings, which are parsed leniently, and for addresses.
pub trait IntoAddress {
    /// Converts into a normalized address.
    fn into_address(self) -> Address;
}

impl IntoAddress for Address {
    fn into_address(self) -> Address {
        // Already normalized by construction
        self
    }
}

impl IntoAddress for &Address {
    fn into_address(self) -> Address {
        self.clone()
    }
}

impl IntoAddress for &str {
    fn into_address(self) -> Address {
        Address::parse(self)
    }
}

impl IntoAddress for String {
    fn into_address(self) -> Address {
        Address::parse(&self)
    }
}

impl IntoAddress for &String {
    fn into_address(self) -> Address {
        Address::parse(self)
    }
}

/// Normalizes a string or address into an [`Address`].
///
/// Normalizing an already normalized value returns it unchanged.
pub fn normalize(value: impl IntoAddress) -> Address {
    value.into_address()
}

/// Parses every address in a header value such as `a@x, "B" <b@y>`.
///
/// Commas inside quotes, comments and angle brackets do not separate
/// addresses. Group syntax (`team: a@x, b@y;`) contributes its members.
#[must_use]
pub fn parse_address_list(value: &str) -> Vec<Address> {
    split_top_level(value)
        .into_iter()
        .filter(|member| !member.trim().is_empty())
        .map(Address::parse)
        .collect()
}

/// Encodes a domain to ASCII.
///
/// ASCII domains are returned unchanged. Others go through IDNA, which
/// also lowercases their ASCII labels (`Bücher.EXAMPLE` becomes
/// `xn--bcher-kva.example`). If IDNA rejects the domain, each non-ASCII
/// label is punycode encoded on its own and ASCII labels keep their case.
pub(crate) fn encode_domain(domain: &str) -> String {
    if domain.is_ascii() {
        return domain.to_string();
    }

    match idna::domain_to_ascii(domain) {
        Ok(ascii) => ascii,
        Err(error) => {
            warn!(domain, ?error, "IDNA rejected domain, encoding labels directly");
            domain.split('.').map(encode_label).collect::<Vec<_>>().join(".")
        }
    }
}

fn encode_label(label: &str) -> String {
    if label.is_ascii() {
        return label.to_string();
    }
    idna::punycode::encode_str(label).map_or_else(
        || label.escape_unicode().to_string(),
        |encoded| format!("xn--{encoded}"),
    )
}

/// Splits on commas and group delimiters outside quotes, comments and
/// angle brackets. Group display names (`name:`) are dropped.
fn split_top_level(value: &str) -> Vec<&str> {
    let mut members = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut escaped = false;
    let mut comment_depth = 0usize;
    let mut in_angle = false;

    for (i, c) in value.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_quotes || comment_depth > 0 => escaped = true,
            '"' if comment_depth == 0 => in_quotes = !in_quotes,
            _ if in_quotes => {}
            '(' => comment_depth += 1,
            ')' => comment_depth = comment_depth.saturating_sub(1),
            _ if comment_depth > 0 => {}
            '<' => in_angle = true,
            '>' => in_angle = false,
            _ if in_angle => {}
            ',' | ';' => {
                members.push(&value[start..i]);
                start = i + 1;
            }
            ':' => start = i + 1,
            _ => {}
        }
    }
    members.push(&value[start..]);
    members
}

/// Which buffer a mailbox character belongs to.
#[derive(Clone, Copy)]
enum Segment {
    Phrase,
    Angle,
    Comment,
}

/// Splits a single mailbox into its display name and addr-spec.
///
/// More than one address in the input yields empty fields.
fn split_mailbox(input: &str) -> (String, String) {
    let members: Vec<&str> = split_top_level(input)
        .into_iter()
        .filter(|m| !m.trim().is_empty())
        .collect();
    let [mailbox] = members.as_slice() else {
        return (String::new(), String::new());
    };

    let mut buffers = [String::new(), String::new(), String::new()];
    let mut has_angle = false;
    let mut angle_open = false;
    let mut in_quotes = false;
    let mut escaped = false;
    let mut comment_depth = 0usize;

    for c in mailbox.chars() {
        let segment = if comment_depth > 0 {
            Segment::Comment
        } else if angle_open {
            Segment::Angle
        } else {
            Segment::Phrase
        };
        let buffer = &mut buffers[segment as usize];

        if escaped {
            buffer.push(c);
            escaped = false;
            continue;
        }

        match c {
            '\\' if comment_depth > 0 => escaped = true,
            '\\' if in_quotes => {
                buffer.push(c);
                escaped = true;
            }
            '"' if comment_depth == 0 => {
                in_quotes = !in_quotes;
                buffer.push(c);
            }
            _ if in_quotes => buffer.push(c),
            '(' => {
                if comment_depth > 0 {
                    buffer.push(c);
                }
                comment_depth += 1;
            }
            ')' if comment_depth > 0 => {
                comment_depth -= 1;
                if comment_depth > 0 {
                    buffer.push(c);
                }
            }
            _ if comment_depth > 0 => buffer.push(c),
            '<' if !has_angle => {
                has_angle = true;
                angle_open = true;
            }
            '>' if angle_open => angle_open = false,
            _ => buffer.push(c),
        }
    }

    let [phrase, angle, comment] = buffers;
    let decode = |name: &str| {
        let name = unquote(name.trim());
        mailform_mime::encoding::decode_rfc2047(&name).unwrap_or(name)
    };

    if has_angle {
        let name = if phrase.trim().is_empty() { &comment } else { &phrase };
        (decode(name), strip_route(&strip_unquoted_whitespace(&angle)))
    } else {
        (decode(&comment), strip_unquoted_whitespace(&phrase))
    }
}

/// Drops an obsolete source route such as `@relay:user@domain`.
fn strip_route(addr: &str) -> String {
    if addr.starts_with('@') {
        if let Some((_, rest)) = addr.rsplit_once(':') {
            return rest.to_string();
        }
    }
    addr.to_string()
}

fn strip_unquoted_whitespace(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_quotes = false;
    let mut escaped = false;
    for c in s.chars() {
        if escaped {
            escaped = false;
        } else if c == '\\' && in_quotes {
            escaped = true;
        } else if c == '"' {
            in_quotes = !in_quotes;
        } else if c.is_whitespace() && !in_quotes {
            continue;
        }
        out.push(c);
    }
    out
}

/// Removes quoting from a display name.
fn unquote(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' => {}
            '\\' => {
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            _ => out.push(c),
        }
    }
    out
}
