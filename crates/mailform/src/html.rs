//! Plain text extraction from HTML.
//!
//! This is a lossy fallback for messages that only have HTML content. The
//! text of every node is concatenated in document order with character
//! references resolved. No whitespace is added for block elements, so
//! `<p>a</p><p>b</p>` becomes `ab`.

/// Elements whose content is raw text rather than markup.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Extracts the text content of an HTML document.
///
/// Tags, attributes, comments, doctypes and processing instructions are
/// dropped. The content of `script` and `style` is kept as is.
#[must_use]
pub fn extract(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;

    while let Some(lt) = rest.find('<') {
        push_text(&mut out, &rest[..lt]);
        rest = &rest[lt..];

        let Some(markup) = Markup::scan(rest) else {
            // Not markup, keep the '<' as text
            out.push('<');
            rest = &rest[1..];
            continue;
        };

        rest = &rest[markup.len..];
        if let Some(name) = markup.raw_text_element {
            let end = find_end_tag(rest, name).unwrap_or(rest.len());
            out.push_str(&rest[..end]);
            rest = &rest[end..];
        }
    }

    push_text(&mut out, rest);
    out
}

/// A tag, comment or declaration at the start of the input.
struct Markup {
    len: usize,
    raw_text_element: Option<&'static str>,
}

impl Markup {
    /// Recognizes markup starting at `<`. Unterminated markup runs to the
    /// end of the input.
    fn scan(s: &str) -> Option<Self> {
        let after = &s[1..];
        let simple = |len| {
            Some(Self {
                len,
                raw_text_element: None,
            })
        };

        if let Some(body) = after.strip_prefix("!--") {
            let len = body.find("-->").map_or(s.len(), |i| 4 + i + 3);
            return simple(len);
        }
        if after.starts_with('!') || after.starts_with('?') {
            return simple(s.find('>').map_or(s.len(), |i| i + 1));
        }

        let is_end_tag = after.starts_with('/');
        let name_start = usize::from(is_end_tag);
        if !after[name_start..].starts_with(|c: char| c.is_ascii_alphabetic()) {
            return None;
        }

        let len = tag_end(s).map_or(s.len(), |i| i + 1);
        let name: String = after[name_start..]
            .chars()
            .take_while(|c| !c.is_whitespace() && *c != '/' && *c != '>')
            .collect();

        let raw_text_element = if is_end_tag || s[..len].ends_with("/>") {
            None
        } else {
            RAW_TEXT_ELEMENTS
                .iter()
                .find(|e| e.eq_ignore_ascii_case(&name))
                .copied()
        };

        Some(Self {
            len,
            raw_text_element,
        })
    }
}

/// Finds the `>` closing a tag, skipping quoted attribute values.
fn tag_end(s: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (i, c) in s.char_indices().skip(1) {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '>') => return Some(i),
            _ => {}
        }
    }
    None
}

/// Finds `</name` (any case) in raw text content.
fn find_end_tag(s: &str, name: &str) -> Option<usize> {
    let lower = s.to_ascii_lowercase();
    let needle = format!("</{name}");
    let mut from = 0;
    while let Some(i) = lower[from..].find(&needle) {
        let at = from + i;
        let next = lower[at + needle.len()..].chars().next();
        if next.is_none_or(|c| c.is_whitespace() || c == '>' || c == '/') {
            return Some(at);
        }
        from = at + needle.len();
    }
    None
}

/// Appends text with character references resolved.
fn push_text(out: &mut String, text: &str) {
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        match decode_reference(&rest[1..]) {
            Some((decoded, len)) => {
                out.push_str(&decoded);
                rest = &rest[1 + len..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
}

/// Decodes the character reference following an `&`.
///
/// Returns the replacement text and the number of bytes consumed after
/// the `&`.
fn decode_reference(body: &str) -> Option<(String, usize)> {
    if let Some(numeric) = body.strip_prefix('#') {
        let (digits, radix, prefix) = match numeric.strip_prefix(['x', 'X']) {
            Some(hex) => (hex, 16, 2),
            None => (numeric, 10, 1),
        };
        let len = digits
            .find(|c: char| !c.is_digit(radix))
            .unwrap_or(digits.len());
        if len == 0 {
            return None;
        }
        let value = u32::from_str_radix(&digits[..len], radix).unwrap_or(u32::MAX);
        let c = char::from_u32(value)
            .filter(|c| *c != '\0')
            .unwrap_or(char::REPLACEMENT_CHARACTER);
        let semicolon = usize::from(digits[len..].starts_with(';'));
        return Some((c.to_string(), prefix + len + semicolon));
    }

    let len = body
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(body.len());
    let name = &body[..len];

    if body[len..].starts_with(';')
        && let Some(decoded) = named_reference(name)
    {
        return Some((decoded, len + 1));
    }

    // Legacy names also match as the longest prefix of a longer run
    (2..=len).rev().find_map(|end| {
        let prefix = &name[..end];
        LEGACY_WITHOUT_SEMICOLON
            .contains(&prefix)
            .then(|| named_reference(prefix))
            .flatten()
            .map(|decoded| (decoded, end))
    })
}

/// Named references that are recognized without a trailing semicolon.
const LEGACY_WITHOUT_SEMICOLON: &[&str] = &[
    "AElig", "AMP", "Aacute", "Acirc", "Agrave", "Aring", "Atilde", "Auml", "COPY", "Ccedil",
    "ETH", "Eacute", "Ecirc", "Egrave", "Euml", "GT", "Iacute", "Icirc", "Igrave", "Iuml", "LT",
    "Ntilde", "Oacute", "Ocirc", "Ograve", "Oslash", "Otilde", "Ouml", "QUOT", "REG", "THORN",
    "Uacute", "Ucirc", "Ugrave", "Uuml", "Yacute", "aacute", "acirc", "acute", "aelig",
    "agrave", "amp", "aring", "atilde", "auml", "brvbar", "ccedil", "cedil", "cent", "copy",
    "curren", "deg", "divide", "eacute", "ecirc", "egrave", "eth", "euml", "frac12", "frac14",
    "frac34", "gt", "iacute", "icirc", "iexcl", "igrave", "iquest", "iuml", "laquo", "lt",
    "macr", "micro", "middot", "nbsp", "not", "ntilde", "oacute", "ocirc", "ograve", "ordf",
    "ordm", "oslash", "otilde", "ouml", "para", "plusmn", "pound", "quot", "raquo", "reg",
    "sect", "shy", "sup1", "sup2", "sup3", "szlig", "thorn", "times", "uacute", "ucirc",
    "ugrave", "uml", "uuml", "yacute", "yen", "yuml",
];

/// Resolves `&name;` against the HTML5 named reference table.
fn named_reference(name: &str) -> Option<String> {
    if name.is_empty() {
        return None;
    }
    let reference = format!("&{name};");
    let decoded = html_escape::decode_html_entities(&reference);
    // A known name decodes to one or two code points
    (decoded != reference.as_str() && decoded.chars().count() <= 2).then(|| decoded.into_owned())
}
