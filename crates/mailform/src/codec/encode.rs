//! Message to document conversion.

use super::header;
use crate::html;
use crate::message::Message;
use mailform_mime::{Headers, Part};
use tracing::debug;

/// Builds the MIME document for a message.
///
/// Message headers are only set for non-empty fields. The text body is
/// `text`, or the text extracted from `html` when there is no `text`. With
/// `html`, the body is an alternative group of the text and the HTML, and
/// inline attachments turn the HTML into a related group. Download
/// attachments wrap the body in a mixed group.
#[must_use]
pub fn encode(message: &Message) -> Part {
    let mut document = body(message);

    if !message.attachments.is_empty() {
        let mut mixed = Part::multipart("mixed", vec![document]);
        for attachment in &message.attachments {
            attachment.render(&mut mixed, false);
        }
        document = mixed;
    }

    let mut headers = message_headers(message);
    headers.append(std::mem::take(&mut document.headers));
    document.headers = headers;

    debug!(
        attachments = message.attachments.len(),
        inline_attachments = message.inline_attachments.len(),
        has_html = non_empty(message.html.as_deref()).is_some(),
        "Encoded message"
    );

    document
}

/// Builds the body: a text leaf, an alternative group, or an empty part.
fn body(message: &Message) -> Part {
    let html = non_empty(message.html.as_deref());
    let text = non_empty(message.text.as_deref());

    let Some(html) = html else {
        return text.map_or_else(Part::new, |text| Part::text("plain", text));
    };

    let text = text.map_or_else(|| html::extract(html), str::to_string);
    let mut html_part = Part::text("html", html);
    for attachment in &message.inline_attachments {
        attachment.render(&mut html_part, true);
    }

    Part::multipart("alternative", vec![Part::text("plain", text), html_part])
}

fn message_headers(message: &Message) -> Headers {
    let mut headers = Headers::new();

    if let Some(subject) = non_empty(message.subject.as_deref()) {
        headers.add(header::SUBJECT, subject);
    }
    if let Some(from) = message.from_addr() {
        headers.add(header::FROM, from.to_string());
    }
    if let Some(reply_to) = message.reply_to() {
        headers.add(header::REPLY_TO, reply_to.to_string());
    }
    for (name, list) in [
        (header::TO, message.to()),
        (header::CC, message.cc()),
        (header::BCC, message.bcc()),
    ] {
        if !list.is_empty() {
            headers.add(name, list.to_string());
        }
    }

    headers
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
