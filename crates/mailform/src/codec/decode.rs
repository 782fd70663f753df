//! Document to message conversion.

use super::header;
use crate::address::{Address, parse_address_list};
use crate::address_list::AddressList;
use crate::attachment::{Attachment, AttachmentData};
use crate::error::{Error, Result};
use crate::message::Message;
use mailform_mime::{Body, Part};
use tracing::trace;

/// Reads a message from a document produced by [`encode`](super::encode).
///
/// The document must be one of:
///
/// - a `text/plain` part, or a part without content;
/// - a `multipart/alternative` with a `text/plain` part, then either a
///   `text/html` part or a `multipart/related` of a `text/html` part and
///   inline attachments;
/// - a `multipart/mixed` whose first child is one of the above, followed by
///   download attachments.
///
/// # Errors
///
/// Returns [`Error::StructuralDecode`] for any other shape,
/// [`Error::Encoding`] when text content is not valid in its charset, and
/// [`Error::AddressParse`] when From or Reply-To holds no address.
pub fn decode(document: &Part) -> Result<Message> {
    let mut message = Message::new();

    let body = if document.is_multipart_of("mixed") {
        let (body, downloads) = document
            .children()
            .split_first()
            .ok_or_else(|| Error::structural("mixed group has no body part"))?;
        for part in downloads {
            message.attachments.push(attachment(part)?);
        }
        body
    } else {
        document
    };

    if body.is_multipart_of("alternative") {
        let [text, html] = body.children() else {
            return Err(Error::structural(format!(
                "alternative group must have 2 parts, found {}",
                body.children().len()
            )));
        };
        message.text = non_empty(leaf_text(text, "plain")?);

        let html = if html.is_multipart_of("related") {
            let (html, inline) = html
                .children()
                .split_first()
                .ok_or_else(|| Error::structural("related group has no html part"))?;
            for part in inline {
                let mut attachment = attachment(part)?;
                if let Some(content_id) = part.content_id() {
                    attachment.set_content_id(content_id);
                }
                message.inline_attachments.push(attachment);
            }
            html
        } else {
            html
        };
        message.html = non_empty(leaf_text(html, "html")?);
    } else if !body.is_empty() {
        message.text = non_empty(leaf_text(body, "plain")?);
    }

    message.subject = document.header(header::SUBJECT).map(str::to_string);
    if let Some(from) = single_address(document, header::FROM)? {
        message.set_from_addr(from);
    }
    if let Some(reply_to) = single_address(document, header::REPLY_TO)? {
        message.set_reply_to(reply_to);
    }
    message.set_to(address_list(document, header::TO));
    message.set_cc(address_list(document, header::CC));
    message.set_bcc(address_list(document, header::BCC));

    trace!(
        attachments = message.attachments.len(),
        inline_attachments = message.inline_attachments.len(),
        "Decoded message"
    );

    Ok(message)
}

/// Returns the text of a `text/<sub_type>` leaf.
fn leaf_text(part: &Part, sub_type: &str) -> Result<String> {
    expect_leaf(part)?;
    let content_type = part.content_type()?;
    if !content_type.is("text", sub_type) {
        return Err(Error::structural(format!(
            "expected text/{sub_type}, found {}",
            content_type.essence()
        )));
    }

    match &part.body {
        Body::Empty => Ok(String::new()),
        _ => part
            .text_content()
            .map(|text| text.into_owned())
            .map_err(|e| Error::Encoding(e.to_string())),
    }
}

fn expect_leaf(part: &Part) -> Result<()> {
    if matches!(part.body, Body::Multipart(_)) {
        let essence = part
            .content_type()
            .map_or_else(|_| "multipart".to_string(), |ct| ct.essence());
        return Err(Error::structural(format!(
            "unexpected {essence} where a single part was expected"
        )));
    }
    Ok(())
}

/// Rebuilds an attachment from a leaf part.
fn attachment(part: &Part) -> Result<Attachment> {
    expect_leaf(part)?;
    let content_type = part.content_type()?;

    let data = match &part.body {
        Body::Text(text) => AttachmentData::Text(text.clone()),
        Body::Binary(_) if content_type.is_text() => AttachmentData::Text(
            part.text_content()
                .map_err(|e| Error::Encoding(e.to_string()))?
                .into_owned(),
        ),
        Body::Binary(bytes) => AttachmentData::Binary(bytes.clone()),
        Body::Empty if content_type.is_text() => AttachmentData::Text(String::new()),
        Body::Empty | Body::Multipart(_) => AttachmentData::Binary(Vec::new()),
    };

    let mut builder = Attachment::builder(data).mimetype(content_type.essence());
    if let Some(filename) = part.filename() {
        builder = builder.filename(filename);
    }
    Ok(builder.build())
}

/// Reads a header that must hold exactly one address when present.
fn single_address(document: &Part, name: &str) -> Result<Option<Address>> {
    let Some(value) = document.header(name).filter(|v| !v.trim().is_empty()) else {
        return Ok(None);
    };
    parse_address_list(value)
        .into_iter()
        .next()
        .map(Some)
        .ok_or_else(|| Error::AddressParse(format!("{name} header has no address: {value}")))
}

fn address_list(document: &Part, name: &str) -> AddressList {
    document
        .headers
        .get_all(name)
        .into_iter()
        .flat_map(parse_address_list)
        .collect()
}

fn non_empty(text: String) -> Option<String> {
    (!text.is_empty()).then_some(text)
}
