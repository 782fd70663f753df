//! The message model.

use crate::address::{Address, IntoAddress};
use crate::address_list::AddressList;
use crate::attachment::Attachment;
use crate::codec;
use crate::error::Result;
use mailform_mime::Part;

/// The common parts of an email: text and HTML content, addresses, and
/// downloadable and inline attachments.
///
/// Addresses can be given as strings (`user@domain` or
/// `Name <user@domain>`) or as [`Address`] values. They are normalized when
/// set, which IDNA encodes non-ASCII domains. Usernames are kept as given;
/// sending non-ASCII usernames needs a server with `SMTPUTF8`.
///
/// Empty strings count as unset for `subject`, `text` and `html`. If only
/// `html` is set, the text content is extracted from it when encoding.
/// Inline attachments are only used when `html` is set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    /// The subject line.
    pub subject: Option<String>,
    /// The plain text content.
    pub text: Option<String>,
    /// The HTML content.
    pub html: Option<String>,
    /// Files shown as downloads, separate from the content.
    pub attachments: Vec<Attachment>,
    /// Files referenced from the HTML content by content-id.
    pub inline_attachments: Vec<Attachment>,
    from_addr: Option<Address>,
    reply_to: Option<Address>,
    to: AddressList,
    cc: AddressList,
    bcc: AddressList,
}

impl Message {
    /// Creates an empty message.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the sender shown to recipients.
    #[must_use]
    pub const fn from_addr(&self) -> Option<&Address> {
        self.from_addr.as_ref()
    }

    /// Sets the sender. An empty value clears it.
    pub fn set_from_addr(&mut self, value: impl IntoAddress) {
        self.from_addr = non_empty(value);
    }

    /// Clears the sender.
    pub fn clear_from_addr(&mut self) {
        self.from_addr = None;
    }

    /// Returns the address replies should go to instead of the sender.
    #[must_use]
    pub const fn reply_to(&self) -> Option<&Address> {
        self.reply_to.as_ref()
    }

    /// Sets the reply address. An empty value clears it.
    pub fn set_reply_to(&mut self, value: impl IntoAddress) {
        self.reply_to = non_empty(value);
    }

    /// Clears the reply address.
    pub fn clear_reply_to(&mut self) {
        self.reply_to = None;
    }

    /// Returns the primary recipients.
    #[must_use]
    pub const fn to(&self) -> &AddressList {
        &self.to
    }

    /// Returns the primary recipients for editing.
    pub const fn to_mut(&mut self) -> &mut AddressList {
        &mut self.to
    }

    /// Replaces the primary recipients.
    pub fn set_to<I>(&mut self, values: I)
    where
        I: IntoIterator,
        I::Item: IntoAddress,
    {
        self.to.replace_all(values);
    }

    /// Returns the secondary recipients.
    #[must_use]
    pub const fn cc(&self) -> &AddressList {
        &self.cc
    }

    /// Returns the secondary recipients for editing.
    pub const fn cc_mut(&mut self) -> &mut AddressList {
        &mut self.cc
    }

    /// Replaces the secondary recipients.
    pub fn set_cc<I>(&mut self, values: I)
    where
        I: IntoIterator,
        I::Item: IntoAddress,
    {
        self.cc.replace_all(values);
    }

    /// Returns the hidden recipients.
    ///
    /// Prefer these over `to` and `cc` for mass email, since hidden
    /// recipients cannot reply to each other.
    #[must_use]
    pub const fn bcc(&self) -> &AddressList {
        &self.bcc
    }

    /// Returns the hidden recipients for editing.
    pub const fn bcc_mut(&mut self) -> &mut AddressList {
        &mut self.bcc
    }

    /// Replaces the hidden recipients.
    pub fn set_bcc<I>(&mut self, values: I)
    where
        I: IntoIterator,
        I::Item: IntoAddress,
    {
        self.bcc.replace_all(values);
    }

    /// Sets the subject.
    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Sets the text content.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Sets the HTML content.
    #[must_use]
    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.html = Some(html.into());
        self
    }

    /// Sets the sender.
    #[must_use]
    pub fn with_from_addr(mut self, value: impl IntoAddress) -> Self {
        self.set_from_addr(value);
        self
    }

    /// Sets the reply address.
    #[must_use]
    pub fn with_reply_to(mut self, value: impl IntoAddress) -> Self {
        self.set_reply_to(value);
        self
    }

    /// Sets the primary recipients.
    #[must_use]
    pub fn with_to<I>(mut self, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: IntoAddress,
    {
        self.set_to(values);
        self
    }

    /// Sets the secondary recipients.
    #[must_use]
    pub fn with_cc<I>(mut self, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: IntoAddress,
    {
        self.set_cc(values);
        self
    }

    /// Sets the hidden recipients.
    #[must_use]
    pub fn with_bcc<I>(mut self, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: IntoAddress,
    {
        self.set_bcc(values);
        self
    }

    /// Adds a download attachment.
    #[must_use]
    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Adds an inline attachment.
    #[must_use]
    pub fn with_inline_attachment(mut self, attachment: Attachment) -> Self {
        self.inline_attachments.push(attachment);
        self
    }

    /// Builds the MIME document for this message. See [`codec::encode`].
    #[must_use]
    pub fn to_document(&self) -> Part {
        codec::encode(self)
    }

    /// Reads a message from a MIME document. See [`codec::decode`].
    ///
    /// # Errors
    ///
    /// Returns an error if the document does not have one of the shapes
    /// produced by encoding.
    pub fn from_document(document: &Part) -> Result<Self> {
        codec::decode(document)
    }
}

fn non_empty(value: impl IntoAddress) -> Option<Address> {
    Some(value.into_address()).filter(|address| !address.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_address_fields_normalize() {
        let mut message = Message::new()
            .with_from_addr("Sender <s@bücher.example>")
            .with_to(["a@bücher.example", "b@example.com"]);

        assert_eq!(
            message.from_addr().unwrap().domain(),
            "xn--bcher-kva.example"
        );
        assert!(message.to().contains("a@xn--bcher-kva.example"));

        message.to_mut().push("c@bücher.example");
        assert_eq!(message.to()[2].domain(), "xn--bcher-kva.example");
    }

    #[test]
    fn test_empty_value_clears() {
        let mut message = Message::new().with_reply_to("r@example.com");
        assert!(message.reply_to().is_some());
        message.set_reply_to("");
        assert!(message.reply_to().is_none());

        message.set_from_addr("f@example.com");
        message.clear_from_addr();
        assert!(message.from_addr().is_none());
    }

    #[test]
    fn test_setters_replace_contents() {
        let mut message = Message::new().with_cc(["a@example.com", "b@example.com"]);
        message.set_cc(["c@bücher.example"]);
        assert_eq!(message.cc().len(), 1);
        assert_eq!(message.cc()[0].addr_spec(), "c@xn--bcher-kva.example");

        message.set_bcc(Vec::<String>::new());
        assert!(message.bcc().is_empty());
    }
}
