//! Envelope sender and recipients of a document.

use mailform::mime::Part;
use mailform::parse_address_list;

const RECIPIENT_HEADERS: [&str; 3] = ["To", "CC", "BCC"];

/// Who a transaction is from and to, apart from the headers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Envelope {
    /// Reverse path; empty for the null sender.
    pub from: String,
    /// Forward paths, in header order.
    pub recipients: Vec<String>,
}

impl Envelope {
    /// Reads the envelope from a document's headers.
    ///
    /// The sender is the first address of `Sender`, else of `From`, else
    /// `default_from`. Recipients are every address of `To`, `CC` and `BCC`.
    #[must_use]
    pub fn from_document(document: &Part, default_from: Option<&str>) -> Self {
        let from = ["Sender", "From"]
            .into_iter()
            .find_map(|name| first_address(document, name))
            .or_else(|| default_from.map(str::to_string))
            .unwrap_or_default();

        let recipients = RECIPIENT_HEADERS
            .into_iter()
            .flat_map(|name| document.headers.get_all(name))
            .flat_map(parse_address_list)
            .map(|address| address.addr_spec())
            .collect();

        Self { from, recipients }
    }

    /// Splits the recipients into envelopes of at most `size` recipients.
    ///
    /// A size of zero keeps a single envelope.
    #[must_use]
    pub fn batched(&self, size: usize) -> Vec<Self> {
        if size == 0 || self.recipients.len() <= size {
            return vec![self.clone()];
        }
        self.recipients
            .chunks(size)
            .map(|chunk| Self {
                from: self.from.clone(),
                recipients: chunk.to_vec(),
            })
            .collect()
    }

    /// Returns true if any path has non-ASCII characters.
    #[must_use]
    pub fn needs_smtputf8(&self) -> bool {
        !self.from.is_ascii() || self.recipients.iter().any(|r| !r.is_ascii())
    }
}

fn first_address(document: &Part, name: &str) -> Option<String> {
    document
        .headers
        .get_all(name)
        .into_iter()
        .flat_map(parse_address_list)
        .map(|address| address.addr_spec())
        .find(|spec| !spec.is_empty())
}

/// Returns the bytes to transmit: the document without its BCC header.
#[must_use]
pub fn transmitted_bytes(document: &Part) -> Vec<u8> {
    if document.headers.contains("BCC") {
        let mut document = document.clone();
        document.headers.remove("BCC");
        document.to_bytes()
    } else {
        document.to_bytes()
    }
}
