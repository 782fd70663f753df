//! Wire format tests for `mailform-mime`.

#![allow(clippy::unwrap_used)]

use mailform_mime::{Body, Part};
use proptest::prelude::*;

proptest! {
    #[test]
    fn text_survives_the_wire(text in "[^\r]{0,300}") {
        let doc = Part::text("plain", text.clone());
        let parsed = Part::parse(&doc.to_bytes()).unwrap();
        prop_assert_eq!(parsed.body, Body::Text(text));
    }

    #[test]
    fn bytes_survive_the_wire(data in proptest::collection::vec(any::<u8>(), 0..512)) {
        let doc = Part::multipart(
            "mixed",
            vec![Part::text("plain", "body"), Part::binary("application", "octet-stream", data.clone())],
        );
        let parsed = Part::parse(&doc.to_bytes()).unwrap();
        prop_assert_eq!(parsed.children().len(), 2);
        prop_assert_eq!(&parsed.children()[1].body, &Body::Binary(data));
    }

    #[test]
    fn subject_survives_the_wire(subject in "[^\r\n]{1,120}") {
        let mut doc = Part::text("plain", "x");
        doc.set_header("Subject", subject.trim());
        let parsed = Part::parse(&doc.to_bytes()).unwrap();
        prop_assert_eq!(parsed.header("subject"), Some(subject.trim()));
    }
}

#[test]
fn crlf_in_source_text_is_normalized() {
    let doc = Part::text("plain", "one\r\ntwo");
    let parsed = Part::parse(&doc.to_bytes()).unwrap();
    assert_eq!(parsed.body, Body::Text("one\ntwo".to_string()));
}
