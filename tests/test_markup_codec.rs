// Integration tests for the markup codec
// Decodes markup through the public API and checks the encode/decode pairing

use mentionkit::config::defaults::default_registry;
use mentionkit::{MentionDirectory, MentionObject, MentionSyntax, SyntaxRegistry, decode, encode};
use rstest::rstest;

fn directory() -> MentionDirectory {
    let mut directory = MentionDirectory::new();
    directory.insert("user", MentionObject::new("42", "Amber"));
    directory.insert("user", MentionObject::new("bob", "Bob"));
    directory.insert("tag", MentionObject::new("rust", "rust"));
    directory
}

fn two_syntax_registry() -> SyntaxRegistry {
    SyntaxRegistry::new([
        MentionSyntax::new("user", '@'),
        MentionSyntax::new("tag", '#').with_delimiters("[[", "]]"),
    ])
}

/// Re-encoding decoded markup gives back the same markup when every id resolves
#[rstest]
#[case::plain("no mentions at all")]
#[case::single("Hello <###@42###>")]
#[case::adjacent("<###@42###><###@bob###>")]
#[case::surrounded("cc <###@bob###>, <###@42###> and [[#rust]]!")]
#[case::multibyte("café ☕ <###@bob###> ünïcödé")]
fn decode_then_encode_reproduces_markup(#[case] markup: &str) {
    let decoded = decode(markup, &two_syntax_registry(), &directory());
    assert_eq!(encode(&decoded.text, &decoded.spans), markup);
}

#[test]
fn every_decoded_span_reads_as_its_display_text() {
    let decoded = decode(
        "ñ <###@42###> and [[#rust]] or <###@ghost###>",
        &two_syntax_registry(),
        &directory(),
    );

    assert_eq!(decoded.text, "ñ @Amber and #rust or @Unknown");
    assert_eq!(decoded.spans.len(), 3);
    for span in &decoded.spans {
        assert!(
            span.is_valid_in(&decoded.text),
            "span {:?} does not match the buffer",
            span
        );
    }
    assert!(
        decoded
            .spans
            .windows(2)
            .all(|pair| pair[0].end <= pair[1].start)
    );
}

/// Unresolved ids display the missing text but keep their id for re-encoding
#[test]
fn unresolved_id_survives_round_trip() {
    let registry = default_registry();
    let decoded = decode("hi <###@nobody###>", &registry, &MentionDirectory::new());
    assert_eq!(decoded.text, "hi @Unknown");
    assert_eq!(decoded.spans[0].id, "nobody");
    assert_eq!(
        encode(&decoded.text, &decoded.spans),
        "hi <###@nobody###>"
    );
}

#[rstest]
#[case::unterminated("hi <###@42")]
#[case::bad_id_char("hi <###@4 2###>")]
#[case::empty_id("hi <###@###>")]
#[case::wrong_trigger("hi <####42###>")]
fn malformed_markup_passes_through_as_text(#[case] markup: &str) {
    let decoded = decode(markup, &default_registry(), &directory());
    assert_eq!(decoded.text, markup);
    assert!(decoded.spans.is_empty());
}

#[test]
fn decoded_document_snapshot() {
    let decoded = decode(
        "Hi <###@42###>, meet <###@7###>!",
        &default_registry(),
        &directory(),
    );
    insta::assert_json_snapshot!("decoded_document", decoded);
}
