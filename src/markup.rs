//! Markup codec: markup text <-> (plain text, ordered spans).
//!
//! Decoding replaces each well-formed `prefix + trigger + id + suffix` run with
//! `trigger + display name` and records a span for it. Anything that does not
//! match is copied through verbatim, so corrupt markup shows up as visible
//! text instead of failing the decode.

use crate::mention::{MentionResolver, MentionSpan};
use crate::syntax::SyntaxRegistry;
use crate::text::offsets::char_to_byte;
use log::{debug, trace};
use serde::Serialize;

/// Result of decoding markup
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Decoded {
    pub text: String,
    pub spans: Vec<MentionSpan>,
}

/// Decode `markup` into plain text and spans.
pub fn decode<R>(markup: &str, registry: &SyntaxRegistry, resolver: &R) -> Decoded
where
    R: MentionResolver + ?Sized,
{
    let lead_chars: Vec<char> = registry
        .iter()
        .map(|syntax| {
            syntax
                .prefix()
                .chars()
                .next()
                .unwrap_or(syntax.starting_character())
        })
        .collect();

    let mut text = String::with_capacity(markup.len());
    let mut text_chars = 0;
    let mut spans = Vec::new();
    let mut plain_start = 0;
    let mut pos = 0;

    while let Some(ch) = markup[pos..].chars().next() {
        if lead_chars.contains(&ch)
            && let Some(found) = registry.match_at(markup, pos)
        {
            let plain = &markup[plain_start..pos];
            text.push_str(plain);
            text_chars += plain.chars().count();

            let display_name = match resolver.resolve(&found.syntax, &found.id) {
                Some(object) => object.display_name,
                None => {
                    trace!(
                        target: "mentionkit::markup",
                        "Unresolved {} id '{}', using missing text",
                        found.syntax.name(),
                        found.id
                    );
                    found.syntax.missing_text().to_string()
                }
            };

            let span = MentionSpan::new(found.id, &display_name, text_chars, found.syntax);
            text.push_str(&span.display_text);
            text_chars = span.end;
            spans.push(span);

            pos += found.matched_len;
            plain_start = pos;
            continue;
        }
        pos += ch.len_utf8();
    }
    text.push_str(&markup[plain_start..]);

    debug!(
        target: "mentionkit::markup",
        "Decoded {} mention(s) from {} bytes of markup",
        spans.len(),
        markup.len()
    );
    Decoded { text, spans }
}

/// Encode plain text and its spans back into markup.
///
/// `spans` must be sorted by `start`. A span that overlaps its predecessor or
/// points past the end of `text` is left as plain text.
pub fn encode(text: &str, spans: &[MentionSpan]) -> String {
    let mut out = String::with_capacity(text.len() + spans.len() * 16);
    let mut cursor_byte = 0;

    for span in spans {
        let (Some(start), Some(end)) = (char_to_byte(text, span.start), char_to_byte(text, span.end))
        else {
            continue;
        };
        if start < cursor_byte || end < start {
            continue;
        }
        out.push_str(&text[cursor_byte..start]);
        out.push_str(&span.syntax.encode(&span.id));
        cursor_byte = end;
    }
    out.push_str(&text[cursor_byte..]);
    out
}
