//! Mention objects, live spans over the plain-text buffer, and id resolution.

use crate::syntax::MentionSyntax;
use crate::text::offsets::{char_to_byte, slice_chars};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;
use std::sync::Arc;

/// An externally owned entity that can be mentioned.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MentionObject {
    pub id: String,
    pub display_name: String,
    /// Arbitrary data carried for the host; never read by the engine
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl MentionObject {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            metadata: serde_json::Map::new(),
        }
    }
}

/// A mention annotation over the current plain-text buffer.
///
/// `start` and `end` are half-open character offsets. While the span is valid,
/// the buffer characters in `[start, end)` equal `display_text`, which
/// includes the leading starting character (e.g. `@Bob`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MentionSpan {
    pub id: String,
    pub display_text: String,
    pub start: usize,
    pub end: usize,
    #[serde(serialize_with = "serialize_syntax_name")]
    pub syntax: Arc<MentionSyntax>,
}

fn serialize_syntax_name<S: Serializer>(
    syntax: &Arc<MentionSyntax>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(syntax.name())
}

impl MentionSpan {
    /// Create a span for `display_name` starting at `start`.
    pub fn new(
        id: impl Into<String>,
        display_name: &str,
        start: usize,
        syntax: Arc<MentionSyntax>,
    ) -> Self {
        let display_text = syntax.display_run(display_name);
        let end = start + display_text.chars().count();
        Self {
            id: id.into(),
            display_text,
            start,
            end,
            syntax,
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Display text without the starting character
    pub fn display_name(&self) -> &str {
        self.display_text
            .strip_prefix(self.syntax.starting_character())
            .unwrap_or(&self.display_text)
    }

    /// True if `text[start..end]` still reads exactly as this mention.
    pub fn is_valid_in(&self, text: &str) -> bool {
        slice_chars(text, self.start, self.end).is_some_and(|run| run == self.display_text)
    }

    pub fn overlaps(&self, other: &MentionSpan) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub(crate) fn shift_forward(&mut self, by: usize) {
        self.start += by;
        self.end += by;
    }

    pub(crate) fn shift_backward(&mut self, by: usize) {
        self.start = self.start.saturating_sub(by);
        self.end = self.end.saturating_sub(by);
    }
}

/// Resolves mention ids to displayable objects.
///
/// Must be synchronous and free of side effects visible to the engine.
pub trait MentionResolver {
    fn resolve(&self, syntax: &MentionSyntax, id: &str) -> Option<MentionObject>;
}

impl<F> MentionResolver for F
where
    F: Fn(&MentionSyntax, &str) -> Option<MentionObject>,
{
    fn resolve(&self, syntax: &MentionSyntax, id: &str) -> Option<MentionObject> {
        self(syntax, id)
    }
}

/// Lookup by id alone, shared by every syntax.
impl MentionResolver for HashMap<String, MentionObject> {
    fn resolve(&self, _syntax: &MentionSyntax, id: &str) -> Option<MentionObject> {
        self.get(id).cloned()
    }
}

/// Known mention objects grouped by syntax name.
///
/// Deserializes from `{ "<syntax name>": [ { "id": ..., "displayName": ... } ] }`.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(from = "HashMap<String, Vec<MentionObject>>")]
pub struct MentionDirectory {
    entries: HashMap<String, HashMap<String, MentionObject>>,
}

impl MentionDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, syntax_name: impl Into<String>, object: MentionObject) {
        self.entries
            .entry(syntax_name.into())
            .or_default()
            .insert(object.id.clone(), object);
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<HashMap<String, Vec<MentionObject>>> for MentionDirectory {
    fn from(groups: HashMap<String, Vec<MentionObject>>) -> Self {
        let mut directory = Self::new();
        for (syntax_name, objects) in groups {
            for object in objects {
                directory.insert(syntax_name.clone(), object);
            }
        }
        directory
    }
}

impl MentionResolver for MentionDirectory {
    fn resolve(&self, syntax: &MentionSyntax, id: &str) -> Option<MentionObject> {
        self.entries.get(syntax.name())?.get(id).cloned()
    }
}

/// A flat run of the buffer: either plain text or one mention.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Segment<'a> {
    Plain(&'a str),
    Mention(&'a MentionSpan),
}

/// Split `text` into plain and mention runs.
///
/// `spans` must be sorted and non-overlapping. Spans falling outside the text
/// are skipped.
pub fn segments<'a>(text: &'a str, spans: &'a [MentionSpan]) -> Vec<Segment<'a>> {
    let mut out = Vec::with_capacity(spans.len() * 2 + 1);
    let mut cursor_byte = 0;
    for span in spans {
        let (Some(start), Some(end)) = (char_to_byte(text, span.start), char_to_byte(text, span.end))
        else {
            continue;
        };
        if start < cursor_byte {
            continue;
        }
        if start > cursor_byte {
            out.push(Segment::Plain(&text[cursor_byte..start]));
        }
        out.push(Segment::Mention(span));
        cursor_byte = end;
    }
    if cursor_byte < text.len() {
        out.push(Segment::Plain(&text[cursor_byte..]));
    }
    out
}
