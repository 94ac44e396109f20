//! The "typing a new mention" state machine.
//!
//! A session starts when an insertion consists of exactly one registered
//! starting character, grows while text is appended at the end of the token,
//! and ends on a space, on an insertion anywhere else, or when a deletion at or
//! before the token removes a starting character. A trigger typed while a
//! session is active cancels it without starting another. The search text handed to suggestion UIs is the token
//! without its starting character.

use crate::error::{MentionError, MentionResult};
use crate::syntax::{MentionSyntax, SyntaxRegistry};
use crate::text::diff::DiffOp;
use crate::text::offsets::{char_len, slice_chars};
use log::trace;
use std::sync::Arc;

/// An in-progress mention token in the buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompositionSession {
    /// Character offset of the starting character
    pub start: usize,
    /// Length of the token in characters, starting character included
    pub length: usize,
    pub syntax: Arc<MentionSyntax>,
}

impl CompositionSession {
    pub fn end(&self) -> usize {
        self.start + self.length
    }

    /// The token typed so far, without its starting character
    pub fn search_text<'a>(&self, text: &'a str) -> Option<&'a str> {
        slice_chars(text, self.start + 1, self.end())
    }

    /// True if `text` still holds the starting character at `start` and the
    /// whole token fits inside it
    pub(crate) fn reads_as_token_in(&self, text: &str) -> bool {
        self.length > 0
            && slice_chars(text, self.start, self.start + 1)
                .and_then(|first| first.chars().next())
                == Some(self.syntax.starting_character())
            && self.end() <= char_len(text)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum CompositionState {
    #[default]
    Inactive,
    Composing(CompositionSession),
}

impl CompositionState {
    pub fn session(&self) -> Option<&CompositionSession> {
        match self {
            CompositionState::Inactive => None,
            CompositionState::Composing(session) => Some(session),
        }
    }

    pub fn is_composing(&self) -> bool {
        matches!(self, CompositionState::Composing(_))
    }
}

/// Payload of the composition-changed notification.
///
/// Both fields are `None` when composition ended.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompositionChanged {
    pub syntax: Option<Arc<MentionSyntax>>,
    pub search_text: Option<String>,
}

impl CompositionChanged {
    pub fn cancelled() -> Self {
        Self::default()
    }

    pub fn describe(state: &CompositionState, text: &str) -> Self {
        match state {
            CompositionState::Inactive => Self::cancelled(),
            CompositionState::Composing(session) => Self {
                syntax: Some(Arc::clone(&session.syntax)),
                search_text: session.search_text(text).map(str::to_string),
            },
        }
    }
}

/// Advance the composition state across one edit.
///
/// `ops` is the diff from the previous buffer to `new_text`. Returns an error,
/// without side effects, if a deletion would shrink the token to nothing.
pub fn advance(
    state: &CompositionState,
    ops: &[DiffOp],
    registry: &SyntaxRegistry,
    new_text: &str,
) -> MentionResult<CompositionState> {
    let mut state = state.clone();
    let mut cursor = 0;

    for op in ops {
        let len = op.char_len();
        state = match op {
            DiffOp::Equal(_) => {
                cursor += len;
                state
            }
            DiffOp::Insert(inserted) => {
                let next = on_insert(state, cursor, inserted, len, registry);
                cursor += len;
                next
            }
            DiffOp::Delete(deleted) => on_delete(state, cursor, deleted, len)?,
        };
    }

    if let CompositionState::Composing(session) = &state
        && !session.reads_as_token_in(new_text)
    {
        trace!(
            target: "mentionkit::composition",
            "Token at {} no longer starts with '{}', cancelling",
            session.start,
            session.syntax.starting_character()
        );
        return Ok(CompositionState::Inactive);
    }
    Ok(state)
}

fn on_insert(
    state: CompositionState,
    at: usize,
    inserted: &str,
    len: usize,
    registry: &SyntaxRegistry,
) -> CompositionState {
    match state {
        CompositionState::Composing(_) if inserted.contains(' ') => {
            trace!(target: "mentionkit::composition", "Space typed, cancelling composition");
            CompositionState::Inactive
        }
        CompositionState::Composing(mut session) if at == session.end() => {
            session.length += len;
            trace!(
                target: "mentionkit::composition",
                "Token at {} extended to length {}",
                session.start,
                session.length
            );
            CompositionState::Composing(session)
        }
        CompositionState::Composing(session) => {
            trace!(
                target: "mentionkit::composition",
                "Insertion at {} outside token [{}, {}), cancelling",
                at,
                session.start,
                session.end()
            );
            CompositionState::Inactive
        }
        // Only an idle buffer starts a new session
        CompositionState::Inactive => match registry.for_trigger_text(inserted) {
            Some(syntax) => {
                trace!(
                    target: "mentionkit::composition",
                    "Starting character '{}' typed at {}, composing",
                    syntax.starting_character(),
                    at
                );
                CompositionState::Composing(CompositionSession {
                    start: at,
                    length: 1,
                    syntax: Arc::clone(syntax),
                })
            }
            None => CompositionState::Inactive,
        },
    }
}

fn on_delete(
    state: CompositionState,
    at: usize,
    deleted: &str,
    len: usize,
) -> MentionResult<CompositionState> {
    let CompositionState::Composing(mut session) = state else {
        return Ok(CompositionState::Inactive);
    };
    let end = at + len;

    // Covers deleting the token's own starting character too
    if at <= session.start && deleted.contains(session.syntax.starting_character()) {
        trace!(
            target: "mentionkit::composition",
            "Starting character deleted at {} (token at {}), cancelling",
            at,
            session.start
        );
        return Ok(CompositionState::Inactive);
    }

    if end <= session.start {
        session.start -= len;
    } else if end <= session.end() {
        if len >= session.length {
            return Err(MentionError::CompositionUnderflow {
                length: session.length,
                removed: len,
            });
        }
        session.length -= len;
    } else if at < session.end() {
        // Deletion runs past the end of the token: keep what precedes it
        session.length = at - session.start;
    }
    Ok(CompositionState::Composing(session))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::diff::diff;

    fn registry() -> SyntaxRegistry {
        SyntaxRegistry::new([
            MentionSyntax::new("user", '@'),
            MentionSyntax::new("tag", '#'),
        ])
    }

    fn step(state: &CompositionState, old: &str, new: &str) -> CompositionState {
        advance(state, &diff(old, new), &registry(), new).unwrap()
    }

    fn composing(start: usize, length: usize) -> CompositionState {
        CompositionState::Composing(CompositionSession {
            start,
            length,
            syntax: Arc::new(MentionSyntax::new("user", '@')),
        })
    }

    #[test]
    fn typing_trigger_starts_session_with_empty_search() {
        let state = step(&CompositionState::Inactive, "", "@");
        assert_eq!(state, composing(0, 1));
        assert_eq!(state.session().unwrap().search_text("@"), Some(""));
    }

    #[test]
    fn trigger_can_start_mid_word() {
        let state = step(&CompositionState::Inactive, "mail", "mail@");
        assert_eq!(state, composing(4, 1));
    }

    #[test]
    fn second_syntax_is_detected() {
        let state = step(&CompositionState::Inactive, "x ", "x #");
        assert_eq!(state.session().unwrap().syntax.name(), "tag");
    }

    #[test]
    fn appending_extends_the_token() {
        let state = step(&composing(0, 1), "@", "@am");
        assert_eq!(state, composing(0, 3));
        assert_eq!(state.session().unwrap().search_text("@am"), Some("am"));
    }

    #[test]
    fn space_cancels() {
        assert_eq!(
            step(&composing(0, 3), "@am", "@am "),
            CompositionState::Inactive
        );
    }

    #[test]
    fn insertion_elsewhere_cancels() {
        assert_eq!(
            step(&composing(3, 3), "hi @am", "ohi @am"),
            CompositionState::Inactive
        );
        assert_eq!(
            step(&composing(0, 3), "@am", "@xam"),
            CompositionState::Inactive
        );
    }

    #[test]
    fn trigger_typed_elsewhere_cancels_without_restarting() {
        assert_eq!(
            step(&composing(3, 3), "hi @am", "@hi @am"),
            CompositionState::Inactive
        );
    }

    #[test]
    fn trigger_typed_after_cancel_starts_fresh_session() {
        let cancelled = step(&composing(3, 3), "hi @am", "hi @am ");
        assert_eq!(cancelled, CompositionState::Inactive);
        assert_eq!(step(&cancelled, "hi @am ", "hi @am @"), composing(7, 1));
    }

    #[test]
    fn backspace_shrinks_the_token() {
        assert_eq!(step(&composing(3, 3), "hi @am", "hi @a"), composing(3, 2));
    }

    #[test]
    fn deleting_the_trigger_cancels() {
        assert_eq!(
            step(&composing(3, 3), "hi @am", "hi am"),
            CompositionState::Inactive
        );
        assert_eq!(
            step(&composing(3, 3), "hi @am", "hi"),
            CompositionState::Inactive
        );
    }

    #[test]
    fn deletion_before_the_token_shifts_it() {
        let state = step(&composing(3, 3), "hi @am", "h @am");
        assert_eq!(state, composing(2, 3));
        assert_eq!(state.session().unwrap().search_text("h @am"), Some("am"));
    }

    #[test]
    fn deleting_a_starting_character_before_the_token_cancels() {
        assert_eq!(
            step(&composing(4, 2), "a@b @x", "ab @x"),
            CompositionState::Inactive
        );
    }

    #[test]
    fn deleting_other_syntax_trigger_before_the_token_shifts_it() {
        assert_eq!(step(&composing(4, 2), "a#b @x", "ab @x"), composing(3, 2));
    }

    #[test]
    fn deletion_after_the_token_is_ignored() {
        assert_eq!(
            step(&composing(0, 2), "@a and more", "@a and"),
            composing(0, 2)
        );
    }

    #[test]
    fn inactive_ignores_ordinary_typing() {
        assert_eq!(
            step(&CompositionState::Inactive, "hi", "hi there"),
            CompositionState::Inactive
        );
    }

    #[test]
    fn describe_reports_syntax_and_search_text() {
        let changed = CompositionChanged::describe(&composing(3, 3), "hi @am");
        assert_eq!(changed.syntax.unwrap().name(), "user");
        assert_eq!(changed.search_text.as_deref(), Some("am"));
        assert_eq!(
            CompositionChanged::describe(&CompositionState::Inactive, "hi"),
            CompositionChanged::cancelled()
        );
    }
}
