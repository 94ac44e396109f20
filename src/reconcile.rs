//! Span reconciliation across one buffer edit.
//!
//! The diff between the previous and the current buffer is walked once with a
//! cursor kept in new-buffer coordinates. Spans are transformed as the walk
//! goes:
//!
//! - an insertion strictly inside a span, or a deletion overlapping it,
//!   invalidates the span;
//! - an insertion at or before a span's start, or a deletion entirely before
//!   it, shifts the span;
//! - anything after the span leaves it alone.
//!
//! Mentions are atomic. When an edit lands inside a span (an insertion
//! strictly inside, or a deletion fully contained in it), the characters left
//! over from the mention are recorded as excision zones. Zones are carried
//! through the rest of the walk like spans and cut from the buffer in a second
//! phase, so the walk itself never mutates the text it is indexing. A final
//! pass drops any span whose buffer slice no longer reads as its display text.
//!
//! The suggested caret after an excision is not the removed mention's start.
//! It sits right after the text typed into the mention, or at the deletion
//! point, so typing continues where the user left off. Hosts that want the
//! caret at the old mention start can use the start of the first
//! [`ReconcileOutcome::excised`] range instead.

use crate::mention::MentionSpan;
use crate::text::diff::DiffOp;
use crate::text::offsets::replace_chars;
use log::{debug, warn};
use std::ops::Range;

/// What one reconciliation pass did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// Surviving spans, sorted by start, positioned in `text`
    pub spans: Vec<MentionSpan>,
    /// The buffer after excising the remains of invalidated mentions
    pub text: String,
    /// Spans dropped during this pass, with their last known positions
    pub removed: Vec<MentionSpan>,
    /// Character ranges cut from the edited buffer, ascending and disjoint
    pub excised: Vec<Range<usize>>,
    /// Where the host should place its caret after an excision
    pub caret: Option<usize>,
}

impl ReconcileOutcome {
    pub fn removed_any(&self) -> bool {
        !self.removed.is_empty()
    }

    /// True if `text` differs from the buffer the pass was given
    pub fn text_changed(&self) -> bool {
        !self.excised.is_empty()
    }
}

/// Reconcile `spans`, valid in the previous buffer, against an edit.
///
/// `ops` is the diff from the previous buffer to `new_text`.
pub fn reconcile(ops: &[DiffOp], spans: &[MentionSpan], new_text: &str) -> ReconcileOutcome {
    let mut walk = Walk {
        live: spans.to_vec(),
        removed: Vec::new(),
        zones: Vec::new(),
        caret: None,
        cursor: 0,
    };
    for op in ops {
        walk.step(op);
    }
    walk.finish(new_text)
}

/// Drop spans that no longer read as their display text in `text`.
///
/// Used for edits the engine made itself, where no diff-driven shifting is wanted.
pub fn revalidate(spans: &[MentionSpan], text: &str) -> ReconcileOutcome {
    let (spans, removed) = retain_valid(spans.to_vec(), text);
    ReconcileOutcome {
        spans,
        text: text.to_string(),
        removed,
        excised: Vec::new(),
        caret: None,
    }
}

struct Walk {
    live: Vec<MentionSpan>,
    removed: Vec<MentionSpan>,
    zones: Vec<Range<usize>>,
    caret: Option<usize>,
    cursor: usize,
}

impl Walk {
    fn step(&mut self, op: &DiffOp) {
        let len = op.char_len();
        match op {
            DiffOp::Equal(_) => self.cursor += len,
            DiffOp::Insert(_) => {
                self.insert(self.cursor, len);
                self.cursor += len;
            }
            // Deleted characters vanish from the new buffer, so the cursor stays put
            DiffOp::Delete(_) => self.delete(self.cursor, len),
        }
    }

    fn insert(&mut self, at: usize, len: usize) {
        self.zones = std::mem::take(&mut self.zones)
            .into_iter()
            .flat_map(|zone| split_for_insert(zone, at, len))
            .collect();
        if let Some(caret) = self.caret.as_mut()
            && *caret >= at
        {
            *caret += len;
        }

        let mut kept = Vec::with_capacity(self.live.len());
        for mut span in std::mem::take(&mut self.live) {
            if span.start < at && at < span.end {
                debug!(
                    target: "mentionkit::reconcile",
                    "Insertion at {} inside mention '{}' [{}, {}), removing it",
                    at, span.id, span.start, span.end
                );
                self.zones.extend(split_for_insert(span.start..span.end, at, len));
                self.caret = Some(at + len);
                self.removed.push(span);
            } else {
                if span.start >= at {
                    span.shift_forward(len);
                }
                kept.push(span);
            }
        }
        self.live = kept;
    }

    fn delete(&mut self, at: usize, len: usize) {
        let end = at + len;
        self.zones = std::mem::take(&mut self.zones)
            .into_iter()
            .filter_map(|zone| shrink_for_delete(zone, at, end))
            .collect();
        if let Some(caret) = self.caret.as_mut()
            && *caret > at
        {
            *caret -= (*caret - at).min(len);
        }

        let mut kept = Vec::with_capacity(self.live.len());
        for mut span in std::mem::take(&mut self.live) {
            if at < span.end && end > span.start {
                if at >= span.start && end <= span.end {
                    debug!(
                        target: "mentionkit::reconcile",
                        "Deletion [{}, {}) inside mention '{}' [{}, {}), excising it",
                        at, end, span.id, span.start, span.end
                    );
                    let remaining = span.len() - len;
                    if remaining > 0 {
                        self.zones.push(span.start..span.start + remaining);
                    }
                    self.caret = Some(at);
                } else {
                    debug!(
                        target: "mentionkit::reconcile",
                        "Deletion [{}, {}) crosses mention '{}' [{}, {}), removing it",
                        at, end, span.id, span.start, span.end
                    );
                }
                self.removed.push(span);
            } else {
                if span.start >= end {
                    span.shift_backward(len);
                }
                kept.push(span);
            }
        }
        self.live = kept;
    }

    fn finish(self, new_text: &str) -> ReconcileOutcome {
        let excised = merge_zones(self.zones);

        let mut text = new_text.to_string();
        for zone in excised.iter().rev() {
            if !replace_chars(&mut text, zone.start, zone.end, "") {
                warn!(
                    target: "mentionkit::reconcile",
                    "Excision zone [{}, {}) is outside the buffer, skipping",
                    zone.start, zone.end
                );
            }
        }

        let mut live = self.live;
        for span in &mut live {
            let before = excised_before(&excised, span.start);
            span.shift_backward(before);
        }
        let caret = self
            .caret
            .map(|caret| caret - excised_before(&excised, caret));

        let (spans, stale) = retain_valid(live, &text);
        let mut removed = self.removed;
        removed.extend(stale);

        ReconcileOutcome {
            spans,
            text,
            removed,
            excised,
            caret,
        }
    }
}

/// Carry a zone across an insertion of `len` characters at `at`.
///
/// An insertion strictly inside the zone splits it, keeping the inserted text.
fn split_for_insert(zone: Range<usize>, at: usize, len: usize) -> Vec<Range<usize>> {
    if zone.start >= at {
        vec![zone.start + len..zone.end + len]
    } else if zone.end <= at {
        vec![zone]
    } else {
        vec![zone.start..at, at + len..zone.end + len]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect()
    }
}

/// Carry a zone across the deletion of `[at, end)`.
fn shrink_for_delete(zone: Range<usize>, at: usize, end: usize) -> Option<Range<usize>> {
    let len = end - at;
    let shrunk = if zone.end <= at {
        zone
    } else if zone.start >= end {
        zone.start - len..zone.end - len
    } else {
        let before = zone.end.min(at).saturating_sub(zone.start);
        let after = zone.end.saturating_sub(zone.start.max(end));
        let start = zone.start.min(at);
        start..start + before + after
    };
    (!shrunk.is_empty()).then_some(shrunk)
}

fn merge_zones(mut zones: Vec<Range<usize>>) -> Vec<Range<usize>> {
    zones.sort_by_key(|zone| zone.start);
    let mut merged: Vec<Range<usize>> = Vec::with_capacity(zones.len());
    for zone in zones {
        if let Some(last) = merged.last_mut()
            && zone.start <= last.end
        {
            last.end = last.end.max(zone.end);
            continue;
        }
        merged.push(zone);
    }
    merged
}

/// Number of excised characters lying before `pos`
fn excised_before(excised: &[Range<usize>], pos: usize) -> usize {
    excised
        .iter()
        .map(|zone| zone.end.min(pos).saturating_sub(zone.start))
        .sum()
}

/// Keep spans that still read as their display text and do not overlap an
/// earlier span. Returns `(kept, dropped)`; `kept` is sorted by start.
fn retain_valid(
    mut spans: Vec<MentionSpan>,
    text: &str,
) -> (Vec<MentionSpan>, Vec<MentionSpan>) {
    spans.sort_by_key(|span| span.start);
    let mut kept: Vec<MentionSpan> = Vec::with_capacity(spans.len());
    let mut dropped = Vec::new();
    for span in spans {
        let overlaps_previous = kept.last().is_some_and(|last| last.overlaps(&span));
        if overlaps_previous || !span.is_valid_in(text) {
            debug!(
                target: "mentionkit::reconcile",
                "Mention '{}' [{}, {}) no longer matches the buffer, dropping it",
                span.id, span.start, span.end
            );
            dropped.push(span);
        } else {
            kept.push(span);
        }
    }
    (kept, dropped)
}
