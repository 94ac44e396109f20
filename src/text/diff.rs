//! Character-level diff between two buffer states.
//!
//! A thin adapter over `similar`: it coalesces per-character changes into runs
//! and trims the common prefix and suffix before diffing, so an insertion that
//! could be placed at several equivalent offsets always lands as far right as
//! possible (e.g. typing `a` after `@aa` is reported at the end of the token).

use serde::{Deserialize, Serialize};
use similar::{Algorithm, ChangeTag, TextDiff};

/// One run of a diff between an old and a new buffer.
///
/// Concatenating `Equal` and `Insert` texts in order rebuilds the new buffer;
/// concatenating `Equal` and `Delete` texts rebuilds the old one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "text", rename_all = "camelCase")]
pub enum DiffOp {
    Equal(String),
    Insert(String),
    Delete(String),
}

impl DiffOp {
    pub fn text(&self) -> &str {
        match self {
            DiffOp::Equal(text) | DiffOp::Insert(text) | DiffOp::Delete(text) => text,
        }
    }

    /// Length of the run in characters
    pub fn char_len(&self) -> usize {
        self.text().chars().count()
    }

    fn tag(&self) -> ChangeTag {
        match self {
            DiffOp::Equal(_) => ChangeTag::Equal,
            DiffOp::Insert(_) => ChangeTag::Insert,
            DiffOp::Delete(_) => ChangeTag::Delete,
        }
    }
}

/// Diff algorithm selectable from configuration
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffAlgorithm {
    #[default]
    Myers,
    Patience,
    Lcs,
}

impl From<DiffAlgorithm> for Algorithm {
    fn from(value: DiffAlgorithm) -> Self {
        match value {
            DiffAlgorithm::Myers => Algorithm::Myers,
            DiffAlgorithm::Patience => Algorithm::Patience,
            DiffAlgorithm::Lcs => Algorithm::Lcs,
        }
    }
}

/// Diff two buffers with the default (Myers) algorithm.
pub fn diff(old_text: &str, new_text: &str) -> Vec<DiffOp> {
    diff_with(old_text, new_text, DiffAlgorithm::default())
}

/// Diff two buffers with the given algorithm.
pub fn diff_with(old_text: &str, new_text: &str, algorithm: DiffAlgorithm) -> Vec<DiffOp> {
    let mut ops = Vec::new();
    if old_text == new_text {
        if !old_text.is_empty() {
            ops.push(DiffOp::Equal(old_text.to_string()));
        }
        return ops;
    }

    let prefix = common_prefix_bytes(old_text, new_text);
    let suffix = common_suffix_bytes(&old_text[prefix..], &new_text[prefix..]);
    let old_middle = &old_text[prefix..old_text.len() - suffix];
    let new_middle = &new_text[prefix..new_text.len() - suffix];

    push_run(&mut ops, ChangeTag::Equal, &old_text[..prefix]);

    // NOTE: diff_chars() for character granularity; word or line diffs would
    // swallow a whole mention into a single replaced token.
    let middle = TextDiff::configure()
        .algorithm(algorithm.into())
        .diff_chars(old_middle, new_middle);
    for change in middle.iter_all_changes() {
        push_run(&mut ops, change.tag(), change.value());
    }

    push_run(&mut ops, ChangeTag::Equal, &old_text[old_text.len() - suffix..]);
    ops
}

/// Append `text` to the last run if it has the same tag, otherwise start a new run.
fn push_run(ops: &mut Vec<DiffOp>, tag: ChangeTag, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(last) = ops.last_mut()
        && last.tag() == tag
    {
        match last {
            DiffOp::Equal(run) | DiffOp::Insert(run) | DiffOp::Delete(run) => run.push_str(text),
        }
        return;
    }
    ops.push(match tag {
        ChangeTag::Equal => DiffOp::Equal(text.to_string()),
        ChangeTag::Insert => DiffOp::Insert(text.to_string()),
        ChangeTag::Delete => DiffOp::Delete(text.to_string()),
    });
}

fn common_prefix_bytes(a: &str, b: &str) -> usize {
    a.chars()
        .zip(b.chars())
        .take_while(|(x, y)| x == y)
        .map(|(x, _)| x.len_utf8())
        .sum()
}

fn common_suffix_bytes(a: &str, b: &str) -> usize {
    a.chars()
        .rev()
        .zip(b.chars().rev())
        .take_while(|(x, y)| x == y)
        .map(|(x, _)| x.len_utf8())
        .sum()
}
