//! Text utilities.
//!
//! This module provides:
//! - Character-level diffs between buffer states
//! - Character/byte offset conversion

pub mod diff;
pub mod offsets;

pub use diff::{DiffAlgorithm, DiffOp, diff, diff_with};
pub use offsets::{byte_to_char, char_len, char_to_byte, replace_chars, slice_chars};
