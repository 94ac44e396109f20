//! Character offset helpers.
//!
//! Span positions count Unicode scalar values, while `String` indexes bytes.
//! These helpers translate between the two.

/// Number of characters in `text`
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Convert a character offset to a byte offset.
/// Returns None if the offset is past the end of the text
pub fn char_to_byte(text: &str, char_pos: usize) -> Option<usize> {
    if char_pos == 0 {
        return Some(0);
    }
    let mut chars_seen = 0;
    for (byte_pos, _) in text.char_indices() {
        if chars_seen == char_pos {
            return Some(byte_pos);
        }
        chars_seen += 1;
    }
    (chars_seen == char_pos).then_some(text.len())
}

/// Convert a byte offset to a character offset.
/// Returns None if the byte offset falls inside a multi-byte character or past the end
pub fn byte_to_char(text: &str, byte_pos: usize) -> Option<usize> {
    if byte_pos > text.len() || !text.is_char_boundary(byte_pos) {
        return None;
    }
    Some(char_len(&text[..byte_pos]))
}

/// Borrow the characters in `[start, end)`
pub fn slice_chars(text: &str, start: usize, end: usize) -> Option<&str> {
    if start > end {
        return None;
    }
    let start_byte = char_to_byte(text, start)?;
    let end_byte = char_to_byte(text, end)?;
    Some(&text[start_byte..end_byte])
}

/// Replace the characters in `[start, end)` with `replacement`.
/// Returns false, leaving `text` untouched, if the range is out of bounds
pub fn replace_chars(text: &mut String, start: usize, end: usize, replacement: &str) -> bool {
    if start > end {
        return false;
    }
    let (Some(start_byte), Some(end_byte)) = (char_to_byte(text, start), char_to_byte(text, end))
    else {
        return false;
    };
    text.replace_range(start_byte..end_byte, replacement);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn char_to_byte_handles_multibyte_text() {
        let text = "héllo @Zoë";
        assert_eq!(char_to_byte(text, 0), Some(0));
        assert_eq!(char_to_byte(text, 2), Some(3));
        assert_eq!(char_to_byte(text, char_len(text)), Some(text.len()));
        assert_eq!(char_to_byte(text, char_len(text) + 1), None);
    }

    #[test]
    fn byte_to_char_rejects_positions_inside_a_character() {
        let text = "é!";
        assert_eq!(byte_to_char(text, 0), Some(0));
        assert_eq!(byte_to_char(text, 1), None);
        assert_eq!(byte_to_char(text, 2), Some(1));
        assert_eq!(byte_to_char(text, 3), Some(2));
        assert_eq!(byte_to_char(text, 4), None);
    }

    #[test]
    fn slice_chars_counts_characters() {
        assert_eq!(slice_chars("añb@Bob", 3, 7), Some("@Bob"));
        assert_eq!(slice_chars("abc", 2, 1), None);
        assert_eq!(slice_chars("abc", 1, 9), None);
    }

    #[test]
    fn replace_chars_splices_in_place() {
        let mut text = String::from("Hello @a");
        assert!(replace_chars(&mut text, 6, 8, "@Amber"));
        assert_eq!(text, "Hello @Amber");

        assert!(!replace_chars(&mut text, 20, 21, "x"));
        assert_eq!(text, "Hello @Amber");
    }
}
