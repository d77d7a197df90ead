//! Offset conversions between chars, UTF-8 bytes and UTF-16 code units.
//!
//! The core counts text offsets in Unicode scalar values (chars). The regex
//! engine reports byte offsets and the browser DOM speaks UTF-16, so every
//! boundary crossing goes through these helpers.

/// Length of `text` in chars.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Convert a byte offset to a char offset.
///
/// Byte offsets inside a multi-byte char round down to that char.
pub fn byte_to_char(text: &str, byte_offset: usize) -> usize {
    text.char_indices()
        .take_while(|(idx, _)| *idx < byte_offset)
        .count()
}

/// Convert a char offset to a byte offset, clamped to the end of `text`.
pub fn char_to_byte(text: &str, char_offset: usize) -> usize {
    text.char_indices()
        .nth(char_offset)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len())
}

/// Convert a char offset to a UTF-16 offset, clamped to the end of `text`.
pub fn char_to_utf16(text: &str, char_offset: usize) -> usize {
    text.chars().take(char_offset).map(char::len_utf16).sum()
}

/// Convert a UTF-16 offset to a char offset.
///
/// An offset that falls between the two halves of a surrogate pair rounds
/// down to the char that pair encodes.
pub fn utf16_to_char(text: &str, utf16_offset: usize) -> usize {
    let mut units = 0;
    let mut chars = 0;
    for c in text.chars() {
        units += c.len_utf16();
        if units > utf16_offset {
            break;
        }
        chars += 1;
    }
    chars
}

/// Slice `text` by char range, clamped to its length.
pub fn slice_chars(text: &str, start: usize, end: usize) -> &str {
    let start = char_to_byte(text, start);
    let end = char_to_byte(text, end).max(start);
    &text[start..end]
}
