//! String helpers shared by the search client, the publishers and logging.
//!
//! - Content preview truncation (character based)
//! - Partition key truncation (byte based, UTF-8 safe)
//! - Shortening long payloads before they go into a log line

/// Marker appended to a preview that was cut short.
pub const TRUNCATION_MARKER: &str = "...";

/// Keep the first `max_chars` characters of `text`, appending `"..."` if anything was dropped.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_with_marker("hello", 10), "hello");
/// assert_eq!(truncate_with_marker("hello world", 5), "hello...");
/// ```
pub fn truncate_with_marker(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}{}", &text[..cut], TRUNCATION_MARKER),
        None => text.to_string(),
    }
}

/// Longest prefix of `s` that fits in `max_bytes` without splitting a character.
pub fn truncate_to_byte_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to at most `max` bytes with an ellipsis and the
/// number of dropped bytes appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    let head = truncate_to_byte_boundary(s, max);
    if head.len() == s.len() {
        s.to_string()
    } else {
        format!("{}…(+{} bytes)", head, s.len() - head.len())
    }
}
