// src/util.rs — Shared utility functions

use serde_json::Value;

/// Truncate a string for display/logging (UTF-8 safe).
///
/// Returns a substring of at most `max_len` bytes, ensuring the cut
/// point falls on a valid UTF-8 character boundary.
pub fn truncate_str(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        s
    } else {
        let mut end = max_len;
        while end > 0 && !s.is_char_boundary(end) {
            end -= 1;
        }
        &s[..end]
    }
}

/// Flatten any JSON value into one line of plain text.
///
/// Strings pass through, numbers and booleans are printed, objects and
/// arrays contribute their (non-empty) leaf values in order, joined by a
/// single space. `null` becomes the empty string.
pub fn json_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => join_parts(items.iter()),
        Value::Object(map) => join_parts(map.values()),
    }
}

fn join_parts<'a>(values: impl Iterator<Item = &'a Value>) -> String {
    values
        .map(json_text)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
