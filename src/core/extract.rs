// src/core/extract.rs — Pull structured JSON out of free-form model output
//
// Models wrap their answers in prose, markdown fences or a named field.
// These helpers never fail: they return `None` and let the calling step
// decide its fallback.

use serde_json::Value;

/// Parse a candidate identifier: a non-negative integer or a numeric string.
pub fn parse_id(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
        Value::String(s) => s.trim().trim_start_matches('#').parse::<u32>().ok(),
        _ => None,
    }
}

/// Extract a list of records from model output.
///
/// Tried in order: the whole text as JSON (an array, an object carrying
/// `field`, or an object whose first array value holds the records), then
/// the span from the first `[` to the last `]`, then the first balanced
/// `{...}` object treated the same way as a whole-text object.
pub fn extract_list(text: &str, field: &str) -> Option<Vec<Value>> {
    let trimmed = strip_fences(text);

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        if let Some(list) = list_from_value(value, field) {
            return Some(list);
        }
    }

    if let Some(span) = bracket_span(trimmed) {
        if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(span) {
            return Some(items);
        }
    }

    let object = extract_object(trimmed)?;
    list_from_value(Value::Object(object), field)
}

/// Extract a single JSON object from model output.
pub fn extract_object(text: &str) -> Option<serde_json::Map<String, Value>> {
    let trimmed = strip_fences(text);

    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(trimmed) {
        return Some(map);
    }

    let candidate = first_balanced_object(trimmed)?;
    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

fn list_from_value(value: Value, field: &str) -> Option<Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        Value::Object(mut map) => {
            if let Some(Value::Array(items)) = map.remove(field) {
                return Some(items);
            }
            map.into_iter().find_map(|(_, v)| match v {
                Value::Array(items) => Some(items),
                _ => None,
            })
        }
        _ => None,
    }
}

fn strip_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (```json) up to the first newline.
    let body = rest.split_once('\n').map(|(_, b)| b).unwrap_or(rest);
    body.trim_end().trim_end_matches("```").trim()
}

fn bracket_span(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    (end > start).then(|| &text[start..=end])
}

/// First `{...}` whose braces balance, ignoring braces inside strings.
fn first_balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + idx + 1]);
                }
            }
            _ => {}
        }
    }
    None
}
