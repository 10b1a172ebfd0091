//! Lenient JSON extraction from model replies.
//!
//! Models wrap JSON in Markdown fences or add a sentence before it. Callers get
//! an untyped `Value` and validate the fields they need themselves.

use serde_json::Value;

/// Pull the first JSON object or array out of a model reply.
pub fn extract_json(raw: &str) -> Option<Value> {
    let body = strip_fences(raw);
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        return Some(value);
    }
    embedded_json(body)
}

/// Contents of a ```json (or bare ```) block, or the trimmed input.
fn strip_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(fence) = trimmed.find("```") else {
        return trimmed;
    };
    let after = &trimmed[fence + 3..];
    let after = after.strip_prefix("json").unwrap_or(after);
    match after.find("```") {
        Some(end) => after[..end].trim(),
        None => after.trim(),
    }
}

/// Try the widest `{...}` then `[...]` slice of the text.
fn embedded_json(text: &str) -> Option<Value> {
    [('{', '}'), ('[', ']')].iter().find_map(|&(open, close)| {
        let start = text.find(open)?;
        let end = text.rfind(close)?;
        if end <= start {
            return None;
        }
        serde_json::from_str(&text[start..=end]).ok()
    })
}

/// String array field, ignoring non-string entries. Missing or wrong type gives empty.
pub fn string_array(value: &Value, field: &str) -> Vec<String> {
    value
        .get(field)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// First `max_chars` characters of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
