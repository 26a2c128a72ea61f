//! Lenient decoding of model replies.
//!
//! Models wrap JSON in code fences or prose. The whole reply is tried
//! first, then each top-level balanced `{...}` or `[...]` span in order.
//! An opening bracket that never closes is passed over.

use serde::de::DeserializeOwned;

/// Decodes `reply` as `T`, or logs and returns `fallback()`.
pub fn decode_or<T, F>(operation: &'static str, reply: &str, fallback: F) -> T
where
    T: DeserializeOwned,
    F: FnOnce() -> T,
{
    match decode::<T>(reply) {
        Some(value) => value,
        None => {
            log::warn!(
                "{}: reply is not the expected JSON shape, using fallback ({} chars)",
                operation,
                reply.len()
            );
            fallback()
        }
    }
}

pub fn decode<T: DeserializeOwned>(reply: &str) -> Option<T> {
    if let Ok(value) = serde_json::from_str(reply.trim()) {
        return Some(value);
    }

    let mut offset = 0;
    while let Some(rel) = reply[offset..].find(['{', '[']) {
        let start = offset + rel;
        match balanced_span(reply, start) {
            Some(span) => {
                if let Ok(value) = serde_json::from_str(span) {
                    return Some(value);
                }
                offset = start + span.len();
            }
            None => offset = start + 1,
        }
    }
    None
}

/// The balanced JSON span opening at byte `start`, skipping brackets
/// inside strings. `None` if it never closes.
fn balanced_span(text: &str, start: usize) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, c) in text[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match c {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' | '[' if !in_string => depth += 1,
            '}' | ']' if !in_string => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&text[start..start + i + 1]);
                }
            }
            _ => {}
        }
    }
    None
}
