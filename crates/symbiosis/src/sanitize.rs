//! Helpers for sanitizing data before it enters log records and span fields.

use std::path::Path;

/// Upstream error bodies longer than this are cut before logging.
pub const MAX_LOGGED_BODY_CHARS: usize = 512;

/// Returns only the filename component of a path (no directory).
pub fn redact_path(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("<unknown>")
        .to_string()
}

/// Trims and shortens an HTTP response body for error messages.
pub fn truncate_body(body: &str) -> String {
    let body = body.trim();
    if body.chars().count() <= MAX_LOGGED_BODY_CHARS {
        return body.to_string();
    }
    let cut: String = body.chars().take(MAX_LOGGED_BODY_CHARS).collect();
    format!("{cut}...")
}
