//! Helpers for sanitizing data before it reaches span attributes or the
//! filesystem.
//!
//! Span fields only ever carry file names, never full paths, and labels
//! supplied by callers are made safe before they become file names.

use std::path::Path;

/// Returns only the filename component of a path (no directory).
///
/// Safe for span fields: reveals the file name without the full path.
pub fn redact_path(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("<unknown>")
        .to_string()
}

/// Turns a free-text label into something usable as a filename stem.
///
/// Path separators, control characters and characters rejected by common
/// filesystems become `_`. Leading dots are stripped so a label can never
/// produce a hidden file or a `..` component. Ordinary labels such as
/// `cat` or `red car` pass through unchanged.
pub fn filename_component(label: &str) -> String {
    let replaced: String = label
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let stripped = replaced.trim_start_matches('.');
    if stripped.is_empty() {
        "artifact".to_string()
    } else {
        stripped.to_string()
    }
}
