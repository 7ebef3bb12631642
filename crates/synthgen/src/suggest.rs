//! Label and noise suggestions for request forms.
//!
//! Suggestions are a convenience: ledger failures degrade to the built-in
//! lists instead of surfacing an error.

use crate::job::JobStatus;
use crate::ledger::JobLedger;

pub const MAX_SUGGESTIONS: usize = 10;
const DEFAULT_LABEL_COUNT: usize = 10;
const DEFAULT_NOISE_COUNT: usize = 8;
const LEDGER_LABEL_LIMIT: u32 = 5;

pub const COMMON_LABELS: &[&str] = &[
    "cat", "dog", "bird", "car", "house", "tree", "flower", "person", "bicycle", "airplane",
    "boat", "train", "truck", "motorcycle", "chair", "table", "laptop", "phone", "book", "cup",
    "bottle", "apple", "banana", "pizza", "cake", "sandwich", "coffee", "mountain", "beach",
    "forest", "city", "sunset", "landscape",
];

pub const NOISE_DESCRIPTIONS: &[&str] = &[
    "low noise",
    "medium noise",
    "high noise",
    "minimal noise",
    "clean",
    "slightly blurred",
    "artistic noise",
    "vintage effect",
    "film grain",
    "digital noise",
    "smooth",
    "textured",
];

/// Built-in labels containing `query`, followed by labels of earlier
/// successful jobs that match it. Deduplicated, at most ten entries.
pub fn suggest_labels(ledger: &dyn JobLedger, query: &str) -> Vec<String> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return COMMON_LABELS
            .iter()
            .take(DEFAULT_LABEL_COUNT)
            .map(|s| s.to_string())
            .collect();
    }

    let mut suggestions: Vec<String> = filter_builtin(COMMON_LABELS, &query);

    match ledger.find_labels_matching(&query, JobStatus::Succeeded, LEDGER_LABEL_LIMIT) {
        Ok(labels) => suggestions.extend(labels),
        Err(e) => log::warn!("Label suggestions from ledger unavailable: {}", e),
    }

    dedup_and_cap(suggestions)
}

/// Built-in noise descriptions containing `query`.
pub fn suggest_noise(query: &str) -> Vec<String> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return NOISE_DESCRIPTIONS
            .iter()
            .take(DEFAULT_NOISE_COUNT)
            .map(|s| s.to_string())
            .collect();
    }
    dedup_and_cap(filter_builtin(NOISE_DESCRIPTIONS, &query))
}

fn filter_builtin(list: &[&str], query: &str) -> Vec<String> {
    list.iter()
        .filter(|entry| entry.to_lowercase().contains(query))
        .map(|entry| entry.to_string())
        .collect()
}

/// Keeps first occurrences in order.
fn dedup_and_cap(items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .take(MAX_SUGGESTIONS)
        .collect()
}
