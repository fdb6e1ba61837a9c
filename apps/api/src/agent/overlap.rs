//! Word-overlap heuristic and the repetition guard built on it.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::models::ContextEntry;

/// Overlap above this between a new summary and any earlier one counts as repetition.
pub const REPETITION_OVERLAP_THRESHOLD: f64 = 0.6;

/// Shared-token ratio between two texts: `|A ∩ B| / max(|A|, |B|)` over
/// lower-cased, whitespace-split token sets. 0.0 when either side is empty.
pub fn overlap_ratio(text_a: &str, text_b: &str) -> f64 {
    let words_a = token_set(text_a);
    let words_b = token_set(text_b);

    if words_a.is_empty() || words_b.is_empty() {
        return 0.0;
    }

    let shared = words_a.intersection(&words_b).count();
    shared as f64 / words_a.len().max(words_b.len()) as f64
}

fn token_set(text: &str) -> HashSet<String> {
    text.split_whitespace().map(|w| w.to_lowercase()).collect()
}

/// Highest overlap between `summary` and any prior system text. 0.0 for empty history.
pub fn max_overlap(summary: &str, history: &[ContextEntry]) -> f64 {
    history
        .iter()
        .map(|entry| overlap_ratio(summary, entry.what_we_said()))
        .fold(0.0, f64::max)
}

/// Returns false when `new_summary` overlaps any earlier summary by more than
/// [`REPETITION_OVERLAP_THRESHOLD`].
pub fn no_repetition(new_summary: &str, history: &[ContextEntry]) -> bool {
    for entry in history {
        let overlap = overlap_ratio(new_summary, entry.what_we_said());
        if overlap > REPETITION_OVERLAP_THRESHOLD {
            warn!(
                "High overlap with an earlier summary: {:.0}% (threshold {:.0}%, earlier summary {} chars)",
                overlap * 100.0,
                REPETITION_OVERLAP_THRESHOLD * 100.0,
                entry.what_we_said().chars().count()
            );
            return false;
        }
    }

    debug!(
        "Repetition check passed ({} history entries, new summary {} chars)",
        history.len(),
        new_summary.chars().count()
    );
    true
}
