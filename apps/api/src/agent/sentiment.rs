use tracing::debug;

use crate::agent::keywords::{KeywordTables, DETECTION_ORDER};
use crate::models::Sentiment;

/// Refines `prior` from the user's latest message.
///
/// Categories are checked frustrated → satisfied → confused and the first hit
/// wins, so "great, still broken" reads as frustrated. No feedback, or no
/// keyword hit, leaves `prior` unchanged.
pub fn detect_sentiment(
    keywords: &KeywordTables,
    prior: Sentiment,
    latest_feedback: Option<&str>,
) -> Sentiment {
    let feedback = match latest_feedback {
        Some(f) if !f.is_empty() => f,
        _ => return prior,
    };

    let feedback_lower = feedback.to_lowercase();

    for sentiment in DETECTION_ORDER {
        if keywords.matches(sentiment, &feedback_lower) {
            debug!(
                "Sentiment detected: {} (feedback: {} chars)",
                sentiment,
                feedback.chars().count()
            );
            return sentiment;
        }
    }

    debug!(
        "No sentiment keywords matched (feedback: {} chars); keeping {}",
        feedback.chars().count(),
        prior
    );
    prior
}
