//! Context building: turns a ticket's history into the text block the model sees.
//!
//! This block is the only thing that stops the model from repeating itself, so
//! every earlier attempt goes in, in order, with nothing dropped beyond the
//! history bound already applied to `TicketState`.

use crate::agent::prompts::NO_REPEAT_INSTRUCTION;
use crate::models::{ContextEntry, TicketState};

/// What has already happened on a ticket, split out of its history.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreviousAttempts<'a> {
    pub attempted_fixes: Vec<&'a str>,
    pub user_responses: Vec<&'a str>,
    /// Rationales that mention escalating.
    pub escalations: Vec<&'a str>,
}

pub fn extract_previous_attempts(history: &[ContextEntry]) -> PreviousAttempts<'_> {
    PreviousAttempts {
        attempted_fixes: history.iter().map(|e| e.what_we_said()).collect(),
        user_responses: history.iter().map(|e| e.what_user_said_back()).collect(),
        escalations: history
            .iter()
            .map(|e| e.our_reasoning())
            .filter(|r| r.to_lowercase().contains("escalat"))
            .collect(),
    }
}

pub fn build_context(ticket: &TicketState, previous: &PreviousAttempts<'_>) -> String {
    let mut parts = vec![
        format!("User: {}", ticket.user_name()),
        format!("Issue: {}", ticket.initial_issue()),
        format!("Phase: {}", ticket.current_phase()),
    ];

    if !previous.attempted_fixes.is_empty() {
        parts.push("---PREVIOUS ATTEMPTS---".to_string());
        push_numbered(&mut parts, &previous.attempted_fixes);
    }

    if !previous.user_responses.is_empty() {
        parts.push("---USER RESPONSES---".to_string());
        push_numbered(&mut parts, &previous.user_responses);
    }

    parts.push("---USER SENTIMENT---".to_string());
    parts.push(format!("Detected: {}", ticket.user_sentiment()));
    if let Some(feedback) = ticket.latest_user_feedback().filter(|f| !f.is_empty()) {
        parts.push(format!("Latest: \"{feedback}\""));
    }

    parts.push("---CRITICAL---".to_string());
    parts.push(NO_REPEAT_INSTRUCTION.to_string());

    parts.join("\n")
}

fn push_numbered(parts: &mut Vec<String>, items: &[&str]) {
    parts.extend(
        items
            .iter()
            .enumerate()
            .map(|(i, item)| format!("{}. {}", i + 1, item)),
    );
}
