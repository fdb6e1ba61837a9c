use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// History longer than this is cut back on construction.
pub const CONTEXT_HISTORY_MAX_SIZE: usize = 20;
/// Number of most recent entries kept once the history exceeds the max.
pub const CONTEXT_HISTORY_TRUNCATE_TO: usize = 15;

/// Errors raised when a ticket or agent output value is constructed with bad data.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    #[error("Invalid ISO 8601 timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("phase index must be >= 1, got {0}")]
    PhaseIndexOutOfRange(u32),

    #[error("{field} exceeds {max} characters (got {actual})")]
    FieldTooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },

    #[error("user_learning_tip may only be set on the Resolved phase (phase is {0})")]
    LearningTipOutsideResolved(Phase),
}

/// Ticket lifecycle stages, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Phase {
    Received,
    Assigned,
    Diagnosed,
    Escalated,
    Resolved,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Received => "Received",
            Phase::Assigned => "Assigned",
            Phase::Diagnosed => "Diagnosed",
            Phase::Escalated => "Escalated",
            Phase::Resolved => "Resolved",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Resolved)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse classification of how the user feels about the ticket right now.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Frustrated,
    Satisfied,
    #[default]
    Neutral,
    Confused,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Frustrated => "frustrated",
            Sentiment::Satisfied => "satisfied",
            Sentiment::Neutral => "neutral",
            Sentiment::Confused => "confused",
        }
    }
}

impl std::str::FromStr for Sentiment {
    type Err = UnknownSentiment;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "frustrated" => Ok(Sentiment::Frustrated),
            "satisfied" => Ok(Sentiment::Satisfied),
            "neutral" => Ok(Sentiment::Neutral),
            "confused" => Ok(Sentiment::Confused),
            _ => Err(UnknownSentiment(s.to_string())),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
#[error("Unknown sentiment: {0}")]
pub struct UnknownSentiment(pub String);

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// ContextEntry
// ────────────────────────────────────────────────────────────────────────────

/// One prior exchange on a ticket: what the team said, what the user replied, and why.
///
/// Fields are private so an entry can only exist in validated form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ContextEntryInput")]
pub struct ContextEntry {
    phase: u32,
    timestamp: String,
    what_we_said: String,
    what_user_said_back: String,
    our_reasoning: String,
}

/// Unvalidated wire shape of a [`ContextEntry`].
#[derive(Debug, Clone, Deserialize)]
pub struct ContextEntryInput {
    pub phase: u32,
    pub timestamp: String,
    pub what_we_said: String,
    pub what_user_said_back: String,
    pub our_reasoning: String,
}

impl ContextEntry {
    pub fn new(
        phase: u32,
        timestamp: impl Into<String>,
        what_we_said: impl Into<String>,
        what_user_said_back: impl Into<String>,
        our_reasoning: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        if phase < 1 {
            return Err(ValidationError::PhaseIndexOutOfRange(phase));
        }

        let timestamp = timestamp.into();
        validate_timestamp(&timestamp)?;

        Ok(Self {
            phase,
            timestamp,
            what_we_said: require_text("what_we_said", what_we_said.into())?,
            what_user_said_back: require_text("what_user_said_back", what_user_said_back.into())?,
            our_reasoning: require_text("our_reasoning", our_reasoning.into())?,
        })
    }

    pub fn phase(&self) -> u32 {
        self.phase
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn what_we_said(&self) -> &str {
        &self.what_we_said
    }

    pub fn what_user_said_back(&self) -> &str {
        &self.what_user_said_back
    }

    pub fn our_reasoning(&self) -> &str {
        &self.our_reasoning
    }
}

impl TryFrom<ContextEntryInput> for ContextEntry {
    type Error = ValidationError;

    fn try_from(input: ContextEntryInput) -> Result<Self, Self::Error> {
        ContextEntry::new(
            input.phase,
            input.timestamp,
            input.what_we_said,
            input.what_user_said_back,
            input.our_reasoning,
        )
    }
}

// ────────────────────────────────────────────────────────────────────────────
// TicketState
// ────────────────────────────────────────────────────────────────────────────

/// Snapshot of a ticket handed to the agent for one generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TicketStateInput")]
pub struct TicketState {
    ticket_id: String,
    user_name: String,
    initial_issue: String,
    current_phase: Phase,
    context_history: Vec<ContextEntry>,
    user_sentiment: Sentiment,
    latest_user_feedback: Option<String>,
}

/// Unvalidated wire shape of a [`TicketState`].
#[derive(Debug, Clone, Deserialize)]
pub struct TicketStateInput {
    pub ticket_id: String,
    pub user_name: String,
    pub initial_issue: String,
    pub current_phase: Phase,
    #[serde(default)]
    pub context_history: Vec<ContextEntry>,
    #[serde(default)]
    pub user_sentiment: Sentiment,
    #[serde(default)]
    pub latest_user_feedback: Option<String>,
}

impl TicketState {
    /// Creates a ticket with an empty history and neutral sentiment.
    pub fn new(
        ticket_id: impl Into<String>,
        user_name: impl Into<String>,
        initial_issue: impl Into<String>,
        current_phase: Phase,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            ticket_id: require_text("ticket_id", ticket_id.into())?,
            user_name: require_text("user_name", user_name.into())?,
            initial_issue: require_text("initial_issue", initial_issue.into())?,
            current_phase,
            context_history: Vec::new(),
            user_sentiment: Sentiment::Neutral,
            latest_user_feedback: None,
        })
    }

    /// Replaces the history. Lists over the max keep only the most recent entries.
    pub fn with_context_history(mut self, history: Vec<ContextEntry>) -> Self {
        self.context_history = bound_history(history);
        self
    }

    pub fn with_sentiment(mut self, sentiment: Sentiment) -> Self {
        self.user_sentiment = sentiment;
        self
    }

    pub fn with_latest_feedback(mut self, feedback: Option<String>) -> Self {
        self.latest_user_feedback = feedback;
        self
    }

    pub fn ticket_id(&self) -> &str {
        &self.ticket_id
    }

    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    pub fn initial_issue(&self) -> &str {
        &self.initial_issue
    }

    pub fn current_phase(&self) -> Phase {
        self.current_phase
    }

    pub fn context_history(&self) -> &[ContextEntry] {
        &self.context_history
    }

    pub fn user_sentiment(&self) -> Sentiment {
        self.user_sentiment
    }

    pub fn latest_user_feedback(&self) -> Option<&str> {
        self.latest_user_feedback.as_deref()
    }
}

impl TryFrom<TicketStateInput> for TicketState {
    type Error = ValidationError;

    fn try_from(input: TicketStateInput) -> Result<Self, Self::Error> {
        Ok(TicketState::new(
            input.ticket_id,
            input.user_name,
            input.initial_issue,
            input.current_phase,
        )?
        .with_context_history(input.context_history)
        .with_sentiment(input.user_sentiment)
        .with_latest_feedback(input.latest_user_feedback))
    }
}

fn bound_history(mut history: Vec<ContextEntry>) -> Vec<ContextEntry> {
    if history.len() > CONTEXT_HISTORY_MAX_SIZE {
        warn!(
            "context_history has {} entries (max {}); keeping the last {}",
            history.len(),
            CONTEXT_HISTORY_MAX_SIZE,
            CONTEXT_HISTORY_TRUNCATE_TO
        );
        let cut = history.len() - CONTEXT_HISTORY_TRUNCATE_TO;
        history.drain(..cut);
    }
    history
}

pub(crate) fn require_text(field: &'static str, value: String) -> Result<String, ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    Ok(value)
}

/// Accepts RFC 3339 (with `Z` or an offset), a naive date-time, or a bare date.
fn validate_timestamp(value: &str) -> Result<(), ValidationError> {
    let parses = DateTime::parse_from_rfc3339(value).is_ok()
        || NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
        || NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f").is_ok()
        || NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok();

    if parses {
        Ok(())
    } else {
        Err(ValidationError::InvalidTimestamp(value.to_string()))
    }
}
