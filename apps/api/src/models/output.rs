use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::ticket::{require_text, Phase, Sentiment, ValidationError};

pub const SUMMARY_MAX_LENGTH: usize = 500;
pub const REASONING_MAX_LENGTH: usize = 300;
pub const NEXT_STEP_MAX_LENGTH: usize = 300;
pub const LEARNING_TIP_MAX_LENGTH: usize = 250;

/// Communicative style applied to a generated response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Initial,
    Empathetic,
    Escalation,
    Celebratory,
    Simplified,
}

impl Tone {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Initial => "initial",
            Tone::Empathetic => "empathetic",
            Tone::Escalation => "escalation",
            Tone::Celebratory => "celebratory",
            Tone::Simplified => "simplified",
        }
    }
}

impl std::fmt::Display for Tone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The agent's validated reply for one ticket.
///
/// Only constructible through [`AgentOutput::new`] (or deserialization, which
/// runs the same checks), so every instance satisfies the length bounds and the
/// Resolved-only learning tip rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "AgentOutputDraft")]
pub struct AgentOutput {
    ticket_id: String,
    phase: Phase,
    summary: String,
    reasoning: String,
    next_step: String,
    tone_applied: Tone,
    sentiment_detected: Sentiment,
    user_learning_tip: Option<String>,
    model_used: String,
    timestamp: DateTime<Utc>,
}

/// Unvalidated field set for an [`AgentOutput`].
#[derive(Debug, Clone, Deserialize)]
pub struct AgentOutputDraft {
    pub ticket_id: String,
    pub phase: Phase,
    pub summary: String,
    pub reasoning: String,
    pub next_step: String,
    pub tone_applied: Tone,
    pub sentiment_detected: Sentiment,
    #[serde(default)]
    pub user_learning_tip: Option<String>,
    pub model_used: String,
    /// Defaults to now when absent.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl AgentOutput {
    pub fn new(draft: AgentOutputDraft) -> Result<Self, ValidationError> {
        let summary = bounded_text("summary", draft.summary, SUMMARY_MAX_LENGTH)?;
        let reasoning = bounded_text("reasoning", draft.reasoning, REASONING_MAX_LENGTH)?;
        let next_step = bounded_text("next_step", draft.next_step, NEXT_STEP_MAX_LENGTH)?;

        if let Some(tip) = &draft.user_learning_tip {
            if draft.phase != Phase::Resolved {
                return Err(ValidationError::LearningTipOutsideResolved(draft.phase));
            }
            check_max("user_learning_tip", tip, LEARNING_TIP_MAX_LENGTH)?;
        }

        Ok(Self {
            ticket_id: draft.ticket_id,
            phase: draft.phase,
            summary,
            reasoning,
            next_step,
            tone_applied: draft.tone_applied,
            sentiment_detected: draft.sentiment_detected,
            user_learning_tip: draft.user_learning_tip,
            model_used: draft.model_used,
            timestamp: draft.timestamp.unwrap_or_else(Utc::now),
        })
    }

    pub fn ticket_id(&self) -> &str {
        &self.ticket_id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn reasoning(&self) -> &str {
        &self.reasoning
    }

    pub fn next_step(&self) -> &str {
        &self.next_step
    }

    pub fn tone_applied(&self) -> Tone {
        self.tone_applied
    }

    pub fn sentiment_detected(&self) -> Sentiment {
        self.sentiment_detected
    }

    pub fn user_learning_tip(&self) -> Option<&str> {
        self.user_learning_tip.as_deref()
    }

    pub fn model_used(&self) -> &str {
        &self.model_used
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

impl TryFrom<AgentOutputDraft> for AgentOutput {
    type Error = ValidationError;

    fn try_from(draft: AgentOutputDraft) -> Result<Self, Self::Error> {
        AgentOutput::new(draft)
    }
}

fn bounded_text(field: &'static str, value: String, max: usize) -> Result<String, ValidationError> {
    let value = require_text(field, value)?;
    check_max(field, &value, max)?;
    Ok(value)
}

fn check_max(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    let actual = value.chars().count();
    if actual > max {
        return Err(ValidationError::FieldTooLong { field, max, actual });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(phase: Phase, tip: Option<&str>) -> AgentOutputDraft {
        AgentOutputDraft {
            ticket_id: "TKT-001".to_string(),
            phase,
            summary: "We restarted the print spooler on your machine.".to_string(),
            reasoning: "The queue was stuck, which blocks every job behind it.".to_string(),
            next_step: "Try printing a test page and tell us what happens.".to_string(),
            tone_applied: Tone::Initial,
            sentiment_detected: Sentiment::Neutral,
            user_learning_tip: tip.map(str::to_string),
            model_used: "claude-sonnet-4-5".to_string(),
            timestamp: None,
        }
    }

    #[test]
    fn test_learning_tip_rejected_outside_resolved() {
        for phase in [
            Phase::Received,
            Phase::Assigned,
            Phase::Diagnosed,
            Phase::Escalated,
        ] {
            let err = AgentOutput::new(draft(phase, Some("Keep drivers updated"))).unwrap_err();
            assert_eq!(err, ValidationError::LearningTipOutsideResolved(phase));
        }
    }

    #[test]
    fn test_learning_tip_allowed_on_resolved() {
        let output = AgentOutput::new(draft(Phase::Resolved, Some("Keep drivers updated"))).unwrap();
        assert_eq!(output.user_learning_tip(), Some("Keep drivers updated"));
    }

    #[test]
    fn test_no_tip_is_fine_on_any_phase() {
        assert!(AgentOutput::new(draft(Phase::Diagnosed, None)).is_ok());
        assert!(AgentOutput::new(draft(Phase::Resolved, None)).is_ok());
    }

    #[test]
    fn test_summary_bounds() {
        let mut d = draft(Phase::Assigned, None);
        d.summary = String::new();
        assert_eq!(
            AgentOutput::new(d).unwrap_err(),
            ValidationError::EmptyField("summary")
        );

        let mut d = draft(Phase::Assigned, None);
        d.summary = "é".repeat(SUMMARY_MAX_LENGTH);
        assert!(AgentOutput::new(d).is_ok(), "limit counts characters, not bytes");

        let mut d = draft(Phase::Assigned, None);
        d.summary = "x".repeat(SUMMARY_MAX_LENGTH + 1);
        assert_eq!(
            AgentOutput::new(d).unwrap_err(),
            ValidationError::FieldTooLong {
                field: "summary",
                max: SUMMARY_MAX_LENGTH,
                actual: SUMMARY_MAX_LENGTH + 1
            }
        );
    }

    #[test]
    fn test_reasoning_and_next_step_limits() {
        let mut d = draft(Phase::Assigned, None);
        d.reasoning = "r".repeat(REASONING_MAX_LENGTH + 1);
        assert!(AgentOutput::new(d).is_err());

        let mut d = draft(Phase::Assigned, None);
        d.next_step = "n".repeat(NEXT_STEP_MAX_LENGTH + 1);
        assert!(AgentOutput::new(d).is_err());

        let d = draft(Phase::Resolved, Some(&"t".repeat(LEARNING_TIP_MAX_LENGTH + 1)));
        assert!(AgentOutput::new(d).is_err());
    }

    #[test]
    fn test_output_json_round_trip_preserves_fields() {
        let output = AgentOutput::new(draft(Phase::Resolved, Some("Label your cables"))).unwrap();
        let json = serde_json::to_value(&output).unwrap();

        assert_eq!(json["phase"], "Resolved");
        assert_eq!(json["tone_applied"], "initial");
        assert_eq!(json["sentiment_detected"], "neutral");
        assert_eq!(json["user_learning_tip"], "Label your cables");

        let recovered: AgentOutput = serde_json::from_value(json).unwrap();
        assert_eq!(recovered, output);
        assert_eq!(recovered.timestamp(), output.timestamp());
    }

    #[test]
    fn test_timestamp_kept_when_given() {
        let at: DateTime<Utc> = "2025-10-18T09:00:00Z".parse().unwrap();
        let mut given = draft(Phase::Diagnosed, None);
        given.timestamp = Some(at);
        assert_eq!(AgentOutput::new(given).unwrap().timestamp(), at);

        let before = Utc::now();
        let defaulted = AgentOutput::new(draft(Phase::Diagnosed, None)).unwrap();
        assert!(defaulted.timestamp() >= before);
    }

    #[test]
    fn test_deserialization_enforces_tip_rule() {
        let json = serde_json::json!({
            "ticket_id": "TKT-002",
            "phase": "Diagnosed",
            "summary": "s",
            "reasoning": "r",
            "next_step": "n",
            "tone_applied": "escalation",
            "sentiment_detected": "neutral",
            "user_learning_tip": "nope",
            "model_used": "m",
            "timestamp": "2025-10-18T09:00:00Z"
        });
        assert!(serde_json::from_value::<AgentOutput>(json).is_err());
    }
}
