//! Ticket explanation pipeline.
//!
//! Flow: extract previous attempts → detect sentiment → select tone →
//!       build context → generate → parse reply → validated AgentOutput.
//!
//! One call, one ticket. Nothing is retried here: a failed or malformed
//! generation goes straight back to the caller.

use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::agent::context::{build_context, extract_previous_attempts};
use crate::agent::keywords::KeywordTables;
use crate::agent::overlap::{max_overlap, no_repetition};
use crate::agent::prompts::{SYSTEM_PROMPT, USER_MESSAGE_TEMPLATE};
use crate::agent::sentiment::detect_sentiment;
use crate::agent::tone::{select_tone, tone_instruction};
use crate::llm_client::prompts::TICKET_REPLY_SCHEMA_INSTRUCTION;
use crate::llm_client::{
    strip_json_fences, GenerationRequest, GenerationService, LlmError, DEFAULT_MAX_TOKENS,
};
use crate::models::{AgentOutput, AgentOutputDraft, Sentiment, TicketState, Tone};

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Generation failed: {0}")]
    GenerationFailed(#[source] LlmError),

    #[error("Invalid generation output: {0}")]
    InvalidOutput(String),

    #[error("Generated summary repeats an earlier attempt ({max_overlap:.2} overlap)")]
    Repetition { max_overlap: f64 },

    #[error("system prompt cannot be empty")]
    EmptySystemPrompt,
}

/// The reply shape the model is asked for. Extra keys are ignored.
#[derive(Debug, Deserialize)]
struct GeneratedReply {
    summary: String,
    reasoning: String,
    next_step: String,
    #[serde(default)]
    user_learning_tip: Option<String>,
}

/// Context-aware explanation agent. Cheap to share behind an `Arc`; holds no
/// per-ticket state.
pub struct Agent {
    generator: Arc<dyn GenerationService>,
    keywords: KeywordTables,
    system_prompt: String,
    max_output_tokens: u32,
    enforce_no_repetition: bool,
}

impl Agent {
    pub fn new(generator: Arc<dyn GenerationService>) -> Self {
        Self {
            generator,
            keywords: KeywordTables::default(),
            system_prompt: SYSTEM_PROMPT.to_string(),
            max_output_tokens: DEFAULT_MAX_TOKENS,
            enforce_no_repetition: false,
        }
    }

    pub fn with_keywords(mut self, keywords: KeywordTables) -> Self {
        self.keywords = keywords;
        self
    }

    pub fn with_system_prompt(mut self, prompt: &str) -> Result<Self, AgentError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(AgentError::EmptySystemPrompt);
        }
        self.system_prompt = prompt.to_string();
        Ok(self)
    }

    pub fn with_max_output_tokens(mut self, max_tokens: u32) -> Self {
        self.max_output_tokens = max_tokens;
        self
    }

    /// Reject summaries that fail the repetition guard instead of only logging them.
    pub fn with_repetition_enforcement(mut self, enforce: bool) -> Self {
        self.enforce_no_repetition = enforce;
        self
    }

    pub fn keywords(&self) -> &KeywordTables {
        &self.keywords
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Runs the full pipeline for one ticket.
    pub async fn process(&self, ticket: &TicketState) -> Result<AgentOutput, AgentError> {
        info!(
            "Processing ticket {} (phase: {})",
            ticket.ticket_id(),
            ticket.current_phase()
        );

        // Step a: what has been tried already
        let previous = extract_previous_attempts(ticket.context_history());
        debug!(
            "Ticket {}: {} previous attempts, {} escalations",
            ticket.ticket_id(),
            previous.attempted_fixes.len(),
            previous.escalations.len()
        );

        // Step b/c: sentiment, then tone
        let sentiment = self.sentiment_for(ticket);
        let tone = select_tone(ticket.current_phase(), sentiment);

        // Step d/e: context and generation
        let context = build_context(ticket, &previous);
        let request = self.build_request(&context, tone);

        info!(
            "Generation call: ticket={}, phase={}, tone={}, sentiment={}, context_entries={}, context_len={}, message_len={}",
            ticket.ticket_id(),
            ticket.current_phase(),
            tone,
            sentiment,
            ticket.context_history().len(),
            context.len(),
            request.user_message.len()
        );

        let raw = self.generator.generate(&request).await.map_err(|e| {
            error!("Generation failed for ticket {}: {e}", ticket.ticket_id());
            AgentError::GenerationFailed(e)
        })?;

        debug!(
            "Generation reply for ticket {}: {} chars",
            ticket.ticket_id(),
            raw.len()
        );

        // Step f/g: parse and validate
        let output = self.parse_reply(&raw, ticket, tone, sentiment)?;

        if !no_repetition(output.summary(), ticket.context_history()) {
            if self.enforce_no_repetition {
                return Err(AgentError::Repetition {
                    max_overlap: max_overlap(output.summary(), ticket.context_history()),
                });
            }
            warn!(
                "Ticket {}: summary overlaps an earlier attempt (advisory only)",
                ticket.ticket_id()
            );
        }

        info!(
            "Generated response for {} at {}: {}",
            ticket.ticket_id(),
            output.timestamp().to_rfc3339(),
            tone
        );
        Ok(output)
    }

    /// Sentiment from the ticket's latest feedback, or from the most recent
    /// reply in its history when no separate feedback is attached.
    pub fn sentiment_for(&self, ticket: &TicketState) -> Sentiment {
        let feedback = ticket
            .latest_user_feedback()
            .filter(|f| !f.trim().is_empty())
            .or_else(|| {
                ticket
                    .context_history()
                    .last()
                    .map(|e| e.what_user_said_back())
            });
        detect_sentiment(&self.keywords, ticket.user_sentiment(), feedback)
    }

    fn build_request(&self, context: &str, tone: Tone) -> GenerationRequest {
        let user_message = USER_MESSAGE_TEMPLATE
            .replace("{context}", context)
            .replace("{tone_instruction}", tone_instruction(tone))
            .replace("{output_schema}", TICKET_REPLY_SCHEMA_INSTRUCTION);

        GenerationRequest {
            system: self.system_prompt.clone(),
            user_message,
            max_tokens: self.max_output_tokens,
        }
    }

    fn parse_reply(
        &self,
        raw: &str,
        ticket: &TicketState,
        tone: Tone,
        sentiment: Sentiment,
    ) -> Result<AgentOutput, AgentError> {
        // serde_json messages can quote reply text, so only the position is reported
        let reply: GeneratedReply = serde_json::from_str(strip_json_fences(raw)).map_err(|e| {
            error!(
                "Unparseable generation reply for ticket {} ({} chars): {:?} error at line {} column {}",
                ticket.ticket_id(),
                raw.len(),
                e.classify(),
                e.line(),
                e.column()
            );
            AgentError::InvalidOutput(format!(
                "reply is not the expected JSON ({:?} error at line {} column {})",
                e.classify(),
                e.line(),
                e.column()
            ))
        })?;

        AgentOutput::new(AgentOutputDraft {
            ticket_id: ticket.ticket_id().to_string(),
            phase: ticket.current_phase(),
            summary: reply.summary.trim().to_string(),
            reasoning: reply.reasoning.trim().to_string(),
            next_step: reply.next_step.trim().to_string(),
            tone_applied: tone,
            sentiment_detected: sentiment,
            user_learning_tip: reply.user_learning_tip,
            model_used: self.generator.model_id().to_string(),
            timestamp: None,
        })
        .map_err(|e| {
            error!(
                "Generation reply for ticket {} failed validation: {e}",
                ticket.ticket_id()
            );
            AgentError::InvalidOutput(e.to_string())
        })
    }
}
