//! Ticket storage: the stored ticket shape, its conversion into the agent's
//! `TicketState`, and the `TicketStore` seam.

pub mod handlers;
pub mod memory;

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{ContextEntry, Phase, Sentiment, TicketState, ValidationError};

pub use memory::InMemoryTicketStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to read ticket data: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed ticket data: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Ticket {ticket_id} cannot be converted: {source}")]
    Conversion {
        ticket_id: String,
        #[source]
        source: ValidationError,
    },
}

/// One entry in a ticket's status timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEvent {
    /// Wall-clock time of the event, "HH:MM".
    pub time: String,
    pub phase: Phase,
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_feedback: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub learning_tip: Option<String>,
}

/// A ticket as the store keeps it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredTicket {
    pub ticket_id: String,
    pub category: String,
    pub title: String,
    pub user_name: String,
    #[serde(default)]
    pub user_tone: Sentiment,
    #[serde(default)]
    pub status_events: Vec<StatusEvent>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

/// What was said and heard at one phase of a stored ticket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryItem {
    pub phase: Phase,
    pub time: String,
    pub what_we_said: Option<String>,
    pub user_response: Option<String>,
}

impl StoredTicket {
    /// Phase of the latest event; Received when there are none.
    pub fn current_phase(&self) -> Phase {
        self.status_events
            .last()
            .map(|e| e.phase)
            .unwrap_or(Phase::Received)
    }

    /// Events that carry a summary or a user reply.
    pub fn context_history(&self) -> Vec<HistoryItem> {
        self.status_events
            .iter()
            .filter(|e| e.summary.is_some() || e.user_feedback.is_some())
            .map(|e| HistoryItem {
                phase: e.phase,
                time: e.time.clone(),
                what_we_said: e.summary.clone(),
                user_response: e.user_feedback.clone(),
            })
            .collect()
    }

    /// Builds the agent's view of this ticket.
    ///
    /// The first event (submission) is skipped. Every later event with both a
    /// system text (summary, else resolution) and a user reply becomes one
    /// history entry, indexed by its position in the timeline.
    pub fn to_ticket_state(&self) -> Result<TicketState, StoreError> {
        let date = self.created_at.format("%Y-%m-%d");

        let history = self
            .status_events
            .iter()
            .enumerate()
            .skip(1)
            .filter_map(|(position, event)| {
                let said = event.summary.as_ref().or(event.resolution.as_ref())?;
                let reply = event.user_feedback.as_ref()?;
                Some(ContextEntry::new(
                    position as u32 + 1,
                    format!("{date}T{}:00", event.time),
                    said.clone(),
                    reply.clone(),
                    format!("Previous attempt at {} phase", event.phase),
                ))
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| self.conversion_error(e))?;

        let latest_feedback = self
            .status_events
            .last()
            .and_then(|e| e.user_feedback.clone());

        Ok(TicketState::new(
            self.ticket_id.clone(),
            self.user_name.clone(),
            self.title.clone(),
            self.current_phase(),
        )
        .map_err(|e| self.conversion_error(e))?
        .with_context_history(history)
        .with_sentiment(self.user_tone)
        .with_latest_feedback(latest_feedback))
    }

    fn conversion_error(&self, source: ValidationError) -> StoreError {
        StoreError::Conversion {
            ticket_id: self.ticket_id.clone(),
            source,
        }
    }
}

/// A piece of user feedback recorded against a ticket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedbackRecord {
    pub id: Uuid,
    pub feedback: String,
    pub sentiment: Sentiment,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedbackAnalytics {
    pub total_responses: usize,
    pub helpful_count: usize,
    pub helpful_percentage: f64,
}

/// Source of tickets for the agent. Swapping the backing system means one new
/// implementation; nothing in the agent changes.
#[async_trait]
pub trait TicketStore: Send + Sync {
    async fn fetch_ticket(&self, ticket_id: &str) -> Option<StoredTicket>;

    /// The ticket in the agent's shape, or `None` when it is unknown.
    async fn fetch_ticket_state(&self, ticket_id: &str) -> Result<Option<TicketState>, StoreError> {
        self.fetch_ticket(ticket_id)
            .await
            .map(|ticket| ticket.to_ticket_state())
            .transpose()
    }

    async fn store_feedback(&self, ticket_id: &str, feedback: &str, sentiment: Sentiment) -> bool;

    async fn get_all_tickets(&self) -> BTreeMap<String, StoredTicket>;

    /// Writes a generated summary onto the ticket's latest event.
    /// False when the ticket is unknown or has no events.
    async fn update_context_history(&self, ticket_id: &str, summary: &str, phase: Phase) -> bool;

    async fn feedback_for(&self, ticket_id: &str) -> Vec<FeedbackRecord>;

    async fn analytics(&self) -> FeedbackAnalytics;
}
