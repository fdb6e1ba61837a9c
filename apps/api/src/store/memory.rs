use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::models::{Phase, Sentiment};
use crate::store::{FeedbackAnalytics, FeedbackRecord, StoreError, StoredTicket, TicketStore};

/// Process-local ticket store. Everything is lost on restart.
#[derive(Default)]
pub struct InMemoryTicketStore {
    tickets: RwLock<BTreeMap<String, StoredTicket>>,
    feedback: RwLock<BTreeMap<String, Vec<FeedbackRecord>>>,
}

impl InMemoryTicketStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces tickets, keyed by the map key.
    pub async fn load_tickets(&self, tickets: BTreeMap<String, StoredTicket>) {
        let mut store = self.tickets.write().await;
        store.extend(tickets);
        info!("Loaded {} tickets into the in-memory store", store.len());
    }

    /// Loads a JSON object of `ticket_id → StoredTicket`.
    pub async fn load_from_path(&self, path: &Path) -> Result<usize, StoreError> {
        let raw = tokio::fs::read_to_string(path).await?;
        let tickets: BTreeMap<String, StoredTicket> = serde_json::from_str(&raw)?;
        let count = tickets.len();
        self.load_tickets(tickets).await;
        Ok(count)
    }
}

#[async_trait]
impl TicketStore for InMemoryTicketStore {
    async fn fetch_ticket(&self, ticket_id: &str) -> Option<StoredTicket> {
        let ticket = self.tickets.read().await.get(ticket_id).cloned();
        if ticket.is_none() {
            warn!("Ticket {ticket_id} not found in store");
        }
        ticket
    }

    async fn store_feedback(&self, ticket_id: &str, feedback: &str, sentiment: Sentiment) -> bool {
        self.feedback
            .write()
            .await
            .entry(ticket_id.to_string())
            .or_default()
            .push(FeedbackRecord {
                id: Uuid::new_v4(),
                feedback: feedback.to_string(),
                sentiment,
                timestamp: Utc::now(),
            });
        info!("Stored feedback for {ticket_id}: sentiment={sentiment}");
        true
    }

    async fn get_all_tickets(&self) -> BTreeMap<String, StoredTicket> {
        self.tickets.read().await.clone()
    }

    async fn update_context_history(&self, ticket_id: &str, summary: &str, phase: Phase) -> bool {
        let mut tickets = self.tickets.write().await;
        let Some(ticket) = tickets.get_mut(ticket_id) else {
            error!("Cannot update context: ticket {ticket_id} not found");
            return false;
        };
        let Some(last) = ticket.status_events.last_mut() else {
            error!("Cannot update context: ticket {ticket_id} has no events");
            return false;
        };

        last.summary = Some(summary.to_string());
        info!("Updated context history for {ticket_id} at phase {phase}");
        true
    }

    async fn feedback_for(&self, ticket_id: &str) -> Vec<FeedbackRecord> {
        self.feedback
            .read()
            .await
            .get(ticket_id)
            .cloned()
            .unwrap_or_default()
    }

    async fn analytics(&self) -> FeedbackAnalytics {
        let feedback = self.feedback.read().await;
        let total_responses: usize = feedback.values().map(Vec::len).sum();
        let helpful_count = feedback
            .values()
            .flatten()
            .filter(|f| f.sentiment == Sentiment::Satisfied)
            .count();

        let helpful_percentage = if total_responses == 0 {
            0.0
        } else {
            (helpful_count as f64 / total_responses as f64 * 1000.0).round() / 10.0
        };

        FeedbackAnalytics {
            total_responses,
            helpful_count,
            helpful_percentage,
        }
    }
}
