//! Axum route handlers for the Ticket and Feedback APIs.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::agent::sentiment::detect_sentiment;
use crate::errors::AppError;
use crate::models::{Phase, Sentiment};
use crate::state::AppState;
use crate::store::{FeedbackAnalytics, FeedbackRecord, HistoryItem, StoredTicket};

#[derive(Debug, Serialize)]
pub struct TicketSummary {
    pub ticket_id: String,
    pub title: String,
    pub category: String,
    pub user_name: String,
    pub current_phase: Phase,
    pub resolved: bool,
}

#[derive(Debug, Serialize)]
pub struct TicketDetailResponse {
    #[serde(flatten)]
    pub ticket: StoredTicket,
    pub current_phase: Phase,
    pub context_history: Vec<HistoryItem>,
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub feedback: String,
}

#[derive(Debug, Serialize)]
pub struct FeedbackResponse {
    pub stored: bool,
    pub sentiment: Sentiment,
}

/// GET /api/v1/tickets
pub async fn handle_list_tickets(State(state): State<AppState>) -> Json<Vec<TicketSummary>> {
    let tickets = state.store.get_all_tickets().await;
    Json(
        tickets
            .into_values()
            .map(|t| TicketSummary {
                current_phase: t.current_phase(),
                resolved: t.current_phase().is_terminal(),
                ticket_id: t.ticket_id,
                title: t.title,
                category: t.category,
                user_name: t.user_name,
            })
            .collect(),
    )
}

/// GET /api/v1/tickets/:id
pub async fn handle_get_ticket(
    State(state): State<AppState>,
    Path(ticket_id): Path<String>,
) -> Result<Json<TicketDetailResponse>, AppError> {
    let ticket = state
        .store
        .fetch_ticket(&ticket_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Ticket {ticket_id} not found")))?;

    Ok(Json(TicketDetailResponse {
        current_phase: ticket.current_phase(),
        context_history: ticket.context_history(),
        ticket,
    }))
}

/// POST /api/v1/tickets/:id/feedback
///
/// Classifies the feedback against the ticket's recorded tone and stores it.
pub async fn handle_submit_feedback(
    State(state): State<AppState>,
    Path(ticket_id): Path<String>,
    Json(request): Json<FeedbackRequest>,
) -> Result<Json<FeedbackResponse>, AppError> {
    let feedback = request.feedback.trim();
    if feedback.is_empty() {
        return Err(AppError::Validation("feedback cannot be empty".to_string()));
    }

    let ticket = state
        .store
        .fetch_ticket(&ticket_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Ticket {ticket_id} not found")))?;

    let sentiment = detect_sentiment(state.agent.keywords(), ticket.user_tone, Some(feedback));
    let stored = state
        .store
        .store_feedback(&ticket_id, feedback, sentiment)
        .await;

    Ok(Json(FeedbackResponse { stored, sentiment }))
}

/// GET /api/v1/tickets/:id/feedback
pub async fn handle_list_feedback(
    State(state): State<AppState>,
    Path(ticket_id): Path<String>,
) -> Result<Json<Vec<FeedbackRecord>>, AppError> {
    if state.store.fetch_ticket(&ticket_id).await.is_none() {
        return Err(AppError::NotFound(format!("Ticket {ticket_id} not found")));
    }
    Ok(Json(state.store.feedback_for(&ticket_id).await))
}

/// GET /api/v1/feedback/analytics
pub async fn handle_feedback_analytics(State(state): State<AppState>) -> Json<FeedbackAnalytics> {
    Json(state.store.analytics().await)
}
