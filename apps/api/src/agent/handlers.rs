//! Axum route handlers for the Agent API.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::agent::overlap::{max_overlap, no_repetition};
use crate::errors::AppError;
use crate::models::{AgentOutput, ContextEntry, TicketState};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RepetitionCheckRequest {
    pub summary: String,
    #[serde(default)]
    pub history: Vec<ContextEntry>,
}

#[derive(Debug, Serialize)]
pub struct RepetitionCheckResponse {
    pub no_repetition: bool,
    pub max_overlap: f64,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/tickets/:id/explain
///
/// Explains a stored ticket and writes the new summary back onto its latest event.
pub async fn handle_explain_ticket(
    State(state): State<AppState>,
    Path(ticket_id): Path<String>,
) -> Result<Json<AgentOutput>, AppError> {
    let ticket = state
        .store
        .fetch_ticket_state(&ticket_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Ticket {ticket_id} not found")))?;

    let output = state.agent.process(&ticket).await?;

    if !state
        .store
        .update_context_history(&ticket_id, output.summary(), output.phase())
        .await
    {
        warn!("Generated summary for {ticket_id} was not written back");
    }

    Ok(Json(output))
}

/// POST /api/v1/agent/process
///
/// Runs the agent on a caller-supplied ticket. Nothing is stored.
pub async fn handle_process(
    State(state): State<AppState>,
    Json(ticket): Json<TicketState>,
) -> Result<Json<AgentOutput>, AppError> {
    let output = state.agent.process(&ticket).await?;
    Ok(Json(output))
}

/// POST /api/v1/agent/repetition-check
pub async fn handle_repetition_check(
    Json(request): Json<RepetitionCheckRequest>,
) -> Result<Json<RepetitionCheckResponse>, AppError> {
    if request.summary.trim().is_empty() {
        return Err(AppError::Validation("summary cannot be empty".to_string()));
    }

    Ok(Json(RepetitionCheckResponse {
        no_repetition: no_repetition(&request.summary, &request.history),
        max_overlap: max_overlap(&request.summary, &request.history),
    }))
}
