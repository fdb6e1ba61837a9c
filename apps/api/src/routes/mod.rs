pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::agent::handlers as agent;
use crate::state::AppState;
use crate::store::handlers as tickets;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Ticket API
        .route("/api/v1/tickets", get(tickets::handle_list_tickets))
        .route("/api/v1/tickets/:id", get(tickets::handle_get_ticket))
        .route(
            "/api/v1/tickets/:id/explain",
            post(agent::handle_explain_ticket),
        )
        .route(
            "/api/v1/tickets/:id/feedback",
            post(tickets::handle_submit_feedback).get(tickets::handle_list_feedback),
        )
        .route(
            "/api/v1/feedback/analytics",
            get(tickets::handle_feedback_analytics),
        )
        // Agent API
        .route("/api/v1/agent/process", post(agent::handle_process))
        .route(
            "/api/v1/agent/repetition-check",
            post(agent::handle_repetition_check),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::agent::orchestrator::tests::{StubGenerator, GOOD_REPLY};
    use crate::agent::Agent;
    use crate::config::Config;
    use crate::store::tests::wifi_ticket;
    use crate::store::{InMemoryTicketStore, TicketStore};

    fn test_config() -> Config {
        Config {
            anthropic_api_key: "sk-test".to_string(),
            llm_model: "stub-model".to_string(),
            llm_max_output_tokens: 1024,
            llm_max_retries: 1,
            llm_timeout_secs: 5,
            port: 0,
            rust_log: "debug".to_string(),
            tickets_seed_path: None,
            sentiment_keywords_path: None,
            system_prompt_path: None,
            enforce_no_repetition: false,
        }
    }

    async fn app_with(generator: StubGenerator) -> (Router, Arc<InMemoryTicketStore>) {
        let store = Arc::new(InMemoryTicketStore::new());
        store
            .load_tickets(BTreeMap::from([("TKT-008".to_string(), wifi_ticket())]))
            .await;

        let state = AppState {
            agent: Arc::new(Agent::new(Arc::new(generator))),
            store: store.clone(),
            config: test_config(),
        };
        (build_router(state), store)
    }

    async fn send(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = app_with(StubGenerator::replying(GOOD_REPLY)).await;
        let (status, body) = send(app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["service"], "ticketglass-api");
        assert_eq!(body["model"], "stub-model");
    }

    #[tokio::test]
    async fn test_list_and_get_tickets() {
        let (app, _) = app_with(StubGenerator::replying(GOOD_REPLY)).await;

        let (status, body) = send(app.clone(), "GET", "/api/v1/tickets", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["ticket_id"], "TKT-008");
        assert_eq!(body[0]["current_phase"], "Diagnosed");
        assert_eq!(body[0]["resolved"], false);

        let (status, body) = send(app.clone(), "GET", "/api/v1/tickets/TKT-008", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["title"], "WiFi won't connect");
        assert_eq!(body["context_history"].as_array().unwrap().len(), 1);

        let (status, body) = send(app, "GET", "/api/v1/tickets/TKT-404", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_explain_writes_summary_back() {
        let (app, store) = app_with(StubGenerator::replying(GOOD_REPLY)).await;

        let (status, body) = send(app, "POST", "/api/v1/tickets/TKT-008/explain", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ticket_id"], "TKT-008");
        assert_eq!(body["tone_applied"], "empathetic");
        assert_eq!(body["sentiment_detected"], "frustrated");
        assert_eq!(body["model_used"], "stub-model");

        let ticket = store.fetch_ticket("TKT-008").await.unwrap();
        assert_eq!(
            ticket.status_events.last().unwrap().summary.as_deref(),
            body["summary"].as_str()
        );
    }

    #[tokio::test]
    async fn test_explain_unknown_ticket_is_404() {
        let (app, _) = app_with(StubGenerator::replying(GOOD_REPLY)).await;
        let (status, _) = send(app, "POST", "/api/v1/tickets/TKT-404/explain", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_generation_failure_is_502() {
        let (app, _) = app_with(StubGenerator::failing("overloaded")).await;
        let (status, body) = send(app, "POST", "/api/v1/tickets/TKT-008/explain", None).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"]["code"], "LLM_ERROR");
    }

    #[tokio::test]
    async fn test_malformed_generation_is_422() {
        let (app, _) = app_with(StubGenerator::replying("not json")).await;
        let (status, _) = send(app, "POST", "/api/v1/tickets/TKT-008/explain", None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_feedback_flow() {
        let (app, _) = app_with(StubGenerator::replying(GOOD_REPLY)).await;

        let (status, _) = send(
            app.clone(),
            "POST",
            "/api/v1/tickets/TKT-008/feedback",
            Some(json!({"feedback": "   "})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(
            app.clone(),
            "POST",
            "/api/v1/tickets/TKT-008/feedback",
            Some(json!({"feedback": "Thanks, that fixed it!"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"stored": true, "sentiment": "satisfied"}));

        let (_, body) = send(app.clone(), "GET", "/api/v1/tickets/TKT-008/feedback", None).await;
        assert_eq!(body.as_array().unwrap().len(), 1);

        let (_, body) = send(app, "GET", "/api/v1/feedback/analytics", None).await;
        assert_eq!(body["total_responses"], 1);
        assert_eq!(body["helpful_count"], 1);
        assert_eq!(body["helpful_percentage"], 100.0);
    }

    #[tokio::test]
    async fn test_process_takes_ticket_body() {
        let (app, _) = app_with(StubGenerator::replying(GOOD_REPLY)).await;
        let ticket = json!({
            "ticket_id": "TKT-100",
            "user_name": "Kai",
            "initial_issue": "Printer offline",
            "current_phase": "Diagnosed",
            "context_history": [{
                "phase": 2,
                "timestamp": "2025-10-18T09:00:00Z",
                "what_we_said": "Power cycle the printer.",
                "what_user_said_back": "still not working, this is ridiculous",
                "our_reasoning": "Most offline printers recover after a restart"
            }]
        });

        let (status, body) = send(app, "POST", "/api/v1/agent/process", Some(ticket)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ticket_id"], "TKT-100");
        assert_eq!(body["tone_applied"], "empathetic");
    }

    #[tokio::test]
    async fn test_process_rejects_invalid_ticket() {
        let (app, _) = app_with(StubGenerator::replying(GOOD_REPLY)).await;
        let ticket = json!({
            "ticket_id": "",
            "user_name": "Kai",
            "initial_issue": "Printer offline",
            "current_phase": "Received"
        });

        let (status, _) = send(app, "POST", "/api/v1/agent/process", Some(ticket)).await;
        assert!(status.is_client_error());
    }

    #[tokio::test]
    async fn test_repetition_check() {
        let (app, _) = app_with(StubGenerator::replying(GOOD_REPLY)).await;
        let history = json!([{
            "phase": 1,
            "timestamp": "2025-10-18",
            "what_we_said": "Clear your DNS cache now",
            "what_user_said_back": "ok",
            "our_reasoning": "first attempt"
        }]);

        let (status, body) = send(
            app.clone(),
            "POST",
            "/api/v1/agent/repetition-check",
            Some(json!({"summary": "Please clear your DNS cache now", "history": history})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["no_repetition"], false);

        let (_, body) = send(
            app,
            "POST",
            "/api/v1/agent/repetition-check",
            Some(json!({"summary": "Check your network adapter settings", "history": history})),
        )
        .await;
        assert_eq!(body["no_repetition"], true);
        assert!(body["max_overlap"].as_f64().unwrap() < 0.6);
    }
}
