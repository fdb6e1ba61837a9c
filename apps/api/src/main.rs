mod agent;
mod config;
mod errors;
mod llm_client;
mod models;
mod routes;
mod state;
mod store;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::agent::keywords::KeywordTables;
use crate::agent::Agent;
use crate::config::Config;
use crate::llm_client::{LlmClient, LlmSettings};
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::InMemoryTicketStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting TicketGlass API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM client
    let llm = LlmClient::new(LlmSettings {
        api_key: config.anthropic_api_key.clone(),
        model: config.llm_model.clone(),
        timeout: Duration::from_secs(config.llm_timeout_secs),
        max_retries: config.llm_max_retries,
    })
    .context("Failed to build LLM client")?;
    info!(
        "LLM client initialized (model: {}, retries: {})",
        config.llm_model, config.llm_max_retries
    );

    // Sentiment keywords (defaults, optionally overridden from a JSON file)
    let keywords = match &config.sentiment_keywords_path {
        Some(path) => KeywordTables::from_override_file(path)?,
        None => KeywordTables::default(),
    };
    info!("Sentiment keywords loaded ({} total)", keywords.all_keywords().len());

    let mut agent = Agent::new(Arc::new(llm))
        .with_keywords(keywords)
        .with_max_output_tokens(config.llm_max_output_tokens)
        .with_repetition_enforcement(config.enforce_no_repetition);

    if let Some(path) = &config.system_prompt_path {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read system prompt from {}", path.display()))?;
        agent = agent.with_system_prompt(&prompt)?;
        info!("Custom system prompt loaded ({} chars)", agent.system_prompt().len());
    }

    // Initialize ticket store
    let store = InMemoryTicketStore::new();
    if let Some(path) = &config.tickets_seed_path {
        let count = store
            .load_from_path(path)
            .await
            .with_context(|| format!("Failed to load tickets from {}", path.display()))?;
        info!("Seeded {count} tickets from {}", path.display());
    }

    // Build app state
    let state = AppState {
        agent: Arc::new(agent),
        store: Arc::new(store),
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the support portal domain is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
