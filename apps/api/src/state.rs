use std::sync::Arc;

use crate::agent::Agent;
use crate::config::Config;
use crate::store::TicketStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub agent: Arc<Agent>,
    /// Pluggable ticket source. Default: InMemoryTicketStore seeded from TICKETS_SEED_PATH.
    pub store: Arc<dyn TicketStore>,
    pub config: Config,
}
