//! # Application State
//!
//! Shared state threaded through every handler. The in-memory
//! repositories are the runtime source of truth; the optional Postgres
//! pool mirrors writes and hydrates them at startup. The engine itself
//! holds no per-caller session state — caller identity arrives as
//! explicit parameters on each call.

use std::sync::Arc;

use sqlx::postgres::PgPool;

use fieldops_dispatch::{
    CostEstimator, DispatchEngine, FlatRateEstimator, InMemoryAgentRepository,
    InMemoryRequestRepository,
};

use crate::notify::SessionRegistry;

/// Environment-driven service configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Port for the HTTP listener (`FIELDOPS_PORT`).
    pub port: u16,
    /// Optional Postgres connection string (`DATABASE_URL`).
    pub database_url: Option<String>,
}

impl AppConfig {
    /// Read configuration from the environment.
    pub fn from_env() -> Self {
        let port = std::env::var("FIELDOPS_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(8080);
        let database_url = std::env::var("DATABASE_URL").ok();
        Self { port, database_url }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            database_url: None,
        }
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub engine: Arc<DispatchEngine>,
    pub agents: Arc<InMemoryAgentRepository>,
    pub requests: Arc<InMemoryRequestRepository>,
    /// Live WebSocket sessions, keyed by user. Doubles as the engine's
    /// notifier.
    pub sessions: SessionRegistry,
    pub estimator: Arc<dyn CostEstimator>,
    /// Write-through mirror; `None` means in-memory only mode.
    pub db: Option<PgPool>,
}

impl AppState {
    /// In-memory state with default configuration (tests, development).
    pub fn new() -> Self {
        Self::with_config(AppConfig::default(), None)
    }

    /// Assemble state from configuration and an optional database pool.
    pub fn with_config(config: AppConfig, db: Option<PgPool>) -> Self {
        let agents = Arc::new(InMemoryAgentRepository::new());
        let requests = Arc::new(InMemoryRequestRepository::new());
        let sessions = SessionRegistry::new();
        let engine = Arc::new(DispatchEngine::new(
            agents.clone(),
            requests.clone(),
            Arc::new(sessions.clone()),
        ));
        Self {
            config: Arc::new(config),
            engine,
            agents,
            requests,
            sessions,
            estimator: Arc::new(FlatRateEstimator::default()),
            db,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("agents", &self.agents)
            .field("requests", &self.requests)
            .field("sessions", &self.sessions.connected())
            .field("db", &self.db.is_some())
            .finish()
    }
}
