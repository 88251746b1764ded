//! # Database Persistence Layer
//!
//! Optional Postgres mirror for dispatch state via SQLx.
//!
//! The in-memory repositories remain the runtime source of truth. When
//! `DATABASE_URL` is set, agent and request records are hydrated from
//! Postgres at startup and every committed write is mirrored back.
//! When absent, the API operates in in-memory-only mode (suitable for
//! development and testing).
//!
//! Mirror failures are logged and swallowed: like notification
//! delivery, persistence of the mirror is decoupled from the
//! already-committed in-memory transition. State machine constraints
//! are enforced at the application layer, not in SQL.

pub mod agents;
pub mod requests;

use sqlx::postgres::{PgPool, PgPoolOptions};

use fieldops_core::Agent;
use fieldops_dispatch::{AgentRepository, ServiceRequest};

use crate::state::AppState;

/// Initialize the database connection pool and run migrations.
///
/// Returns `None` if `DATABASE_URL` is not set (in-memory-only mode).
/// Returns `Err` if the URL is set but the connection or migration
/// fails.
pub async fn init_pool(database_url: Option<&str>) -> Result<Option<PgPool>, sqlx::Error> {
    let url = match database_url {
        Some(url) => url,
        None => {
            tracing::warn!(
                "DATABASE_URL not set — running in-memory only mode. \
                 State will not survive restarts."
            );
            return Ok(None);
        }
    };

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(url)
        .await?;

    tracing::info!("Connected to PostgreSQL");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    Ok(Some(pool))
}

/// Load all persisted agents and requests into the in-memory stores.
pub async fn hydrate(state: &AppState) -> Result<(), sqlx::Error> {
    let Some(pool) = &state.db else {
        return Ok(());
    };

    let agent_records = agents::fetch_all(pool).await?;
    let agent_count = agent_records.len();
    for agent in agent_records {
        state.agents.upsert(agent);
    }

    let request_records = requests::fetch_all(pool).await?;
    let request_count = request_records.len();
    for request in request_records {
        state.requests.insert(request);
    }

    tracing::info!(agent_count, request_count, "hydrated state from database");
    Ok(())
}

/// Mirror a committed agent write. Best-effort.
pub async fn mirror_agent(state: &AppState, agent: &Agent) {
    let Some(pool) = &state.db else { return };
    if let Err(e) = agents::upsert(pool, agent).await {
        tracing::warn!(agent = %agent.id, error = %e, "agent mirror write failed");
    }
}

/// Mirror a committed dispatch transition: the request record plus the
/// agents it touched (assignment and reservation flip availability on
/// every agent in the attempted chain).
pub async fn mirror_dispatch(state: &AppState, request: &ServiceRequest) {
    let Some(pool) = &state.db else { return };

    if let Err(e) = requests::upsert(pool, request).await {
        tracing::warn!(request = %request.id, error = %e, "request mirror write failed");
    }
    for agent_id in &request.attempted {
        if let Some(agent) = state.agents.get(agent_id) {
            if let Err(e) = agents::upsert(pool, &agent).await {
                tracing::warn!(agent = %agent.id, error = %e, "agent mirror write failed");
            }
        }
    }
}
