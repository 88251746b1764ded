//! # fieldops-api — Axum API Surface for the FieldOps Dispatch Stack
//!
//! HTTP and WebSocket surface over the dispatch engine.
//!
//! ## API Surface
//!
//! | Prefix                      | Module                | Domain                    |
//! |-----------------------------|-----------------------|---------------------------|
//! | `/v1/requests/*`            | [`routes::requests`]  | Intake, responses, views  |
//! | `/v1/users/:id/requests`    | [`routes::requests`]  | Per-user request history  |
//! | `/v1/agents/*`              | [`routes::agents`]    | Agent administration      |
//! | `/v1/sessions/:user_id/ws`  | [`routes::sessions`]  | Live push sessions        |
//! | `/openapi.json`             | [`openapi`]           | OpenAPI document          |
//! | `/health/*`, `/metrics`     | here                  | Probes and metrics        |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → MetricsMiddleware → Handler
//! ```
//!
//! Health probes and `/metrics` are mounted beside the versioned API so
//! they stay reachable regardless of API-level middleware.

pub mod db;
pub mod error;
pub mod middleware;
pub mod notify;
pub mod openapi;
pub mod routes;
pub mod state;

use std::collections::HashMap;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::response::IntoResponse;
use axum::{Extension, Router};
use tower_http::trace::TraceLayer;

use fieldops_dispatch::AgentRepository;

use crate::middleware::metrics::ApiMetrics;
use crate::state::AppState;

/// Check if metrics are enabled via the `FIELDOPS_METRICS_ENABLED` env
/// var. Defaults to `true` when the variable is absent or set to
/// anything other than `"false"`.
fn metrics_enabled() -> bool {
    std::env::var("FIELDOPS_METRICS_ENABLED")
        .map(|v| v.to_lowercase() != "false")
        .unwrap_or(true)
}

/// Assemble the full application router with all routes and middleware.
pub fn app(state: AppState) -> Router {
    let metrics = ApiMetrics::new();
    let metrics_on = metrics_enabled();

    // Body size limit: 2 MiB. Dispatch payloads are small; anything
    // larger is a client error.
    let mut api = Router::new()
        .merge(routes::requests::router())
        .merge(routes::agents::router())
        .merge(routes::sessions::router())
        .merge(openapi::router())
        .layer(DefaultBodyLimit::max(2 * 1024 * 1024));

    // Only register the metrics middleware when metrics are enabled.
    if metrics_on {
        api = api
            .layer(from_fn(middleware::metrics::metrics_middleware))
            .layer(Extension(metrics.clone()));
    }

    let api = api
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone());

    // Health probes — readiness checks actual service health.
    let mut operational = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness));

    if metrics_on {
        operational = operational
            .route("/metrics", axum::routing::get(prometheus_metrics))
            .layer(Extension(metrics));
    }

    let operational = operational.with_state(state);

    Router::new().merge(operational).merge(api)
}

/// Liveness probe — always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe — verifies the application is ready to serve
/// traffic. Checks the database connection when one is configured; the
/// in-memory stores are always ready.
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    if let Some(pool) = &state.db {
        if let Err(e) = sqlx::query("SELECT 1").execute(pool).await {
            tracing::warn!(error = %e, "readiness: database unreachable");
            return (StatusCode::SERVICE_UNAVAILABLE, "database unreachable").into_response();
        }
    }
    (StatusCode::OK, "ready").into_response()
}

/// GET /metrics — Prometheus metrics scrape endpoint.
///
/// Updates domain gauges from current `AppState` on each scrape (pull
/// model), then gathers and encodes all metrics in Prometheus text
/// exposition format.
async fn prometheus_metrics(
    State(state): State<AppState>,
    Extension(metrics): Extension<ApiMetrics>,
) -> impl IntoResponse {
    // -- Update domain gauges from AppState --

    // Requests by status.
    let requests = state.requests.list();
    let mut by_status: HashMap<&'static str, usize> = HashMap::new();
    for r in &requests {
        *by_status.entry(r.status.as_str()).or_default() += 1;
    }
    metrics.dispatch_requests_total().reset();
    for (status, count) in &by_status {
        metrics
            .dispatch_requests_total()
            .with_label_values(&[status])
            .set(*count as f64);
    }

    // Agent pool.
    let agents = state.agents.list();
    metrics.agents_total().set(agents.len() as f64);
    metrics
        .agents_available()
        .set(agents.iter().filter(|a| a.available).count() as f64);

    // Live sessions.
    metrics
        .sessions_connected()
        .set(state.sessions.connected() as f64);

    // -- Gather and encode --
    match metrics.gather_and_encode() {
        Ok(body) => (
            StatusCode::OK,
            [(
                axum::http::header::CONTENT_TYPE,
                "text/plain; version=0.0.4; charset=utf-8",
            )],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to encode Prometheus metrics: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, e).into_response()
        }
    }
}
