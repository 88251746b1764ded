//! # OpenAPI Specification Assembly
//!
//! Assembles all utoipa-documented routes into a single OpenAPI spec,
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// Assembled OpenAPI spec for the entire API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "FieldOps API — Dispatch Stack",
        version = "0.3.2",
        description = "Dispatch layer for damage-repair service requests.\n\nProvides:\n- **Request intake** with nearest-agent assignment by great-circle distance\n- **Agent response handling** — accept/reject handshake with a distance-ordered fallback chain over the remaining agent pool\n- **Live session push** — per-user WebSocket delivery of acceptance updates (`/v1/sessions/{user_id}/ws`, not expressible in OpenAPI)\n- **Agent administration** — registration, availability, per-agent request history\n\nHealth probes (`/health/*`) and `/metrics` are served beside the versioned API.",
        license(name = "BUSL-1.1")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server"),
    ),
    paths(
        // ── Requests ────────────────────────────────────────────────────
        crate::routes::requests::create_request,
        crate::routes::requests::respond,
        crate::routes::requests::get_request,
        crate::routes::requests::list_for_user,
        // ── Agents ──────────────────────────────────────────────────────
        crate::routes::agents::create_agent,
        crate::routes::agents::list_agents,
        crate::routes::agents::get_agent,
        crate::routes::agents::set_availability,
        crate::routes::agents::list_requests_for_agent,
    ),
    components(schemas(
        // ── Request DTOs ────────────────────────────────────────────
        crate::routes::requests::CreateRequestRequest,
        crate::routes::requests::CreateRequestResponse,
        crate::routes::requests::RespondRequest,
        crate::routes::requests::RespondResponse,
        crate::routes::requests::RequestView,
        // ── Agent DTOs ──────────────────────────────────────────────
        crate::routes::agents::CreateAgentRequest,
        crate::routes::agents::CreateAgentResponse,
        crate::routes::agents::SetAvailabilityRequest,
        crate::routes::agents::AgentView,
        // ── Push & error envelopes ──────────────────────────────────
        crate::notify::PushEvent,
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "requests", description = "Service request intake, agent responses, and queries"),
        (name = "agents", description = "Field agent administration and availability"),
    )
)]
pub struct ApiDoc;

/// Build the OpenAPI router.
///
/// Serves the OpenAPI JSON spec at `/openapi.json`.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json — Return the generated OpenAPI specification.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_generates_successfully() {
        let spec = ApiDoc::openapi();
        assert_eq!(spec.info.title, "FieldOps API — Dispatch Stack");
        assert!(!spec.paths.paths.is_empty());
    }

    #[test]
    fn spec_covers_the_dispatch_surface() {
        let spec = ApiDoc::openapi();
        for path in [
            "/v1/requests",
            "/v1/requests/{id}",
            "/v1/requests/{id}/respond",
            "/v1/users/{id}/requests",
            "/v1/agents",
            "/v1/agents/{id}/availability",
            "/v1/agents/{id}/requests",
        ] {
            assert!(
                spec.paths.paths.contains_key(path),
                "should contain {path}"
            );
        }
    }

    #[test]
    fn spec_has_schema_components() {
        let spec = ApiDoc::openapi();
        let schemas = &spec.components.as_ref().unwrap().schemas;
        for name in [
            "CreateRequestRequest",
            "RespondRequest",
            "RequestView",
            "AgentView",
            "PushEvent",
            "ErrorBody",
        ] {
            assert!(schemas.contains_key(name), "should contain {name} schema");
        }
    }

    #[test]
    fn spec_serializes_to_json() {
        let json = serde_json::to_string(&ApiDoc::openapi()).unwrap();
        assert!(json.contains("openapi"));
    }
}
