//! # Service Request API Routes
//!
//! Intake and lifecycle surface for damage-repair service requests:
//! creation assigns the nearest available agent; the respond endpoint
//! carries the agent's accept/reject handshake and drives the fallback
//! chain on rejection.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use fieldops_core::{AgentId, Coordinate, RequestId, UserId};
use fieldops_dispatch::{
    AgentAction, CostEstimator, DispatchOutcome, NewRequest, RequestRepository, ServiceRequest,
};

use crate::db;
use crate::error::AppError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

/// Request intake payload.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateRequestRequest {
    /// Requesting user. Optional in the schema so its absence yields
    /// the documented 400 instead of a deserialization failure.
    pub user_id: Option<String>,
    /// Free-form help category, e.g. "dent repair".
    pub help_type: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Street address as reported by the user, if known.
    pub address: Option<String>,
    /// Estimate from the external cost pipeline. Filled with the
    /// flat-rate default when absent.
    pub cost_estimate: Option<f64>,
}

/// Result of request intake.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateRequestResponse {
    pub request_id: String,
    /// `pending` when an agent was assigned, `exhausted` when none was
    /// available.
    pub status: String,
    pub assigned_agent: Option<String>,
    pub message: String,
}

/// An agent's response to its pending assignment.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RespondRequest {
    /// `accept` or `reject`. Anything else is a 400.
    pub action: Option<String>,
    /// Identity of the responding agent. When present it must match
    /// the currently assigned agent, otherwise the response is
    /// rejected as stale (409). When absent the stale check cannot
    /// apply.
    pub agent_id: Option<String>,
}

/// Outcome of a processed agent response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RespondResponse {
    pub message: String,
    pub status: String,
    pub assigned_agent: Option<String>,
}

/// Full request view.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RequestView {
    pub request_id: String,
    pub user_id: String,
    pub help_type: String,
    pub latitude: f64,
    pub longitude: f64,
    pub address: Option<String>,
    pub status: String,
    pub assigned_agent: Option<String>,
    pub cost_estimate: Option<f64>,
    /// Agents already offered this request, in offer order.
    pub attempted: Vec<String>,
    pub valid_transitions: Vec<String>,
    pub transition_count: usize,
    pub created_at: String,
    pub updated_at: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/requests", post(create_request))
        .route("/v1/requests/:id", get(get_request))
        .route("/v1/requests/:id/respond", post(respond))
        .route("/v1/users/:id/requests", get(list_for_user))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_request_id(raw: &str) -> Result<RequestId, AppError> {
    raw.parse()
        .map_err(|_| AppError::BadRequest(format!("invalid request id: '{raw}'")))
}

pub(crate) fn request_to_view(r: &ServiceRequest) -> RequestView {
    RequestView {
        request_id: r.id.to_string(),
        user_id: r.requester.to_string(),
        help_type: r.kind.clone(),
        latitude: r.origin.latitude(),
        longitude: r.origin.longitude(),
        address: r.address.clone(),
        status: r.status.as_str().to_string(),
        assigned_agent: r.assigned_agent.map(|a| a.to_string()),
        cost_estimate: r.cost_estimate,
        attempted: r.attempted.iter().map(|a| a.to_string()).collect(),
        valid_transitions: r
            .status
            .valid_transitions()
            .iter()
            .map(|s| s.as_str().to_string())
            .collect(),
        transition_count: r.transition_log.len(),
        created_at: r.created_at.to_rfc3339(),
        updated_at: r.updated_at.to_rfc3339(),
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /v1/requests — Create a request and dispatch the nearest agent.
#[utoipa::path(
    post,
    path = "/v1/requests",
    request_body = CreateRequestRequest,
    responses(
        (status = 201, description = "Request created", body = CreateRequestResponse),
        (status = 400, description = "Missing user_id or invalid coordinate"),
    ),
    tag = "requests"
)]
pub(crate) async fn create_request(
    State(state): State<AppState>,
    Json(req): Json<CreateRequestRequest>,
) -> Result<(StatusCode, Json<CreateRequestResponse>), AppError> {
    let user_id = req
        .user_id
        .as_deref()
        .ok_or_else(|| AppError::BadRequest("user_id is missing".to_string()))?;
    let requester: UserId = user_id
        .parse()
        .map_err(|_| AppError::BadRequest(format!("invalid user_id: '{user_id}'")))?;
    let origin = Coordinate::new(req.latitude, req.longitude)?;

    let cost_estimate = req
        .cost_estimate
        .or_else(|| Some(state.estimator.estimate(&req.help_type)));

    let request = state.engine.create_request(NewRequest {
        requester,
        kind: req.help_type,
        origin,
        address: req.address,
        cost_estimate,
    })?;

    db::mirror_dispatch(&state, &request).await;

    let message = match request.assigned_agent {
        Some(_) => "Request created, awaiting agent response".to_string(),
        None => "No agent currently available".to_string(),
    };
    Ok((
        StatusCode::CREATED,
        Json(CreateRequestResponse {
            request_id: request.id.to_string(),
            status: request.status.as_str().to_string(),
            assigned_agent: request.assigned_agent.map(|a| a.to_string()),
            message,
        }),
    ))
}

/// POST /v1/requests/:id/respond — Process an agent's accept/reject.
#[utoipa::path(
    post,
    path = "/v1/requests/{id}/respond",
    params(("id" = String, Path, description = "Request identifier")),
    request_body = RespondRequest,
    responses(
        (status = 200, description = "Response processed", body = RespondResponse),
        (status = 400, description = "Invalid action"),
        (status = 404, description = "Unknown request"),
        (status = 409, description = "Request already terminal, or response superseded"),
    ),
    tag = "requests"
)]
pub(crate) async fn respond(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<RespondRequest>,
) -> Result<Json<RespondResponse>, AppError> {
    let request_id = parse_request_id(&id)?;
    let action = req
        .action
        .as_deref()
        .ok_or_else(|| AppError::BadRequest("action is missing".to_string()))?;
    let action = AgentAction::parse(action)?;
    let responder = req
        .agent_id
        .as_deref()
        .map(|raw| {
            raw.parse::<AgentId>()
                .map_err(|_| AppError::BadRequest(format!("invalid agent_id: '{raw}'")))
        })
        .transpose()?;

    let outcome = state
        .engine
        .handle_agent_response(request_id, action, responder)?;

    // The engine committed in-memory; mirror before answering.
    if let Some(request) = state.requests.get(&request_id) {
        db::mirror_dispatch(&state, &request).await;
    }

    let (message, status, assigned_agent) = match outcome {
        DispatchOutcome::Accepted { agent } => (
            "Request accepted".to_string(),
            "accepted",
            Some(agent.to_string()),
        ),
        DispatchOutcome::Reassigned { agent } => (
            "Request rejected, looking for another agent".to_string(),
            "pending",
            Some(agent.to_string()),
        ),
        DispatchOutcome::Exhausted => (
            "Request rejected, no agent currently available".to_string(),
            "exhausted",
            None,
        ),
    };
    Ok(Json(RespondResponse {
        message,
        status: status.to_string(),
        assigned_agent,
    }))
}

/// GET /v1/requests/:id — Fetch a request.
#[utoipa::path(
    get,
    path = "/v1/requests/{id}",
    params(("id" = String, Path, description = "Request identifier")),
    responses(
        (status = 200, description = "Request found", body = RequestView),
        (status = 404, description = "Unknown request"),
    ),
    tag = "requests"
)]
pub(crate) async fn get_request(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RequestView>, AppError> {
    let request_id = parse_request_id(&id)?;
    let request = state
        .requests
        .get(&request_id)
        .ok_or_else(|| AppError::NotFound(format!("request {request_id} not found")))?;
    Ok(Json(request_to_view(&request)))
}

/// GET /v1/users/:id/requests — Requests raised by a user.
#[utoipa::path(
    get,
    path = "/v1/users/{id}/requests",
    params(("id" = String, Path, description = "User identifier")),
    responses(
        (status = 200, description = "Requests for the user", body = [RequestView]),
        (status = 400, description = "Invalid user id"),
    ),
    tag = "requests"
)]
pub(crate) async fn list_for_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<RequestView>>, AppError> {
    let user: UserId = id
        .parse()
        .map_err(|_| AppError::BadRequest(format!("invalid user id: '{id}'")))?;
    let requests = state.requests.list_for_user(&user);
    Ok(Json(requests.iter().map(request_to_view).collect()))
}
