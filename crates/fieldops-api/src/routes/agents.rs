//! # Agent Administration API Routes
//!
//! Agents are created and edited here by an administrative caller; the
//! dispatch engine itself only reads location/availability and toggles
//! availability as reservation bookkeeping. The availability endpoint
//! is also the external operational signal that returns an accepting
//! agent to the pool once its job is done.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use fieldops_core::{Agent, AgentId, Coordinate};
use fieldops_dispatch::{AgentRepository, RequestRepository};

use crate::db;
use crate::error::AppError;
use crate::routes::requests::{request_to_view, RequestView};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

/// Agent registration payload.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateAgentRequest {
    pub name: String,
    pub shop: String,
    pub phone: String,
    pub city: String,
    /// Both or neither of latitude/longitude must be given. An agent
    /// without a location is never selected for dispatch.
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Defaults to available.
    pub available: Option<bool>,
}

/// Result of agent registration.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateAgentResponse {
    pub agent_id: String,
}

/// Availability toggle payload.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SetAvailabilityRequest {
    pub available: bool,
}

/// Agent view.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AgentView {
    pub agent_id: String,
    pub name: String,
    pub shop: String,
    pub phone: String,
    pub city: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub available: bool,
    pub created_at: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/agents", post(create_agent).get(list_agents))
        .route("/v1/agents/:id", get(get_agent))
        .route("/v1/agents/:id/availability", put(set_availability))
        .route("/v1/agents/:id/requests", get(list_requests_for_agent))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_agent_id(raw: &str) -> Result<AgentId, AppError> {
    raw.parse()
        .map_err(|_| AppError::BadRequest(format!("invalid agent id: '{raw}'")))
}

fn agent_to_view(agent: &Agent) -> AgentView {
    AgentView {
        agent_id: agent.id.to_string(),
        name: agent.name.clone(),
        shop: agent.shop.clone(),
        phone: agent.phone.clone(),
        city: agent.city.clone(),
        latitude: agent.coordinate.map(|c| c.latitude()),
        longitude: agent.coordinate.map(|c| c.longitude()),
        available: agent.available,
        created_at: agent.created_at.to_rfc3339(),
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /v1/agents — Register a field agent.
#[utoipa::path(
    post,
    path = "/v1/agents",
    request_body = CreateAgentRequest,
    responses(
        (status = 201, description = "Agent registered", body = CreateAgentResponse),
        (status = 400, description = "Missing contact fields or half-specified location"),
    ),
    tag = "agents"
)]
pub(crate) async fn create_agent(
    State(state): State<AppState>,
    Json(req): Json<CreateAgentRequest>,
) -> Result<(StatusCode, Json<CreateAgentResponse>), AppError> {
    let coordinate = match (req.latitude, req.longitude) {
        (Some(lat), Some(lon)) => Some(Coordinate::new(lat, lon)?),
        (None, None) => None,
        _ => {
            return Err(AppError::BadRequest(
                "latitude and longitude must be given together".to_string(),
            ))
        }
    };

    let mut agent = Agent::new(req.name, req.shop, req.phone, req.city, coordinate)?;
    if let Some(available) = req.available {
        agent.available = available;
    }
    let agent_id = agent.id;
    state.agents.upsert(agent.clone());
    db::mirror_agent(&state, &agent).await;

    tracing::info!(agent = %agent_id, "agent registered");
    Ok((
        StatusCode::CREATED,
        Json(CreateAgentResponse {
            agent_id: agent_id.to_string(),
        }),
    ))
}

/// GET /v1/agents — List all agents.
#[utoipa::path(
    get,
    path = "/v1/agents",
    responses((status = 200, description = "All agents", body = [AgentView])),
    tag = "agents"
)]
pub(crate) async fn list_agents(State(state): State<AppState>) -> Json<Vec<AgentView>> {
    let agents = state.agents.list();
    Json(agents.iter().map(agent_to_view).collect())
}

/// GET /v1/agents/:id — Fetch an agent.
#[utoipa::path(
    get,
    path = "/v1/agents/{id}",
    params(("id" = String, Path, description = "Agent identifier")),
    responses(
        (status = 200, description = "Agent found", body = AgentView),
        (status = 404, description = "Unknown agent"),
    ),
    tag = "agents"
)]
pub(crate) async fn get_agent(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AgentView>, AppError> {
    let agent_id = parse_agent_id(&id)?;
    let agent = state
        .agents
        .get(&agent_id)
        .ok_or_else(|| AppError::NotFound(format!("agent {agent_id} not found")))?;
    Ok(Json(agent_to_view(&agent)))
}

/// PUT /v1/agents/:id/availability — Toggle agent availability.
#[utoipa::path(
    put,
    path = "/v1/agents/{id}/availability",
    params(("id" = String, Path, description = "Agent identifier")),
    request_body = SetAvailabilityRequest,
    responses(
        (status = 200, description = "Availability updated", body = AgentView),
        (status = 404, description = "Unknown agent"),
    ),
    tag = "agents"
)]
pub(crate) async fn set_availability(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SetAvailabilityRequest>,
) -> Result<Json<AgentView>, AppError> {
    let agent_id = parse_agent_id(&id)?;
    if !state.agents.set_available(&agent_id, req.available) {
        return Err(AppError::NotFound(format!("agent {agent_id} not found")));
    }
    // Re-read for the mirrored record and the response body.
    let agent = state
        .agents
        .get(&agent_id)
        .ok_or_else(|| AppError::NotFound(format!("agent {agent_id} not found")))?;
    db::mirror_agent(&state, &agent).await;
    Ok(Json(agent_to_view(&agent)))
}

/// GET /v1/agents/:id/requests — Requests offered to an agent.
#[utoipa::path(
    get,
    path = "/v1/agents/{id}/requests",
    params(("id" = String, Path, description = "Agent identifier")),
    responses(
        (status = 200, description = "Requests for the agent", body = [RequestView]),
        (status = 400, description = "Invalid agent id"),
    ),
    tag = "agents"
)]
pub(crate) async fn list_requests_for_agent(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<RequestView>>, AppError> {
    let agent_id = parse_agent_id(&id)?;
    let requests = state.requests.list_for_agent(&agent_id);
    Ok(Json(requests.iter().map(request_to_view).collect()))
}
