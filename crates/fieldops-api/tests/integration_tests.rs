//! # Integration Tests for fieldops-api
//!
//! Exercises the assembled router end to end: agent administration,
//! request intake, the accept/reject handshake with its fallback chain,
//! targeted session push, error mapping, health probes, metrics, and
//! the OpenAPI document.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use fieldops_api::state::AppState;
use fieldops_core::UserId;

/// Helper: build the test app plus a handle on its state.
fn test_app() -> (Router, AppState) {
    let state = AppState::new();
    (fieldops_api::app(state.clone()), state)
}

/// Helper: read response body as JSON.
async fn body_json(response: axum::http::Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Helper: read response body as string.
async fn body_string(response: axum::http::Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn post_json(app: &Router, uri: &str, body: Value) -> axum::http::Response<Body> {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn put_json(app: &Router, uri: &str, body: Value) -> axum::http::Response<Body> {
    app.clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn get(app: &Router, uri: &str) -> axum::http::Response<Body> {
    app.clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

/// Helper: register an agent, returning its id.
async fn seed_agent(app: &Router, name: &str, lat: f64, lon: f64) -> String {
    let response = post_json(
        app,
        "/v1/agents",
        json!({
            "name": name,
            "shop": format!("{name} Autoworks"),
            "phone": "0300-5550100",
            "city": "Karachi",
            "latitude": lat,
            "longitude": lon,
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["agent_id"]
        .as_str()
        .unwrap()
        .to_string()
}

/// Helper: create a request for `user`, returning the response JSON.
async fn create_request(app: &Router, user: &UserId) -> Value {
    let response = post_json(
        app,
        "/v1/requests",
        json!({
            "user_id": user.to_string(),
            "help_type": "dent repair",
            "latitude": 0.0,
            "longitude": 0.0,
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}

// -- Health Probes ------------------------------------------------------------

#[tokio::test]
async fn test_liveness_probe() {
    let (app, _) = test_app();
    let response = get(&app, "/health/liveness").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ok");
}

#[tokio::test]
async fn test_readiness_probe_without_database() {
    let (app, _) = test_app();
    let response = get(&app, "/health/readiness").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ready");
}

// -- Agent Administration -----------------------------------------------------

#[tokio::test]
async fn test_create_and_get_agent() {
    let (app, _) = test_app();
    let id = seed_agent(&app, "Bilal", 24.86, 67.0).await;

    let response = get(&app, &format!("/v1/agents/{id}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let agent = body_json(response).await;
    assert_eq!(agent["name"], "Bilal");
    assert_eq!(agent["available"], true);
    assert_eq!(agent["latitude"], 24.86);
}

#[tokio::test]
async fn test_create_agent_with_half_location_is_400() {
    let (app, _) = test_app();
    let response = post_json(
        &app,
        "/v1/agents",
        json!({
            "name": "Sara",
            "shop": "Shop",
            "phone": "123",
            "city": "Lahore",
            "latitude": 31.5,
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_unknown_agent_is_404() {
    let (app, _) = test_app();
    let response = get(&app, "/v1/agents/00000000-0000-0000-0000-000000000001").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_set_availability() {
    let (app, _) = test_app();
    let id = seed_agent(&app, "Bilal", 24.86, 67.0).await;

    let response = put_json(
        &app,
        &format!("/v1/agents/{id}/availability"),
        json!({"available": false}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["available"], false);
}

// -- Request Intake -----------------------------------------------------------

#[tokio::test]
async fn test_create_request_without_user_id_is_400() {
    let (app, _) = test_app();
    let response = post_json(
        &app,
        "/v1/requests",
        json!({
            "help_type": "dent repair",
            "latitude": 0.0,
            "longitude": 0.0,
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("user_id"));
}

#[tokio::test]
async fn test_create_request_with_invalid_coordinate_is_400() {
    let (app, _) = test_app();
    let response = post_json(
        &app,
        "/v1/requests",
        json!({
            "user_id": UserId::new().to_string(),
            "help_type": "dent repair",
            "latitude": 95.0,
            "longitude": 0.0,
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_request_with_no_agents_is_exhausted() {
    let (app, _) = test_app();
    let body = create_request(&app, &UserId::new()).await;
    assert_eq!(body["status"], "exhausted");
    assert_eq!(body["assigned_agent"], Value::Null);
    assert_eq!(body["message"], "No agent currently available");
}

#[tokio::test]
async fn test_create_request_assigns_nearest_agent_and_fills_estimate() {
    let (app, _) = test_app();
    let near = seed_agent(&app, "Near", 0.0, 1.0).await;
    let _far = seed_agent(&app, "Far", 0.0, 10.0).await;

    let body = create_request(&app, &UserId::new()).await;
    assert_eq!(body["status"], "pending");
    assert_eq!(body["assigned_agent"].as_str().unwrap(), near);

    // The reserved agent is no longer available.
    let agent = body_json(get(&app, &format!("/v1/agents/{near}")).await).await;
    assert_eq!(agent["available"], false);

    // Flat-rate estimate filled in by the boundary stub.
    let request_id = body["request_id"].as_str().unwrap();
    let view = body_json(get(&app, &format!("/v1/requests/{request_id}")).await).await;
    assert_eq!(view["cost_estimate"], 99.0);
}

// -- Accept Flow --------------------------------------------------------------

#[tokio::test]
async fn test_accept_notifies_only_the_requesting_user() {
    let (app, state) = test_app();
    seed_agent(&app, "Bilal", 0.0, 1.0).await;

    let requester = UserId::new();
    let bystander = UserId::new();
    let (_h1, mut requester_events) = state.sessions.register(requester);
    let (_h2, mut bystander_events) = state.sessions.register(bystander);

    let body = create_request(&app, &requester).await;
    let request_id = body["request_id"].as_str().unwrap().to_string();

    let response = post_json(
        &app,
        &format!("/v1/requests/{request_id}/respond"),
        json!({"action": "accept"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Request accepted");
    assert_eq!(body["status"], "accepted");

    let event = requester_events.try_recv().expect("requester notified");
    assert!(event.message.contains("Bilal"));
    assert!(event.message.contains("Bilal Autoworks"));
    assert!(event.message.contains("0300-5550100"));
    assert!(requester_events.try_recv().is_err(), "exactly one event");
    assert!(bystander_events.try_recv().is_err(), "no broadcast");
}

#[tokio::test]
async fn test_response_after_accept_is_conflict() {
    let (app, _) = test_app();
    seed_agent(&app, "Bilal", 0.0, 1.0).await;
    let body = create_request(&app, &UserId::new()).await;
    let request_id = body["request_id"].as_str().unwrap().to_string();
    let uri = format!("/v1/requests/{request_id}/respond");

    post_json(&app, &uri, json!({"action": "accept"})).await;
    let response = post_json(&app, &uri, json!({"action": "reject"})).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["error"]["code"], "INVALID_STATE");
}

// -- Reject / Fallback Chain --------------------------------------------------

#[tokio::test]
async fn test_reject_walks_the_chain_to_exhaustion() {
    let (app, state) = test_app();
    let a = seed_agent(&app, "A", 0.0, 1.0).await;
    let b = seed_agent(&app, "B", 0.0, 3.0).await;

    let requester = UserId::new();
    let (_handle, mut events) = state.sessions.register(requester);

    let body = create_request(&app, &requester).await;
    let request_id = body["request_id"].as_str().unwrap().to_string();
    assert_eq!(body["assigned_agent"].as_str().unwrap(), a);
    let uri = format!("/v1/requests/{request_id}/respond");

    // First reject: reassigned to the farther agent.
    let body = body_json(post_json(&app, &uri, json!({"action": "reject"})).await).await;
    assert_eq!(body["status"], "pending");
    assert_eq!(body["assigned_agent"].as_str().unwrap(), b);
    assert_eq!(body["message"], "Request rejected, looking for another agent");

    // Second reject: nobody left.
    let body = body_json(post_json(&app, &uri, json!({"action": "reject"})).await).await;
    assert_eq!(body["status"], "exhausted");
    assert_eq!(body["assigned_agent"], Value::Null);

    // Terminal, with the full chain recorded; the requester was never
    // notified.
    let view = body_json(get(&app, &format!("/v1/requests/{request_id}")).await).await;
    assert_eq!(view["status"], "exhausted");
    assert_eq!(view["attempted"].as_array().unwrap().len(), 2);
    assert!(view["valid_transitions"].as_array().unwrap().is_empty());
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn test_respond_error_mapping() {
    let (app, _) = test_app();
    seed_agent(&app, "A", 0.0, 1.0).await;
    let body = create_request(&app, &UserId::new()).await;
    let request_id = body["request_id"].as_str().unwrap().to_string();

    // Unknown request: 404.
    let response = post_json(
        &app,
        "/v1/requests/00000000-0000-0000-0000-000000000009/respond",
        json!({"action": "accept"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Invalid action: 400.
    let response = post_json(
        &app,
        &format!("/v1/requests/{request_id}/respond"),
        json!({"action": "maybe"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Missing action: 400.
    let response = post_json(
        &app,
        &format!("/v1/requests/{request_id}/respond"),
        json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Response from an agent that is not the current assignee: 409.
    let response = post_json(
        &app,
        &format!("/v1/requests/{request_id}/respond"),
        json!({
            "action": "accept",
            "agent_id": "00000000-0000-0000-0000-000000000042",
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(
        body_json(response).await["error"]["code"],
        "STALE_RESPONSE"
    );
}

// -- Query Endpoints ----------------------------------------------------------

#[tokio::test]
async fn test_per_user_and_per_agent_listings() {
    let (app, _) = test_app();
    let agent = seed_agent(&app, "A", 0.0, 1.0).await;
    let user = UserId::new();

    let body = create_request(&app, &user).await;
    let request_id = body["request_id"].as_str().unwrap();

    let list = body_json(get(&app, &format!("/v1/users/{user}/requests")).await).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["request_id"].as_str().unwrap(), request_id);

    let list = body_json(get(&app, &format!("/v1/agents/{agent}/requests")).await).await;
    assert_eq!(list.as_array().unwrap().len(), 1);

    let list = body_json(get(&app, &format!("/v1/users/{}/requests", UserId::new())).await).await;
    assert!(list.as_array().unwrap().is_empty());
}

// -- Operational Endpoints ----------------------------------------------------

#[tokio::test]
async fn test_metrics_endpoint_exposes_domain_gauges() {
    let (app, _) = test_app();
    seed_agent(&app, "A", 0.0, 1.0).await;
    create_request(&app, &UserId::new()).await;

    let response = get(&app, "/metrics").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("fieldops_http_requests_total"));
    assert!(body.contains("fieldops_agents_total 1"));
    assert!(body.contains("fieldops_dispatch_requests_total"));
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let (app, _) = test_app();
    let response = get(&app, "/openapi.json").await;
    assert_eq!(response.status(), StatusCode::OK);
    let spec = body_json(response).await;
    assert!(spec["paths"]["/v1/requests"].is_object());
}
