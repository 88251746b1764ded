//! Service request persistence operations.
//!
//! All functions take a `&PgPool` and operate on the `service_requests`
//! table. The attempted chain and transition log are stored as JSONB —
//! they are read back whole, never queried into.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use fieldops_core::{AgentId, Coordinate, RequestId, UserId};
use fieldops_dispatch::{RequestStatus, ServiceRequest, TransitionRecord};

/// Insert or replace a request record.
pub async fn upsert(pool: &PgPool, request: &ServiceRequest) -> Result<(), sqlx::Error> {
    let status = request.status.as_str();
    let attempted = serde_json::to_value(&request.attempted)
        .map_err(|e| sqlx::Error::Protocol(format!("failed to serialize attempted set: {e}")))?;
    let transition_log = serde_json::to_value(&request.transition_log)
        .map_err(|e| sqlx::Error::Protocol(format!("failed to serialize transition log: {e}")))?;

    sqlx::query(
        "INSERT INTO service_requests
             (id, requester, kind, latitude, longitude, address, assigned_agent,
              status, cost_estimate, attempted, transition_log, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
         ON CONFLICT (id) DO UPDATE SET
             assigned_agent = EXCLUDED.assigned_agent,
             status = EXCLUDED.status,
             cost_estimate = EXCLUDED.cost_estimate,
             attempted = EXCLUDED.attempted,
             transition_log = EXCLUDED.transition_log,
             updated_at = EXCLUDED.updated_at",
    )
    .bind(request.id.as_uuid())
    .bind(request.requester.as_uuid())
    .bind(&request.kind)
    .bind(request.origin.latitude())
    .bind(request.origin.longitude())
    .bind(&request.address)
    .bind(request.assigned_agent.map(|a| *a.as_uuid()))
    .bind(status)
    .bind(request.cost_estimate)
    .bind(&attempted)
    .bind(&transition_log)
    .bind(request.created_at)
    .bind(request.updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Fetch all request records.
pub async fn fetch_all(pool: &PgPool) -> Result<Vec<ServiceRequest>, sqlx::Error> {
    let rows = sqlx::query_as::<_, RequestRow>(
        "SELECT id, requester, kind, latitude, longitude, address, assigned_agent,
                status, cost_estimate, attempted, transition_log, created_at, updated_at
         FROM service_requests ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(RequestRow::into_record).collect()
}

#[derive(sqlx::FromRow)]
struct RequestRow {
    id: Uuid,
    requester: Uuid,
    kind: String,
    latitude: f64,
    longitude: f64,
    address: Option<String>,
    assigned_agent: Option<Uuid>,
    status: String,
    cost_estimate: Option<f64>,
    attempted: serde_json::Value,
    transition_log: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RequestRow {
    fn into_record(self) -> Result<ServiceRequest, sqlx::Error> {
        let decode = |what: &str, e: String| -> sqlx::Error {
            sqlx::Error::Decode(format!("request has invalid {what}: {e}").into())
        };

        let origin = Coordinate::new(self.latitude, self.longitude)
            .map_err(|e| decode("origin", e.to_string()))?;
        let status: RequestStatus =
            serde_json::from_value(serde_json::Value::String(self.status))
                .map_err(|e| decode("status", e.to_string()))?;
        let attempted: Vec<AgentId> = serde_json::from_value(self.attempted)
            .map_err(|e| decode("attempted set", e.to_string()))?;
        let transition_log: Vec<TransitionRecord> = serde_json::from_value(self.transition_log)
            .map_err(|e| decode("transition log", e.to_string()))?;

        Ok(ServiceRequest {
            id: RequestId::from_uuid(self.id),
            requester: UserId::from_uuid(self.requester),
            kind: self.kind,
            origin,
            address: self.address,
            assigned_agent: self.assigned_agent.map(AgentId::from_uuid),
            status,
            cost_estimate: self.cost_estimate,
            attempted,
            transition_log,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
