//! Agent persistence operations.
//!
//! All functions take a `&PgPool` and operate on the `agents` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use fieldops_core::{Agent, AgentId, Coordinate};

/// Insert or replace an agent record.
pub async fn upsert(pool: &PgPool, agent: &Agent) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO agents (id, name, shop, phone, city, latitude, longitude, available, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
         ON CONFLICT (id) DO UPDATE SET
             name = EXCLUDED.name,
             shop = EXCLUDED.shop,
             phone = EXCLUDED.phone,
             city = EXCLUDED.city,
             latitude = EXCLUDED.latitude,
             longitude = EXCLUDED.longitude,
             available = EXCLUDED.available",
    )
    .bind(agent.id.as_uuid())
    .bind(&agent.name)
    .bind(&agent.shop)
    .bind(&agent.phone)
    .bind(&agent.city)
    .bind(agent.coordinate.map(|c| c.latitude()))
    .bind(agent.coordinate.map(|c| c.longitude()))
    .bind(agent.available)
    .bind(agent.created_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Fetch all agent records.
pub async fn fetch_all(pool: &PgPool) -> Result<Vec<Agent>, sqlx::Error> {
    let rows = sqlx::query_as::<_, AgentRow>(
        "SELECT id, name, shop, phone, city, latitude, longitude, available, created_at
         FROM agents ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(AgentRow::into_record).collect()
}

#[derive(sqlx::FromRow)]
struct AgentRow {
    id: Uuid,
    name: String,
    shop: String,
    phone: String,
    city: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
    available: bool,
    created_at: DateTime<Utc>,
}

impl AgentRow {
    fn into_record(self) -> Result<Agent, sqlx::Error> {
        let coordinate = match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some(Coordinate::new(lat, lon).map_err(|e| {
                sqlx::Error::Decode(format!("agent {} has invalid coordinate: {e}", self.id).into())
            })?),
            _ => None,
        };
        Ok(Agent {
            id: AgentId::from_uuid(self.id),
            name: self.name,
            shop: self.shop,
            phone: self.phone,
            city: self.city,
            coordinate,
            available: self.available,
            created_at: self.created_at,
        })
    }
}
