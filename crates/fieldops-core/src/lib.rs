//! # fieldops-core — Domain Primitives
//!
//! Shared value types for the FieldOps dispatch stack:
//!
//! - **Identity** ([`identity`]): UUID-backed newtypes for users, field
//!   agents, and service requests. Each identifier is a distinct type —
//!   you cannot pass a [`UserId`] where an [`AgentId`] is expected.
//!
//! - **Coordinate** ([`coordinate`]): Immutable geographic coordinate in
//!   decimal degrees, range-validated at construction and at
//!   deserialization.
//!
//! - **Agent** ([`agent`]): The field agent record — location,
//!   availability, and contact details. Agents are created and edited by
//!   an administrative surface; the dispatch engine reads location and
//!   availability and toggles availability as reservation bookkeeping.

pub mod agent;
pub mod coordinate;
pub mod error;
pub mod identity;

// Re-export primary types.
pub use agent::Agent;
pub use coordinate::Coordinate;
pub use error::ValidationError;
pub use identity::{AgentId, RequestId, UserId};
