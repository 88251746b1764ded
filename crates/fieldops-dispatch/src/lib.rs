//! # fieldops-dispatch — Request Dispatch Engine
//!
//! The core of the FieldOps stack: matches an incoming service request
//! to the nearest available field agent, manages the accept/reject
//! handshake, falls back to the next candidate on rejection, and pushes
//! a status update to the requesting user once an agent accepts.
//!
//! - **Request** ([`request`]): The [`ServiceRequest`] record and its
//!   lifecycle state machine `pending → accepted | rejected →
//!   pending | exhausted`, with a transition log in which the transient
//!   `rejected` step of each fallback round remains observable.
//!
//! - **Engine** ([`engine`]): [`DispatchEngine`] — intake, response
//!   handling, and the bounded reassignment chain. Responses for the
//!   same request are serialized through a per-request lock registry.
//!
//! - **Repositories** ([`repository`], [`memory`]): Object-safe
//!   repository traits for agents and requests, with thread-safe
//!   in-memory implementations backed by `DashMap`.
//!
//! - **Boundaries** ([`notify`], [`cost`]): The notification bus and
//!   cost-estimation collaborators, consumed as traits. Delivery is
//!   best-effort and decoupled from persistence: a dropped notification
//!   never rolls back a committed transition.

pub mod cost;
pub mod engine;
pub mod error;
pub mod memory;
pub mod notify;
pub mod repository;
pub mod request;

// Re-export primary types.
pub use cost::{CostEstimator, FlatRateEstimator};
pub use engine::{DispatchEngine, DispatchOutcome, NewRequest};
pub use error::DispatchError;
pub use memory::{InMemoryAgentRepository, InMemoryRequestRepository};
pub use notify::{Notifier, NullNotifier};
pub use repository::{AgentRepository, RequestRepository};
pub use request::{AgentAction, RequestStatus, ServiceRequest, TransitionRecord};
