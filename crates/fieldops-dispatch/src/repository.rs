//! # Repository Boundaries
//!
//! Object-safe traits over the stores the engine consumes. Implementors
//! must be `Send + Sync` so they can be shared across async tasks
//! behind an `Arc`.
//!
//! Every accessor returns owned value copies, never live back
//! references — relationship traversal is an explicit query method
//! (`list_for_agent`, `list_for_user`), not a lazy link on the record.
//!
//! The engine assumes each call is atomic: it either fully succeeds or
//! fully fails without a partial write. Retry of transport failures
//! below this boundary belongs to the caller's transport layer.

use fieldops_core::{Agent, AgentId, RequestId, UserId};

use crate::request::ServiceRequest;

/// Store of field agent records.
pub trait AgentRepository: Send + Sync {
    /// All agents, regardless of availability.
    fn list(&self) -> Vec<Agent>;

    /// Agents currently flagged available.
    fn list_available(&self) -> Vec<Agent> {
        self.list().into_iter().filter(|a| a.available).collect()
    }

    fn get(&self, id: &AgentId) -> Option<Agent>;

    /// Insert or replace an agent record.
    fn upsert(&self, agent: Agent);

    /// Flip the availability flag. Returns false when the agent is
    /// unknown.
    fn set_available(&self, id: &AgentId, available: bool) -> bool;
}

/// Store of service request records.
pub trait RequestRepository: Send + Sync {
    fn create(&self, request: ServiceRequest);

    fn get(&self, id: &RequestId) -> Option<ServiceRequest>;

    /// Replace the stored record. Returns false when the request is
    /// unknown.
    fn update(&self, request: ServiceRequest) -> bool;

    /// Requests currently or previously assigned to an agent, oldest
    /// first.
    fn list_for_agent(&self, id: &AgentId) -> Vec<ServiceRequest>;

    /// Requests raised by a user, oldest first.
    fn list_for_user(&self, id: &UserId) -> Vec<ServiceRequest>;
}
