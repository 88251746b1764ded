//! # In-Memory Repositories
//!
//! Thread-safe `DashMap`-backed implementations of the repository
//! traits. These are the source of truth at runtime; an optional
//! database layer can hydrate them at startup and mirror writes.

use dashmap::DashMap;

use fieldops_core::{Agent, AgentId, RequestId, UserId};

use crate::repository::{AgentRepository, RequestRepository};
use crate::request::ServiceRequest;

/// In-memory agent store.
#[derive(Default)]
pub struct InMemoryAgentRepository {
    agents: DashMap<AgentId, Agent>,
}

impl InMemoryAgentRepository {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl AgentRepository for InMemoryAgentRepository {
    fn list(&self) -> Vec<Agent> {
        let mut agents: Vec<Agent> = self.agents.iter().map(|r| r.value().clone()).collect();
        agents.sort_by_key(|a| a.id);
        agents
    }

    fn get(&self, id: &AgentId) -> Option<Agent> {
        self.agents.get(id).map(|r| r.value().clone())
    }

    fn upsert(&self, agent: Agent) {
        self.agents.insert(agent.id, agent);
    }

    fn set_available(&self, id: &AgentId, available: bool) -> bool {
        match self.agents.get_mut(id) {
            Some(mut entry) => {
                entry.value_mut().available = available;
                true
            }
            None => false,
        }
    }
}

impl std::fmt::Debug for InMemoryAgentRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryAgentRepository")
            .field("agent_count", &self.agents.len())
            .finish()
    }
}

/// In-memory request store.
#[derive(Default)]
pub struct InMemoryRequestRepository {
    requests: DashMap<RequestId, ServiceRequest>,
}

impl InMemoryRequestRepository {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record directly, bypassing intake (used for hydration
    /// from a database).
    pub fn insert(&self, request: ServiceRequest) {
        self.requests.insert(request.id, request);
    }

    /// Total number of stored requests.
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// All requests, oldest first.
    pub fn list(&self) -> Vec<ServiceRequest> {
        let mut requests: Vec<ServiceRequest> =
            self.requests.iter().map(|r| r.value().clone()).collect();
        requests.sort_by_key(|r| r.created_at);
        requests
    }
}

impl RequestRepository for InMemoryRequestRepository {
    fn create(&self, request: ServiceRequest) {
        self.requests.insert(request.id, request);
    }

    fn get(&self, id: &RequestId) -> Option<ServiceRequest> {
        self.requests.get(id).map(|r| r.value().clone())
    }

    fn update(&self, request: ServiceRequest) -> bool {
        match self.requests.get_mut(&request.id) {
            Some(mut entry) => {
                *entry.value_mut() = request;
                true
            }
            None => false,
        }
    }

    fn list_for_agent(&self, id: &AgentId) -> Vec<ServiceRequest> {
        let mut requests: Vec<ServiceRequest> = self
            .requests
            .iter()
            .filter(|r| r.value().attempted.contains(id))
            .map(|r| r.value().clone())
            .collect();
        requests.sort_by_key(|r| r.created_at);
        requests
    }

    fn list_for_user(&self, id: &UserId) -> Vec<ServiceRequest> {
        let mut requests: Vec<ServiceRequest> = self
            .requests
            .iter()
            .filter(|r| r.value().requester == *id)
            .map(|r| r.value().clone())
            .collect();
        requests.sort_by_key(|r| r.created_at);
        requests
    }
}

impl std::fmt::Debug for InMemoryRequestRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryRequestRepository")
            .field("request_count", &self.requests.len())
            .finish()
    }
}
