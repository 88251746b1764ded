//! # Dispatch Engine
//!
//! Creates requests, assigns the nearest available agent, processes
//! accept/reject responses, drives the reassignment fallback chain, and
//! triggers notifications.
//!
//! ## Concurrency
//!
//! All mutation of a given request is serialized through a per-request
//! lock registry: two concurrent responses for the same request (a
//! stale accept racing a reject that is already reassigning) cannot
//! both succeed. Agent availability is read optimistically and without
//! a lock — it is an eventually-consistent signal, not a reservation
//! token; the reservation itself happens as an explicit availability
//! write after selection.
//!
//! ## Reservation
//!
//! Assignment flips the chosen agent's availability to false; an
//! explicit reject flips it back. An accepting agent stays unavailable
//! — it is now on the job, and its return to the pool is an external
//! operational signal.

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;

use fieldops_core::{AgentId, Coordinate, RequestId, UserId, ValidationError};
use fieldops_geo::nearest;

use crate::error::DispatchError;
use crate::notify::Notifier;
use crate::repository::{AgentRepository, RequestRepository};
use crate::request::{AgentAction, ServiceRequest};

/// Intake parameters for a new service request.
#[derive(Debug, Clone)]
pub struct NewRequest {
    pub requester: UserId,
    pub kind: String,
    pub origin: Coordinate,
    pub address: Option<String>,
    /// Estimate produced by the external cost collaborator, if it ran.
    pub cost_estimate: Option<f64>,
}

/// Outcome of a processed agent response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The assigned agent took the job; the requester has been
    /// notified.
    Accepted { agent: AgentId },
    /// The assigned agent declined; the request is pending on the next
    /// nearest candidate.
    Reassigned { agent: AgentId },
    /// The assigned agent declined and no candidate remains.
    Exhausted,
}

/// The dispatch state machine over agent and request repositories.
pub struct DispatchEngine {
    agents: Arc<dyn AgentRepository>,
    requests: Arc<dyn RequestRepository>,
    notifier: Arc<dyn Notifier>,
    /// Per-request mutual exclusion for response handling.
    locks: DashMap<RequestId, Arc<Mutex<()>>>,
}

impl DispatchEngine {
    pub fn new(
        agents: Arc<dyn AgentRepository>,
        requests: Arc<dyn RequestRepository>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            agents,
            requests,
            notifier,
            locks: DashMap::new(),
        }
    }

    /// Create a request and offer it to the nearest available agent.
    ///
    /// When no agent qualifies the request is persisted directly in the
    /// terminal `exhausted` status — "no agent currently available" is
    /// a successful, surfaced outcome, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Validation`] for a blank request kind.
    /// The requester identity itself is validated by the caller.
    pub fn create_request(&self, new: NewRequest) -> Result<ServiceRequest, DispatchError> {
        if new.kind.trim().is_empty() {
            return Err(ValidationError::EmptyField("kind").into());
        }

        let pool = self.agents.list();
        let request = match nearest(new.origin, &pool, &HashSet::new()) {
            Some(candidate) => {
                let agent_id = candidate.id;
                let request = ServiceRequest::new_pending(
                    new.requester,
                    new.kind,
                    new.origin,
                    new.address,
                    new.cost_estimate,
                    agent_id,
                );
                self.agents.set_available(&agent_id, false);
                tracing::info!(
                    request = %request.id,
                    agent = %agent_id,
                    "request assigned to nearest agent"
                );
                request
            }
            None => {
                let request = ServiceRequest::new_exhausted(
                    new.requester,
                    new.kind,
                    new.origin,
                    new.address,
                    new.cost_estimate,
                );
                tracing::warn!(request = %request.id, "no agent available at intake");
                request
            }
        };

        self.requests.create(request.clone());
        Ok(request)
    }

    /// Process an agent's accept/reject response to a pending request.
    ///
    /// `responder`, when given, must be the currently assigned agent;
    /// otherwise the call fails with [`DispatchError::StaleResponse`]
    /// — the assignment it answers has been superseded by a concurrent
    /// reassignment.
    ///
    /// On accept the transition commits first, then the requester is
    /// notified best-effort with the accepting agent's contact details.
    /// On reject the reassignment chain runs within the same call: the
    /// request never remains externally visible in `rejected`.
    pub fn handle_agent_response(
        &self,
        id: RequestId,
        action: AgentAction,
        responder: Option<AgentId>,
    ) -> Result<DispatchOutcome, DispatchError> {
        let lock = self.locks.entry(id).or_default().clone();
        let _guard = lock.lock();

        let mut request = self.requests.get(&id).ok_or(DispatchError::NotFound(id))?;

        if request.status.is_terminal() {
            return Err(DispatchError::InvalidState {
                id,
                status: request.status,
            });
        }
        // Non-terminal implies a live assignment; a record violating
        // that invariant is treated as untransitionable.
        let assigned = request
            .assigned_agent
            .ok_or(DispatchError::InvalidState {
                id,
                status: request.status,
            })?;
        if let Some(responder) = responder {
            if responder != assigned {
                return Err(DispatchError::StaleResponse { id, responder });
            }
        }

        match action {
            AgentAction::Accept => {
                request.mark_accepted();
                self.requests.update(request.clone());
                self.locks.remove(&id);
                self.notify_accepted(&request, assigned);
                Ok(DispatchOutcome::Accepted { agent: assigned })
            }
            AgentAction::Reject => {
                request.mark_rejected();
                // The rejecting agent returns to the pool; the
                // attempted-set keeps it out of this request's chain.
                self.agents.set_available(&assigned, true);
                tracing::info!(request = %id, agent = %assigned, "assignment rejected");

                let exclude: HashSet<AgentId> = request.attempted.iter().copied().collect();
                let pool = self.agents.list();
                match nearest(request.origin, &pool, &exclude) {
                    Some(candidate) => {
                        let next_id = candidate.id;
                        request.assign_next(next_id);
                        self.agents.set_available(&next_id, false);
                        self.requests.update(request);
                        tracing::info!(
                            request = %id,
                            agent = %next_id,
                            "request reassigned to next nearest agent"
                        );
                        Ok(DispatchOutcome::Reassigned { agent: next_id })
                    }
                    None => {
                        request.mark_exhausted();
                        self.requests.update(request);
                        self.locks.remove(&id);
                        tracing::warn!(request = %id, "fallback chain exhausted");
                        Ok(DispatchOutcome::Exhausted)
                    }
                }
            }
        }
    }

    /// Commit-then-notify: called after the accepted transition is
    /// already persisted. Failure here is logged and swallowed.
    fn notify_accepted(&self, request: &ServiceRequest, agent_id: AgentId) {
        let Some(agent) = self.agents.get(&agent_id) else {
            tracing::warn!(
                request = %request.id,
                agent = %agent_id,
                "accepting agent vanished before notification; dropping"
            );
            return;
        };
        let message = format!(
            "Your request has been accepted by {} at {}. Contact: {}",
            agent.name, agent.shop, agent.phone
        );
        self.notifier.notify(&request.requester, &message);
    }
}

impl std::fmt::Debug for DispatchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchEngine")
            .field("inflight_locks", &self.locks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex as PlMutex;

    use fieldops_core::Agent;

    use crate::memory::{InMemoryAgentRepository, InMemoryRequestRepository};
    use crate::request::RequestStatus;

    /// Captures every delivery for assertion.
    #[derive(Default)]
    struct RecordingNotifier {
        sent: PlMutex<Vec<(UserId, String)>>,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, user: &UserId, message: &str) {
            self.sent.lock().push((*user, message.to_string()));
        }
    }

    struct Harness {
        engine: DispatchEngine,
        agents: Arc<InMemoryAgentRepository>,
        notifier: Arc<RecordingNotifier>,
    }

    fn harness() -> Harness {
        let agents = Arc::new(InMemoryAgentRepository::new());
        let requests = Arc::new(InMemoryRequestRepository::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let engine = DispatchEngine::new(
            agents.clone(),
            requests.clone(),
            notifier.clone(),
        );
        Harness {
            engine,
            agents,
            notifier,
        }
    }

    fn coord(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    fn seed_agent(h: &Harness, name: &str, lat: f64, lon: f64) -> AgentId {
        let agent = Agent::new(
            name,
            format!("{name}'s Garage"),
            "0300-5550100",
            "Karachi",
            Some(coord(lat, lon)),
        )
        .unwrap();
        let id = agent.id;
        h.agents.upsert(agent);
        id
    }

    fn new_request(requester: UserId) -> NewRequest {
        NewRequest {
            requester,
            kind: "dent repair".to_string(),
            origin: coord(0.0, 0.0),
            address: Some("Shahrah-e-Faisal".to_string()),
            cost_estimate: Some(99.0),
        }
    }

    #[test]
    fn intake_assigns_nearest_and_reserves() {
        let h = harness();
        let near = seed_agent(&h, "Near", 0.0, 1.0);
        let _far = seed_agent(&h, "Far", 0.0, 5.0);

        let request = h.engine.create_request(new_request(UserId::new())).unwrap();

        assert_eq!(request.status, RequestStatus::Pending);
        assert_eq!(request.assigned_agent, Some(near));
        assert_eq!(request.attempted, vec![near]);
        assert!(!h.agents.get(&near).unwrap().available, "reserved on assignment");
    }

    #[test]
    fn intake_with_empty_pool_is_exhausted_not_error() {
        let h = harness();
        let request = h.engine.create_request(new_request(UserId::new())).unwrap();
        assert_eq!(request.status, RequestStatus::Exhausted);
        assert_eq!(request.assigned_agent, None);
    }

    #[test]
    fn blank_kind_is_rejected() {
        let h = harness();
        let mut new = new_request(UserId::new());
        new.kind = "   ".to_string();
        assert!(matches!(
            h.engine.create_request(new),
            Err(DispatchError::Validation(_))
        ));
    }

    #[test]
    fn accept_notifies_requester_exactly_once_with_contact_details() {
        let h = harness();
        seed_agent(&h, "Bilal", 0.0, 1.0);
        let requester = UserId::new();

        let request = h.engine.create_request(new_request(requester)).unwrap();
        let outcome = h
            .engine
            .handle_agent_response(request.id, AgentAction::Accept, request.assigned_agent)
            .unwrap();

        assert!(matches!(outcome, DispatchOutcome::Accepted { .. }));
        let sent = h.notifier.sent.lock();
        assert_eq!(sent.len(), 1);
        let (to, message) = &sent[0];
        assert_eq!(*to, requester);
        assert!(message.contains("Bilal"));
        assert!(message.contains("Bilal's Garage"));
        assert!(message.contains("0300-5550100"));
    }

    #[test]
    fn response_after_accept_fails_invalid_state_without_mutation() {
        let h = harness();
        seed_agent(&h, "Bilal", 0.0, 1.0);
        let request = h.engine.create_request(new_request(UserId::new())).unwrap();

        h.engine
            .handle_agent_response(request.id, AgentAction::Accept, None)
            .unwrap();
        let err = h
            .engine
            .handle_agent_response(request.id, AgentAction::Reject, None)
            .unwrap_err();

        assert!(matches!(err, DispatchError::InvalidState { .. }));
        assert_eq!(h.notifier.sent.lock().len(), 1, "no second notification");
    }

    #[test]
    fn two_agent_exhaustion_chain() {
        let h = harness();
        let a = seed_agent(&h, "A", 0.0, 1.0); // closer
        let b = seed_agent(&h, "B", 0.0, 3.0); // farther
        let requester = UserId::new();

        let request = h.engine.create_request(new_request(requester)).unwrap();
        assert_eq!(request.assigned_agent, Some(a));

        let outcome = h
            .engine
            .handle_agent_response(request.id, AgentAction::Reject, Some(a))
            .unwrap();
        assert_eq!(outcome, DispatchOutcome::Reassigned { agent: b });
        assert!(h.agents.get(&a).unwrap().available, "released on reject");
        assert!(!h.agents.get(&b).unwrap().available, "next candidate reserved");

        let outcome = h
            .engine
            .handle_agent_response(request.id, AgentAction::Reject, Some(b))
            .unwrap();
        assert_eq!(outcome, DispatchOutcome::Exhausted);
        assert!(h.notifier.sent.lock().is_empty(), "never notified");

        // Terminal afterwards.
        let err = h
            .engine
            .handle_agent_response(request.id, AgentAction::Accept, None)
            .unwrap_err();
        assert!(matches!(err, DispatchError::InvalidState { .. }));
    }

    #[test]
    fn attempted_set_grows_without_duplicates() {
        let h = harness();
        let ids = vec![
            seed_agent(&h, "A", 0.0, 1.0),
            seed_agent(&h, "B", 0.0, 2.0),
            seed_agent(&h, "C", 0.0, 3.0),
        ];
        let request = h.engine.create_request(new_request(UserId::new())).unwrap();

        let mut seen = vec![request.assigned_agent.unwrap()];
        loop {
            match h
                .engine
                .handle_agent_response(request.id, AgentAction::Reject, None)
                .unwrap()
            {
                DispatchOutcome::Reassigned { agent } => {
                    assert!(!seen.contains(&agent), "agent re-offered");
                    seen.push(agent);
                }
                DispatchOutcome::Exhausted => break,
                DispatchOutcome::Accepted { .. } => unreachable!(),
            }
        }
        assert_eq!(seen.len(), ids.len());
    }

    #[test]
    fn rejection_reselects_by_distance_not_insertion_order() {
        let h = harness();
        // Seeded far-first: the fallback must still pick by distance.
        let far = seed_agent(&h, "Far", 0.0, 5.0);
        let near = seed_agent(&h, "Near", 0.0, 1.0);
        let mid = seed_agent(&h, "Mid", 0.0, 2.0);

        let request = h.engine.create_request(new_request(UserId::new())).unwrap();
        assert_eq!(request.assigned_agent, Some(near));

        let outcome = h
            .engine
            .handle_agent_response(request.id, AgentAction::Reject, None)
            .unwrap();
        assert_eq!(outcome, DispatchOutcome::Reassigned { agent: mid });

        let outcome = h
            .engine
            .handle_agent_response(request.id, AgentAction::Reject, None)
            .unwrap();
        assert_eq!(outcome, DispatchOutcome::Reassigned { agent: far });
    }

    #[test]
    fn stale_responder_is_rejected_without_mutation() {
        let h = harness();
        let a = seed_agent(&h, "A", 0.0, 1.0);
        let b = seed_agent(&h, "B", 0.0, 2.0);
        let request = h.engine.create_request(new_request(UserId::new())).unwrap();
        assert_eq!(request.assigned_agent, Some(a));

        let err = h
            .engine
            .handle_agent_response(request.id, AgentAction::Accept, Some(b))
            .unwrap_err();
        assert_eq!(err, DispatchError::StaleResponse {
            id: request.id,
            responder: b,
        });
        // Still pending on A.
        let outcome = h
            .engine
            .handle_agent_response(request.id, AgentAction::Accept, Some(a))
            .unwrap();
        assert_eq!(outcome, DispatchOutcome::Accepted { agent: a });
    }

    #[test]
    fn unknown_request_is_not_found() {
        let h = harness();
        let err = h
            .engine
            .handle_agent_response(RequestId::new(), AgentAction::Accept, None)
            .unwrap_err();
        assert!(matches!(err, DispatchError::NotFound(_)));
    }

    #[test]
    fn concurrent_responses_cannot_both_succeed() {
        let h = Arc::new(harness());
        seed_agent(&h, "A", 0.0, 1.0);
        seed_agent(&h, "B", 0.0, 2.0);
        let request = h.engine.create_request(new_request(UserId::new())).unwrap();
        let assigned = request.assigned_agent.unwrap();

        let accept = {
            let h = Arc::clone(&h);
            std::thread::spawn(move || {
                h.engine
                    .handle_agent_response(request.id, AgentAction::Accept, Some(assigned))
            })
        };
        let reject = {
            let h = Arc::clone(&h);
            std::thread::spawn(move || {
                h.engine
                    .handle_agent_response(request.id, AgentAction::Reject, Some(assigned))
            })
        };

        let results = [accept.join().unwrap(), reject.join().unwrap()];
        let ok = results.iter().filter(|r| r.is_ok()).count();
        // One response wins; the loser sees InvalidState or
        // StaleResponse, never a silent double-mutation.
        assert_eq!(ok, 1, "exactly one response may succeed: {results:?}");
        assert!(h.notifier.sent.lock().len() <= 1);
    }
}
