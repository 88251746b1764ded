//! # Service Request Lifecycle
//!
//! The [`ServiceRequest`] record and its status state machine:
//!
//! ```text
//! [start] ── intake, agent found ──► pending
//! [start] ── intake, no agent ─────► exhausted
//! pending ── accept ───────────────► accepted
//! pending ── reject, next found ───► rejected ──► pending   (loop)
//! pending ── reject, none left ────► rejected ──► exhausted
//! ```
//!
//! `accepted` and `exhausted` are terminal. A request is never left in
//! `rejected` as its externally visible status — every rejection is
//! followed, within the same engine operation, by a new `pending`
//! assignment or by `exhausted`. The `rejected` step stays observable
//! in the transition log.
//!
//! ## Design Choice: Validated Enum over Typestate
//!
//! The status is a runtime-checked enum rather than a typestate. The
//! record is stored, serialized, and transmitted where the state is not
//! known at compile time, and the engine's per-request lock already
//! serializes all mutation, so the enum check is the single gate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use fieldops_core::{AgentId, Coordinate, RequestId, UserId};

/// Status of a service request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    /// Offered to an agent, awaiting that agent's response.
    Pending,
    /// An agent accepted. Terminal.
    Accepted,
    /// The assigned agent declined. Transient: only ever observed in
    /// the transition log, never as a persisted final status.
    Rejected,
    /// No eligible agent remains. Terminal.
    Exhausted,
}

impl RequestStatus {
    /// Stable lowercase name, as serialized on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Exhausted => "exhausted",
        }
    }

    /// Whether this status permits no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Accepted | Self::Exhausted)
    }

    /// States reachable from this one.
    pub fn valid_transitions(&self) -> &'static [RequestStatus] {
        match self {
            Self::Pending => &[Self::Accepted, Self::Rejected],
            Self::Rejected => &[Self::Pending, Self::Exhausted],
            Self::Accepted | Self::Exhausted => &[],
        }
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An agent's response to a pending assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentAction {
    Accept,
    Reject,
}

impl AgentAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::Reject => "reject",
        }
    }

    /// Parse an action literal. Anything outside `{accept, reject}` is
    /// an [`InvalidAction`](crate::DispatchError::InvalidAction).
    pub fn parse(s: &str) -> Result<Self, crate::DispatchError> {
        match s {
            "accept" => Ok(Self::Accept),
            "reject" => Ok(Self::Reject),
            other => Err(crate::DispatchError::InvalidAction(other.to_string())),
        }
    }
}

/// A single status change within a request's lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub from: RequestStatus,
    pub to: RequestStatus,
    /// The agent concerned by this transition: the one assigned,
    /// rejecting, or accepting. `None` for the exhaustion step.
    pub agent: Option<AgentId>,
    pub at: DateTime<Utc>,
}

/// A damage-repair service request and its dispatch state.
///
/// Invariants, maintained by the mutation methods below (only the
/// dispatch engine mutates a request):
///
/// - at most one currently assigned agent at any instant;
/// - `assigned_agent` is `Some` exactly when status is `pending` or
///   `accepted`;
/// - `attempted` only grows and never holds a duplicate — an agent that
///   already declined is never re-offered this request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceRequest {
    pub id: RequestId,
    pub requester: UserId,
    /// Free-form help category, e.g. `"dent repair"`.
    pub kind: String,
    pub origin: Coordinate,
    /// Street address as reported at intake, if any.
    pub address: Option<String>,
    pub assigned_agent: Option<AgentId>,
    pub status: RequestStatus,
    /// Populated by the external cost-estimation collaborator.
    pub cost_estimate: Option<f64>,
    /// Agents already offered this request, in offer order.
    pub attempted: Vec<AgentId>,
    pub transition_log: Vec<TransitionRecord>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ServiceRequest {
    /// Create a request assigned to its first candidate agent.
    pub fn new_pending(
        requester: UserId,
        kind: impl Into<String>,
        origin: Coordinate,
        address: Option<String>,
        cost_estimate: Option<f64>,
        agent: AgentId,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: RequestId::new(),
            requester,
            kind: kind.into(),
            origin,
            address,
            assigned_agent: Some(agent),
            status: RequestStatus::Pending,
            cost_estimate,
            attempted: vec![agent],
            transition_log: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a request for which no agent was available at intake.
    pub fn new_exhausted(
        requester: UserId,
        kind: impl Into<String>,
        origin: Coordinate,
        address: Option<String>,
        cost_estimate: Option<f64>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: RequestId::new(),
            requester,
            kind: kind.into(),
            origin,
            address,
            assigned_agent: None,
            status: RequestStatus::Exhausted,
            cost_estimate,
            attempted: Vec::new(),
            transition_log: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    fn record(&mut self, to: RequestStatus, agent: Option<AgentId>) {
        let now = Utc::now();
        self.transition_log.push(TransitionRecord {
            from: self.status,
            to,
            agent,
            at: now,
        });
        self.status = to;
        self.updated_at = now;
    }

    /// Record the assigned agent's acceptance. Terminal; the assignment
    /// is left in place so the accepting agent stays resolvable.
    pub fn mark_accepted(&mut self) {
        let agent = self.assigned_agent;
        self.record(RequestStatus::Accepted, agent);
    }

    /// Record the assigned agent's rejection and clear the assignment.
    /// The engine always follows this, in the same operation, with
    /// [`assign_next`](Self::assign_next) or
    /// [`mark_exhausted`](Self::mark_exhausted).
    pub fn mark_rejected(&mut self) {
        let agent = self.assigned_agent.take();
        self.record(RequestStatus::Rejected, agent);
    }

    /// Offer the request to the next candidate of the fallback chain.
    pub fn assign_next(&mut self, agent: AgentId) {
        if !self.attempted.contains(&agent) {
            self.attempted.push(agent);
        }
        self.assigned_agent = Some(agent);
        self.record(RequestStatus::Pending, Some(agent));
    }

    /// Record that the fallback chain ran dry. Terminal.
    pub fn mark_exhausted(&mut self) {
        self.assigned_agent = None;
        self.record(RequestStatus::Exhausted, None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ServiceRequest {
        ServiceRequest::new_pending(
            UserId::new(),
            "dent repair",
            Coordinate::new(24.86, 67.0).unwrap(),
            None,
            Some(99.0),
            AgentId::new(),
        )
    }

    #[test]
    fn terminal_statuses_have_no_transitions() {
        assert!(RequestStatus::Accepted.valid_transitions().is_empty());
        assert!(RequestStatus::Exhausted.valid_transitions().is_empty());
        assert!(!RequestStatus::Pending.is_terminal());
        assert!(!RequestStatus::Rejected.is_terminal());
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&RequestStatus::Exhausted).unwrap(),
            "\"exhausted\""
        );
    }

    #[test]
    fn intake_seeds_attempted_with_first_agent() {
        let r = request();
        assert_eq!(r.attempted.len(), 1);
        assert_eq!(r.assigned_agent, Some(r.attempted[0]));
        assert_eq!(r.status, RequestStatus::Pending);
    }

    #[test]
    fn reject_then_reassign_keeps_log_and_attempted() {
        let mut r = request();
        let first = r.assigned_agent.unwrap();
        let second = AgentId::new();

        r.mark_rejected();
        assert_eq!(r.assigned_agent, None);
        r.assign_next(second);

        assert_eq!(r.status, RequestStatus::Pending);
        assert_eq!(r.attempted, vec![first, second]);
        // pending→rejected, rejected→pending
        assert_eq!(r.transition_log.len(), 2);
        assert_eq!(r.transition_log[0].to, RequestStatus::Rejected);
        assert_eq!(r.transition_log[0].agent, Some(first));
    }

    #[test]
    fn assign_next_never_duplicates_attempted() {
        let mut r = request();
        let agent = r.assigned_agent.unwrap();
        r.mark_rejected();
        r.assign_next(agent);
        assert_eq!(r.attempted, vec![agent]);
    }

    #[test]
    fn exhaustion_clears_assignment() {
        let mut r = request();
        r.mark_rejected();
        r.mark_exhausted();
        assert_eq!(r.assigned_agent, None);
        assert!(r.status.is_terminal());
    }

    #[test]
    fn action_parse_rejects_unknown_literals() {
        assert!(AgentAction::parse("accept").is_ok());
        assert!(AgentAction::parse("reject").is_ok());
        assert!(matches!(
            AgentAction::parse("maybe"),
            Err(crate::DispatchError::InvalidAction(_))
        ));
    }
}
