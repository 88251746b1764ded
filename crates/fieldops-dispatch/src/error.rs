//! Dispatch engine errors.
//!
//! Exhaustion is deliberately NOT an error: a request that runs out of
//! candidates is persisted in the terminal `exhausted` status and
//! surfaced to the caller as a successful outcome, not an exception.

use fieldops_core::{AgentId, RequestId, ValidationError};
use thiserror::Error;

use crate::request::RequestStatus;

/// Errors returned by [`DispatchEngine`](crate::engine::DispatchEngine)
/// operations. All variants leave request state unmutated.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DispatchError {
    /// Missing or malformed input.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Unknown request identifier.
    #[error("request {0} not found")]
    NotFound(RequestId),

    /// Action outside `{accept, reject}`.
    #[error("invalid action '{0}': expected 'accept' or 'reject'")]
    InvalidAction(String),

    /// A transition was attempted on a terminal request.
    #[error("request {id} is {status} and accepts no further responses")]
    InvalidState {
        id: RequestId,
        status: RequestStatus,
    },

    /// The response targets an assignment that a concurrent
    /// reassignment has already superseded.
    #[error("stale response: agent {responder} is no longer assigned to request {id}")]
    StaleResponse {
        id: RequestId,
        responder: AgentId,
    },
}
