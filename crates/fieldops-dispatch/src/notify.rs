//! # Notification Boundary
//!
//! The engine announces an acceptance through this trait and moves on.
//! Delivery is best-effort: implementations must not block the dispatch
//! transition, and a failed or dropped delivery is never retried by the
//! engine — the state transition that triggered it is already
//! committed.

use fieldops_core::UserId;

/// Delivers a message to whichever live client session currently
/// corresponds to `user`. No session connected means the message is
/// dropped.
///
/// For a given user, messages must be delivered in the order they were
/// issued. The engine issues at most one notification per accept event
/// per request.
pub trait Notifier: Send + Sync {
    fn notify(&self, user: &UserId, message: &str);
}

/// No-op notifier for contexts without a live session transport
/// (tests, CLI-driven runs).
#[derive(Debug, Default, Clone)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, user: &UserId, message: &str) {
        tracing::debug!(%user, message, "notification dropped (no transport)");
    }
}
