//! # Live Session Registry
//!
//! Implements the engine's [`Notifier`] boundary over per-user
//! WebSocket sessions.
//!
//! Delivery is strictly targeted: an event for a user reaches only that
//! user's live session, never every connected client. With no session
//! connected the event is dropped — delivery is decoupled from the
//! already-committed dispatch transition and is never retried here.
//!
//! Each user has at most one registered session; a reconnect replaces
//! the previous channel (latest connection wins). Events for a user are
//! delivered in issue order through the session's unbounded channel.

use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use utoipa::ToSchema;

use fieldops_core::UserId;
use fieldops_dispatch::Notifier;

/// JSON payload pushed to a user's live session.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PushEvent {
    pub message: String,
    pub user_id: String,
}

/// Handle identifying one registered session; used to unregister on
/// disconnect without tearing down a newer session for the same user.
pub struct SessionHandle {
    user: UserId,
    sender: mpsc::UnboundedSender<PushEvent>,
}

/// Registry of live client sessions, keyed by user.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    inner: Arc<DashMap<UserId, mpsc::UnboundedSender<PushEvent>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session for `user`, replacing any previous one.
    /// Returns the handle for disconnect cleanup and the event
    /// receiver to drain into the socket.
    pub fn register(&self, user: UserId) -> (SessionHandle, mpsc::UnboundedReceiver<PushEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.inner.insert(user, sender.clone());
        (SessionHandle { user, sender }, receiver)
    }

    /// Remove the session identified by `handle`. A newer session that
    /// replaced it stays registered.
    pub fn unregister(&self, handle: &SessionHandle) {
        self.inner
            .remove_if(&handle.user, |_, sender| sender.same_channel(&handle.sender));
    }

    /// Number of currently registered sessions.
    pub fn connected(&self) -> usize {
        self.inner.len()
    }
}

impl Notifier for SessionRegistry {
    fn notify(&self, user: &UserId, message: &str) {
        let event = PushEvent {
            message: message.to_string(),
            user_id: user.to_string(),
        };
        match self.inner.get(user) {
            Some(sender) => {
                if sender.send(event).is_err() {
                    tracing::debug!(%user, "session channel closed; dropping notification");
                }
            }
            None => {
                tracing::debug!(%user, "no live session; dropping notification");
            }
        }
    }
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("connected", &self.inner.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivery_is_targeted_to_the_addressed_user() {
        let registry = SessionRegistry::new();
        let alice = UserId::new();
        let bob = UserId::new();
        let (_ha, mut rx_alice) = registry.register(alice);
        let (_hb, mut rx_bob) = registry.register(bob);

        registry.notify(&alice, "your request was accepted");

        assert_eq!(
            rx_alice.try_recv().unwrap().message,
            "your request was accepted"
        );
        assert!(rx_bob.try_recv().is_err(), "must not broadcast");
    }

    #[test]
    fn no_session_drops_silently() {
        let registry = SessionRegistry::new();
        registry.notify(&UserId::new(), "anyone there?");
        assert_eq!(registry.connected(), 0);
    }

    #[test]
    fn events_arrive_in_issue_order() {
        let registry = SessionRegistry::new();
        let user = UserId::new();
        let (_handle, mut rx) = registry.register(user);

        registry.notify(&user, "first");
        registry.notify(&user, "second");

        assert_eq!(rx.try_recv().unwrap().message, "first");
        assert_eq!(rx.try_recv().unwrap().message, "second");
    }

    #[test]
    fn reconnect_replaces_previous_session() {
        let registry = SessionRegistry::new();
        let user = UserId::new();
        let (old_handle, mut old_rx) = registry.register(user);
        let (_new_handle, mut new_rx) = registry.register(user);

        registry.notify(&user, "hello");
        assert!(old_rx.try_recv().is_err());
        assert_eq!(new_rx.try_recv().unwrap().message, "hello");

        // Cleanup of the stale handle must not tear down the live one.
        registry.unregister(&old_handle);
        assert_eq!(registry.connected(), 1);
    }
}
