//! Registry of live client sessions.
//!
//! The registry is the server's view of who is connected.  Each entry holds
//! the session's current [`SessionState`] and the sending half of a close
//! signal, so shutdown can ask every session to close without owning its
//! socket.
//!
//! Cloning a `SessionRegistry` is cheap: clones share the same map.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{watch, Mutex, Notify};
use tracing::debug;

use crate::domain::session::{SessionId, SessionState};

struct SessionEntry {
    state: SessionState,
    close_tx: watch::Sender<bool>,
}

/// Shared map of live sessions keyed by peer address.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<Mutex<HashMap<SessionId, SessionEntry>>>,
    drained: Arc<Notify>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a session in the `Connecting` state and returns the receiver its
    /// task watches for close requests.
    pub async fn insert(&self, id: SessionId) -> watch::Receiver<bool> {
        let (close_tx, close_rx) = watch::channel(false);
        let previous = self.sessions.lock().await.insert(
            id,
            SessionEntry {
                state: SessionState::Connecting,
                close_tx,
            },
        );
        if previous.is_some() {
            debug!("session {id} replaced a stale registry entry");
        }
        close_rx
    }

    /// Records a lifecycle transition.  Unknown ids are ignored.
    pub async fn set_state(&self, id: &SessionId, state: SessionState) {
        if let Some(entry) = self.sessions.lock().await.get_mut(id) {
            entry.state = state;
        }
    }

    pub async fn state(&self, id: &SessionId) -> Option<SessionState> {
        self.sessions.lock().await.get(id).map(|e| e.state)
    }

    /// Removes a session.  Returns `true` if it was present.
    pub async fn remove(&self, id: &SessionId) -> bool {
        let mut sessions = self.sessions.lock().await;
        let removed = sessions.remove(id).is_some();
        if sessions.is_empty() {
            self.drained.notify_waiters();
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }

    /// Ids of all live sessions, sorted for stable output.
    pub async fn ids(&self) -> Vec<SessionId> {
        let mut ids: Vec<SessionId> = self.sessions.lock().await.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Asks every live session to close.  Returns how many were signalled.
    pub async fn close_all(&self) -> usize {
        let sessions = self.sessions.lock().await;
        for entry in sessions.values() {
            entry.close_tx.send_replace(true);
        }
        sessions.len()
    }

    /// Waits until the registry is empty.
    pub async fn wait_empty(&self) {
        loop {
            // Create the waiter before checking so a removal in between is
            // not missed.
            let notified = self.drained.notified();
            if self.is_empty().await {
                return;
            }
            notified.await;
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn id(port: u16) -> SessionId {
        SessionId::new(([127, 0, 0, 1], port).into())
    }

    #[tokio::test]
    async fn test_insert_and_remove_track_count() {
        // Arrange
        let registry = SessionRegistry::new();

        // Act
        let _a = registry.insert(id(1)).await;
        let _b = registry.insert(id(2)).await;

        // Assert
        assert_eq!(registry.len().await, 2);
        assert!(registry.remove(&id(1)).await);
        assert!(!registry.remove(&id(1)).await);
        assert_eq!(registry.ids().await, vec![id(2)]);
    }

    #[tokio::test]
    async fn test_new_sessions_start_connecting() {
        let registry = SessionRegistry::new();
        let _rx = registry.insert(id(7)).await;

        assert_eq!(registry.state(&id(7)).await, Some(SessionState::Connecting));

        registry.set_state(&id(7), SessionState::Active).await;
        assert_eq!(registry.state(&id(7)).await, Some(SessionState::Active));
    }

    #[tokio::test]
    async fn test_close_all_signals_every_session() {
        let registry = SessionRegistry::new();
        let mut a = registry.insert(id(1)).await;
        let mut b = registry.insert(id(2)).await;

        assert_eq!(registry.close_all().await, 2);

        a.changed().await.unwrap();
        b.changed().await.unwrap();
        assert!(*a.borrow());
        assert!(*b.borrow());
    }

    #[tokio::test]
    async fn test_wait_empty_returns_after_last_removal() {
        let registry = SessionRegistry::new();
        let _rx = registry.insert(id(1)).await;

        let waiter = {
            let registry = registry.clone();
            tokio::spawn(async move { registry.wait_empty().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        registry.remove(&id(1)).await;

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("wait_empty must return once the registry drains")
            .unwrap();
    }

    #[tokio::test]
    async fn test_wait_empty_on_empty_registry_returns_immediately() {
        let registry = SessionRegistry::new();
        tokio::time::timeout(Duration::from_millis(100), registry.wait_empty())
            .await
            .expect("empty registry must not block");
    }
}
