//! In-process session store
//!
//! Sessions live in a sharded concurrent map. Creation and first secret
//! generation happen under the key's entry lock, so overlapping requests
//! for the same session always observe a single secret.

use super::session::{Secret, Session, SessionId};
use chrono::{Duration, Utc};
use dashmap::DashMap;
use std::sync::Arc;

/// Shared session storage keyed by session id
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    sessions: Arc<DashMap<SessionId, Session>>,
}

impl SessionStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a session with this id exists
    #[must_use]
    pub fn contains(&self, id: &SessionId) -> bool {
        self.sessions.contains_key(id)
    }

    /// Snapshot of a stored session
    #[must_use]
    pub fn load(&self, id: &SessionId) -> Option<Session> {
        self.sessions.get(id).map(|entry| entry.value().clone())
    }

    /// Stored secret of a session, if both exist
    #[must_use]
    pub fn secret(&self, id: &SessionId) -> Option<Secret> {
        self.sessions
            .get(id)
            .and_then(|entry| entry.value().secret.clone())
    }

    /// Return the session's secret, creating the session and secret as needed
    ///
    /// Runs entirely under the entry lock for `id`.
    pub fn issue_secret(&self, id: &SessionId, secret_bytes: usize) -> Secret {
        let mut entry = self
            .sessions
            .entry(id.clone())
            .or_insert_with(|| Session::new(id.clone()));
        entry.secret_or_generate(secret_bytes).clone()
    }

    /// Mark a session as seen now; returns whether it exists
    pub fn touch(&self, id: &SessionId) -> bool {
        self.sessions.get_mut(id).is_some_and(|mut entry| {
            entry.last_seen = Utc::now();
            true
        })
    }

    /// Number of live sessions
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether the store holds no sessions
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Drop sessions not seen for longer than `max_idle`
    ///
    /// Returns the number of sessions removed.
    pub fn evict_idle(&self, max_idle: Duration) -> usize {
        let Some(cutoff) = Utc::now().checked_sub_signed(max_idle) else {
            return 0;
        };
        let before = self.sessions.len();
        self.sessions.retain(|_, session| session.last_seen > cutoff);
        before.saturating_sub(self.sessions.len())
    }

    /// Spawn the periodic idle-eviction task
    pub fn spawn_sweeper(
        &self,
        max_idle: Duration,
        every: std::time::Duration,
    ) -> tokio::task::JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                let removed = store.evict_idle(max_idle);
                tracing::debug!(removed, remaining = store.len(), "Swept idle sessions");
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_creates_session_once() {
        let store = SessionStore::new();
        let id = SessionId::generate();
        assert!(!store.contains(&id));

        let first = store.issue_secret(&id, 32);
        let second = store.issue_secret(&id, 32);

        assert_eq!(first, second);
        assert_eq!(store.len(), 1);
        assert_eq!(store.secret(&id), Some(first));
    }

    #[test]
    fn test_sessions_are_isolated() {
        let store = SessionStore::new();
        let a = store.issue_secret(&SessionId::generate(), 32);
        let b = store.issue_secret(&SessionId::generate(), 32);
        assert_ne!(a, b);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_issue_yields_one_secret() {
        let store = SessionStore::new();
        let id = SessionId::generate();

        let tasks: Vec<_> = (0..32)
            .map(|_| {
                let store = store.clone();
                let id = id.clone();
                tokio::spawn(async move { store.issue_secret(&id, 32) })
            })
            .collect();

        let mut secrets = Vec::new();
        for task in tasks {
            secrets.push(task.await.unwrap());
        }

        assert!(secrets.windows(2).all(|pair| pair[0] == pair[1]));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_evict_idle() {
        let store = SessionStore::new();
        let id = SessionId::generate();
        store.issue_secret(&id, 32);

        assert_eq!(store.evict_idle(Duration::hours(1)), 0);
        assert_eq!(store.evict_idle(Duration::seconds(-1)), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn test_touch_keeps_session_alive() {
        let store = SessionStore::new();
        let id = SessionId::generate();
        assert!(!store.touch(&id));

        store.issue_secret(&id, 32);
        std::thread::sleep(std::time::Duration::from_millis(60));
        assert!(store.touch(&id));

        assert_eq!(store.evict_idle(Duration::milliseconds(30)), 0);
        assert!(store.contains(&id));
    }
}
