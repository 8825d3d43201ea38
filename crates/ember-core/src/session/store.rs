//! In-memory session store.
//!
//! Process-wide keyed mapping from session id to [`Session`]. The store is
//! the sole owner of session lifetime; callers get cloned snapshots, and all
//! read-modify-write goes through [`SessionStore::update`] so a mutation is
//! atomic under the write lock. No persistence - a process restart loses all
//! sessions, which is acceptable for ephemeral conversational caches.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{Duration, Utc};

use super::Session;
use crate::error::{Error, Result};

/// Keyed in-memory session collection, safe for concurrent access.
///
/// Constructed once at startup and passed by handle into the lifecycle
/// manager and the cleanup sweep - never a module-level singleton.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new session. Colliding ids are an invariant violation given
    /// a random id generator, so this is surfaced as an error rather than an
    /// overwrite.
    pub fn insert(&self, session: Session) -> Result<()> {
        let mut sessions = self.sessions.write().map_err(|_| Error::LockPoisoned)?;
        if sessions.contains_key(&session.session_id) {
            return Err(Error::DuplicateSessionId(session.session_id.clone()));
        }
        sessions.insert(session.session_id.clone(), session);
        Ok(())
    }

    /// Snapshot of a session, or `None` if absent. Never creates.
    pub fn get(&self, session_id: &str) -> Result<Option<Session>> {
        let sessions = self.sessions.read().map_err(|_| Error::LockPoisoned)?;
        Ok(sessions.get(session_id).cloned())
    }

    /// Run `f` against a session under the write lock, returning its result,
    /// or `None` if the session is absent. The closure sees and mutates the
    /// live record, so compound transitions (append + trigger update) cannot
    /// interleave with other writers.
    pub fn update<T>(&self, session_id: &str, f: impl FnOnce(&mut Session) -> T) -> Result<Option<T>> {
        let mut sessions = self.sessions.write().map_err(|_| Error::LockPoisoned)?;
        Ok(sessions.get_mut(session_id).map(f))
    }

    /// Remove a session. No-op if absent.
    pub fn remove(&self, session_id: &str) -> Result<()> {
        let mut sessions = self.sessions.write().map_err(|_| Error::LockPoisoned)?;
        sessions.remove(session_id);
        Ok(())
    }

    /// Number of live sessions.
    pub fn len(&self) -> Result<usize> {
        let sessions = self.sessions.read().map_err(|_| Error::LockPoisoned)?;
        Ok(sessions.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Drop every session older than `max_age`, returning how many were
    /// removed. Runs entirely under the write lock so the sweep cannot race
    /// per-session mutation.
    pub fn sweep_expired(&self, max_age: Duration) -> Result<usize> {
        let mut sessions = self.sessions.write().map_err(|_| Error::LockPoisoned)?;
        let now = Utc::now();
        let before = sessions.len();
        sessions.retain(|_, s| now - s.created_at <= max_age);
        Ok(before - sessions.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::TriggerState;
    use crate::types::Profile;

    fn session(id: &str) -> Session {
        Session::new(
            id.to_string(),
            "profile-1".to_string(),
            Profile {
                name: "Ana".to_string(),
                age: 27,
                personality: "playful".to_string(),
            },
            5,
        )
    }

    #[test]
    fn test_insert_and_get() {
        let store = SessionStore::new();
        store.insert(session("s1")).unwrap();

        let got = store.get("s1").unwrap().unwrap();
        assert_eq!(got.session_id, "s1");
        assert_eq!(got.trigger, TriggerState::Idle);
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_get_unknown_returns_none() {
        let store = SessionStore::new();
        assert!(store.get("missing").unwrap().is_none());
        // Lookup must not create as a side effect
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn test_duplicate_insert_fails() {
        let store = SessionStore::new();
        store.insert(session("s1")).unwrap();
        let err = store.insert(session("s1")).unwrap_err();
        assert!(matches!(err, Error::DuplicateSessionId(id) if id == "s1"));
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_remove_is_noop_when_absent() {
        let store = SessionStore::new();
        store.remove("missing").unwrap();
        store.insert(session("s1")).unwrap();
        store.remove("s1").unwrap();
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn test_update_absent_returns_none() {
        let store = SessionStore::new();
        let result = store.update("missing", |_| ()).unwrap();
        assert!(result.is_none());
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn test_sweep_expired_keeps_young_sessions() {
        let store = SessionStore::new();
        let mut old = session("old");
        old.created_at = Utc::now() - Duration::hours(2);
        store.insert(old).unwrap();
        store.insert(session("young")).unwrap();

        let removed = store.sweep_expired(Duration::hours(1)).unwrap();
        assert_eq!(removed, 1);
        assert!(store.get("old").unwrap().is_none());
        assert!(store.get("young").unwrap().is_some());
    }
}
