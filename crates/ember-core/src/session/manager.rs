//! Session lifecycle manager.
//!
//! Domain operations over the [`SessionStore`]: creation with a randomized
//! premium threshold, message ingestion driving the trigger state machine,
//! trigger queries, stats snapshots, and expiry sweeps.

use std::sync::Arc;

use chrono::Duration;
use rand::Rng;
use tracing::{debug, info};
use uuid::Uuid;

use super::{Session, SessionStore};
use crate::error::{Error, Result};
use crate::types::{Message, Profile, Role, SessionStats};

/// Inclusive range the premium trigger threshold is drawn from.
const TRIGGER_RANGE: std::ops::RangeInclusive<u32> = 5..=8;

/// Enforces the message-counting and one-shot premium-trigger rules on top
/// of a shared [`SessionStore`] handle.
#[derive(Debug, Clone)]
pub struct SessionManager {
    store: Arc<SessionStore>,
}

impl SessionManager {
    pub fn new(store: Arc<SessionStore>) -> Self {
        Self { store }
    }

    /// Create a manager over a fresh private store. Convenient for tests and
    /// single-owner setups.
    pub fn with_new_store() -> Self {
        Self::new(Arc::new(SessionStore::new()))
    }

    /// Create a new session with a threshold drawn uniformly from 5..=8.
    pub fn create(&self, profile_id: impl Into<String>, profile: Profile) -> Result<Session> {
        let trigger_at = rand::thread_rng().gen_range(TRIGGER_RANGE);
        self.create_with_trigger_at(profile_id, profile, trigger_at)
    }

    /// Create a new session with an explicit threshold. Deterministic entry
    /// point used by tests; `create` is the production path.
    pub fn create_with_trigger_at(
        &self,
        profile_id: impl Into<String>,
        profile: Profile,
        trigger_at: u32,
    ) -> Result<Session> {
        let session_id = Uuid::new_v4().to_string();
        let session = Session::new(session_id.clone(), profile_id.into(), profile, trigger_at);
        self.store.insert(session.clone())?;
        info!(%session_id, trigger_at, "session created");
        Ok(session)
    }

    /// Append one turn to a session, applying the trigger state machine.
    ///
    /// The append and any trigger transition happen atomically under the
    /// store's write lock. Returns the updated session snapshot, or
    /// `SessionNotFound` if the id is unknown.
    pub fn append(
        &self,
        session_id: &str,
        role: Role,
        content: impl Into<String>,
    ) -> Result<Session> {
        let content = content.into();
        self.store
            .update(session_id, |session| {
                session.apply(role, content);
                session.clone()
            })?
            .ok_or_else(|| Error::SessionNotFound(session_id.to_string()))
    }

    /// True while a premium suggestion is scheduled but not yet delivered.
    /// False for unknown ids: absence is not exceptional here.
    pub fn trigger_pending(&self, session_id: &str) -> Result<bool> {
        Ok(self
            .store
            .get(session_id)?
            .map(|s| s.trigger.pending())
            .unwrap_or(false))
    }

    /// Session snapshot, or `SessionNotFound`.
    pub fn get(&self, session_id: &str) -> Result<Session> {
        self.store
            .get(session_id)?
            .ok_or_else(|| Error::SessionNotFound(session_id.to_string()))
    }

    /// Client-facing stats snapshot, or `SessionNotFound`.
    pub fn stats(&self, session_id: &str) -> Result<SessionStats> {
        Ok(self.get(session_id)?.stats())
    }

    /// Last `limit` turns in chronological order. A fresh Vec each call, so
    /// callers can build completion context windows without holding any lock.
    pub fn history(&self, session_id: &str, limit: usize) -> Result<Vec<Message>> {
        Ok(self.get(session_id)?.recent_history(limit))
    }

    /// Drop sessions older than `max_age`. Returns how many were removed.
    pub fn sweep_expired(&self, max_age: Duration) -> Result<usize> {
        let removed = self.store.sweep_expired(max_age)?;
        if removed > 0 {
            info!(removed, "swept expired sessions");
        } else {
            debug!("sweep found no expired sessions");
        }
        Ok(removed)
    }

    /// Number of live sessions, for health reporting.
    pub fn session_count(&self) -> Result<usize> {
        self.store.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::TriggerState;

    fn profile() -> Profile {
        Profile {
            name: "Ana".to_string(),
            age: 27,
            personality: "playful".to_string(),
        }
    }

    fn manager() -> SessionManager {
        SessionManager::with_new_store()
    }

    #[test]
    fn test_create_draws_threshold_in_range() {
        let mgr = manager();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..1000 {
            let s = mgr.create("p1", profile()).unwrap();
            assert!((5..=8).contains(&s.premium_trigger_at));
            seen.insert(s.premium_trigger_at);
        }
        // Uniform draw over four values; 1000 trials hit all of them
        assert_eq!(seen.len(), 4);
    }

    #[test]
    fn test_create_generates_unique_ids() {
        let mgr = manager();
        let a = mgr.create("p1", profile()).unwrap();
        let b = mgr.create("p1", profile()).unwrap();
        assert_ne!(a.session_id, b.session_id);
        assert_eq!(mgr.session_count().unwrap(), 2);
    }

    #[test]
    fn test_user_count_only_counts_user_messages() {
        let mgr = manager();
        let s = mgr.create_with_trigger_at("p1", profile(), 8).unwrap();
        let id = s.session_id;

        mgr.append(&id, Role::User, "hi").unwrap();
        mgr.append(&id, Role::Assistant, "hello").unwrap();
        mgr.append(&id, Role::User, "how are you").unwrap();
        let s = mgr.get(&id).unwrap();

        assert_eq!(s.user_message_count, 2);
        assert_eq!(s.history.len(), 3);
        let user_turns = s.history.iter().filter(|m| m.role == Role::User).count();
        assert_eq!(s.user_message_count as usize, user_turns);
    }

    // Scenario A: threshold 5, five straight user messages arm the trigger,
    // the next assistant message delivers it.
    #[test]
    fn test_trigger_arms_and_delivers() {
        let mgr = manager();
        let s = mgr.create_with_trigger_at("p1", profile(), 5).unwrap();
        let id = s.session_id;

        for i in 0..5 {
            let s = mgr.append(&id, Role::User, format!("msg {i}")).unwrap();
            if i < 4 {
                assert_eq!(s.trigger, TriggerState::Idle);
            }
        }
        let s = mgr.get(&id).unwrap();
        assert!(s.trigger.pending());
        assert!(!s.trigger.delivered());
        assert!(mgr.trigger_pending(&id).unwrap());

        let s = mgr.append(&id, Role::Assistant, "reply").unwrap();
        assert!(!s.trigger.pending());
        assert!(s.trigger.delivered());
    }

    // Scenario B: threshold 8, seven alternating pairs never reach it.
    #[test]
    fn test_no_premature_trigger() {
        let mgr = manager();
        let s = mgr.create_with_trigger_at("p1", profile(), 8).unwrap();
        let id = s.session_id;

        for i in 0..7 {
            mgr.append(&id, Role::User, format!("msg {i}")).unwrap();
            mgr.append(&id, Role::Assistant, format!("re {i}")).unwrap();
        }
        let s = mgr.get(&id).unwrap();
        assert_eq!(s.user_message_count, 7);
        assert_eq!(s.trigger, TriggerState::Idle);
        let stats = mgr.stats(&id).unwrap();
        assert!(!stats.premium_suggested);
        assert!(!stats.should_show_premium_button);
    }

    // Scenario C: appends to unknown ids are a not-found outcome, and the
    // store is untouched.
    #[test]
    fn test_append_unknown_session() {
        let mgr = manager();
        let err = mgr.append("unknown-id", Role::User, "hi").unwrap_err();
        assert!(matches!(err, Error::SessionNotFound(_)));
        assert_eq!(mgr.session_count().unwrap(), 0);

        assert!(!mgr.trigger_pending("unknown-id").unwrap());
        assert!(matches!(
            mgr.stats("unknown-id").unwrap_err(),
            Error::SessionNotFound(_)
        ));
    }

    // Scenario D: delivery is a one-shot latch.
    #[test]
    fn test_delivery_is_permanent() {
        let mgr = manager();
        let s = mgr.create_with_trigger_at("p1", profile(), 5).unwrap();
        let id = s.session_id;

        for _ in 0..5 {
            mgr.append(&id, Role::User, "msg").unwrap();
        }
        mgr.append(&id, Role::Assistant, "delivered").unwrap();

        for _ in 0..10 {
            let s = mgr.append(&id, Role::User, "more").unwrap();
            assert!(s.trigger.delivered());
            assert!(!s.trigger.pending());
            let s = mgr.append(&id, Role::Assistant, "reply").unwrap();
            assert!(s.trigger.delivered());
            assert!(!s.trigger.pending());
        }
    }

    // Bursts of user messages past the threshold never re-arm the trigger.
    #[test]
    fn test_trigger_is_edge_triggered() {
        let mgr = manager();
        let s = mgr.create_with_trigger_at("p1", profile(), 5).unwrap();
        let id = s.session_id;

        for _ in 0..9 {
            let s = mgr.append(&id, Role::User, "msg").unwrap();
            assert!(!s.trigger.delivered());
        }
        // One Pending state the whole burst; a single assistant reply ends it
        let s = mgr.append(&id, Role::Assistant, "reply").unwrap();
        assert!(s.trigger.delivered());
    }

    #[test]
    fn test_history_window() {
        let mgr = manager();
        let s = mgr.create_with_trigger_at("p1", profile(), 8).unwrap();
        let id = s.session_id;

        for i in 0..15 {
            mgr.append(&id, Role::User, format!("msg {i}")).unwrap();
        }
        let window = mgr.history(&id, 10).unwrap();
        assert_eq!(window.len(), 10);
        assert_eq!(window[0].content, "msg 5");
        assert_eq!(window[9].content, "msg 14");
    }

    #[test]
    fn test_sweep_expired_via_manager() {
        let mgr = manager();
        let s = mgr.create("p1", profile()).unwrap();
        // Fresh sessions survive the sweep
        assert_eq!(mgr.sweep_expired(Duration::hours(1)).unwrap(), 0);
        assert!(mgr.get(&s.session_id).is_ok());
        // A zero-length max age evicts everything
        assert_eq!(mgr.sweep_expired(Duration::zero()).unwrap(), 1);
        assert!(matches!(
            mgr.get(&s.session_id).unwrap_err(),
            Error::SessionNotFound(_)
        ));
    }
}
