//! Session lifecycle management with premium trigger tracking.
//!
//! A session is one ongoing conversation between a client and a synthetic
//! persona. Each session carries a randomized threshold of user messages
//! after which a one-time premium suggestion is scheduled.
//!
//! ## Trigger state machine (per session)
//!
//! ```text
//! Idle
//!   │
//!   ├─► user append crosses premium_trigger_at
//!   ▼
//! Pending
//!   │
//!   ├─► next assistant append
//!   ▼
//! Delivered  (terminal - never re-armed)
//! ```

mod manager;
mod store;

pub use manager::SessionManager;
pub use store::SessionStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Message, Profile, Role, SessionStats};

/// Premium trigger state. `Delivered` is a one-shot latch: once reached,
/// no further append of either role leaves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerState {
    /// Threshold not yet reached.
    Idle,
    /// Threshold crossed; the next assistant reply delivers the suggestion.
    Pending,
    /// Suggestion delivered. Terminal.
    Delivered,
}

impl TriggerState {
    /// True while a threshold crossing awaits an assistant reply.
    pub fn pending(&self) -> bool {
        matches!(self, TriggerState::Pending)
    }

    /// True once the suggestion has been delivered. Monotone.
    pub fn delivered(&self) -> bool {
        matches!(self, TriggerState::Delivered)
    }
}

/// One conversation session. Owned by the [`SessionStore`]; all mutation goes
/// through the [`SessionManager`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub profile_id: String,
    pub profile: Profile,
    /// Append-only; insertion order is chronological order.
    pub history: Vec<Message>,
    /// Counts user messages only.
    pub user_message_count: u32,
    /// User-message count at which the premium suggestion is scheduled.
    /// Drawn uniformly from 5..=8 at creation; immutable afterwards.
    pub premium_trigger_at: u32,
    pub trigger: TriggerState,
    pub created_at: DateTime<Utc>,
}

impl Session {
    fn new(session_id: String, profile_id: String, profile: Profile, trigger_at: u32) -> Self {
        Self {
            session_id,
            profile_id,
            profile,
            history: Vec::new(),
            user_message_count: 0,
            premium_trigger_at: trigger_at,
            trigger: TriggerState::Idle,
            created_at: Utc::now(),
        }
    }

    /// Apply one append to this session's state machine.
    ///
    /// User messages bump the count and arm the trigger edge-wise when the
    /// threshold is first reached. An assistant message while `Pending`
    /// moves the trigger to `Delivered` atomically with the append.
    fn apply(&mut self, role: Role, content: String) {
        self.history.push(Message { role, content });

        match role {
            Role::User => {
                self.user_message_count += 1;
                if self.trigger == TriggerState::Idle
                    && self.user_message_count >= self.premium_trigger_at
                {
                    self.trigger = TriggerState::Pending;
                    tracing::info!(
                        session_id = %self.session_id,
                        count = self.user_message_count,
                        "premium trigger armed"
                    );
                }
            }
            Role::Assistant => {
                if self.trigger == TriggerState::Pending {
                    self.trigger = TriggerState::Delivered;
                    tracing::info!(session_id = %self.session_id, "premium suggestion delivered");
                }
            }
        }
    }

    /// Client-facing snapshot.
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            session_id: self.session_id.clone(),
            user_message_count: self.user_message_count,
            premium_suggested: self.trigger.delivered(),
            should_show_premium_button: self.trigger.delivered(),
        }
    }

    /// Last `limit` turns in chronological order, as a fresh slice.
    pub fn recent_history(&self, limit: usize) -> Vec<Message> {
        let start = self.history.len().saturating_sub(limit);
        self.history[start..].to_vec()
    }
}
