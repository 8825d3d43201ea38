//! Shared types for ember-core.
//!
//! These types are used by both the session layer and the API surface.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Conversation Types
// ─────────────────────────────────────────────────────────────────────────────

/// Who produced a conversation turn.
///
/// Closed two-value tag: system prompts never enter the session history,
/// they exist only in completion requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Wire representation used in completion requests.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One conversation turn. Immutable once appended to a session history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Persona Types
// ─────────────────────────────────────────────────────────────────────────────

/// Persona descriptor driving a conversation. Immutable after session creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub age: u32,
    pub personality: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Snapshot Types
// ─────────────────────────────────────────────────────────────────────────────

/// Client-facing session snapshot.
///
/// `premium_suggested` doubles as the "show the premium button" flag in the
/// client contract; both fields are kept so the wire shape stays explicit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    pub session_id: String,
    pub user_message_count: u32,
    pub premium_suggested: bool,
    pub should_show_premium_button: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        assert_eq!(
            serde_json::to_string(&Role::Assistant).unwrap(),
            "\"assistant\""
        );
        let role: Role = serde_json::from_str("\"assistant\"").unwrap();
        assert_eq!(role, Role::Assistant);
    }

    #[test]
    fn test_message_roundtrip() {
        let msg = Message::new(Role::User, "hey");
        let json = serde_json::to_string(&msg).unwrap();
        let back: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(back.role, Role::User);
        assert_eq!(back.content, "hey");
    }
}
