//! ChatService - conversation orchestration.
//!
//! Thin layer between the HTTP routes and the session lifecycle manager.
//! For each inbound user message it records the turn, reads the premium
//! trigger state, asks the completion service for a reply with that state
//! folded into the prompt, records the reply, and returns it with current
//! stats.
//!
//! Completion failures never surface as request errors: the caller always
//! gets a chat-shaped reply. A fallback reply goes through the same append
//! path as a real one, so the trigger-delivery transition applies either
//! way.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, warn};

use ember_core::completion::{prompt, ChatMessage, CompletionClient};
use ember_core::{Profile, Result, Role, SessionManager, SessionStats};

/// Token budget for the three opening lines.
const OPENER_MAX_TOKENS: u32 = 150;

/// Token budget for a chat reply.
const REPLY_MAX_TOKENS: u32 = 350;

/// Result of starting a session: the id plus the recorded opening lines.
#[derive(Debug, Clone)]
pub struct StartedSession {
    pub session_id: String,
    pub messages: Vec<String>,
}

/// Result of posting a message: the assistant reply plus a stats snapshot.
#[derive(Debug, Clone)]
pub struct ChatReply {
    pub message: String,
    pub stats: SessionStats,
}

/// Conversation orchestrator over a session manager and an optional
/// completion client. Without a client the service runs in credential-less
/// mode and serves canned lines.
#[derive(Clone)]
pub struct ChatService {
    sessions: Arc<SessionManager>,
    completion: Option<Arc<dyn CompletionClient>>,
    history_window: usize,
    /// Per-session mutation locks. The trigger state read before the
    /// completion call must stay valid across the await, so the whole
    /// append-complete-append sequence holds the session's lock.
    message_locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl ChatService {
    pub fn new(
        sessions: Arc<SessionManager>,
        completion: Option<Arc<dyn CompletionClient>>,
        history_window: usize,
    ) -> Self {
        Self {
            sessions,
            completion,
            history_window,
            message_locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Create a session and produce three opening lines, recorded as
    /// assistant turns.
    pub async fn start_session(
        &self,
        profile_id: &str,
        profile: Profile,
        user_city: Option<&str>,
    ) -> Result<StartedSession> {
        let city = user_city.map(str::trim).filter(|c| !c.is_empty());
        let session = self.sessions.create(profile_id, profile.clone())?;

        let openers = match &self.completion {
            Some(client) => {
                let request = vec![
                    ChatMessage::system(prompt::system_prompt(&profile)),
                    ChatMessage::user(prompt::opener_prompt(city)),
                ];
                match client.complete(&request, OPENER_MAX_TOKENS).await {
                    Ok(raw) => {
                        let parsed = prompt::parse_openers(&raw);
                        if parsed.is_empty() {
                            prompt::fallback_openers(&profile.name, city)
                        } else {
                            parsed
                        }
                    }
                    Err(err) => {
                        warn!(error = %err, "opener completion failed, using fallback lines");
                        prompt::fallback_openers(&profile.name, city)
                    }
                }
            }
            None => prompt::fallback_openers(&profile.name, city),
        };

        for line in &openers {
            self.sessions
                .append(&session.session_id, Role::Assistant, line.clone())?;
        }
        info!(session_id = %session.session_id, openers = openers.len(), "session started");

        Ok(StartedSession {
            session_id: session.session_id,
            messages: openers,
        })
    }

    /// Record a user message, obtain a reply, record it, and report stats.
    ///
    /// Fails only when the session is unknown. The premium trigger state is
    /// read after the user append and before the completion call; the reply
    /// append performs the delivery transition.
    ///
    /// Concurrent messages for one session are serialized: a second request
    /// waits until the first has recorded its reply. Without this, two
    /// in-flight requests could both observe `Pending` and both ask for a
    /// premium pitch.
    pub async fn post_message(&self, session_id: &str, text: &str) -> Result<ChatReply> {
        let lock = {
            let mut locks = self.message_locks.lock().await;
            locks.entry(session_id.to_string()).or_default().clone()
        };

        let result = {
            let _guard = lock.lock().await;
            self.exchange(session_id, text).await
        };

        // Drop the map entry once no other request for this session holds it
        {
            let mut locks = self.message_locks.lock().await;
            if let Some(entry) = locks.get(session_id) {
                if Arc::strong_count(entry) == 2 {
                    locks.remove(session_id);
                }
            }
        }

        result
    }

    /// One full user-turn exchange. Caller holds the session's message lock.
    async fn exchange(&self, session_id: &str, text: &str) -> Result<ChatReply> {
        let session = self.sessions.append(session_id, Role::User, text)?;
        let premium_pending = self.sessions.trigger_pending(session_id)?;

        let reply = match &self.completion {
            Some(client) => {
                let mut request = vec![ChatMessage::system(prompt::system_prompt(&session.profile))];
                request.extend(
                    self.sessions
                        .history(session_id, self.history_window)?
                        .into_iter()
                        .map(|m| ChatMessage {
                            role: m.role.as_str().to_string(),
                            content: m.content,
                        }),
                );
                request.push(ChatMessage::system(prompt::reminder(premium_pending)));

                match client.complete(&request, REPLY_MAX_TOKENS).await {
                    Ok(reply) => reply,
                    Err(err) => {
                        warn!(%session_id, error = %err, "completion failed, serving offline reply");
                        prompt::offline_reply()
                    }
                }
            }
            None => prompt::canned_reply(),
        };

        self.sessions
            .append(session_id, Role::Assistant, reply.clone())?;
        let stats = self.sessions.stats(session_id)?;

        Ok(ChatReply {
            message: reply,
            stats,
        })
    }

    /// Stats snapshot passthrough.
    pub fn stats(&self, session_id: &str) -> Result<SessionStats> {
        self.sessions.stats(session_id)
    }
}
