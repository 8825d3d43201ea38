//! Application state.

use std::sync::Arc;
use std::time::Instant;

use ember_core::completion::{CompletionClient, GroqClient};
use ember_core::SessionManager;
use tracing::info;

use crate::config::Config;
use crate::services::ChatService;

/// Shared application state, injected into every handler.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration
    pub config: Arc<Config>,
    /// Session lifecycle manager over the in-memory store
    pub sessions: Arc<SessionManager>,
    /// Conversation orchestrator
    pub chat: ChatService,
    /// Server start time
    pub start_time: Instant,
}

impl AppState {
    /// Create new application state.
    ///
    /// Builds the session store/manager and, when credentials are
    /// configured, the completion client. Without credentials the chat
    /// service serves canned replies.
    pub fn new(config: Config) -> anyhow::Result<Arc<Self>> {
        let sessions = Arc::new(SessionManager::with_new_store());

        let completion: Option<Arc<dyn CompletionClient>> = if config.has_completion_keys() {
            let client = GroqClient::new(config.api_keys.clone(), config.model.clone())?;
            info!(keys = client.key_count(), model = %config.model, "completion client ready");
            Some(Arc::new(client))
        } else {
            info!("no completion credentials configured, serving canned replies");
            None
        };

        let chat = ChatService::new(sessions.clone(), completion, config.history_window);

        Ok(Arc::new(Self {
            config: Arc::new(config),
            sessions,
            chat,
            start_time: Instant::now(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_without_credentials() {
        let state = AppState::new(Config::default()).unwrap();
        assert!(!state.config.has_completion_keys());
        assert_eq!(state.sessions.session_count().unwrap(), 0);
    }

    #[test]
    fn test_state_with_credentials() {
        let config = Config {
            api_keys: vec!["key1".to_string(), "key2".to_string()],
            ..Config::default()
        };
        let state = AppState::new(config).unwrap();
        assert!(state.config.has_completion_keys());
    }
}
