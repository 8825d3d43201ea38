//! Completion service client.
//!
//! The completion service is consumed as an opaque text generator: an
//! ordered list of role-tagged messages in, a single reply string out. The
//! concrete implementation talks to an OpenAI-compatible chat-completions
//! endpoint and holds an ordered list of API keys, advancing to the next key
//! only on a rate-limit-class failure.

pub mod prompt;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Default chat-completions endpoint (Groq's OpenAI-compatible API).
pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Default model served by the completion endpoint.
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

/// One role-tagged turn in a completion request. Unlike the domain
/// [`Role`](crate::types::Role), the wire role is open-ended: completion
/// requests also carry `system` turns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Opaque text-completion collaborator.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Generate one reply for the given context window.
    async fn complete(&self, messages: &[ChatMessage], max_tokens: u32) -> Result<String>;
}

/// Request body for the chat-completions endpoint.
#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
}

/// Response body from the chat-completions endpoint.
#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: ChatMessage,
}

/// Client for Groq's OpenAI-compatible chat-completions API with sequential
/// API-key fallback.
///
/// Keys are tried in order; a 429 advances to the next key, any other
/// failure is terminal for the whole attempt. Sampling parameters are fixed
/// to match the persona tuning (temperature 1.0, top_p 0.95).
#[derive(Debug)]
pub struct GroqClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_keys: Vec<String>,
}

impl GroqClient {
    /// Build a client over the default Groq endpoint.
    ///
    /// Fails with `NoApiKeys` when the key list is empty - callers that want
    /// a credential-less deployment skip constructing a client entirely.
    pub fn new(api_keys: Vec<String>, model: impl Into<String>) -> Result<Self> {
        Self::with_base_url(api_keys, model, DEFAULT_BASE_URL)
    }

    /// Build a client against a custom endpoint. Used by tests.
    pub fn with_base_url(
        api_keys: Vec<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self> {
        if api_keys.is_empty() {
            return Err(Error::NoApiKeys);
        }
        Ok(Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_keys,
        })
    }

    pub fn key_count(&self) -> usize {
        self.api_keys.len()
    }

    async fn attempt(
        &self,
        api_key: &str,
        messages: &[ChatMessage],
        max_tokens: u32,
    ) -> Result<String> {
        let request = CompletionRequest {
            model: &self.model,
            messages,
            temperature: 1.0,
            max_tokens,
            top_p: 0.95,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(Error::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), %body, "completion request failed");
            return Err(Error::CompletionStatus(status.as_u16()));
        }

        let completion: CompletionResponse = response.json().await?;
        completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| Error::CompletionUnavailable("empty choices".to_string()))
    }
}

#[async_trait]
impl CompletionClient for GroqClient {
    async fn complete(&self, messages: &[ChatMessage], max_tokens: u32) -> Result<String> {
        let mut last_error = Error::NoApiKeys;

        for (i, api_key) in self.api_keys.iter().enumerate() {
            debug!(key = i + 1, total = self.api_keys.len(), "trying API key");

            match self.attempt(api_key, messages, max_tokens).await {
                Ok(reply) => {
                    debug!(key = i + 1, "completion succeeded");
                    return Ok(reply);
                }
                Err(err) if err.is_rate_limit() => {
                    warn!(key = i + 1, "API key rate limited, trying next");
                    last_error = err;
                }
                Err(err) => {
                    // Non-rate-limit failures are terminal: retrying another
                    // key would hit the same problem.
                    warn!(key = i + 1, error = %err, "completion attempt failed");
                    return Err(err);
                }
            }
        }

        warn!("all API keys exhausted");
        Err(match last_error {
            Error::RateLimited => Error::CompletionUnavailable("all API keys rate limited".into()),
            other => other,
        })
    }
}
