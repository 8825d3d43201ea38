//! Error types for ember-core.

use thiserror::Error;

/// Result type alias using ember-core Error
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for ember operations
#[derive(Error, Debug)]
pub enum Error {
    // Session errors
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Duplicate session id: {0}")]
    DuplicateSessionId(String),

    #[error("Session store lock poisoned")]
    LockPoisoned,

    // Completion service errors
    #[error("Completion service unavailable: {0}")]
    CompletionUnavailable(String),

    #[error("Completion service rate limited")]
    RateLimited,

    #[error("Completion service returned status {0}")]
    CompletionStatus(u16),

    #[error("No completion API keys configured")]
    NoApiKeys,

    // HTTP transport errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Generic errors
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// True when the failure should be retried with the next API key.
    ///
    /// Per the completion service contract, only rate-limit-class failures
    /// advance the key fallback chain; everything else is terminal.
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Error::RateLimited | Error::CompletionStatus(429))
    }
}
