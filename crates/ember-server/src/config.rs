//! Server configuration.

use ember_core::completion::DEFAULT_MODEL;

/// Default session maximum age before eviction (1 hour).
const DEFAULT_MAX_AGE_SECS: u64 = 3600;

/// Default interval between cleanup sweeps (30 minutes).
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 1800;

/// Default number of history turns sent as completion context.
const DEFAULT_HISTORY_WINDOW: usize = 20;

/// Server configuration, read from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// TCP port to listen on.
    pub port: u16,
    /// Completion API keys, in fallback order. May be empty: the server
    /// then runs in credential-less mode and serves canned replies.
    pub api_keys: Vec<String>,
    /// Completion model name.
    pub model: String,
    /// Session maximum age in seconds.
    pub session_max_age_secs: u64,
    /// Seconds between cleanup sweeps.
    pub sweep_interval_secs: u64,
    /// History turns included in each completion request.
    pub history_window: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3001,
            api_keys: Vec::new(),
            model: DEFAULT_MODEL.to_string(),
            session_max_age_secs: DEFAULT_MAX_AGE_SECS,
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
            history_window: DEFAULT_HISTORY_WINDOW,
        }
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// defaults.
    ///
    /// Recognized variables:
    /// - `EMBER_PORT` - listen port (default 3001)
    /// - `GROQ_API_KEY`, `GROQ_API_KEY_2`, `GROQ_API_KEY_3` - completion
    ///   credentials, tried in that order
    /// - `EMBER_MODEL` - completion model name
    /// - `EMBER_SESSION_MAX_AGE_SECS` - session expiry age
    /// - `EMBER_SWEEP_INTERVAL_SECS` - cleanup sweep interval
    /// - `EMBER_HISTORY_WINDOW` - completion context window size
    pub fn load() -> anyhow::Result<Self> {
        let defaults = Self::default();

        let api_keys = ["GROQ_API_KEY", "GROQ_API_KEY_2", "GROQ_API_KEY_3"]
            .iter()
            .filter_map(|name| std::env::var(name).ok())
            .filter(|key| !key.trim().is_empty())
            .collect();

        Ok(Self {
            port: env_parsed("EMBER_PORT", defaults.port)?,
            api_keys,
            model: std::env::var("EMBER_MODEL").unwrap_or(defaults.model),
            session_max_age_secs: env_parsed(
                "EMBER_SESSION_MAX_AGE_SECS",
                defaults.session_max_age_secs,
            )?,
            sweep_interval_secs: env_parsed(
                "EMBER_SWEEP_INTERVAL_SECS",
                defaults.sweep_interval_secs,
            )?,
            history_window: env_parsed("EMBER_HISTORY_WINDOW", defaults.history_window)?,
        })
    }

    /// True when at least one completion credential is configured.
    pub fn has_completion_keys(&self) -> bool {
        !self.api_keys.is_empty()
    }

    /// Session maximum age as a chrono duration for store sweeps.
    pub fn session_max_age(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.session_max_age_secs as i64)
    }

    /// Sweep interval as a std duration for the tokio timer.
    pub fn sweep_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.sweep_interval_secs)
    }
}

fn env_parsed<T: std::str::FromStr>(name: &str, default: T) -> anyhow::Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid {name}: {e}")),
        Err(_) => Ok(default),
    }
}
