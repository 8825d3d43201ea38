//! CleanupService - periodic session expiry sweeps.
//!
//! Owns a background tokio task that sweeps the session store on a fixed
//! interval, evicting sessions older than the configured maximum age.
//! Eviction is unconditional: an abandoned session with a pending premium
//! trigger is simply dropped.
//!
//! The task is held by an abort handle so startup/shutdown (and tests) can
//! stop it cleanly; it is also aborted on drop.

use std::sync::Arc;

use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{error, info};

use ember_core::SessionManager;

/// Handle for the running sweep task. Aborts the task when dropped.
pub struct CleanupService {
    abort_handle: tokio::task::AbortHandle,
}

impl CleanupService {
    /// Spawn the sweep task. The first tick fires after one full interval,
    /// not immediately.
    pub fn start(
        sessions: Arc<SessionManager>,
        sweep_interval: Duration,
        max_age: chrono::Duration,
    ) -> Self {
        info!(
            interval_secs = sweep_interval.as_secs(),
            max_age_secs = max_age.num_seconds(),
            "starting session cleanup"
        );

        let task = tokio::spawn(async move {
            let mut ticker = interval(sweep_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // interval() yields immediately on the first tick
            ticker.tick().await;

            loop {
                ticker.tick().await;
                match sessions.sweep_expired(max_age) {
                    Ok(_) => {}
                    Err(e) => error!(error = %e, "session sweep failed"),
                }
            }
        });

        Self {
            abort_handle: task.abort_handle(),
        }
    }

    /// Stop the sweep task.
    pub fn stop(&self) {
        info!("stopping session cleanup");
        self.abort_handle.abort();
    }
}

impl Drop for CleanupService {
    fn drop(&mut self) {
        self.abort_handle.abort();
    }
}
