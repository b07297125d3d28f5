//! Sync Scheduler
//!
//! Rate-limits reconciliation attempts with a cooldown timer. Every
//! attempt, failed or not, stamps `last_sync_time` so a misconfigured or
//! unreachable remote cannot cause a tight retry storm; failures arm a
//! distinct, shorter cooldown so real outages recover sooner than the
//! success cadence.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use bridge_traits::Clock;

use crate::reconciler::Reconciler;

/// Result of a [`SyncScheduler::maybe_sync`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Reconciliation ran; `message` summarizes the pull.
    Success { message: String },
    /// Still cooling down; no reconciliation was attempted.
    Cooldown { remaining: Duration },
    /// Reconciliation was attempted and failed.
    Failure { reason: String },
}

#[derive(Debug, Default)]
struct SyncState {
    /// Millis timestamp of the last completed attempt, success or failure
    last_sync_millis: Option<i64>,
    /// Whether that attempt failed (selects the failure cooldown)
    last_failed: bool,
}

/// Cooldown gate in front of the [`Reconciler`] pull path.
pub struct SyncScheduler {
    state: Mutex<SyncState>,
    cooldown: Duration,
    failure_cooldown: Duration,
    clock: Arc<dyn Clock>,
}

impl SyncScheduler {
    pub fn new(cooldown: Duration, failure_cooldown: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(SyncState::default()),
            cooldown,
            failure_cooldown,
            clock,
        }
    }

    /// Remaining cooldown, if the gate is currently closed.
    async fn remaining_cooldown(&self) -> Option<Duration> {
        let state = self.state.lock().await;
        let last = state.last_sync_millis?;
        let window = if state.last_failed {
            self.failure_cooldown
        } else {
            self.cooldown
        };
        let elapsed = self.clock.unix_timestamp_millis().saturating_sub(last);
        let window_millis = window.as_millis() as i64;
        if elapsed < window_millis {
            Some(Duration::from_millis((window_millis - elapsed) as u64))
        } else {
            None
        }
    }

    /// Attempt a pull reconciliation, unless the cooldown window is still
    /// open and `force` is not set.
    ///
    /// The state lock is held only for the gate check and the final stamp,
    /// never across remote I/O; two concurrent callers may both attempt a
    /// pull, which is wasteful but safe.
    #[instrument(skip(self, reconciler))]
    pub async fn maybe_sync(
        &self,
        force: bool,
        reconciler: &Reconciler,
        remote_folder: &str,
    ) -> SyncOutcome {
        if !force {
            if let Some(remaining) = self.remaining_cooldown().await {
                info!(remaining_secs = remaining.as_secs(), "Sync still cooling down");
                return SyncOutcome::Cooldown { remaining };
            }
        }

        let result = reconciler.sync_from_remote(remote_folder).await;

        // Failed attempts count too; this bounds retry volume against an
        // unreachable remote.
        let mut state = self.state.lock().await;
        state.last_sync_millis = Some(self.clock.unix_timestamp_millis());
        state.last_failed = result.is_err();
        drop(state);

        match result {
            Ok(report) => SyncOutcome::Success {
                message: report.message(),
            },
            Err(e) => {
                warn!(error = %e, "Reconciliation attempt failed");
                SyncOutcome::Failure {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Seconds since the last completed attempt, `None` before the first.
    pub async fn seconds_since_last_sync(&self) -> Option<u64> {
        let state = self.state.lock().await;
        let last = state.last_sync_millis?;
        let elapsed = self.clock.unix_timestamp_millis().saturating_sub(last);
        Some((elapsed / 1000).max(0) as u64)
    }

    /// Whether a non-forced sync would run right now.
    pub async fn can_sync_now(&self) -> bool {
        self.remaining_cooldown().await.is_none()
    }
}
