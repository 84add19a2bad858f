use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::repositories::session::SessionStore;

/// Result of one sweep cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SweepOutcome {
    Success { removed: u64 },
    Failure { error: String },
}

/// Background task removing reclaimable sessions at a fixed interval.
///
/// A failed sweep is logged and retried on the next tick. Cycles share no
/// state with each other.
pub struct Reaper {
    store: Arc<dyn SessionStore>,
    interval: Duration,
}

impl Reaper {
    pub fn new(store: Arc<dyn SessionStore>, interval: Duration) -> Self {
        Self { store, interval }
    }

    /// Runs a single sweep and emits one event describing it.
    pub async fn sweep_once(&self) -> SweepOutcome {
        match self.store.sweep_expired().await {
            Ok(removed) => {
                if removed > 0 {
                    tracing::info!(outcome = "success", removed, "🧹 Session sweep completed");
                } else {
                    tracing::debug!(outcome = "success", removed, "🧹 Session sweep completed");
                }
                SweepOutcome::Success { removed }
            }
            Err(e) => {
                tracing::error!(outcome = "failure", error = %e, "❌ Session sweep failed");
                SweepOutcome::Failure {
                    error: e.to_string(),
                }
            }
        }
    }

    /// Sweeps on every tick until `shutdown` is cancelled. The first tick
    /// fires immediately. Cancellation also abandons a sweep in flight.
    pub async fn run(self, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("🛑 Session reaper stopped");
                    break;
                }
                _ = ticker.tick() => {
                    // A hung sweep must not hold up shutdown.
                    tokio::select! {
                        _ = shutdown.cancelled() => {
                            tracing::warn!("🛑 Session reaper stopped during a sweep");
                            break;
                        }
                        _ = self.sweep_once() => {}
                    }
                }
            }
        }
    }

    /// Spawns [`Reaper::run`] on the current runtime.
    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            "✅ Session reaper started"
        );
        tokio::spawn(self.run(shutdown))
    }
}
