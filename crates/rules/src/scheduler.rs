//! Periodic rules file polling.
//!
//! [`ReloadTask`] drives [`RuleEngine::read_rules`] on a fixed interval from a
//! tokio task until it is stopped. Each poll runs on the blocking pool since
//! it touches the filesystem.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::engine::RuleEngine;
use crate::loader::ReloadOutcome;

/// Handle to a running reload loop.
pub struct ReloadTask {
    shutdown: Arc<Notify>,
    handle: JoinHandle<()>,
}

impl ReloadTask {
    /// Spawn the reload loop. The first poll happens after one `period`.
    pub fn spawn(engine: Arc<RuleEngine>, period: Duration) -> Self {
        let shutdown = Arc::new(Notify::new());
        let signal = Arc::clone(&shutdown);

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(interval_secs = period.as_secs_f64(), "aggregation rules reload task started");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let engine = Arc::clone(&engine);
                        match tokio::task::spawn_blocking(move || engine.read_rules()).await {
                            Ok(ReloadOutcome::Unchanged) => {}
                            Ok(outcome) => debug!(?outcome, "aggregation rules poll"),
                            Err(e) => error!(error = %e, "aggregation rules reload panicked"),
                        }
                    }
                    _ = signal.notified() => {
                        info!("aggregation rules reload task shutting down");
                        break;
                    }
                }
            }
        });

        Self { shutdown, handle }
    }

    /// Ask the loop to exit after the current poll.
    pub fn stop(&self) {
        self.shutdown.notify_one();
    }

    /// Stop the loop and wait for it to exit.
    pub async fn shutdown(self) {
        self.stop();
        if let Err(e) = self.handle.await {
            error!(error = %e, "aggregation rules reload task failed");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}
