use crate::manager::AlertManager;
use std::sync::{Arc, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// `tokio::time::interval` rejects a zero period.
const MIN_CHECK_INTERVAL: Duration = Duration::from_millis(1);
/// Longer periods are clamped so the first deadline stays representable.
pub const MAX_CHECK_INTERVAL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

pub(crate) struct MonitorHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl AlertManager {
    /// Start the periodic [`check_alerts`](Self::check_alerts) loop.
    ///
    /// The first check runs one interval after the call. Returns `false`
    /// if a loop is already running. The task holds only a weak reference,
    /// so dropping the last `Arc` ends the loop too.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn start_monitoring(self: &Arc<Self>) -> bool {
        let mut slot = self.monitor.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(|h| !h.task.is_finished()) {
            tracing::debug!("Alert monitoring already running");
            return false;
        }

        let period = self
            .options()
            .check_interval
            .clamp(MIN_CHECK_INTERVAL, MAX_CHECK_INTERVAL);
        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let manager = Arc::downgrade(self);

        let task = tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            tracing::info!(interval_secs = period.as_secs_f64(), "Alert monitoring started");

            loop {
                tokio::select! {
                    biased;
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                    _ = ticker.tick() => {
                        let Some(manager) = manager.upgrade() else {
                            break;
                        };
                        let summary = manager.check_alerts().await;
                        if summary.skipped {
                            tracing::debug!("Alert tick skipped, previous check still running");
                        }
                    }
                }
            }

            tracing::info!("Alert monitoring stopped");
        });

        *slot = Some(MonitorHandle { shutdown, task });
        true
    }

    /// Stop the monitoring loop. Future ticks are cancelled; a check that
    /// is already running completes. Returns `false` if no loop was running.
    pub fn stop_monitoring(&self) -> bool {
        let handle = self
            .monitor
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match handle {
            Some(handle) => {
                let running = !handle.task.is_finished();
                let _ = handle.shutdown.send(true);
                running
            }
            None => false,
        }
    }

    pub fn is_monitoring(&self) -> bool {
        self.monitor
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|h| !h.task.is_finished())
    }
}
