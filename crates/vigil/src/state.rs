use crate::config::VigilConfig;
use std::sync::Arc;
use vigil_alert::AlertManager;
use vigil_common::clock::{Clock, SystemClock};
use vigil_logs::{CallerLocation, LogAggregator};
use vigil_metrics::MetricsCollector;
use vigil_notify::registry::ActionRegistry;
use vigil_perf::PerformanceMonitor;

/// The four services wired together over one clock.
///
/// `perf` and `alerts` share the same `metrics` instance; `alerts` writes
/// its audit trail into `logs`. Clone the `Arc`s to hand services to the
/// parts of the application that need them.
#[derive(Clone)]
pub struct Observability {
    pub metrics: Arc<MetricsCollector>,
    pub logs: Arc<LogAggregator>,
    pub perf: Arc<PerformanceMonitor>,
    pub alerts: Arc<AlertManager>,
}

impl Observability {
    /// System clock and the default `log` / `webhook` actions.
    pub fn new(config: &VigilConfig) -> Self {
        Self::with_parts(config, Arc::new(SystemClock), |registry| registry)
    }

    /// Build with an explicit clock. `actions` receives the registry holding
    /// the default handlers and returns the one the alert manager uses, e.g.
    /// `|r| r.with_host_dispatcher(dispatcher)`.
    pub fn with_parts(
        config: &VigilConfig,
        clock: Arc<dyn Clock>,
        actions: impl FnOnce(ActionRegistry) -> ActionRegistry,
    ) -> Self {
        let metrics = Arc::new(MetricsCollector::with_clock(
            config.metrics.options(),
            clock.clone(),
        ));
        let logs = Arc::new(LogAggregator::with_parts(
            config.logs.options(),
            clock.clone(),
            Arc::new(CallerLocation),
        ));
        let perf = Arc::new(PerformanceMonitor::with_clock(
            metrics.clone(),
            config.perf.options(),
            clock.clone(),
        ));
        let registry = actions(ActionRegistry::with_defaults(logs.clone()));
        tracing::debug!(actions = ?registry.handler_names(), "Alert actions registered");
        let alerts = Arc::new(AlertManager::with_clock(
            metrics.clone(),
            logs.clone(),
            Arc::new(registry),
            config.alerts.options(),
            clock,
        ));

        Self {
            metrics,
            logs,
            perf,
            alerts,
        }
    }

    /// Stop monitoring and drop all recorded state and alert definitions.
    pub fn reset(&self) {
        self.alerts.stop_monitoring();
        self.alerts.clear();
        self.perf.clear();
        self.logs.clear();
        self.metrics.reset();
        tracing::debug!("Observability state reset");
    }
}
