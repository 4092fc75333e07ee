use crate::condition::evaluate_condition;
use crate::error::AlertError;
use crate::monitor::MonitorHandle;
use chrono::{DateTime, Utc};
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use vigil_common::clock::{Clock, SystemClock};
use vigil_common::id::next_id;
use vigil_common::types::{
    labels, Alert, AlertActionConfig, AlertCondition, AlertStatus, Severity,
};
use vigil_logs::{context_from, Context, LogAggregator};
use vigil_metrics::MetricsCollector;
use vigil_notify::registry::ActionRegistry;

pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(60);
pub const DEFAULT_ACTION_TIMEOUT: Duration = Duration::from_secs(10);

/// Counter incremented once per trigger, labelled by severity and alert name.
pub const TRIGGERED_METRIC: &str = "alerts.triggered";
/// Counter incremented once per resolve, labelled by severity and alert name.
pub const RESOLVED_METRIC: &str = "alerts.resolved";

#[derive(Debug, Clone, Copy)]
pub struct AlertManagerOptions {
    /// Period of the monitoring loop.
    pub check_interval: Duration,
    /// Upper bound for a single action execution.
    pub action_timeout: Duration,
}

impl Default for AlertManagerOptions {
    fn default() -> Self {
        Self {
            check_interval: DEFAULT_CHECK_INTERVAL,
            action_timeout: DEFAULT_ACTION_TIMEOUT,
        }
    }
}

/// Optional fields for [`AlertManager::create`].
#[derive(Debug, Clone)]
pub struct AlertOptions {
    pub severity: Severity,
    pub enabled: bool,
    pub description: Option<String>,
}

impl Default for AlertOptions {
    fn default() -> Self {
        Self {
            severity: Severity::Medium,
            enabled: true,
            description: None,
        }
    }
}

/// Partial update for [`AlertManager::update`]; `None` leaves a field as is.
#[derive(Debug, Clone, Default)]
pub struct AlertUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub severity: Option<Severity>,
    pub condition: Option<AlertCondition>,
    pub actions: Option<Vec<AlertActionConfig>>,
    pub enabled: Option<bool>,
    pub status: Option<AlertStatus>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AlertFilter {
    pub severity: Option<Severity>,
    pub enabled: Option<bool>,
}

impl AlertFilter {
    fn matches(&self, alert: &Alert) -> bool {
        self.severity.map_or(true, |s| alert.severity == s)
            && self.enabled.map_or(true, |e| alert.enabled == e)
    }
}

/// Outcome of one [`AlertManager::check_alerts`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckSummary {
    /// Enabled alerts whose condition was evaluated.
    pub evaluated: usize,
    pub triggered: usize,
    pub resolved: usize,
    /// Conditions that failed to evaluate (treated as `false`).
    pub errors: usize,
    /// Actions that failed or timed out.
    pub action_failures: usize,
    /// The pass did not run because another one was still in progress.
    pub skipped: bool,
}

/// Evaluates alert conditions against a [`MetricsCollector`] and drives the
/// edge-triggered trigger/resolve state machine.
///
/// An alert triggers when its condition is true, its status is
/// [`AlertStatus::Active`] and it is not already firing; it resolves when
/// the condition turns false while firing. Repeated true evaluations do not
/// re-run actions.
pub struct AlertManager {
    metrics: Arc<MetricsCollector>,
    logs: Arc<LogAggregator>,
    actions: Arc<ActionRegistry>,
    clock: Arc<dyn Clock>,
    options: AlertManagerOptions,
    alerts: Mutex<Vec<Alert>>,
    checking: AtomicBool,
    pub(crate) monitor: Mutex<Option<MonitorHandle>>,
}

impl AlertManager {
    pub fn new(
        metrics: Arc<MetricsCollector>,
        logs: Arc<LogAggregator>,
        actions: Arc<ActionRegistry>,
        options: AlertManagerOptions,
    ) -> Self {
        Self::with_clock(metrics, logs, actions, options, Arc::new(SystemClock))
    }

    pub fn with_clock(
        metrics: Arc<MetricsCollector>,
        logs: Arc<LogAggregator>,
        actions: Arc<ActionRegistry>,
        options: AlertManagerOptions,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            metrics,
            logs,
            actions,
            clock,
            options,
            alerts: Mutex::new(Vec::new()),
            checking: AtomicBool::new(false),
            monitor: Mutex::new(None),
        }
    }

    pub fn options(&self) -> &AlertManagerOptions {
        &self.options
    }

    pub fn actions(&self) -> &Arc<ActionRegistry> {
        &self.actions
    }

    fn alerts(&self) -> MutexGuard<'_, Vec<Alert>> {
        self.alerts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn create(
        &self,
        name: impl Into<String>,
        condition: AlertCondition,
        actions: Vec<AlertActionConfig>,
        options: AlertOptions,
    ) -> Alert {
        let now = self.clock.now();
        let alert = Alert {
            id: next_id(),
            name: name.into(),
            description: options.description,
            severity: options.severity,
            condition,
            actions,
            enabled: options.enabled,
            status: AlertStatus::Active,
            triggered_at: None,
            resolved_at: None,
            created_at: now,
            updated_at: now,
        };
        self.warn_invalid_actions(&alert);

        tracing::info!(
            alert_id = %alert.id,
            name = %alert.name,
            metric = %alert.condition.metric,
            severity = %alert.severity,
            "Alert created"
        );
        self.alerts().push(alert.clone());
        alert
    }

    pub fn update(&self, id: &str, update: AlertUpdate) -> Option<Alert> {
        let now = self.clock.now();
        let updated = {
            let mut alerts = self.alerts();
            let alert = alerts.iter_mut().find(|a| a.id == id)?;
            if let Some(name) = update.name {
                alert.name = name;
            }
            if let Some(description) = update.description {
                alert.description = Some(description);
            }
            if let Some(severity) = update.severity {
                alert.severity = severity;
            }
            if let Some(condition) = update.condition {
                alert.condition = condition;
            }
            if let Some(actions) = update.actions {
                alert.actions = actions;
            }
            if let Some(enabled) = update.enabled {
                alert.enabled = enabled;
            }
            if let Some(status) = update.status {
                alert.status = status;
            }
            alert.updated_at = now;
            alert.clone()
        };
        self.warn_invalid_actions(&updated);
        tracing::debug!(alert_id = %id, "Alert updated");
        Some(updated)
    }

    pub fn delete(&self, id: &str) -> bool {
        let mut alerts = self.alerts();
        let len_before = alerts.len();
        alerts.retain(|a| a.id != id);
        let removed = alerts.len() < len_before;
        if removed {
            tracing::debug!(alert_id = %id, "Alert deleted");
        }
        removed
    }

    pub fn get(&self, id: &str) -> Option<Alert> {
        self.alerts().iter().find(|a| a.id == id).cloned()
    }

    /// Alerts matching `filter`, in registration order.
    pub fn get_all(&self, filter: &AlertFilter) -> Vec<Alert> {
        self.alerts()
            .iter()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect()
    }

    /// Drop every alert definition. Does not stop the monitoring loop.
    pub fn clear(&self) {
        self.alerts().clear();
    }

    fn warn_invalid_actions(&self, alert: &Alert) {
        for action in &alert.actions {
            if let Err(e) = self.actions.validate(action) {
                tracing::warn!(
                    alert_id = %alert.id,
                    action_type = %action.action_type,
                    error = %e,
                    "Alert action will fail when triggered"
                );
            }
        }
    }

    /// Evaluate every enabled alert once, in registration order.
    ///
    /// A pass that starts while another is still running returns
    /// immediately with [`CheckSummary::skipped`] set.
    pub async fn check_alerts(&self) -> CheckSummary {
        if self.checking.swap(true, Ordering::AcqRel) {
            tracing::debug!("Alert check already in progress, skipping");
            return CheckSummary {
                skipped: true,
                ..CheckSummary::default()
            };
        }
        let _pass = CheckPass(&self.checking);

        let candidates: Vec<Alert> = self.alerts().iter().filter(|a| a.enabled).cloned().collect();
        let mut summary = CheckSummary::default();

        for alert in candidates {
            summary.evaluated += 1;
            let now = self.clock.now();
            match evaluate_condition(&self.metrics, &alert.condition, now) {
                Ok(true) if alert.status == AlertStatus::Active && !alert.is_firing() => {
                    if let Some(alert) = self.mark_triggered(&alert.id, now) {
                        summary.triggered += 1;
                        summary.action_failures += self.trigger(&alert).await;
                    }
                }
                Ok(false) if alert.is_firing() => {
                    if let Some(alert) = self.mark_resolved(&alert.id, now) {
                        summary.resolved += 1;
                        self.resolve(&alert);
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    summary.errors += 1;
                    tracing::warn!(alert_id = %alert.id, error = %e, "Alert evaluation failed");
                    self.logs.error(
                        format!("Failed to evaluate alert '{}'", alert.name),
                        Some(&e),
                        Some(alert_context(&alert)),
                    );
                }
            }
        }

        tracing::debug!(
            evaluated = summary.evaluated,
            triggered = summary.triggered,
            resolved = summary.resolved,
            errors = summary.errors,
            "Alert check complete"
        );
        summary
    }

    /// Stamp `triggered_at` if the stored alert may still trigger; the
    /// definition can change between the snapshot and this call.
    fn mark_triggered(&self, id: &str, now: DateTime<Utc>) -> Option<Alert> {
        let mut alerts = self.alerts();
        let alert = alerts.iter_mut().find(|a| a.id == id)?;
        if !alert.enabled || alert.status != AlertStatus::Active || alert.is_firing() {
            return None;
        }
        alert.triggered_at = Some(now);
        alert.resolved_at = None;
        Some(alert.clone())
    }

    fn mark_resolved(&self, id: &str, now: DateTime<Utc>) -> Option<Alert> {
        let mut alerts = self.alerts();
        let alert = alerts.iter_mut().find(|a| a.id == id)?;
        if !alert.is_firing() {
            return None;
        }
        alert.resolved_at = Some(now);
        Some(alert.clone())
    }

    /// Audit, run enabled actions in order and count. Returns the number of
    /// failed actions.
    async fn trigger(&self, alert: &Alert) -> usize {
        tracing::warn!(
            alert_id = %alert.id,
            name = %alert.name,
            severity = %alert.severity,
            metric = %alert.condition.metric,
            threshold = alert.condition.threshold,
            "Alert triggered"
        );
        self.logs.warn(
            format!("Alert triggered: {}", alert.name),
            Some(alert_context(alert)),
        );

        let mut failures = 0;
        for action in alert.actions.iter().filter(|a| a.enabled) {
            if let Err(e) = self.run_action(alert, action).await {
                failures += 1;
                tracing::error!(
                    alert_id = %alert.id,
                    action_type = %action.action_type,
                    error = %e,
                    "Alert action failed"
                );
                let mut context = alert_context(alert);
                context.insert("action_type".to_string(), json!(action.action_type));
                self.logs.error(
                    format!("Alert action '{}' failed for '{}'", action.action_type, alert.name),
                    Some(&e),
                    Some(context),
                );
            }
        }

        let severity = alert.severity.to_string();
        self.metrics.increment(
            TRIGGERED_METRIC,
            1.0,
            labels([("severity", severity.as_str()), ("name", alert.name.as_str())]),
        );
        failures
    }

    async fn run_action(&self, alert: &Alert, action: &AlertActionConfig) -> Result<(), AlertError> {
        let timeout = self.options.action_timeout;
        match tokio::time::timeout(timeout, self.actions.execute(alert, action)).await {
            Ok(Ok(())) => {
                tracing::debug!(alert_id = %alert.id, action_type = %action.action_type, "Alert action executed");
                Ok(())
            }
            Ok(Err(source)) => Err(AlertError::ActionFailed {
                action_type: action.action_type.clone(),
                source,
            }),
            Err(_) => Err(AlertError::ActionTimeout {
                action_type: action.action_type.clone(),
                timeout,
            }),
        }
    }

    fn resolve(&self, alert: &Alert) {
        let duration_ms = match (alert.triggered_at, alert.resolved_at) {
            (Some(triggered), Some(resolved)) => (resolved - triggered).num_milliseconds(),
            _ => 0,
        };
        tracing::info!(alert_id = %alert.id, name = %alert.name, duration_ms, "Alert resolved");

        let mut context = alert_context(alert);
        context.insert("duration_ms".to_string(), json!(duration_ms));
        self.logs.info(format!("Alert resolved: {}", alert.name), Some(context));

        let severity = alert.severity.to_string();
        self.metrics.increment(
            RESOLVED_METRIC,
            1.0,
            labels([("severity", severity.as_str()), ("name", alert.name.as_str())]),
        );
    }
}

fn alert_context(alert: &Alert) -> Context {
    context_from(json!({
        "alert_id": alert.id,
        "severity": alert.severity,
        "metric": alert.condition.metric,
        "threshold": alert.condition.threshold,
    }))
}

/// Clears the in-progress flag when a pass ends, including when its future
/// is dropped mid-await.
struct CheckPass<'a>(&'a AtomicBool);

impl Drop for CheckPass<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
