use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use vigil::alert::AlertFilter;
use vigil::common::clock::{Clock, ManualClock};
use vigil::common::types::{
    Aggregation, Alert, AlertActionConfig, AlertCondition, CompareOp, Labels, MetricConfig,
    MetricType,
};
use vigil::logs::{LogFilter, LogLevel};
use vigil::notify::channels::host::HostDispatcher;
use vigil::{Observability, VigilConfig};

#[derive(Default)]
struct Inbox {
    delivered: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl HostDispatcher for Inbox {
    async fn dispatch(&self, action_type: &str, alert: &Alert, _config: &Value) -> anyhow::Result<()> {
        self.delivered
            .lock()
            .unwrap()
            .push((action_type.to_string(), alert.name.clone()));
        Ok(())
    }
}

#[tokio::test]
async fn latency_alert_triggers_once_and_resolves() {
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap(),
    ));
    let inbox = Arc::new(Inbox::default());
    let mut config = VigilConfig::default();
    config.logs.console_mirror = false;
    let obs = Observability::with_parts(&config, clock.clone(), |registry| {
        registry.with_host_dispatcher(inbox.clone())
    });

    obs.metrics
        .register_metric(MetricConfig::new("latency", MetricType::Gauge).with_unit("ms"));
    let alert = obs.alerts.create(
        "High latency",
        AlertCondition::new("latency", CompareOp::Gt, 250.0),
        vec![
            AlertActionConfig::new("notification", json!({"channel": "ops"})),
            AlertActionConfig::new("log", Value::Null),
        ],
        Default::default(),
    );

    // Nothing recorded yet.
    let summary = obs.alerts.check_alerts().await;
    assert_eq!(summary.triggered, 0);

    for value in [100.0, 200.0, 300.0] {
        clock.advance(Duration::seconds(1));
        obs.metrics.record("latency", value, Labels::new(), None);
    }
    assert_eq!(obs.metrics.aggregate("latency", Aggregation::Avg, None), 200.0);
    assert_eq!(obs.metrics.aggregate("latency", Aggregation::Max, None), 300.0);

    for _ in 0..3 {
        obs.alerts.check_alerts().await;
    }
    assert_eq!(
        inbox.delivered.lock().unwrap().clone(),
        vec![("notification".to_string(), "High latency".to_string())]
    );
    let triggered_at = obs.alerts.get(&alert.id).unwrap().triggered_at;
    assert_eq!(triggered_at, Some(clock.now()));

    clock.advance(Duration::milliseconds(2_500));
    obs.metrics.record("latency", 100.0, Labels::new(), None);
    assert_eq!(obs.alerts.check_alerts().await.resolved, 1);

    let stored = obs.alerts.get_all(&AlertFilter::default()).remove(0);
    assert!(stored.resolved_at > stored.triggered_at);

    let resolved = obs
        .logs
        .get_logs(&LogFilter::new().level(LogLevel::Info).search("resolved"));
    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved[0].context["duration_ms"], 2_500);

    // Trigger audit entry plus the `log` action's own entry.
    let warns = obs.logs.get_logs(&LogFilter::new().level(LogLevel::Warn));
    assert_eq!(warns.len(), 2);
    assert_eq!(
        obs.metrics.get_latest("alerts.triggered").map(|m| m.value),
        Some(1.0)
    );
    assert_eq!(
        obs.metrics.get_latest("alerts.resolved").map(|m| m.value),
        Some(1.0)
    );
}
