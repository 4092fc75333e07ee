use crate::config::VigilConfig;
use crate::state::Observability;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use vigil_common::clock::ManualClock;
use vigil_common::types::{AlertCondition, CompareOp, Labels, SampleCap};
use vigil_perf::Category;

#[test]
fn empty_file_equals_default_config() {
    let config = VigilConfig::parse("").expect("empty config");
    assert_eq!(config, VigilConfig::default());
    assert_eq!(config.metrics.default_max_samples, 10_000);
    assert_eq!(config.logs.max_logs, 10_000);
    assert_eq!(config.logs.retention_days, 7);
    assert_eq!(config.perf.max_traces, 1_000);
    assert_eq!(config.alerts.check_interval_secs, 60);
    assert_eq!(config.alerts.action_timeout_secs, 10);
}

#[test]
fn load_from_file_with_partial_sections() -> anyhow::Result<()> {
    let temp_dir = tempfile::tempdir()?;
    let path = temp_dir.path().join("vigil.toml");
    let mut file = std::fs::File::create(&path)?;
    writeln!(
        file,
        r#"
[metrics]
default_max_samples = 0

[logs]
max_logs = 500
console_mirror = false

[alerts]
check_interval_secs = 15
"#
    )?;

    let config = VigilConfig::load(&path)?;
    assert_eq!(config.metrics.options().default_max_samples, SampleCap::Unbounded);
    assert_eq!(config.logs.max_logs, 500);
    assert_eq!(config.logs.retention_days, 7);
    assert!(!config.logs.options().console_mirror);
    assert_eq!(config.perf.max_measurements, 10_000);

    let alerts = config.alerts.options();
    assert_eq!(alerts.check_interval, Duration::from_secs(15));
    assert_eq!(alerts.action_timeout, Duration::from_secs(10));
    Ok(())
}

#[test]
fn invalid_config_is_rejected() {
    assert!(VigilConfig::parse("[alerts]\ncheck_interval_secs = 0\n").is_err());
    assert!(VigilConfig::parse("[alerts]\naction_timeout_secs = 0\n").is_err());
    assert!(VigilConfig::parse("[logs]\nmax_logs = \"many\"\n").is_err());
    assert!(VigilConfig::parse("[logs]\nretention_days = 4294967295\n").is_err());
    assert!(VigilConfig::parse("[logs]\nretention_days = 36500\n").is_ok());
    assert!(VigilConfig::parse("[alerts]\ncheck_interval_secs = 31536001\n").is_err());
    assert!(VigilConfig::parse("[alerts]\naction_timeout_secs = 10000000000\n").is_err());
    assert!(VigilConfig::load("/nonexistent/vigil.toml").is_err());
}

fn quiet_config() -> VigilConfig {
    let mut config = VigilConfig::default();
    config.logs.console_mirror = false;
    config
}

#[test]
fn perf_measurements_land_in_shared_collector() {
    let obs = Observability::new(&quiet_config());
    let id = obs.perf.start("load_jobs", Category::Api);
    obs.perf.end(&id, None).expect("measurement");

    let samples = obs.metrics.get_metrics("performance.api.load_jobs", None);
    assert_eq!(samples.len(), 1);
    assert_eq!(samples[0].labels["category"], "api");
}

#[tokio::test]
async fn reset_clears_every_service() {
    let clock = Arc::new(ManualClock::new(chrono::Utc::now()));
    let obs = Observability::with_parts(&quiet_config(), clock, |registry| registry);
    obs.metrics.gauge("latency", 300.0, Labels::new());
    obs.logs.info("booted", None);
    let id = obs.perf.start("render", Category::Render);
    obs.perf.end(&id, None);
    obs.alerts.create(
        "High latency",
        AlertCondition::new("latency", CompareOp::Gt, 250.0),
        Vec::new(),
        Default::default(),
    );
    assert!(obs.alerts.start_monitoring());

    obs.reset();

    assert!(obs.metrics.metric_names().is_empty());
    assert!(obs.logs.is_empty());
    assert!(obs.perf.get_metrics(None).is_empty());
    assert!(obs.alerts.get_all(&Default::default()).is_empty());
    assert!(!obs.alerts.is_monitoring());
}
