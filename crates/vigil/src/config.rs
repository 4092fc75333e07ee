use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use vigil_alert::AlertManagerOptions;
use vigil_common::types::SampleCap;
use vigil_logs::LogOptions;
use vigil_metrics::CollectorOptions;
use vigil_perf::PerfOptions;

/// Upper bound accepted for `logs.retention_days`.
pub const MAX_RETENTION_DAYS: u32 = 36_500;

/// Service configuration. Every field has a default, so an empty file is a
/// valid configuration equal to `VigilConfig::default()`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct VigilConfig {
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub logs: LogsConfig,
    #[serde(default)]
    pub perf: PerfConfig,
    #[serde(default)]
    pub alerts: AlertsConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MetricsConfig {
    /// Samples kept per metric name; `0` means unbounded.
    #[serde(default = "default_max_samples")]
    pub default_max_samples: usize,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LogsConfig {
    #[serde(default = "default_max_logs")]
    pub max_logs: usize,
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
    /// Mirror entries to `tracing`. Defaults to on in debug builds.
    #[serde(default = "default_console_mirror")]
    pub console_mirror: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PerfConfig {
    #[serde(default = "default_max_measurements")]
    pub max_measurements: usize,
    #[serde(default = "default_max_traces")]
    pub max_traces: usize,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AlertsConfig {
    #[serde(default = "default_check_interval")]
    pub check_interval_secs: u64,
    #[serde(default = "default_action_timeout")]
    pub action_timeout_secs: u64,
}

fn default_max_samples() -> usize {
    vigil_metrics::DEFAULT_MAX_SAMPLES
}

fn default_max_logs() -> usize {
    vigil_logs::DEFAULT_MAX_LOGS
}

fn default_retention_days() -> u32 {
    vigil_logs::DEFAULT_RETENTION_DAYS
}

fn default_console_mirror() -> bool {
    cfg!(debug_assertions)
}

fn default_max_measurements() -> usize {
    vigil_perf::DEFAULT_MAX_MEASUREMENTS
}

fn default_max_traces() -> usize {
    vigil_perf::DEFAULT_MAX_TRACES
}

fn default_check_interval() -> u64 {
    vigil_alert::DEFAULT_CHECK_INTERVAL.as_secs()
}

fn default_action_timeout() -> u64 {
    vigil_alert::DEFAULT_ACTION_TIMEOUT.as_secs()
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            default_max_samples: default_max_samples(),
        }
    }
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            max_logs: default_max_logs(),
            retention_days: default_retention_days(),
            console_mirror: default_console_mirror(),
        }
    }
}

impl Default for PerfConfig {
    fn default() -> Self {
        Self {
            max_measurements: default_max_measurements(),
            max_traces: default_max_traces(),
        }
    }
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            check_interval_secs: default_check_interval(),
            action_timeout_secs: default_action_timeout(),
        }
    }
}

impl VigilConfig {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let max_interval = vigil_alert::MAX_CHECK_INTERVAL.as_secs();
        if !(1..=max_interval).contains(&self.alerts.check_interval_secs) {
            anyhow::bail!("alerts.check_interval_secs must be between 1 and {max_interval}");
        }
        if !(1..=max_interval).contains(&self.alerts.action_timeout_secs) {
            anyhow::bail!("alerts.action_timeout_secs must be between 1 and {max_interval}");
        }
        if self.logs.max_logs == 0 {
            anyhow::bail!("logs.max_logs must be greater than 0");
        }
        if self.logs.retention_days > MAX_RETENTION_DAYS {
            anyhow::bail!("logs.retention_days must be at most {MAX_RETENTION_DAYS}");
        }
        Ok(())
    }
}

impl MetricsConfig {
    pub fn options(&self) -> CollectorOptions {
        let default_max_samples = match self.default_max_samples {
            0 => SampleCap::Unbounded,
            n => SampleCap::Limited(n),
        };
        CollectorOptions {
            default_max_samples,
        }
    }
}

impl LogsConfig {
    pub fn options(&self) -> LogOptions {
        LogOptions {
            max_logs: self.max_logs,
            retention_days: self.retention_days,
            console_mirror: self.console_mirror,
        }
    }
}

impl PerfConfig {
    pub fn options(&self) -> PerfOptions {
        PerfOptions {
            max_measurements: self.max_measurements,
            max_traces: self.max_traces,
        }
    }
}

impl AlertsConfig {
    pub fn options(&self) -> AlertManagerOptions {
        AlertManagerOptions {
            check_interval: Duration::from_secs(self.check_interval_secs),
            action_timeout: Duration::from_secs(self.action_timeout_secs),
        }
    }
}
