use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Dimensional tags attached to a metric sample.
pub type Labels = HashMap<String, String>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricType {
    Counter,
    #[default]
    Gauge,
    Histogram,
    Summary,
}

impl std::fmt::Display for MetricType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricType::Counter => write!(f, "counter"),
            MetricType::Gauge => write!(f, "gauge"),
            MetricType::Histogram => write!(f, "histogram"),
            MetricType::Summary => write!(f, "summary"),
        }
    }
}

impl std::str::FromStr for MetricType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "counter" => Ok(MetricType::Counter),
            "gauge" => Ok(MetricType::Gauge),
            "histogram" => Ok(MetricType::Histogram),
            "summary" => Ok(MetricType::Summary),
            _ => Err(format!("unknown metric type: {s}")),
        }
    }
}

/// Reduction applied over a set of sample values.
///
/// # Examples
///
/// ```
/// use vigil_common::types::Aggregation;
///
/// let agg: Aggregation = "avg".parse().unwrap();
/// assert_eq!(agg, Aggregation::Avg);
/// assert_eq!(agg.apply(&[100.0, 200.0, 300.0]), 200.0);
/// assert_eq!(Aggregation::Min.apply(&[]), 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    Sum,
    Avg,
    Min,
    Max,
    Count,
}

impl Aggregation {
    /// Reduce `values`. Every kind returns `0.0` for an empty slice, so
    /// callers that need to tell "no data" from "zero" must check `Count`.
    pub fn apply(&self, values: &[f64]) -> f64 {
        if values.is_empty() {
            return 0.0;
        }
        match self {
            Aggregation::Sum => values.iter().sum(),
            Aggregation::Avg => values.iter().sum::<f64>() / values.len() as f64,
            Aggregation::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
            Aggregation::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Aggregation::Count => values.len() as f64,
        }
    }
}

impl std::fmt::Display for Aggregation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Aggregation::Sum => write!(f, "sum"),
            Aggregation::Avg => write!(f, "avg"),
            Aggregation::Min => write!(f, "min"),
            Aggregation::Max => write!(f, "max"),
            Aggregation::Count => write!(f, "count"),
        }
    }
}

impl std::str::FromStr for Aggregation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sum" => Ok(Aggregation::Sum),
            "avg" | "average" => Ok(Aggregation::Avg),
            "min" => Ok(Aggregation::Min),
            "max" => Ok(Aggregation::Max),
            "count" => Ok(Aggregation::Count),
            _ => Err(format!("unknown aggregation: {s}")),
        }
    }
}

/// Inclusive `[start, end]` interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// The window of length `duration` ending at `now`. A start before the
    /// earliest representable instant is clamped to it.
    pub fn trailing(now: DateTime<Utc>, duration: Duration) -> Self {
        Self::try_trailing(now, duration).unwrap_or(Self {
            start: DateTime::<Utc>::MIN_UTC,
            end: now,
        })
    }

    /// Like [`trailing`](Self::trailing), but `None` when `now - duration`
    /// is not representable.
    pub fn try_trailing(now: DateTime<Utc>, duration: Duration) -> Option<Self> {
        now.checked_sub_signed(duration)
            .map(|start| Self { start, end: now })
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start && ts <= self.end
    }
}

/// Oldest timestamp kept by a `retention_days` window ending at `now`.
///
/// `None` when the window reaches past the earliest representable instant;
/// nothing can be old enough to drop then.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use vigil_common::types::retention_cutoff;
///
/// let now = Utc.with_ymd_and_hms(2024, 1, 8, 0, 0, 0).unwrap();
/// assert_eq!(retention_cutoff(now, 7), Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()));
/// assert_eq!(retention_cutoff(now, u32::MAX), None);
/// ```
pub fn retention_cutoff(now: DateTime<Utc>, retention_days: u32) -> Option<DateTime<Utc>> {
    now.checked_sub_signed(Duration::try_days(i64::from(retention_days))?)
}

/// Upper bound on the samples kept per metric name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleCap {
    Limited(usize),
    Unbounded,
}

impl SampleCap {
    pub fn limit(&self) -> Option<usize> {
        match self {
            SampleCap::Limited(n) => Some(*n),
            SampleCap::Unbounded => None,
        }
    }
}

/// One recorded metric sample.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
    pub metric_type: MetricType,
    pub value: f64,
    pub unit: Option<String>,
    pub labels: Labels,
    pub timestamp: DateTime<Utc>,
    pub metadata: Option<Value>,
}

/// Per-name metric declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricConfig {
    pub name: String,
    pub metric_type: MetricType,
    pub unit: Option<String>,
    /// Samples older than this many days are dropped on the next write.
    pub retention_days: Option<u32>,
    pub aggregation: Option<Aggregation>,
    /// Overrides the collector-wide sample cap for this name.
    pub max_samples: Option<SampleCap>,
}

impl MetricConfig {
    pub fn new(name: impl Into<String>, metric_type: MetricType) -> Self {
        Self {
            name: name.into(),
            metric_type,
            unit: None,
            retention_days: None,
            aggregation: None,
            max_samples: None,
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_retention_days(mut self, days: u32) -> Self {
        self.retention_days = Some(days);
        self
    }

    pub fn with_aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = Some(aggregation);
        self
    }

    pub fn with_max_samples(mut self, cap: SampleCap) -> Self {
        self.max_samples = Some(cap);
        self
    }
}

/// Alert severity level, ordered from lowest to highest.
///
/// # Examples
///
/// ```
/// use vigil_common::types::Severity;
///
/// let sev: Severity = "high".parse().unwrap();
/// assert_eq!(sev, Severity::High);
/// assert_eq!(sev.to_string(), "high");
/// assert!(Severity::Critical > Severity::Low);
/// ```
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            _ => Err(format!("unknown severity: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompareOp {
    Gt,
    Lt,
    Eq,
    Gte,
    Lte,
    Ne,
}

impl std::str::FromStr for CompareOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "greater_than" | "gt" => Ok(Self::Gt),
            "less_than" | "lt" => Ok(Self::Lt),
            "equal" | "eq" => Ok(Self::Eq),
            "greater_equal" | "gte" => Ok(Self::Gte),
            "less_equal" | "lte" => Ok(Self::Lte),
            "not_equal" | "ne" => Ok(Self::Ne),
            _ => Err(format!("unknown compare operator: {s}")),
        }
    }
}

impl std::fmt::Display for CompareOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gt => write!(f, "gt"),
            Self::Lt => write!(f, "lt"),
            Self::Eq => write!(f, "eq"),
            Self::Gte => write!(f, "gte"),
            Self::Lte => write!(f, "lte"),
            Self::Ne => write!(f, "ne"),
        }
    }
}

impl CompareOp {
    pub fn check(&self, value: f64, threshold: f64) -> bool {
        match self {
            Self::Gt => value > threshold,
            Self::Lt => value < threshold,
            Self::Eq => value == threshold,
            Self::Gte => value >= threshold,
            Self::Lte => value <= threshold,
            Self::Ne => value != threshold,
        }
    }

    /// Human-readable phrase, e.g. "above".
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Gt => "above",
            Self::Lt => "below",
            Self::Eq => "equal to",
            Self::Gte => "at or above",
            Self::Lte => "at or below",
            Self::Ne => "not equal to",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertCondition {
    pub metric: String,
    pub operator: CompareOp,
    pub threshold: f64,
    /// When set, the condition compares an aggregate over the trailing
    /// window of this many seconds instead of the latest sample.
    pub duration_secs: Option<u64>,
    /// Aggregation for the trailing window. Defaults to `avg`.
    pub aggregation: Option<Aggregation>,
}

impl AlertCondition {
    pub fn new(metric: impl Into<String>, operator: CompareOp, threshold: f64) -> Self {
        Self {
            metric: metric.into(),
            operator,
            threshold,
            duration_secs: None,
            aggregation: None,
        }
    }

    pub fn over(mut self, duration_secs: u64, aggregation: Aggregation) -> Self {
        self.duration_secs = Some(duration_secs);
        self.aggregation = Some(aggregation);
        self
    }
}

/// One side effect to run when an alert triggers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertActionConfig {
    /// Handler type, e.g. `"log"` or `"webhook"`.
    pub action_type: String,
    #[serde(default)]
    pub config: Value,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl AlertActionConfig {
    pub fn new(action_type: impl Into<String>, config: Value) -> Self {
        Self {
            action_type: action_type.into(),
            config,
            enabled: true,
        }
    }
}

fn default_enabled() -> bool {
    true
}

/// Administrative state, independent of whether the alert is firing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    #[default]
    Active,
    Paused,
    Disabled,
}

impl std::fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertStatus::Active => write!(f, "active"),
            AlertStatus::Paused => write!(f, "paused"),
            AlertStatus::Disabled => write!(f, "disabled"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub severity: Severity,
    pub condition: AlertCondition,
    pub actions: Vec<AlertActionConfig>,
    pub enabled: bool,
    pub status: AlertStatus,
    pub triggered_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Alert {
    /// Triggered and not resolved since.
    pub fn is_firing(&self) -> bool {
        match (self.triggered_at, self.resolved_at) {
            (Some(triggered), Some(resolved)) => resolved < triggered,
            (Some(_), None) => true,
            _ => false,
        }
    }
}

/// Format labels map into a human-readable string.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use vigil_common::types::format_labels;
///
/// let mut labels = HashMap::new();
/// labels.insert("severity".to_string(), "high".to_string());
/// labels.insert("name".to_string(), "latency".to_string());
/// assert_eq!(format_labels(&labels), "name=latency, severity=high");
/// ```
pub fn format_labels(labels: &Labels) -> String {
    if labels.is_empty() {
        return String::new();
    }
    let mut pairs: Vec<String> = labels.iter().map(|(k, v)| format!("{k}={v}")).collect();
    pairs.sort();
    pairs.join(", ")
}

/// Build a label map from string pairs.
pub fn labels<const N: usize>(pairs: [(&str, &str); N]) -> Labels {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
