use crate::bucket::MetricBucket;
use crate::export::{ExportedSample, MetricsExport};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use vigil_common::clock::{Clock, SystemClock};
use vigil_common::types::{
    Aggregation, Labels, Metric, MetricConfig, MetricType, SampleCap, TimeRange,
};

/// Default number of samples kept per metric name when neither the
/// collector nor the name's config says otherwise.
pub const DEFAULT_MAX_SAMPLES: usize = 10_000;

#[derive(Debug, Clone, Copy)]
pub struct CollectorOptions {
    /// Cap applied to names whose config does not set `max_samples`.
    pub default_max_samples: SampleCap,
}

impl Default for CollectorOptions {
    fn default() -> Self {
        Self {
            default_max_samples: SampleCap::Limited(DEFAULT_MAX_SAMPLES),
        }
    }
}

#[derive(Default)]
struct CollectorState {
    buckets: HashMap<String, MetricBucket>,
    configs: HashMap<String, MetricConfig>,
}

/// Process-local store of numeric telemetry keyed by metric name.
///
/// Buckets are created lazily on first write. Retention runs at write time
/// and only for the name being written.
pub struct MetricsCollector {
    state: Mutex<CollectorState>,
    clock: Arc<dyn Clock>,
    options: CollectorOptions,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new(CollectorOptions::default())
    }
}

impl MetricsCollector {
    pub fn new(options: CollectorOptions) -> Self {
        Self::with_clock(options, Arc::new(SystemClock))
    }

    pub fn with_clock(options: CollectorOptions, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(CollectorState::default()),
            clock,
            options,
        }
    }

    fn state(&self) -> MutexGuard<'_, CollectorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store or replace the config for `config.name`.
    pub fn register_metric(&self, config: MetricConfig) {
        self.state().configs.insert(config.name.clone(), config);
    }

    pub fn get_config(&self, name: &str) -> Option<MetricConfig> {
        self.state().configs.get(name).cloned()
    }

    /// Append a sample using the registered type for `name` (gauge if
    /// unregistered).
    pub fn record(&self, name: &str, value: f64, labels: Labels, metadata: Option<Value>) -> Metric {
        let mut state = self.state();
        self.write(&mut state, name, value, labels, metadata, MetricType::Gauge)
    }

    /// Record `latest + delta` as a materialised running total.
    ///
    /// The stored value is the current total, not the delta, so averaging a
    /// counter's samples is meaningless.
    pub fn increment(&self, name: &str, delta: f64, labels: Labels) -> Metric {
        let mut state = self.state();
        let current = state
            .buckets
            .get(name)
            .and_then(MetricBucket::latest)
            .map_or(0.0, |m| m.value);
        self.write(
            &mut state,
            name,
            current + delta,
            labels,
            None,
            MetricType::Counter,
        )
    }

    pub fn gauge(&self, name: &str, value: f64, labels: Labels) -> Metric {
        let mut state = self.state();
        self.write(&mut state, name, value, labels, None, MetricType::Gauge)
    }

    /// Record a raw histogram observation. No bucketing happens here; the
    /// raw values are aggregated at query time.
    pub fn histogram(&self, name: &str, value: f64, labels: Labels) -> Metric {
        let mut state = self.state();
        self.write(&mut state, name, value, labels, None, MetricType::Histogram)
    }

    fn write(
        &self,
        state: &mut CollectorState,
        name: &str,
        value: f64,
        labels: Labels,
        metadata: Option<Value>,
        fallback_type: MetricType,
    ) -> Metric {
        let now = self.clock.now();
        let config = state.configs.get(name);
        let metric = Metric {
            name: name.to_string(),
            metric_type: config.map_or(fallback_type, |c| c.metric_type),
            value,
            unit: config.and_then(|c| c.unit.clone()),
            labels,
            timestamp: now,
            metadata,
        };
        let retention_days = config.and_then(|c| c.retention_days);
        let cap = config
            .and_then(|c| c.max_samples)
            .unwrap_or(self.options.default_max_samples);

        let bucket = state.buckets.entry(name.to_string()).or_default();
        bucket.push(metric.clone());

        let mut evicted = 0;
        if let Some(days) = retention_days {
            evicted += bucket.evict_older_than(now, days);
        }
        if let Some(max) = cap.limit() {
            evicted += bucket.truncate_front(max);
        }
        if evicted > 0 {
            tracing::trace!(metric = name, evicted, "Applied metric retention");
        }

        metric
    }

    /// Full history for `name`, optionally bounded by an inclusive range.
    pub fn get_metrics(&self, name: &str, range: Option<TimeRange>) -> Vec<Metric> {
        let state = self.state();
        let Some(bucket) = state.buckets.get(name) else {
            return Vec::new();
        };
        bucket
            .iter()
            .filter(|m| range.map_or(true, |r| r.contains(m.timestamp)))
            .cloned()
            .collect()
    }

    /// The last sample written for `name`.
    pub fn get_latest(&self, name: &str) -> Option<Metric> {
        self.state()
            .buckets
            .get(name)
            .and_then(MetricBucket::latest)
            .cloned()
    }

    fn values(&self, name: &str, range: Option<TimeRange>) -> Vec<f64> {
        let state = self.state();
        let Some(bucket) = state.buckets.get(name) else {
            return Vec::new();
        };
        bucket
            .iter()
            .filter(|m| range.map_or(true, |r| r.contains(m.timestamp)))
            .map(|m| m.value)
            .collect()
    }

    /// Aggregate over the (possibly time-bounded) samples. Returns `0.0` for
    /// an empty set, including `min` and `max`.
    pub fn aggregate(&self, name: &str, aggregation: Aggregation, range: Option<TimeRange>) -> f64 {
        aggregation.apply(&self.values(name, range))
    }

    /// Aggregate with the name's configured default aggregation (`avg` when
    /// none is registered).
    pub fn aggregate_default(&self, name: &str, range: Option<TimeRange>) -> f64 {
        let aggregation = self
            .get_config(name)
            .and_then(|c| c.aggregation)
            .unwrap_or(Aggregation::Avg);
        self.aggregate(name, aggregation, range)
    }

    /// Nearest-rank percentile (`p` in `0..=100`) over the raw samples.
    pub fn percentile(&self, name: &str, p: f64, range: Option<TimeRange>) -> Option<f64> {
        let mut values = self.values(name, range);
        if values.is_empty() {
            return None;
        }
        values.sort_by(f64::total_cmp);
        let rank = ((p.clamp(0.0, 100.0) / 100.0) * values.len() as f64).ceil() as usize;
        values.get(rank.max(1) - 1).copied()
    }

    pub fn metric_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state().buckets.keys().cloned().collect();
        names.sort();
        names
    }

    /// Drop one bucket, or every bucket when `name` is `None`. Configs are
    /// kept.
    pub fn clear(&self, name: Option<&str>) {
        let mut state = self.state();
        match name {
            Some(name) => {
                state.buckets.remove(name);
            }
            None => state.buckets.clear(),
        }
    }

    pub fn clear_all(&self) {
        self.clear(None);
    }

    /// Drop all samples and configs.
    pub fn reset(&self) {
        let mut state = self.state();
        state.buckets.clear();
        state.configs.clear();
    }

    /// Plain snapshot for shipping by an external transport.
    pub fn export(&self) -> MetricsExport {
        let state = self.state();
        state
            .buckets
            .iter()
            .map(|(name, bucket)| {
                let samples = bucket.iter().map(ExportedSample::from).collect();
                (name.clone(), samples)
            })
            .collect()
    }
}
