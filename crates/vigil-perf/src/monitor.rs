use crate::types::{elapsed_ms, Category, Metadata, PerformanceMetric, Span, Trace, TraceStatus};
use crate::vitals::{self, EntryObserver, VitalEntry};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use vigil_common::clock::{Clock, SystemClock};
use vigil_common::types::labels;
use vigil_metrics::MetricsCollector;

pub const DEFAULT_MAX_MEASUREMENTS: usize = 10_000;
pub const DEFAULT_MAX_TRACES: usize = 1_000;

#[derive(Debug, Clone, Copy)]
pub struct PerfOptions {
    /// Oldest measurements are dropped beyond this many.
    pub max_measurements: usize,
    /// Oldest traces are dropped beyond this many.
    pub max_traces: usize,
}

impl Default for PerfOptions {
    fn default() -> Self {
        Self {
            max_measurements: DEFAULT_MAX_MEASUREMENTS,
            max_traces: DEFAULT_MAX_TRACES,
        }
    }
}

#[derive(Default)]
struct PerfState {
    measurements: VecDeque<PerformanceMetric>,
    traces: VecDeque<Trace>,
    active_spans: HashMap<String, Span>,
}

/// Duration measurement and hierarchical tracing.
///
/// Completed measurements are forwarded to the [`MetricsCollector`] as
/// histogram samples named `performance.<category>.<name>`.
pub struct PerformanceMonitor {
    state: Mutex<PerfState>,
    metrics: Arc<MetricsCollector>,
    clock: Arc<dyn Clock>,
    options: PerfOptions,
}

impl PerformanceMonitor {
    pub fn new(metrics: Arc<MetricsCollector>, options: PerfOptions) -> Self {
        Self::with_clock(metrics, options, Arc::new(SystemClock))
    }

    pub fn with_clock(
        metrics: Arc<MetricsCollector>,
        options: PerfOptions,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            state: Mutex::new(PerfState::default()),
            metrics,
            clock,
            options,
        }
    }

    pub fn metrics(&self) -> &Arc<MetricsCollector> {
        &self.metrics
    }

    fn state(&self) -> MutexGuard<'_, PerfState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Open a measurement and return its id.
    pub fn start(&self, name: &str, category: Category) -> String {
        let now = self.clock.now();
        let id = vigil_common::id::next_id();
        let mut state = self.state();
        state.measurements.push_back(PerformanceMetric {
            id: id.clone(),
            name: name.to_string(),
            category,
            start_time: now,
            end_time: now,
            duration: 0.0,
            metadata: Metadata::new(),
            completed: false,
        });
        let excess = state
            .measurements
            .len()
            .saturating_sub(self.options.max_measurements);
        state.measurements.drain(..excess);
        id
    }

    /// Close a measurement. Returns `None` if the id is unknown or was
    /// already ended.
    pub fn end(&self, id: &str, metadata: Option<Metadata>) -> Option<PerformanceMetric> {
        let now = self.clock.now();
        let finished = {
            let mut state = self.state();
            let metric = state
                .measurements
                .iter_mut()
                .rev()
                .find(|m| m.id == id && !m.completed)?;
            metric.end_time = now;
            metric.duration = elapsed_ms(metric.start_time, now);
            metric.completed = true;
            if let Some(metadata) = metadata {
                metric.metadata.extend(metadata);
            }
            metric.clone()
        };

        let category = finished.category.to_string();
        self.metrics.histogram(
            &format!("performance.{category}.{}", finished.name),
            finished.duration,
            labels([("category", category.as_str())]),
        );
        Some(finished)
    }

    /// Measure an async operation. On `Err` the measurement is closed with
    /// `metadata.error` set and the error is returned unchanged. If the
    /// future is dropped before completing, the measurement is closed with
    /// `metadata.error = "cancelled"`.
    pub async fn measure<T, E, Fut>(
        &self,
        name: &str,
        category: Category,
        operation: Fut,
    ) -> Result<T, E>
    where
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let guard = MeasureGuard::new(self, self.start(name, category));
        match operation.await {
            Ok(value) => {
                guard.finish(None);
                Ok(value)
            }
            Err(err) => {
                guard.finish(Some(error_metadata(&err)));
                Err(err)
            }
        }
    }

    /// Synchronous counterpart of [`measure`](Self::measure). A panic inside
    /// `operation` still closes the measurement.
    pub fn measure_sync<T, E>(
        &self,
        name: &str,
        category: Category,
        operation: impl FnOnce() -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: std::fmt::Display,
    {
        let guard = MeasureGuard::new(self, self.start(name, category));
        match operation() {
            Ok(value) => {
                guard.finish(None);
                Ok(value)
            }
            Err(err) => {
                guard.finish(Some(error_metadata(&err)));
                Err(err)
            }
        }
    }

    pub fn start_trace(&self, name: &str, metadata: Option<Metadata>) -> String {
        let id = vigil_common::id::trace_id();
        let trace = Trace {
            id: id.clone(),
            name: name.to_string(),
            start_time: self.clock.now(),
            end_time: None,
            duration: None,
            status: TraceStatus::Pending,
            spans: Vec::new(),
            metadata: metadata.unwrap_or_default(),
        };
        let mut state = self.state();
        state.traces.push_back(trace);
        while state.traces.len() > self.options.max_traces {
            if let Some(evicted) = state.traces.pop_front() {
                tracing::debug!(trace_id = %evicted.id, "Evicted oldest trace");
            }
        }
        id
    }

    /// Finish a pending trace with a terminal `status`. Returns `None` for
    /// unknown or already-ended traces, and for `TraceStatus::Pending`.
    pub fn end_trace(&self, trace_id: &str, status: TraceStatus) -> Option<Trace> {
        if status == TraceStatus::Pending {
            tracing::debug!(trace_id, "Trace cannot end as pending");
            return None;
        }
        let now = self.clock.now();
        let mut state = self.state();
        let trace = state
            .traces
            .iter_mut()
            .find(|t| t.id == trace_id && t.status == TraceStatus::Pending)?;
        trace.end_time = Some(now);
        trace.duration = Some(elapsed_ms(trace.start_time, now));
        trace.status = status;
        Some(trace.clone())
    }

    /// Open a span under `trace_id`. An unknown trace id still yields an
    /// active (orphaned) span.
    pub fn start_span(&self, trace_id: &str, name: &str, parent_id: Option<&str>) -> String {
        let span = Span {
            id: vigil_common::id::next_id(),
            trace_id: trace_id.to_string(),
            parent_id: parent_id.map(str::to_string),
            name: name.to_string(),
            start_time: self.clock.now(),
            end_time: None,
            duration: None,
            tags: Metadata::new(),
        };
        let id = span.id.clone();
        let mut state = self.state();
        match state.traces.iter_mut().find(|t| t.id == trace_id) {
            Some(trace) => trace.spans.push(span.clone()),
            None => tracing::debug!(trace_id, span_id = %id, "Span started for unknown trace"),
        }
        state.active_spans.insert(id.clone(), span);
        id
    }

    pub fn end_span(&self, span_id: &str, tags: Option<Metadata>) -> Option<Span> {
        let now = self.clock.now();
        let mut state = self.state();
        let mut span = state.active_spans.remove(span_id)?;
        span.end_time = Some(now);
        span.duration = Some(elapsed_ms(span.start_time, now));
        if let Some(tags) = tags {
            span.tags.extend(tags);
        }

        if let Some(stored) = state
            .traces
            .iter_mut()
            .find(|t| t.id == span.trace_id)
            .and_then(|t| t.spans.iter_mut().find(|s| s.id == span.id))
        {
            *stored = span.clone();
        }
        Some(span)
    }

    pub fn active_span_count(&self) -> usize {
        self.state().active_spans.len()
    }

    pub fn get_metrics(&self, category: Option<Category>) -> Vec<PerformanceMetric> {
        self.state()
            .measurements
            .iter()
            .filter(|m| category.map_or(true, |c| m.category == c))
            .cloned()
            .collect()
    }

    pub fn get_traces(&self) -> Vec<Trace> {
        self.state().traces.iter().cloned().collect()
    }

    pub fn get_trace(&self, trace_id: &str) -> Option<Trace> {
        self.state().traces.iter().find(|t| t.id == trace_id).cloned()
    }

    /// Mean duration of completed measurements named `name`; `0.0` if none.
    pub fn get_average_duration(&self, name: &str, category: Option<Category>) -> f64 {
        let state = self.state();
        let durations: Vec<f64> = state
            .measurements
            .iter()
            .filter(|m| m.completed && m.name == name)
            .filter(|m| category.map_or(true, |c| m.category == c))
            .map(|m| m.duration)
            .collect();
        if durations.is_empty() {
            return 0.0;
        }
        durations.iter().sum::<f64>() / durations.len() as f64
    }

    /// The `limit` longest completed measurements, longest first.
    pub fn get_slowest(&self, limit: usize, category: Option<Category>) -> Vec<PerformanceMetric> {
        let mut completed: Vec<PerformanceMetric> = self
            .state()
            .measurements
            .iter()
            .filter(|m| m.completed)
            .filter(|m| category.map_or(true, |c| m.category == c))
            .cloned()
            .collect();
        completed.sort_by(|a, b| b.duration.total_cmp(&a.duration));
        completed.truncate(limit);
        completed
    }

    /// Subscribe to web-vitals entries when the host provides an observer.
    pub fn init_web_vitals(&self, observer: Option<&dyn EntryObserver>) -> usize {
        vitals::init_web_vitals(&self.metrics, observer)
    }

    pub fn record_vital(&self, entry: VitalEntry) {
        vitals::record_vital(&self.metrics, entry);
    }

    pub fn clear(&self) {
        let mut state = self.state();
        state.measurements.clear();
        state.traces.clear();
        state.active_spans.clear();
    }
}

fn error_metadata(err: &impl std::fmt::Display) -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert("error".to_string(), Value::String(err.to_string()));
    metadata
}

/// Pairs a `start` with exactly one `end`, including on unwind or drop.
struct MeasureGuard<'a> {
    monitor: &'a PerformanceMonitor,
    id: Option<String>,
}

impl<'a> MeasureGuard<'a> {
    fn new(monitor: &'a PerformanceMonitor, id: String) -> Self {
        Self {
            monitor,
            id: Some(id),
        }
    }

    fn finish(mut self, metadata: Option<Metadata>) {
        if let Some(id) = self.id.take() {
            self.monitor.end(&id, metadata);
        }
    }
}

impl Drop for MeasureGuard<'_> {
    fn drop(&mut self) {
        if let Some(id) = self.id.take() {
            let mut metadata = Metadata::new();
            metadata.insert("error".to_string(), Value::String("cancelled".to_string()));
            self.monitor.end(&id, Some(metadata));
        }
    }
}
