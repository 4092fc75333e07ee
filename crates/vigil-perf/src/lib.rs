//! Duration measurement, tracing and web-vitals ingestion.
//!
//! [`PerformanceMonitor`] opens and closes named measurements, keeps
//! trace/span trees, and forwards every completed duration to the
//! [`MetricsCollector`](vigil_metrics::MetricsCollector) as a histogram
//! sample. The [`vitals`] module maps host-reported UX timing entries onto
//! `web_vitals.*` metrics.

pub mod monitor;
pub mod types;
pub mod vitals;


pub use monitor::{PerfOptions, PerformanceMonitor, DEFAULT_MAX_MEASUREMENTS, DEFAULT_MAX_TRACES};
pub use types::{Category, Metadata, PerformanceMetric, Span, Trace, TraceStatus};
pub use vitals::{EntryCallback, EntryObserver, VitalEntry};
