//! In-process metric storage.
//!
//! [`MetricsCollector`] keeps an append-ordered [`bucket::MetricBucket`] per
//! metric name and answers point ("latest") and ranged aggregate queries.
//! Retention is applied per name at write time: an age window from the
//! name's [`MetricConfig`](vigil_common::types::MetricConfig) followed by a
//! sample cap.

pub mod bucket;
pub mod collector;
pub mod export;


pub use collector::{CollectorOptions, MetricsCollector, DEFAULT_MAX_SAMPLES};
pub use export::{ExportedSample, MetricsExport};
