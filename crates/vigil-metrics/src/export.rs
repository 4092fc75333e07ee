use serde::Serialize;
use std::collections::BTreeMap;
use vigil_common::types::{Labels, Metric};

/// Export snapshot: samples per metric name, names in sorted order.
pub type MetricsExport = BTreeMap<String, Vec<ExportedSample>>;

#[derive(Debug, Clone, Serialize)]
pub struct ExportedSample {
    pub value: f64,
    pub labels: Labels,
    /// RFC 3339 timestamp.
    pub timestamp: String,
}

impl From<&Metric> for ExportedSample {
    fn from(metric: &Metric) -> Self {
        Self {
            value: metric.value,
            labels: metric.labels.clone(),
            timestamp: metric.timestamp.to_rfc3339(),
        }
    }
}
