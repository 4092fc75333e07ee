use anyhow::Result;
use std::sync::Arc;
use vigil_common::types::Labels;
use vigil_metrics::MetricsCollector;

pub const LCP_METRIC: &str = "web_vitals.lcp";
pub const FID_METRIC: &str = "web_vitals.fid";
pub const CLS_METRIC: &str = "web_vitals.cls";

/// Entry types subscribed to by [`init_web_vitals`].
pub const OBSERVED_ENTRY_TYPES: [&str; 3] = ["largest-contentful-paint", "first-input", "layout-shift"];

/// A user-experience timing entry reported by the host's performance
/// observer. Times are milliseconds relative to the host's time origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VitalEntry {
    LargestContentfulPaint { start_time: f64 },
    FirstInput { start_time: f64, processing_start: f64 },
    LayoutShift { value: f64, had_recent_input: bool },
}

pub type EntryCallback = Box<dyn Fn(VitalEntry) + Send + Sync>;

/// Host facility that delivers performance entries of a given type.
pub trait EntryObserver: Send + Sync {
    /// Subscribe `callback` to `entry_type`. Hosts that do not support the
    /// entry type return an error.
    fn observe(&self, entry_type: &str, callback: EntryCallback) -> Result<()>;
}

/// Map one entry onto the web-vitals metrics.
///
/// Layout shifts caused by recent user input are excluded from the
/// cumulative score.
pub fn record_vital(metrics: &MetricsCollector, entry: VitalEntry) {
    match entry {
        VitalEntry::LargestContentfulPaint { start_time } => {
            metrics.gauge(LCP_METRIC, start_time, Labels::new());
        }
        VitalEntry::FirstInput {
            start_time,
            processing_start,
        } => {
            metrics.gauge(FID_METRIC, processing_start - start_time, Labels::new());
        }
        VitalEntry::LayoutShift {
            value,
            had_recent_input,
        } => {
            if !had_recent_input {
                metrics.increment(CLS_METRIC, value, Labels::new());
            }
        }
    }
}

/// Subscribe to every web-vitals entry type the host supports and return
/// how many subscriptions succeeded. Without an observer nothing happens.
/// Unsupported entry types are skipped silently.
pub fn init_web_vitals(metrics: &Arc<MetricsCollector>, observer: Option<&dyn EntryObserver>) -> usize {
    let Some(observer) = observer else {
        return 0;
    };

    let mut subscribed = 0;
    for entry_type in OBSERVED_ENTRY_TYPES {
        let sink = Arc::clone(metrics);
        let callback: EntryCallback = Box::new(move |entry| record_vital(&sink, entry));
        match observer.observe(entry_type, callback) {
            Ok(()) => subscribed += 1,
            Err(e) => {
                tracing::debug!(entry_type, error = %e, "Performance entry type not supported");
            }
        }
    }
    subscribed
}
