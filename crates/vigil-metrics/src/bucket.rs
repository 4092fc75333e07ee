use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use vigil_common::types::{retention_cutoff, Metric};

/// Append-ordered samples for one metric name.
///
/// Samples arrive in chronological order, so both age and count eviction
/// only ever pop from the front.
#[derive(Debug, Default)]
pub struct MetricBucket {
    data: VecDeque<Metric>,
}

impl MetricBucket {
    pub fn new() -> Self {
        Self {
            data: VecDeque::new(),
        }
    }

    pub fn push(&mut self, sample: Metric) {
        self.data.push_back(sample);
    }

    /// Drop samples older than `retention_days` relative to `now`.
    pub fn evict_older_than(&mut self, now: DateTime<Utc>, retention_days: u32) -> usize {
        let Some(cutoff) = retention_cutoff(now, retention_days) else {
            return 0;
        };
        let before = self.data.len();
        while let Some(front) = self.data.front() {
            if front.timestamp < cutoff {
                self.data.pop_front();
            } else {
                break;
            }
        }
        before - self.data.len()
    }

    /// Keep at most `max` of the newest samples.
    pub fn truncate_front(&mut self, max: usize) -> usize {
        let excess = self.data.len().saturating_sub(max);
        self.data.drain(..excess);
        excess
    }

    pub fn latest(&self) -> Option<&Metric> {
        self.data.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Metric> {
        self.data.iter()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
