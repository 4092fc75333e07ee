use crate::entry::{LogEntry, LogLevel};
use chrono::{DateTime, Utc};

/// Query for [`LogAggregator::get_logs`](crate::LogAggregator::get_logs).
///
/// All set criteria must match. `limit` keeps the newest N entries and is
/// applied after every other filter.
///
/// # Examples
///
/// ```
/// use vigil_logs::{LogFilter, LogLevel};
///
/// let filter = LogFilter::new()
///     .levels([LogLevel::Error, LogLevel::Fatal])
///     .search("timeout")
///     .limit(20);
/// assert_eq!(filter.limit, Some(20));
/// ```
#[derive(Debug, Clone, Default)]
pub struct LogFilter {
    pub levels: Option<Vec<LogLevel>>,
    /// Exact source or a glob pattern such as `"src/alerts/*"`.
    pub source: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    /// Case-insensitive substring over the message and serialised context.
    pub search: Option<String>,
    pub limit: Option<usize>,
}

impl LogFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(mut self, level: LogLevel) -> Self {
        self.levels = Some(vec![level]);
        self
    }

    pub fn levels(mut self, levels: impl IntoIterator<Item = LogLevel>) -> Self {
        self.levels = Some(levels.into_iter().collect());
        self
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn between(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.start_time = Some(start);
        self.end_time = Some(end);
        self
    }

    pub fn search(mut self, needle: impl Into<String>) -> Self {
        self.search = Some(needle.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub(crate) fn apply<'a>(&self, logs: impl Iterator<Item = &'a LogEntry>) -> Vec<LogEntry> {
        let needle = self.search.as_ref().map(|s| s.to_lowercase());
        let mut matched: Vec<LogEntry> = logs
            .filter(|entry| self.matches(entry, needle.as_deref()))
            .cloned()
            .collect();

        if let Some(limit) = self.limit {
            let skip = matched.len().saturating_sub(limit);
            matched.drain(..skip);
        }
        matched
    }

    fn matches(&self, entry: &LogEntry, needle: Option<&str>) -> bool {
        if let Some(levels) = &self.levels {
            if !levels.contains(&entry.level) {
                return false;
            }
        }
        if let Some(pattern) = &self.source {
            if !source_matches(pattern, &entry.source) {
                return false;
            }
        }
        if self.start_time.is_some_and(|start| entry.timestamp < start) {
            return false;
        }
        if self.end_time.is_some_and(|end| entry.timestamp > end) {
            return false;
        }
        if let Some(needle) = needle {
            if entry.message.to_lowercase().contains(needle) {
                return true;
            }
            let context = serde_json::to_string(&entry.context).unwrap_or_default();
            return context.to_lowercase().contains(needle);
        }
        true
    }
}

fn source_matches(pattern: &str, source: &str) -> bool {
    if pattern == source {
        return true;
    }
    glob_match::glob_match(pattern, source)
}
