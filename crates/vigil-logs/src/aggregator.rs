use crate::context::{CallerLocation, ContextProvider, UNKNOWN_SOURCE};
use crate::entry::{Context, LogEntry, LogError, LogLevel};
use crate::filter::LogFilter;
use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};
use std::panic::Location;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use vigil_common::clock::{Clock, SystemClock};
use vigil_common::types::retention_cutoff;

pub const DEFAULT_MAX_LOGS: usize = 10_000;
pub const DEFAULT_RETENTION_DAYS: u32 = 7;

#[derive(Debug, Clone, Copy)]
pub struct LogOptions {
    pub max_logs: usize,
    pub retention_days: u32,
    /// Mirror every entry to `tracing` (development mode).
    pub console_mirror: bool,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            max_logs: DEFAULT_MAX_LOGS,
            retention_days: DEFAULT_RETENTION_DAYS,
            console_mirror: cfg!(debug_assertions),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LogExport {
    pub logs: Vec<LogEntry>,
    pub count: usize,
    pub by_level: BTreeMap<LogLevel, usize>,
}

/// Bounded, queryable application log.
///
/// Every write appends and then prunes: first entries older than
/// `retention_days`, then the oldest entries beyond `max_logs`.
pub struct LogAggregator {
    logs: Mutex<VecDeque<LogEntry>>,
    options: LogOptions,
    clock: Arc<dyn Clock>,
    context: Arc<dyn ContextProvider>,
}

impl Default for LogAggregator {
    fn default() -> Self {
        Self::new(LogOptions::default())
    }
}

impl LogAggregator {
    pub fn new(options: LogOptions) -> Self {
        Self::with_parts(options, Arc::new(SystemClock), Arc::new(CallerLocation))
    }

    pub fn with_parts(
        options: LogOptions,
        clock: Arc<dyn Clock>,
        context: Arc<dyn ContextProvider>,
    ) -> Self {
        Self {
            logs: Mutex::new(VecDeque::new()),
            options,
            clock,
            context,
        }
    }

    pub fn options(&self) -> &LogOptions {
        &self.options
    }

    fn logs(&self) -> MutexGuard<'_, VecDeque<LogEntry>> {
        self.logs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[track_caller]
    pub fn log(&self, level: LogLevel, message: impl Into<String>, context: Option<Context>) -> LogEntry {
        self.append(level, message.into(), context, None, Location::caller())
    }

    #[track_caller]
    pub fn debug(&self, message: impl Into<String>, context: Option<Context>) -> LogEntry {
        self.append(LogLevel::Debug, message.into(), context, None, Location::caller())
    }

    #[track_caller]
    pub fn info(&self, message: impl Into<String>, context: Option<Context>) -> LogEntry {
        self.append(LogLevel::Info, message.into(), context, None, Location::caller())
    }

    #[track_caller]
    pub fn warn(&self, message: impl Into<String>, context: Option<Context>) -> LogEntry {
        self.append(LogLevel::Warn, message.into(), context, None, Location::caller())
    }

    #[track_caller]
    pub fn error(
        &self,
        message: impl Into<String>,
        error: Option<&(dyn std::error::Error + 'static)>,
        context: Option<Context>,
    ) -> LogEntry {
        let error = error.map(LogError::from_error);
        self.append(LogLevel::Error, message.into(), context, error, Location::caller())
    }

    #[track_caller]
    pub fn fatal(
        &self,
        message: impl Into<String>,
        error: Option<&(dyn std::error::Error + 'static)>,
        context: Option<Context>,
    ) -> LogEntry {
        let error = error.map(LogError::from_error);
        self.append(LogLevel::Fatal, message.into(), context, error, Location::caller())
    }

    fn append(
        &self,
        level: LogLevel,
        message: String,
        context: Option<Context>,
        error: Option<LogError>,
        caller: &'static Location<'static>,
    ) -> LogEntry {
        let now = self.clock.now();
        let entry = LogEntry {
            id: vigil_common::id::next_id(),
            level,
            message,
            timestamp: now,
            source: self
                .context
                .source(caller)
                .unwrap_or_else(|| UNKNOWN_SOURCE.to_string()),
            context: context.unwrap_or_default(),
            error,
            trace_id: self
                .context
                .trace_id()
                .unwrap_or_else(vigil_common::id::trace_id),
        };

        {
            let mut logs = self.logs();
            logs.push_back(entry.clone());

            if let Some(cutoff) = retention_cutoff(now, self.options.retention_days) {
                while logs.front().is_some_and(|front| front.timestamp < cutoff) {
                    logs.pop_front();
                }
            }
            let excess = logs.len().saturating_sub(self.options.max_logs);
            logs.drain(..excess);
        }

        if self.options.console_mirror {
            crate::console::mirror(&entry);
        }
        entry
    }

    pub fn get_logs(&self, filter: &LogFilter) -> Vec<LogEntry> {
        filter.apply(self.logs().iter())
    }

    /// Entries at `error` or `fatal`, newest `limit` when given.
    pub fn get_errors(&self, limit: Option<usize>) -> Vec<LogEntry> {
        let mut filter = LogFilter::new().levels([LogLevel::Error, LogLevel::Fatal]);
        filter.limit = limit;
        self.get_logs(&filter)
    }

    /// Tally per level; every level is present, zero when unused.
    pub fn count_by_level(&self) -> BTreeMap<LogLevel, usize> {
        let mut counts: BTreeMap<LogLevel, usize> =
            LogLevel::ALL.iter().map(|level| (*level, 0)).collect();
        for entry in self.logs().iter() {
            *counts.entry(entry.level).or_default() += 1;
        }
        counts
    }

    pub fn len(&self) -> usize {
        self.logs().len()
    }

    pub fn is_empty(&self) -> bool {
        self.logs().is_empty()
    }

    pub fn clear(&self) {
        self.logs().clear();
    }

    pub fn export(&self) -> LogExport {
        let logs: Vec<LogEntry> = self.logs().iter().cloned().collect();
        LogExport {
            count: logs.len(),
            by_level: self.count_by_level(),
            logs,
        }
    }
}
