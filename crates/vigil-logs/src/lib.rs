//! Structured application log with bounded memory.
//!
//! [`LogAggregator`] stores [`LogEntry`] records in one append-ordered list
//! pruned by age and count after every write, and answers filtered queries
//! through [`LogFilter`]. Call-site attribution goes through a pluggable
//! [`ContextProvider`]; logging never fails.

pub mod aggregator;
pub mod context;
pub mod entry;
pub mod filter;

mod console;

#[cfg(test)]
mod tests;

pub use aggregator::{LogAggregator, LogExport, LogOptions, DEFAULT_MAX_LOGS, DEFAULT_RETENTION_DAYS};
pub use context::{CallerLocation, ContextProvider, NoContext, StaticContext, UNKNOWN_SOURCE};
pub use entry::{Context, LogEntry, LogError, LogLevel};
pub use filter::LogFilter;

/// Build a [`Context`] from a `serde_json::json!` object literal.
///
/// Non-object values produce an empty context.
///
/// # Examples
///
/// ```
/// use vigil_logs::context_from;
///
/// let ctx = context_from(serde_json::json!({"job_id": 42}));
/// assert_eq!(ctx["job_id"], 42);
/// ```
pub fn context_from(value: serde_json::Value) -> Context {
    match value {
        serde_json::Value::Object(map) => map,
        _ => Context::new(),
    }
}
