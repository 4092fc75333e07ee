use crate::entry::{LogEntry, LogLevel};

/// Re-emit an entry as a `tracing` event at the matching level, so a
/// development subscriber prints it with level-appropriate styling.
pub(crate) fn mirror(entry: &LogEntry) {
    let context = if entry.context.is_empty() {
        String::new()
    } else {
        serde_json::to_string(&entry.context).unwrap_or_default()
    };
    let error = entry.error.as_ref().map(|e| e.message.as_str()).unwrap_or("");

    match entry.level {
        LogLevel::Debug => tracing::debug!(
            target: "vigil::console",
            source = %entry.source,
            trace_id = %entry.trace_id,
            context = %context,
            "{}",
            entry.message
        ),
        LogLevel::Info => tracing::info!(
            target: "vigil::console",
            source = %entry.source,
            trace_id = %entry.trace_id,
            context = %context,
            "{}",
            entry.message
        ),
        LogLevel::Warn => tracing::warn!(
            target: "vigil::console",
            source = %entry.source,
            trace_id = %entry.trace_id,
            context = %context,
            "{}",
            entry.message
        ),
        LogLevel::Error => tracing::error!(
            target: "vigil::console",
            source = %entry.source,
            trace_id = %entry.trace_id,
            context = %context,
            error = %error,
            "{}",
            entry.message
        ),
        LogLevel::Fatal => tracing::error!(
            target: "vigil::console",
            fatal = true,
            source = %entry.source,
            trace_id = %entry.trace_id,
            context = %context,
            error = %error,
            "{}",
            entry.message
        ),
    }
}
