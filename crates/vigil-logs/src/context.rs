use std::panic::Location;

/// Fallback `source` when no call site can be attributed.
pub const UNKNOWN_SOURCE: &str = "unknown";

/// Supplies the call-site label and correlation id stamped on each entry.
///
/// Both lookups are best-effort: returning `None` makes the aggregator fall
/// back to [`UNKNOWN_SOURCE`] and a freshly generated trace id.
pub trait ContextProvider: Send + Sync {
    fn source(&self, caller: &'static Location<'static>) -> Option<String>;

    fn trace_id(&self) -> Option<String> {
        None
    }
}

/// Labels entries with the `file:line` of the logging call.
#[derive(Debug, Default, Clone, Copy)]
pub struct CallerLocation;

impl ContextProvider for CallerLocation {
    fn source(&self, caller: &'static Location<'static>) -> Option<String> {
        Some(format!("{}:{}", caller.file(), caller.line()))
    }
}

/// Attributes nothing; every entry gets `"unknown"` and a generated id.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoContext;

impl ContextProvider for NoContext {
    fn source(&self, _caller: &'static Location<'static>) -> Option<String> {
        None
    }
}

/// Fixed source and trace id, for request-scoped aggregators.
#[derive(Debug, Clone)]
pub struct StaticContext {
    pub source: String,
    pub trace_id: String,
}

impl ContextProvider for StaticContext {
    fn source(&self, _caller: &'static Location<'static>) -> Option<String> {
        Some(self.source.clone())
    }

    fn trace_id(&self) -> Option<String> {
        Some(self.trace_id.clone())
    }
}
