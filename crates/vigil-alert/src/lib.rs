//! Declarative threshold alerts over collected metrics.
//!
//! [`AlertManager`] holds alert definitions, evaluates each enabled alert's
//! [`AlertCondition`](vigil_common::types::AlertCondition) against the
//! [`MetricsCollector`](vigil_metrics::MetricsCollector), and on each
//! trigger/resolve transition writes an audit entry, updates the
//! `alerts.triggered` / `alerts.resolved` counters and (on trigger) runs the
//! alert's actions through the [`ActionRegistry`](vigil_notify::registry::ActionRegistry).

pub mod condition;
pub mod error;
pub mod manager;
mod monitor;


pub use condition::evaluate_condition;
pub use error::AlertError;
pub use manager::{
    AlertFilter, AlertManager, AlertManagerOptions, AlertOptions, AlertUpdate, CheckSummary,
    DEFAULT_ACTION_TIMEOUT, DEFAULT_CHECK_INTERVAL, RESOLVED_METRIC, TRIGGERED_METRIC,
};
pub use monitor::MAX_CHECK_INTERVAL;
