//! Alert action dispatch with pluggable handler support.
//!
//! Each [`AlertActionConfig`](vigil_common::types::AlertActionConfig) on an
//! alert names an action type; the [`registry::ActionRegistry`] resolves it to
//! an [`ActionHandler`] and runs it. Built-in handlers are `log` and
//! `webhook`; `notification` and `email` are forwarded to a host-provided
//! [`channels::host::HostDispatcher`].

pub mod channels;
pub mod error;
pub mod registry;

#[cfg(test)]
mod tests;

use async_trait::async_trait;
use error::Result;
use serde_json::Value;
use vigil_common::types::Alert;

/// A side effect executed when an alert triggers.
///
/// Handlers receive the alert and the per-action JSON config from the
/// alert definition. Handlers are registered in the
/// [`registry::ActionRegistry`] under their `action_type()`.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    /// Returns the action type name (e.g., `"log"`, `"webhook"`).
    fn action_type(&self) -> &str;

    /// Validates a config blob before it is attached to an alert.
    fn validate_config(&self, _config: &Value) -> Result<()> {
        Ok(())
    }

    /// Runs the action for `alert`.
    ///
    /// # Errors
    ///
    /// Returns an error if the side effect could not be completed. The
    /// caller logs it; no retry happens.
    async fn execute(&self, alert: &Alert, config: &Value) -> Result<()>;
}
