use std::time::Duration;
use vigil_notify::error::NotifyError;

/// Errors raised while evaluating alerts or running their actions.
///
/// None of these escape [`AlertManager::check_alerts`](crate::AlertManager::check_alerts):
/// they are logged and counted in its summary.
///
/// # Examples
///
/// ```rust
/// use vigil_alert::AlertError;
///
/// let err = AlertError::NonFiniteValue { metric: "latency".to_string(), value: f64::NAN };
/// assert!(err.to_string().contains("latency"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    /// The compared value was NaN or infinite.
    #[error("Alert: metric '{metric}' evaluated to non-finite value {value}")]
    NonFiniteValue { metric: String, value: f64 },

    /// `now - duration_secs` falls outside the representable time range.
    #[error("Alert: {duration_secs}s window for metric '{metric}' is out of range")]
    WindowOutOfRange { metric: String, duration_secs: u64 },

    /// An action handler returned an error.
    #[error("Alert: action '{action_type}' failed: {source}")]
    ActionFailed {
        action_type: String,
        #[source]
        source: NotifyError,
    },

    /// An action handler did not finish within the action timeout.
    #[error("Alert: action '{action_type}' timed out after {timeout:?}")]
    ActionTimeout {
        action_type: String,
        timeout: Duration,
    },
}
