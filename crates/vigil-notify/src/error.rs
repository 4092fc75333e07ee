/// Errors raised while dispatching an alert action.
///
/// # Examples
///
/// ```rust
/// use vigil_notify::error::NotifyError;
///
/// let err = NotifyError::InvalidConfig("missing url".to_string());
/// assert!(err.to_string().contains("url"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// Action configuration is missing a required field or contains an invalid value.
    #[error("Notify: invalid action configuration: {0}")]
    InvalidConfig(String),

    /// No handler is registered for the action type.
    #[error("Notify: unknown action type '{0}'")]
    UnknownActionType(String),

    /// An HTTP request to a webhook endpoint failed.
    #[error("Notify: HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// JSON serialization or deserialization failed.
    #[error("Notify: JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// The endpoint answered with a non-success status.
    #[error("Notify: endpoint {url} returned status={status}, body={body}")]
    ApiError {
        url: String,
        status: u16,
        body: String,
    },

    /// The host-provided dispatcher failed.
    #[error("Notify: host dispatch for '{action_type}' failed: {message}")]
    HostError {
        action_type: String,
        message: String,
    },
}

/// Convenience `Result` alias for action dispatch.
pub type Result<T> = std::result::Result<T, NotifyError>;
