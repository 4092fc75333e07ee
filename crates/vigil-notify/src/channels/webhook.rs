use crate::error::{NotifyError, Result};
use crate::ActionHandler;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use vigil_common::types::Alert;

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Maximum number of characters kept from an error response body.
const MAX_BODY_LENGTH: usize = 500;

#[derive(Debug, Deserialize)]
struct WebhookConfig {
    url: String,
    timeout_secs: Option<u64>,
    #[serde(default)]
    headers: HashMap<String, String>,
}

impl WebhookConfig {
    fn parse(config: &Value) -> Result<Self> {
        let cfg: WebhookConfig = serde_json::from_value(config.clone())
            .map_err(|e| NotifyError::InvalidConfig(format!("webhook: {e}")))?;
        if !(cfg.url.starts_with("http://") || cfg.url.starts_with("https://")) {
            return Err(NotifyError::InvalidConfig(format!(
                "webhook: url must be http(s), got '{}'",
                cfg.url
            )));
        }
        Ok(cfg)
    }
}

/// `POST {url}` with `{"alert": <alert>}` as JSON. One attempt, bounded by
/// `timeout_secs`; any non-2xx status is an error.
pub struct WebhookAction {
    client: reqwest::Client,
}

impl Default for WebhookAction {
    fn default() -> Self {
        Self::new()
    }
}

impl WebhookAction {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ActionHandler for WebhookAction {
    fn action_type(&self) -> &str {
        "webhook"
    }

    fn validate_config(&self, config: &Value) -> Result<()> {
        WebhookConfig::parse(config).map(|_| ())
    }

    async fn execute(&self, alert: &Alert, config: &Value) -> Result<()> {
        let cfg = WebhookConfig::parse(config)?;
        let body = serde_json::to_string(&serde_json::json!({ "alert": alert }))?;

        let mut request = self
            .client
            .post(cfg.url.as_str())
            .header("Content-Type", "application/json")
            .timeout(Duration::from_secs(
                cfg.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
            ))
            .body(body);
        for (name, value) in &cfg.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let resp = request.send().await?;
        let status = resp.status();
        if status.is_success() {
            tracing::debug!(alert_id = %alert.id, url = %cfg.url, status = %status, "Webhook delivered");
            return Ok(());
        }

        let body = match resp.text().await {
            Ok(text) => truncate(&text, MAX_BODY_LENGTH),
            Err(e) => format!("[Failed to read response body: {e}]"),
        };
        Err(NotifyError::ApiError {
            url: cfg.url,
            status: status.as_u16(),
            body,
        })
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
