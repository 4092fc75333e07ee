use crate::error::{NotifyError, Result};
use crate::ActionHandler;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use vigil_common::types::Alert;
use vigil_logs::{context_from, LogAggregator, LogLevel};

#[derive(Debug, Default, Deserialize)]
struct LogActionConfig {
    level: Option<String>,
    /// Template; `{{name}}`, `{{metric}}`, `{{threshold}}`, `{{severity}}`
    /// are substituted.
    message: Option<String>,
}

/// Writes an entry for the triggered alert into the [`LogAggregator`].
pub struct LogAction {
    logs: Arc<LogAggregator>,
}

impl LogAction {
    pub fn new(logs: Arc<LogAggregator>) -> Self {
        Self { logs }
    }

    fn parse(config: &Value) -> Result<(LogLevel, Option<String>)> {
        if config.is_null() {
            return Ok((LogLevel::Warn, None));
        }
        let cfg: LogActionConfig = serde_json::from_value(config.clone())
            .map_err(|e| NotifyError::InvalidConfig(format!("log: {e}")))?;
        let level = match cfg.level.as_deref() {
            None => LogLevel::Warn,
            Some(raw) => raw
                .parse::<LogLevel>()
                .map_err(|e| NotifyError::InvalidConfig(format!("log: {e}")))?,
        };
        Ok((level, cfg.message))
    }
}

fn render(template: &str, alert: &Alert) -> String {
    template
        .replace("{{name}}", &alert.name)
        .replace("{{metric}}", &alert.condition.metric)
        .replace("{{threshold}}", &alert.condition.threshold.to_string())
        .replace("{{severity}}", &alert.severity.to_string())
}

#[async_trait]
impl ActionHandler for LogAction {
    fn action_type(&self) -> &str {
        "log"
    }

    fn validate_config(&self, config: &Value) -> Result<()> {
        Self::parse(config).map(|_| ())
    }

    async fn execute(&self, alert: &Alert, config: &Value) -> Result<()> {
        let (level, template) = Self::parse(config)?;
        let message = match template {
            Some(t) => render(&t, alert),
            None => format!(
                "Alert '{}': {} {} {}",
                alert.name,
                alert.condition.metric,
                alert.condition.operator.describe(),
                alert.condition.threshold
            ),
        };
        let context = context_from(json!({
            "alert_id": alert.id,
            "severity": alert.severity,
            "metric": alert.condition.metric,
            "threshold": alert.condition.threshold,
        }));
        self.logs.log(level, message, Some(context));
        Ok(())
    }
}
