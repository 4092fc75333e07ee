use crate::error::{NotifyError, Result};
use crate::ActionHandler;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use vigil_common::types::Alert;

/// Host-provided delivery for side effects this crate does not implement
/// itself (in-app notifications, email).
#[async_trait]
pub trait HostDispatcher: Send + Sync {
    async fn dispatch(
        &self,
        action_type: &str,
        alert: &Alert,
        config: &Value,
    ) -> anyhow::Result<()>;
}

/// Forwards one action type to a [`HostDispatcher`].
pub struct HostAction {
    action_type: &'static str,
    dispatcher: Arc<dyn HostDispatcher>,
}

impl HostAction {
    pub fn notification(dispatcher: Arc<dyn HostDispatcher>) -> Self {
        Self {
            action_type: "notification",
            dispatcher,
        }
    }

    pub fn email(dispatcher: Arc<dyn HostDispatcher>) -> Self {
        Self {
            action_type: "email",
            dispatcher,
        }
    }
}

#[async_trait]
impl ActionHandler for HostAction {
    fn action_type(&self) -> &str {
        self.action_type
    }

    fn validate_config(&self, config: &Value) -> Result<()> {
        if self.action_type != "email" {
            return Ok(());
        }
        let has_recipient = match config.get("to") {
            Some(Value::String(to)) => !to.trim().is_empty(),
            Some(Value::Array(list)) => !list.is_empty(),
            _ => false,
        };
        if has_recipient {
            Ok(())
        } else {
            Err(NotifyError::InvalidConfig(
                "email: 'to' must be a non-empty string or list".to_string(),
            ))
        }
    }

    async fn execute(&self, alert: &Alert, config: &Value) -> Result<()> {
        self.validate_config(config)?;
        self.dispatcher
            .dispatch(self.action_type, alert, config)
            .await
            .map_err(|e| NotifyError::HostError {
                action_type: self.action_type.to_string(),
                message: e.to_string(),
            })
    }
}
