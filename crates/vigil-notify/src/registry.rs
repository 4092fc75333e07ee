use crate::channels::host::{HostAction, HostDispatcher};
use crate::channels::log::LogAction;
use crate::channels::webhook::WebhookAction;
use crate::error::{NotifyError, Result};
use crate::ActionHandler;
use std::collections::HashMap;
use std::sync::Arc;
use vigil_common::types::{Alert, AlertActionConfig};
use vigil_logs::LogAggregator;

/// Registry of [`ActionHandler`]s keyed by action type.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use vigil_logs::LogAggregator;
/// use vigil_notify::registry::ActionRegistry;
///
/// let registry = ActionRegistry::with_defaults(Arc::new(LogAggregator::default()));
/// assert!(registry.has_handler("log"));
/// assert!(registry.has_handler("webhook"));
/// assert!(!registry.has_handler("email"));
/// ```
#[derive(Default)]
pub struct ActionRegistry {
    handlers: HashMap<String, Arc<dyn ActionHandler>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// `log` and `webhook` handlers.
    pub fn with_defaults(logs: Arc<LogAggregator>) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(LogAction::new(logs)));
        registry.register(Arc::new(WebhookAction::new()));
        registry
    }

    /// Register `notification` and `email` handlers that forward to the host.
    pub fn with_host_dispatcher(mut self, dispatcher: Arc<dyn HostDispatcher>) -> Self {
        self.register(Arc::new(HostAction::notification(dispatcher.clone())));
        self.register(Arc::new(HostAction::email(dispatcher)));
        self
    }

    /// Register a handler, replacing any existing one of the same type.
    pub fn register(&mut self, handler: Arc<dyn ActionHandler>) {
        let name = handler.action_type().to_string();
        self.handlers.insert(name, handler);
    }

    pub fn get_handler(&self, action_type: &str) -> Option<Arc<dyn ActionHandler>> {
        self.handlers.get(action_type).cloned()
    }

    pub fn has_handler(&self, action_type: &str) -> bool {
        self.handlers.contains_key(action_type)
    }

    pub fn handler_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn validate(&self, action: &AlertActionConfig) -> Result<()> {
        let handler = self
            .handlers
            .get(&action.action_type)
            .ok_or_else(|| NotifyError::UnknownActionType(action.action_type.clone()))?;
        handler.validate_config(&action.config)
    }

    pub async fn execute(&self, alert: &Alert, action: &AlertActionConfig) -> Result<()> {
        let handler = self
            .get_handler(&action.action_type)
            .ok_or_else(|| NotifyError::UnknownActionType(action.action_type.clone()))?;
        handler.execute(alert, &action.config).await
    }
}
