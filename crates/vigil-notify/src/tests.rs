use crate::channels::host::HostDispatcher;
use crate::channels::webhook::WebhookAction;
use crate::error::NotifyError;
use crate::registry::ActionRegistry;
use crate::ActionHandler;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use vigil_common::types::{
    Alert, AlertActionConfig, AlertCondition, AlertStatus, CompareOp, Severity,
};
use vigil_logs::{LogAggregator, LogFilter, LogLevel, LogOptions};

fn sample_alert() -> Alert {
    let now = Utc::now();
    Alert {
        id: "42".into(),
        name: "High latency".into(),
        description: None,
        severity: Severity::High,
        condition: AlertCondition::new("latency", CompareOp::Gt, 250.0),
        actions: Vec::new(),
        enabled: true,
        status: AlertStatus::Active,
        triggered_at: Some(now),
        resolved_at: None,
        created_at: now,
        updated_at: now,
    }
}

fn quiet_logs() -> Arc<LogAggregator> {
    Arc::new(LogAggregator::new(LogOptions {
        console_mirror: false,
        ..LogOptions::default()
    }))
}

/// Accepts one HTTP request, replies with `status`, and hands back the raw
/// request text.
async fn capture_server(status: u16) -> (String, oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("accept");
        let mut raw = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = socket.read(&mut buf).await.expect("read");
            if n == 0 {
                break;
            }
            raw.extend_from_slice(&buf[..n]);
            let text = String::from_utf8_lossy(&raw);
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if raw.len() >= header_end + 4 + content_length {
                    break;
                }
            }
        }
        let body = "ok";
        let response = format!(
            "HTTP/1.1 {status} Status\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.expect("write");
        let _ = tx.send(String::from_utf8_lossy(&raw).into_owned());
    });

    (format!("http://{addr}/hooks/alerts"), rx)
}

#[test]
fn default_registry_has_log_and_webhook() {
    let registry = ActionRegistry::with_defaults(quiet_logs());
    assert_eq!(registry.handler_names(), vec!["log", "webhook"]);
}

#[tokio::test]
async fn unknown_action_type_is_an_error() {
    let registry = ActionRegistry::with_defaults(quiet_logs());
    let action = AlertActionConfig::new("pager", Value::Null);
    let err = registry
        .execute(&sample_alert(), &action)
        .await
        .expect_err("unknown type must fail");
    assert!(matches!(err, NotifyError::UnknownActionType(ref t) if t == "pager"));
    assert!(registry.validate(&action).is_err());
}

#[test]
fn webhook_config_validation() {
    let webhook = WebhookAction::new();
    assert!(webhook
        .validate_config(&json!({"url": "https://example.com/hook"}))
        .is_ok());
    assert!(webhook.validate_config(&json!({})).is_err());
    assert!(webhook
        .validate_config(&json!({"url": "ftp://example.com"}))
        .is_err());
}

#[tokio::test]
async fn webhook_posts_alert_payload_as_json() {
    let (url, captured) = capture_server(200).await;
    let webhook = WebhookAction::new();
    webhook
        .execute(&sample_alert(), &json!({"url": url, "headers": {"X-Source": "vigil"}}))
        .await
        .expect("webhook delivered");

    let request = captured.await.expect("request captured");
    assert!(request.starts_with("POST /hooks/alerts HTTP/1.1"));
    let lower = request.to_lowercase();
    assert!(lower.contains("content-type: application/json"));
    assert!(lower.contains("x-source: vigil"));

    let body = &request[request.find("\r\n\r\n").expect("body") + 4..];
    let payload: Value = serde_json::from_str(body).expect("json body");
    assert_eq!(payload["alert"]["id"], "42");
    assert_eq!(payload["alert"]["severity"], "high");
    assert_eq!(payload["alert"]["condition"]["operator"], "gt");
}

#[tokio::test]
async fn webhook_non_success_status_is_an_error() {
    let (url, _captured) = capture_server(503).await;
    let err = WebhookAction::new()
        .execute(&sample_alert(), &json!({"url": url}))
        .await
        .expect_err("503 must fail");
    match err {
        NotifyError::ApiError { status, body, .. } => {
            assert_eq!(status, 503);
            assert_eq!(body, "ok");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn webhook_connection_failure_is_an_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let err = WebhookAction::new()
        .execute(&sample_alert(), &json!({"url": format!("http://{addr}/"), "timeout_secs": 2}))
        .await
        .expect_err("closed port must fail");
    assert!(matches!(err, NotifyError::HttpError(_)));
}

#[tokio::test]
async fn log_action_writes_entry() {
    let logs = quiet_logs();
    let registry = ActionRegistry::with_defaults(logs.clone());
    registry
        .execute(&sample_alert(), &AlertActionConfig::new("log", Value::Null))
        .await
        .expect("log action");
    registry
        .execute(
            &sample_alert(),
            &AlertActionConfig::new(
                "log",
                json!({"level": "error", "message": "{{name}} on {{metric}} ({{severity}})"}),
            ),
        )
        .await
        .expect("templated log action");

    let warn = logs.get_logs(&LogFilter::new().level(LogLevel::Warn));
    assert_eq!(warn.len(), 1);
    assert_eq!(warn[0].message, "Alert 'High latency': latency above 250");
    assert_eq!(warn[0].context["alert_id"], "42");

    let error = logs.get_logs(&LogFilter::new().level(LogLevel::Error));
    assert_eq!(error[0].message, "High latency on latency (high)");

    let bad = AlertActionConfig::new("log", json!({"level": "loud"}));
    assert!(registry.validate(&bad).is_err());
}

#[derive(Default)]
struct RecordingDispatcher {
    calls: Mutex<Vec<(String, String)>>,
    fail: bool,
}

#[async_trait]
impl HostDispatcher for RecordingDispatcher {
    async fn dispatch(&self, action_type: &str, alert: &Alert, _config: &Value) -> anyhow::Result<()> {
        if self.fail {
            anyhow::bail!("mail relay down");
        }
        self.calls
            .lock()
            .unwrap()
            .push((action_type.to_string(), alert.id.clone()));
        Ok(())
    }
}

#[tokio::test]
async fn host_actions_forward_to_dispatcher() {
    let dispatcher = Arc::new(RecordingDispatcher::default());
    let registry =
        ActionRegistry::with_defaults(quiet_logs()).with_host_dispatcher(dispatcher.clone());
    assert!(registry.has_handler("notification"));
    assert!(registry.has_handler("email"));

    let alert = sample_alert();
    registry
        .execute(&alert, &AlertActionConfig::new("notification", json!({"channel": "admins"})))
        .await
        .expect("notification");
    registry
        .execute(&alert, &AlertActionConfig::new("email", json!({"to": ["ops@example.com"]})))
        .await
        .expect("email");

    let email_without_recipient = AlertActionConfig::new("email", json!({}));
    assert!(matches!(
        registry.execute(&alert, &email_without_recipient).await,
        Err(NotifyError::InvalidConfig(_))
    ));

    let calls = dispatcher.calls.lock().unwrap().clone();
    assert_eq!(
        calls,
        vec![
            ("notification".to_string(), "42".to_string()),
            ("email".to_string(), "42".to_string()),
        ]
    );
}

#[tokio::test]
async fn host_dispatch_failure_is_wrapped() {
    let dispatcher = Arc::new(RecordingDispatcher {
        fail: true,
        ..Default::default()
    });
    let registry = ActionRegistry::new().with_host_dispatcher(dispatcher);
    let err = registry
        .execute(&sample_alert(), &AlertActionConfig::new("email", json!({"to": "ops@example.com"})))
        .await
        .expect_err("dispatcher failure");
    assert!(err.to_string().contains("mail relay down"));
}
