use crate::aggregator::{LogAggregator, LogOptions};
use crate::context::{NoContext, StaticContext, UNKNOWN_SOURCE};
use crate::entry::LogLevel;
use crate::filter::LogFilter;
use crate::{context_from, CallerLocation};
use chrono::{Duration, TimeZone, Utc};
use serde_json::json;
use std::sync::Arc;
use vigil_common::clock::{Clock, ManualClock};

fn options(max_logs: usize) -> LogOptions {
    LogOptions {
        max_logs,
        retention_days: 7,
        console_mirror: false,
    }
}

fn manual_aggregator(max_logs: usize) -> (LogAggregator, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 5, 10, 8, 0, 0).unwrap(),
    ));
    let logs =
        LogAggregator::with_parts(options(max_logs), clock.clone(), Arc::new(CallerLocation));
    (logs, clock)
}

#[derive(Debug)]
struct ConnectError;

impl std::fmt::Display for ConnectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "connection refused")
    }
}

impl std::error::Error for ConnectError {}

#[derive(Debug)]
struct FetchError(ConnectError);

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "failed to fetch profile")
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

#[test]
fn convenience_wrappers_set_levels() {
    let (logs, _) = manual_aggregator(100);
    assert_eq!(logs.debug("d", None).level, LogLevel::Debug);
    assert_eq!(logs.info("i", None).level, LogLevel::Info);
    assert_eq!(logs.warn("w", None).level, LogLevel::Warn);
    assert_eq!(logs.error("e", None, None).level, LogLevel::Error);
    assert_eq!(logs.fatal("f", None, None).level, LogLevel::Fatal);
    assert_eq!(logs.log(LogLevel::Info, "generic", None).level, LogLevel::Info);
    assert_eq!(logs.len(), 6);
}

#[test]
fn source_is_the_calling_line() {
    let (logs, _) = manual_aggregator(100);
    let entry = logs.info("hello", None);
    assert!(entry.source.ends_with(&format!(":{}", line!() - 1)), "{}", entry.source);
    assert!(entry.source.contains("tests.rs"));
    assert_eq!(entry.trace_id.len(), 16);
}

#[test]
fn missing_context_degrades_to_unknown() {
    let logs = LogAggregator::with_parts(
        options(10),
        Arc::new(ManualClock::new(Utc::now())),
        Arc::new(NoContext),
    );
    let entry = logs.warn("no call site", None);
    assert_eq!(entry.source, UNKNOWN_SOURCE);
    assert!(!entry.trace_id.is_empty());
}

#[test]
fn static_context_supplies_source_and_trace() {
    let provider = StaticContext {
        source: "checkout".into(),
        trace_id: "abc123".into(),
    };
    let logs = LogAggregator::with_parts(
        options(10),
        Arc::new(ManualClock::new(Utc::now())),
        Arc::new(provider),
    );
    let entry = logs.info("paid", None);
    assert_eq!(entry.source, "checkout");
    assert_eq!(entry.trace_id, "abc123");
}

#[test]
fn error_captures_source_chain() {
    let (logs, _) = manual_aggregator(10);
    let err = FetchError(ConnectError);
    let entry = logs.error("profile load failed", Some(&err), None);
    let captured = entry.error.expect("error captured");
    assert_eq!(captured.message, "failed to fetch profile");
    assert_eq!(captured.chain, vec!["connection refused".to_string()]);
}

#[test]
fn cap_evicts_oldest_entries() {
    let (logs, _) = manual_aggregator(50);
    for i in 0..55 {
        logs.info(format!("entry {i}"), None);
    }
    let all = logs.get_logs(&LogFilter::new());
    assert_eq!(all.len(), 50);
    assert_eq!(all[0].message, "entry 5");
    assert!(all.iter().all(|e| e.message != "entry 4"));
}

#[test]
fn age_pruning_runs_before_count_cap() {
    let (logs, clock) = manual_aggregator(3);
    logs.info("ancient", None);
    clock.advance(Duration::days(8));
    logs.info("a", None);
    logs.info("b", None);
    // With age pruning first, "ancient" is gone and nothing else is evicted.
    let messages: Vec<String> = logs
        .get_logs(&LogFilter::new())
        .into_iter()
        .map(|e| e.message)
        .collect();
    assert_eq!(messages, vec!["a", "b"]);
}

#[test]
fn retention_beyond_representable_range_keeps_everything() {
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 5, 10, 8, 0, 0).unwrap(),
    ));
    let logs = LogAggregator::with_parts(
        LogOptions {
            retention_days: u32::MAX,
            ..options(100)
        },
        clock.clone(),
        Arc::new(NoContext),
    );
    logs.info("first", None);
    clock.advance(Duration::days(3_650));
    logs.warn("second", None);
    assert_eq!(logs.len(), 2);
}

#[test]
fn entries_within_retention_survive() {
    let (logs, clock) = manual_aggregator(100);
    logs.info("six days old", None);
    clock.advance(Duration::days(6));
    logs.info("fresh", None);
    assert_eq!(logs.len(), 2);
}

#[test]
fn filter_by_level_source_and_time() {
    let (logs, clock) = manual_aggregator(100);
    let start = clock.now();
    logs.info("started", None);
    clock.advance(Duration::minutes(1));
    logs.error("failed", None, None);
    clock.advance(Duration::minutes(1));
    logs.fatal("crashed", None, None);

    assert_eq!(logs.get_logs(&LogFilter::new().level(LogLevel::Info)).len(), 1);
    assert_eq!(logs.get_errors(None).len(), 2);
    assert_eq!(logs.get_errors(Some(1))[0].message, "crashed");

    let window = LogFilter::new().between(start, start + Duration::minutes(1));
    let messages: Vec<String> = logs.get_logs(&window).into_iter().map(|e| e.message).collect();
    assert_eq!(messages, vec!["started", "failed"]);

    let by_glob = LogFilter::new().source("**/tests.rs:*");
    assert_eq!(logs.get_logs(&by_glob).len(), 3);
    assert!(logs.get_logs(&LogFilter::new().source("src/other.rs:1")).is_empty());
}

#[test]
fn search_is_case_insensitive_over_message_and_context() {
    let (logs, _) = manual_aggregator(100);
    logs.info("Job Posted", Some(context_from(json!({"category": "plumbing"}))));
    logs.info("bid placed", Some(context_from(json!({"amount": 120}))));

    assert_eq!(logs.get_logs(&LogFilter::new().search("job posted")).len(), 1);
    assert_eq!(logs.get_logs(&LogFilter::new().search("PLUMB")).len(), 1);
    assert_eq!(logs.get_logs(&LogFilter::new().search("amount")).len(), 1);
    assert!(logs.get_logs(&LogFilter::new().search("refund")).is_empty());
}

#[test]
fn limit_is_applied_last() {
    let (logs, _) = manual_aggregator(100);
    for i in 0..10 {
        if i % 2 == 0 {
            logs.warn(format!("warn {i}"), None);
        } else {
            logs.info(format!("info {i}"), None);
        }
    }
    let tail: Vec<String> = logs
        .get_logs(&LogFilter::new().level(LogLevel::Warn).limit(2))
        .into_iter()
        .map(|e| e.message)
        .collect();
    assert_eq!(tail, vec!["warn 6", "warn 8"]);
}

#[test]
fn count_by_level_and_export() {
    let (logs, _) = manual_aggregator(100);
    logs.info("a", None);
    logs.info("b", None);
    logs.error("c", None, None);

    let counts = logs.count_by_level();
    assert_eq!(counts[&LogLevel::Info], 2);
    assert_eq!(counts[&LogLevel::Error], 1);
    assert_eq!(counts[&LogLevel::Debug], 0);

    let export = logs.export();
    assert_eq!(export.count, 3);
    let json = serde_json::to_value(&export).expect("serialize export");
    assert_eq!(json["by_level"]["info"], 2);
    assert_eq!(json["logs"][2]["level"], "error");

    logs.clear();
    assert!(logs.is_empty());
}
