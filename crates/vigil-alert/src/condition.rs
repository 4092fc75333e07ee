use crate::error::AlertError;
use chrono::{DateTime, Duration, Utc};
use vigil_common::types::{Aggregation, AlertCondition, TimeRange};
use vigil_metrics::MetricsCollector;

/// Evaluate `condition` against the collector at `now`.
///
/// Without `duration_secs` the latest sample is compared; with it, the
/// aggregate (default `avg`) over `[now - duration, now]`. A metric with no
/// samples in scope evaluates to `false`, never to a comparison against `0`.
///
/// # Errors
///
/// [`AlertError::NonFiniteValue`] when the compared value is NaN or infinite,
/// [`AlertError::WindowOutOfRange`] when the window start is not a
/// representable instant.
pub fn evaluate_condition(
    metrics: &MetricsCollector,
    condition: &AlertCondition,
    now: DateTime<Utc>,
) -> Result<bool, AlertError> {
    let value = match condition.duration_secs {
        None => match metrics.get_latest(&condition.metric) {
            Some(sample) => sample.value,
            None => return Ok(false),
        },
        Some(secs) => {
            let range = i64::try_from(secs)
                .ok()
                .and_then(Duration::try_seconds)
                .and_then(|window| TimeRange::try_trailing(now, window))
                .ok_or_else(|| AlertError::WindowOutOfRange {
                    metric: condition.metric.clone(),
                    duration_secs: secs,
                })?;
            let values: Vec<f64> = metrics
                .get_metrics(&condition.metric, Some(range))
                .into_iter()
                .map(|m| m.value)
                .collect();
            if values.is_empty() {
                return Ok(false);
            }
            condition
                .aggregation
                .unwrap_or(Aggregation::Avg)
                .apply(&values)
        }
    };

    if !value.is_finite() {
        return Err(AlertError::NonFiniteValue {
            metric: condition.metric.clone(),
            value,
        });
    }
    Ok(condition.operator.check(value, condition.threshold))
}
