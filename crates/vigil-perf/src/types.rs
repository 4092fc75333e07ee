use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub type Metadata = Map<String, Value>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Api,
    Render,
    #[default]
    Interaction,
    Resource,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Api => write!(f, "api"),
            Category::Render => write!(f, "render"),
            Category::Interaction => write!(f, "interaction"),
            Category::Resource => write!(f, "resource"),
        }
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "api" => Ok(Category::Api),
            "render" => Ok(Category::Render),
            "interaction" => Ok(Category::Interaction),
            "resource" => Ok(Category::Resource),
            _ => Err(format!("unknown performance category: {s}")),
        }
    }
}

/// One duration measurement. Opened by `start` with `duration = 0` and
/// `end_time = start_time`, completed exactly once by `end`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceMetric {
    pub id: String,
    pub name: String,
    pub category: Category,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Milliseconds.
    pub duration: f64,
    pub metadata: Metadata,
    pub completed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceStatus {
    Pending,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Span {
    pub id: String,
    pub trace_id: String,
    pub parent_id: Option<String>,
    pub name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    /// Milliseconds, set when the span ends.
    pub duration: Option<f64>,
    pub tags: Metadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trace {
    pub id: String,
    pub name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration: Option<f64>,
    pub status: TraceStatus,
    pub spans: Vec<Span>,
    pub metadata: Metadata,
}

impl Trace {
    /// Direct children of `span_id` (or the roots when `None`).
    pub fn children_of(&self, span_id: Option<&str>) -> Vec<&Span> {
        self.spans
            .iter()
            .filter(|s| s.parent_id.as_deref() == span_id)
            .collect()
    }
}

/// Milliseconds between two instants, never negative.
pub(crate) fn elapsed_ms(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    (end - start)
        .num_microseconds()
        .map_or(0.0, |us| us as f64 / 1000.0)
        .max(0.0)
}
