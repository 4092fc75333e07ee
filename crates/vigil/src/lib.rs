//! In-process observability: metrics, structured logs, performance traces
//! and threshold alerts.
//!
//! [`Observability`] builds the four services from a [`VigilConfig`] and
//! wires them together. The component crates are re-exported for direct
//! use.
//!
//! ```no_run
//! use vigil::{Observability, VigilConfig};
//!
//! # async fn run() -> anyhow::Result<()> {
//! vigil::logging::init_tracing()?;
//! let config = VigilConfig::load("vigil.toml")?;
//! let obs = Observability::new(&config);
//! obs.alerts.start_monitoring();
//! obs.metrics.gauge("queue.depth", 12.0, Default::default());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod logging;
pub mod state;

#[cfg(test)]
mod tests;

pub use config::VigilConfig;
pub use state::Observability;

pub use vigil_alert as alert;
pub use vigil_common as common;
pub use vigil_logs as logs;
pub use vigil_metrics as metrics;
pub use vigil_notify as notify;
pub use vigil_perf as perf;
