//! Prometheus metrics and structured logging for the oracle deviation monitor.
//!
//! - Structured logging with tracing (JSON in production, pretty otherwise)
//! - Prometheus gauges/counters for ingestion, CDE, bands, triggers and
//!   oracle selection

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging;
pub use metrics::Metrics;
