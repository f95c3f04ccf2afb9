//! Prometheus metrics and structured logging for the autotrader.
//!
//! - Structured logging with tracing (pretty in development, JSON in production)
//! - Prometheus counters for events, commands, fills and hedges
//! - Position gauges for both instruments
//! - Per-session statistics summary

pub mod error;
pub mod logging;
pub mod metrics;
pub mod session_stats;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging;
pub use metrics::Metrics;
pub use session_stats::SessionStats;
