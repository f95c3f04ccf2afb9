//! ETF/future autotrader replay driver.
//!
//! Wires the controller to a line-oriented event stream:
//! - TOML configuration with defaults
//! - JSON-lines events in, JSON-lines commands out
//! - Metrics and a session summary at the end

pub mod config;
pub mod error;
pub mod replay;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use replay::Replayer;
