//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error on line {line}: {message}")]
    Parse { line: u64, message: String },

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Core error: {0}")]
    Core(#[from] rtg_core::CoreError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] rtg_telemetry::TelemetryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
