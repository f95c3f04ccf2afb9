//! Application configuration.

use crate::error::{AppError, AppResult};
use rtg_mm::MakerConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default config file location.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Logging and metrics output.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Log filter used when `RUST_LOG` is unset.
    #[serde(default)]
    pub log_filter: Option<String>,
    /// Write the Prometheus text exposition here at the end of a session.
    #[serde(default)]
    pub metrics_out: Option<String>,
}

/// Replay behaviour.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReplayConfig {
    /// Fail on the first malformed input line instead of skipping it.
    #[serde(default)]
    pub strict: bool,
    /// Stop reading input once a disconnect event has been processed.
    #[serde(default = "default_true")]
    pub stop_on_disconnect: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            strict: false,
            stop_on_disconnect: true,
        }
    }
}

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    #[serde(default)]
    pub maker: MakerConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub replay: ReplayConfig,
}

impl AppConfig {
    /// Load `path` if it exists, defaults otherwise.
    pub fn load_or_default(path: &str) -> AppResult<Self> {
        if Path::new(path).exists() {
            Self::from_file(path)
        } else {
            tracing::warn!(path = %path, "Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load from a specific file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> AppResult<Self> {
        toml::from_str(content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }

    /// Validate every section.
    pub fn validate(&self) -> AppResult<()> {
        self.maker.validate()?;
        Ok(())
    }
}
