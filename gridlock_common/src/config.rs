//! Configuration loading traits and shared configuration sections.
//!
//! Every GridLock configuration file is TOML. Sections deserialize into plain
//! structs with per-field defaults, and each section carries its own
//! `validate()` so a loaded file is checked before anything is built from it.
//!
//! # Usage
//!
//! ```rust,no_run
//! use gridlock_common::config::{ConfigError, ConfigLoader, SharedConfig};
//! use serde::Deserialize;
//! use std::path::Path;
//!
//! #[derive(Debug, Deserialize)]
//! struct MyAppConfig {
//!     shared: SharedConfig,
//! }
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = MyAppConfig::load(Path::new("gridlock.toml"))?;
//!     println!("Service: {}", config.shared.service_name);
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::consts::{CYCLE_PERIOD_MS, CYCLE_PERIOD_MS_MAX, CYCLE_PERIOD_MS_MIN};

/// Error type for configuration loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log level for application logging.
///
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose, per-tick lifecycle tracing.
    Trace,
    /// Action lifecycle transitions.
    Debug,
    /// Routine entry, configuration and shutdown.
    #[default]
    Info,
    /// Rejected starts and cycle overruns.
    Warn,
    /// Fatal errors only.
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Common configuration fields shared across GridLock applications.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// service_name = "gridlock-sim-01"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedConfig {
    /// Logging verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Application instance identifier.
    pub service_name: String,
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            service_name: "gridlock".to_string(),
        }
    }
}

impl SharedConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if `service_name` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

// ─── Cycle Config ───────────────────────────────────────────────────

/// Host loop pacing configuration.
///
/// # TOML Example
///
/// ```toml
/// [cycle]
/// period_ms = 20
/// telemetry_interval = 1
/// abort_on_overrun = false
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CycleConfig {
    /// Fixed control period [ms].
    #[serde(default = "default_period_ms")]
    pub period_ms: u64,

    /// Telemetry snapshot interval [ticks].
    #[serde(default = "default_telemetry_interval")]
    pub telemetry_interval: u32,

    /// Stop the host loop on the first overrun instead of counting it.
    #[serde(default)]
    pub abort_on_overrun: bool,
}

fn default_period_ms() -> u64 {
    CYCLE_PERIOD_MS
}
fn default_telemetry_interval() -> u32 {
    1
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            period_ms: default_period_ms(),
            telemetry_interval: default_telemetry_interval(),
            abort_on_overrun: false,
        }
    }
}

impl CycleConfig {
    /// Control period as a `Duration`.
    #[inline]
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }

    /// Validate period bounds and telemetry interval.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(CYCLE_PERIOD_MS_MIN..=CYCLE_PERIOD_MS_MAX).contains(&self.period_ms) {
            return Err(ConfigError::ValidationError(format!(
                "cycle.period_ms {} out of range [{CYCLE_PERIOD_MS_MIN}, {CYCLE_PERIOD_MS_MAX}]",
                self.period_ms
            )));
        }
        if self.telemetry_interval == 0 {
            return Err(ConfigError::ValidationError(
                "cycle.telemetry_interval must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Trait for loading configuration from TOML files.
///
/// Blanket-implemented for every `serde::de::DeserializeOwned` type.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;
        tracing::debug!(path = %path.display(), bytes = content.len(), "config file read");

        Self::from_toml(&content)
    }

    /// Parse configuration from an in-memory TOML string.
    fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}
