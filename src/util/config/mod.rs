//! Configuration
//!
//! # Configuration hierarchy
//!
//! ```text
//! Priority (high → low):
//! 1. CLI arguments
//! 2. Environment variable (LAZY_IR_LOG)
//! 3. Config file (RON)
//! 4. Default values
//! ```
//!
//! # Example file
//!
//! ```ron
//! (
//!     log: (level: debug),
//!     dump: (format: dot, graph_name: "step_0"),
//! )
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ir::DumpFormat;
use crate::util::logger::LogLevel;

/// Environment variable overriding `log.level`.
pub const LOG_ENV: &str = "LAZY_IR_LOG";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("Invalid log level: {0}")]
    InvalidLogLevel(String),
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    /// Logging settings
    #[serde(default)]
    pub log: LogConfig,
    /// Graph dump settings
    #[serde(default)]
    pub dump: DumpConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_level")]
    pub level: LogLevel,
}

fn default_level() -> LogLevel {
    LogLevel::Info
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

/// Graph dump configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DumpConfig {
    #[serde(default)]
    pub format: DumpFormat,
    /// Name of the DOT digraph
    #[serde(default = "default_graph_name")]
    pub graph_name: String,
}

fn default_graph_name() -> String {
    "lazy_ir".to_string()
}

impl Default for DumpConfig {
    fn default() -> Self {
        Self {
            format: DumpFormat::default(),
            graph_name: default_graph_name(),
        }
    }
}

impl Config {
    /// Parse a RON config.
    pub fn from_ron(source: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(source)?)
    }

    /// Replace the log level with a textual value such as `debug`.
    pub fn override_log_level(&mut self, value: &str) -> Result<(), ConfigError> {
        self.log.level = value
            .parse()
            .map_err(ConfigError::InvalidLogLevel)?;
        Ok(())
    }

    /// Apply [`LOG_ENV`] if it is set.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        match std::env::var(LOG_ENV) {
            Ok(value) => self.override_log_level(&value),
            Err(_) => Ok(()),
        }
    }
}

/// Load a config file.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = fs::read_to_string(path)?;
    Config::from_ron(&content)
}

/// Load `path` if given, defaults otherwise; then apply the environment.
pub fn load_config_or_default(path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(path) => load_config(path)?,
        None => Config::default(),
    };
    config.apply_env()?;
    Ok(config)
}

#[cfg(test)]
mod tests;
