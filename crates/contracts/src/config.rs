//! Logger configuration model
//!
//! Deserialized by `config_loader` from TOML or JSON.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::LogLevel;

/// Top-level logger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggerConfig {
    /// Logger name
    #[serde(default = "default_logger_name")]
    pub name: String,

    /// Global level, inherited by sinks configured without one
    #[serde(default = "LogLevel::default_global")]
    pub level: LogLevel,

    /// Sinks in registration order
    #[serde(default)]
    pub sinks: Vec<SinkConfig>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            name: default_logger_name(),
            level: LogLevel::default_global(),
            sinks: Vec::new(),
        }
    }
}

fn default_logger_name() -> String {
    "default".to_string()
}

/// Sink output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Sink name (registry key)
    pub name: String,

    /// Sink type
    pub sink_type: SinkType,

    /// Explicit level; absent or `none` inherits the logger level
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<LogLevel>,

    /// Type-specific parameters
    #[serde(default)]
    pub params: HashMap<String, String>,
}

impl SinkConfig {
    /// Level the sink is constructed with, before inherit-on-add
    pub fn initial_level(&self) -> LogLevel {
        self.level.unwrap_or(LogLevel::NONE)
    }

    /// Level the sink ends up with once added to a logger at `logger_level`
    pub fn effective_level(&self, logger_level: LogLevel) -> LogLevel {
        match self.initial_level() {
            level if level.is_none() => logger_level,
            level => level,
        }
    }
}

/// Sink type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// ANSI console output
    Console,
    /// Forward into `tracing`
    Tracing,
    /// Telemetry backend client
    Telemetry,
}

impl SinkType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Console => "console",
            Self::Tracing => "tracing",
            Self::Telemetry => "telemetry",
        }
    }
}
