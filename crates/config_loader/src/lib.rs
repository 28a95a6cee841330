//! # Config Loader
//!
//! Configuration loading and parsing module.
//!
//! Responsibilities:
//! - Parse TOML/JSON configuration files
//! - Validate sink declarations
//! - Produce a `LoggerConfig` ready for `dispatcher::create_logger`
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let config = ConfigLoader::load_from_path(Path::new("logger.toml")).unwrap();
//! println!("Logger: {} ({} sinks)", config.name, config.sinks.len());
//! ```

mod parser;
mod validator;

pub use contracts::LoggerConfig;
pub use parser::ConfigFormat;

use contracts::TelemetryError;
use std::path::Path;
use tracing::{debug, instrument};

/// Configuration loader
///
/// Provides static methods to load configuration from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file path
    ///
    /// Automatically detects format from file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    #[instrument(name = "config_load", fields(path = %path.display()))]
    pub fn load_from_path(path: &Path) -> Result<LoggerConfig, TelemetryError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        let config = Self::load_from_str(&content, format)?;
        debug!(logger = %config.name, sinks = config.sinks.len(), "Configuration loaded");
        Ok(config)
    }

    /// Load configuration from string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<LoggerConfig, TelemetryError> {
        Self::parse_and_validate(content, format)
    }

    /// Non-fatal findings for an already validated configuration
    pub fn warnings(config: &LoggerConfig) -> Vec<String> {
        validator::warnings(config)
    }

    /// Serialize LoggerConfig to TOML string
    pub fn to_toml(config: &LoggerConfig) -> Result<String, TelemetryError> {
        toml::to_string_pretty(config)
            .map_err(|e| TelemetryError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize LoggerConfig to JSON string
    pub fn to_json(config: &LoggerConfig) -> Result<String, TelemetryError> {
        serde_json::to_string_pretty(config)
            .map_err(|e| TelemetryError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    /// Infer configuration format from file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, TelemetryError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            TelemetryError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            TelemetryError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }

    fn read_file(path: &Path) -> Result<String, TelemetryError> {
        Ok(std::fs::read_to_string(path)?)
    }

    fn parse_and_validate(
        content: &str,
        format: ConfigFormat,
    ) -> Result<LoggerConfig, TelemetryError> {
        let config = parser::parse(content, format)?;
        validator::validate(&config)?;
        Ok(config)
    }
}
