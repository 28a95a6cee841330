//! Configuration validation
//!
//! Rules:
//! - sink names are non-empty and unique
//! - telemetry sinks carry a non-blank `access_key`
//! - console `color` parses as a boolean

use std::collections::HashSet;

use contracts::{LoggerConfig, SinkType, TelemetryError};

/// Validate a logger configuration
///
/// Returns the first error encountered.
pub fn validate(config: &LoggerConfig) -> Result<(), TelemetryError> {
    validate_sink_names(config)?;
    validate_sink_params(config)?;
    Ok(())
}

/// Non-fatal findings: configurations that load but will never emit.
pub fn warnings(config: &LoggerConfig) -> Vec<String> {
    let mut found = Vec::new();
    if config.sinks.is_empty() {
        found.push("no sinks configured; every event is discarded".to_string());
    }
    for sink in &config.sinks {
        if sink.effective_level(config.level).is_none() {
            found.push(format!(
                "sink '{}' resolves to level none and receives nothing",
                sink.name
            ));
        }
    }
    found
}

fn validate_sink_names(config: &LoggerConfig) -> Result<(), TelemetryError> {
    let mut seen = HashSet::new();
    for (idx, sink) in config.sinks.iter().enumerate() {
        if sink.name.trim().is_empty() {
            return Err(TelemetryError::config(
                format!("sinks[{idx}].name"),
                "sink name cannot be empty",
            ));
        }
        if !seen.insert(sink.name.as_str()) {
            return Err(TelemetryError::config(
                format!("sinks[name={}]", sink.name),
                "duplicate sink name",
            ));
        }
    }
    Ok(())
}

fn validate_sink_params(config: &LoggerConfig) -> Result<(), TelemetryError> {
    for sink in &config.sinks {
        match sink.sink_type {
            SinkType::Telemetry => {
                let key = sink.params.get("access_key").map(|k| k.trim());
                if key.map_or(true, str::is_empty) {
                    return Err(TelemetryError::config(
                        format!("sinks[name={}].params.access_key", sink.name),
                        "telemetry sink requires a non-empty access_key",
                    ));
                }
            }
            SinkType::Console => {
                if let Some(color) = sink.params.get("color") {
                    if color.parse::<bool>().is_err() {
                        return Err(TelemetryError::config(
                            format!("sinks[name={}].params.color", sink.name),
                            format!("expected true or false, got '{color}'"),
                        ));
                    }
                }
            }
            SinkType::Tracing => {}
        }
    }
    Ok(())
}
