//! Layered error definitions
//!
//! Categorized by source: config / registry / sink

use std::fmt;

use thiserror::Error;

use crate::EventKind;

/// Unified error type
#[derive(Debug, Error)]
pub enum TelemetryError {
    // ===== Configuration Errors =====
    /// Mandatory setup missing or invalid
    #[error("config error at '{field}': {message}")]
    Config { field: String, message: String },

    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // ===== Registry Errors =====
    /// A sink with this name is already registered
    #[error("sink already exists: {name}")]
    DuplicateSink { name: String },

    /// No sink with this name is registered
    #[error("sink not found: {name}")]
    SinkNotFound { name: String },

    // ===== Sink Errors =====
    /// Failure inside a single sink operation
    #[error("sink '{sink_name}' write error: {message}")]
    SinkWrite { sink_name: String, message: String },

    /// One or more sinks failed while an event was fanned out
    #[error(
        "dispatch failed for {count} sink(s): {failures}",
        count = .failures.len(),
        failures = FailureList(.failures)
    )]
    Dispatch { failures: Vec<SinkFailure> },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl TelemetryError {
    /// Create configuration error
    pub fn config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    pub fn duplicate_sink(name: impl Into<String>) -> Self {
        Self::DuplicateSink { name: name.into() }
    }

    pub fn sink_not_found(name: impl Into<String>) -> Self {
        Self::SinkNotFound { name: name.into() }
    }

    /// Create sink write error
    pub fn sink_write(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkWrite {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }

    /// Sink failures carried by a dispatch error, empty for any other kind
    pub fn failures(&self) -> &[SinkFailure] {
        match self {
            Self::Dispatch { failures } => failures,
            _ => &[],
        }
    }
}

/// One sink that failed during a fan-out
#[derive(Debug)]
pub struct SinkFailure {
    pub sink_name: String,
    pub kind: EventKind,
    pub error: Box<TelemetryError>,
}

impl SinkFailure {
    pub fn new(sink_name: impl Into<String>, kind: EventKind, error: TelemetryError) -> Self {
        Self {
            sink_name: sink_name.into(),
            kind,
            error: Box::new(error),
        }
    }
}

impl fmt::Display for SinkFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.sink_name, self.kind, self.error)
    }
}

struct FailureList<'a>(&'a [SinkFailure]);

impl fmt::Display for FailureList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, failure) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{failure}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_error_messages() {
        assert_eq!(
            TelemetryError::duplicate_sink("console").to_string(),
            "sink already exists: console"
        );
        assert_eq!(
            TelemetryError::sink_not_found("nope").to_string(),
            "sink not found: nope"
        );
    }

    #[test]
    fn test_dispatch_error_lists_every_failure() {
        let err = TelemetryError::Dispatch {
            failures: vec![
                SinkFailure::new(
                    "a",
                    EventKind::Info,
                    TelemetryError::sink_write("a", "disk full"),
                ),
                SinkFailure::new(
                    "b",
                    EventKind::Info,
                    TelemetryError::sink_write("b", "closed"),
                ),
            ],
        };

        let message = err.to_string();
        assert!(message.starts_with("dispatch failed for 2 sink(s)"));
        assert!(message.contains("a (info): sink 'a' write error: disk full"));
        assert!(message.contains("b (info)"));
        assert_eq!(err.failures().len(), 2);
        assert!(TelemetryError::sink_not_found("x").failures().is_empty());
    }
}
