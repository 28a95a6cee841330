//! Telemetry backend contract
//!
//! `Envelope` is the unit a telemetry sink hands to its backend client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::TelemetryError;

/// Backend severity code for trace submissions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum SeverityLevel {
    Verbose = 0,
    Info = 1,
    Warning = 2,
    Error = 3,
}

impl From<SeverityLevel> for u8 {
    fn from(level: SeverityLevel) -> Self {
        level as u8
    }
}

impl TryFrom<u8> for SeverityLevel {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, <Self as TryFrom<u8>>::Error> {
        match code {
            0 => Ok(Self::Verbose),
            1 => Ok(Self::Info),
            2 => Ok(Self::Warning),
            3 => Ok(Self::Error),
            other => Err(format!("invalid severity code {other}")),
        }
    }
}

/// One submission to the telemetry backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Backend access key the submission is routed with
    pub access_key: String,
    /// Session the submitting sink belongs to
    pub session_id: String,
    pub time: DateTime<Utc>,
    pub payload: Payload,
}

/// Submission kinds, with every property already stringified
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Payload {
    Trace {
        message: String,
        severity: SeverityLevel,
        properties: BTreeMap<String, String>,
    },
    Event {
        name: String,
        properties: BTreeMap<String, String>,
    },
    Metric {
        name: String,
        value: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        count: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
        properties: BTreeMap<String, String>,
    },
    Exception {
        message: String,
        /// `source()` chain, outermost first
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        causes: Vec<String>,
        properties: BTreeMap<String, String>,
    },
}

impl Payload {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Trace { .. } => "trace",
            Self::Event { .. } => "event",
            Self::Metric { .. } => "metric",
            Self::Exception { .. } => "exception",
        }
    }
}

/// Client that ships envelopes to a telemetry backend
///
/// Submission must not block on backend I/O; implementations queue or
/// buffer and return.
pub trait TelemetryClient: Send + Sync {
    fn submit(&self, envelope: Envelope) -> Result<(), TelemetryError>;
}
