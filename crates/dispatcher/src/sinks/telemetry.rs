//! TelemetrySink - converts events into backend envelopes

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::Utc;
use contracts::{
    Envelope, LevelCell, LogLevel, MetricStats, Payload, Properties, SeverityLevel, Sink,
    TelemetryClient, TelemetryError,
};
use tracing::debug;
use uuid::Uuid;

/// Default registry name
pub const TELEMETRY_SINK_NAME: &str = "appInsights";

/// Sink that submits every event to a telemetry backend client
///
/// Each instance draws a random session id at construction and stamps it on
/// every envelope it submits.
pub struct TelemetrySink {
    name: String,
    level: LevelCell,
    access_key: String,
    session_id: String,
    client: Arc<dyn TelemetryClient>,
}

impl TelemetrySink {
    /// Create a TelemetrySink named [`TELEMETRY_SINK_NAME`]
    ///
    /// # Errors
    /// [`TelemetryError::Config`] when `access_key` is empty or blank.
    pub fn new(
        access_key: impl Into<String>,
        client: Arc<dyn TelemetryClient>,
    ) -> Result<Self, TelemetryError> {
        Self::with_name(TELEMETRY_SINK_NAME, access_key, client)
    }

    /// Create a TelemetrySink with a custom name
    pub fn with_name(
        name: impl Into<String>,
        access_key: impl Into<String>,
        client: Arc<dyn TelemetryClient>,
    ) -> Result<Self, TelemetryError> {
        let name = name.into();
        let access_key = access_key.into();
        if access_key.trim().is_empty() {
            return Err(TelemetryError::config(
                format!("sinks[name={name}].params.access_key"),
                "telemetry access key is required",
            ));
        }

        let session_id = Uuid::new_v4().to_string();
        debug!(sink = %name, session_id = %session_id, "TelemetrySink created");

        Ok(Self {
            name,
            level: LevelCell::new(LogLevel::NONE),
            access_key,
            session_id,
            client,
        })
    }

    /// Create from params (for factory)
    ///
    /// Requires an `access_key` param.
    pub fn from_params(
        name: impl Into<String>,
        level: LogLevel,
        params: &HashMap<String, String>,
        client: Arc<dyn TelemetryClient>,
    ) -> Result<Self, TelemetryError> {
        let name = name.into();
        let access_key = params.get("access_key").cloned().unwrap_or_default();
        let sink = Self::with_name(name, access_key, client)?;
        Ok(sink.with_level(level))
    }

    pub fn with_level(self, level: LogLevel) -> Self {
        self.level.set(level);
        self
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    fn submit(&self, payload: Payload) -> Result<(), TelemetryError> {
        self.client.submit(Envelope {
            access_key: self.access_key.clone(),
            session_id: self.session_id.clone(),
            time: Utc::now(),
            payload,
        })
    }

    fn trace(
        &self,
        message: &str,
        severity: SeverityLevel,
        data: Option<&Properties>,
    ) -> Result<(), TelemetryError> {
        self.submit(Payload::Trace {
            message: message.to_string(),
            severity,
            properties: stringify_properties(data),
        })
    }
}

/// Flatten structured data to string values.
///
/// Strings are kept verbatim; every other value becomes its JSON text.
pub fn stringify_properties(data: Option<&Properties>) -> BTreeMap<String, String> {
    data.into_iter()
        .flatten()
        .map(|(key, value)| {
            let text = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (key.clone(), text)
        })
        .collect()
}

impl Sink for TelemetrySink {
    fn name(&self) -> &str {
        &self.name
    }

    fn level(&self) -> LogLevel {
        self.level.get()
    }

    fn set_level(&self, level: LogLevel) {
        self.level.set(level);
    }

    fn error(&self, message: &str, data: Option<&Properties>) -> Result<(), TelemetryError> {
        self.trace(message, SeverityLevel::Error, data)
    }

    fn warn(&self, message: &str, data: Option<&Properties>) -> Result<(), TelemetryError> {
        self.trace(message, SeverityLevel::Warning, data)
    }

    fn info(&self, message: &str, data: Option<&Properties>) -> Result<(), TelemetryError> {
        self.trace(message, SeverityLevel::Info, data)
    }

    fn verbose(&self, message: &str, data: Option<&Properties>) -> Result<(), TelemetryError> {
        self.trace(message, SeverityLevel::Verbose, data)
    }

    // The backend has no debug severity
    fn debug(&self, message: &str, data: Option<&Properties>) -> Result<(), TelemetryError> {
        self.trace(message, SeverityLevel::Verbose, data)
    }

    fn event(
        &self,
        name: &str,
        duration_ms: f64,
        data: Option<&Properties>,
    ) -> Result<(), TelemetryError> {
        let mut properties = stringify_properties(data);
        properties.insert("duration".to_string(), duration_ms.to_string());
        self.submit(Payload::Event {
            name: name.to_string(),
            properties,
        })
    }

    fn metric(
        &self,
        name: &str,
        value: f64,
        stats: MetricStats,
        data: Option<&Properties>,
    ) -> Result<(), TelemetryError> {
        self.submit(Payload::Metric {
            name: name.to_string(),
            value,
            count: stats.count,
            min: stats.min,
            max: stats.max,
            properties: stringify_properties(data),
        })
    }

    fn exception(
        &self,
        error: &dyn std::error::Error,
        data: Option<&Properties>,
    ) -> Result<(), TelemetryError> {
        let causes = std::iter::successors(error.source(), |e| e.source())
            .map(|e| e.to_string())
            .collect();
        self.submit(Payload::Exception {
            message: error.to_string(),
            causes,
            properties: stringify_properties(data),
        })
    }
}
