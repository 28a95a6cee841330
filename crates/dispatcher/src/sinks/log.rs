//! TracingSink - forwards events into `tracing`

use contracts::{LevelCell, LogLevel, MetricStats, Properties, Sink, TelemetryError};
use tracing::{debug, error, info, trace, warn};

/// Default registry name
pub const TRACING_SINK_NAME: &str = "tracing";

/// Sink that re-emits events as `tracing` records
///
/// verbose maps to DEBUG and debug to TRACE; event and metric are INFO.
pub struct TracingSink {
    name: String,
    level: LevelCell,
}

impl TracingSink {
    /// Create a new TracingSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            level: LevelCell::new(LogLevel::NONE),
        }
    }

    pub fn with_level(self, level: LogLevel) -> Self {
        self.level.set(level);
        self
    }
}

impl Default for TracingSink {
    fn default() -> Self {
        Self::new(TRACING_SINK_NAME)
    }
}

fn render(data: Option<&Properties>) -> Option<String> {
    data.map(|d| serde_json::Value::Object(d.clone()).to_string())
}

impl Sink for TracingSink {
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
        let data = render(data);
        error!(sink = %self.name, data = data.as_deref(), "{message}");
        Ok(())
    }

    fn warn(&self, message: &str, data: Option<&Properties>) -> Result<(), TelemetryError> {
        let data = render(data);
        warn!(sink = %self.name, data = data.as_deref(), "{message}");
        Ok(())
    }

    fn info(&self, message: &str, data: Option<&Properties>) -> Result<(), TelemetryError> {
        let data = render(data);
        info!(sink = %self.name, data = data.as_deref(), "{message}");
        Ok(())
    }

    fn verbose(&self, message: &str, data: Option<&Properties>) -> Result<(), TelemetryError> {
        let data = render(data);
        debug!(sink = %self.name, data = data.as_deref(), "{message}");
        Ok(())
    }

    fn debug(&self, message: &str, data: Option<&Properties>) -> Result<(), TelemetryError> {
        let data = render(data);
        trace!(sink = %self.name, data = data.as_deref(), "{message}");
        Ok(())
    }

    fn event(
        &self,
        name: &str,
        duration_ms: f64,
        data: Option<&Properties>,
    ) -> Result<(), TelemetryError> {
        let data = render(data);
        info!(
            sink = %self.name,
            event = name,
            duration_ms,
            data = data.as_deref(),
            "Event"
        );
        Ok(())
    }

    fn metric(
        &self,
        name: &str,
        value: f64,
        stats: MetricStats,
        data: Option<&Properties>,
    ) -> Result<(), TelemetryError> {
        let data = render(data);
        info!(
            sink = %self.name,
            metric = name,
            value,
            count = stats.count,
            min = stats.min,
            max = stats.max,
            data = data.as_deref(),
            "Metric"
        );
        Ok(())
    }

    fn exception(
        &self,
        error: &dyn std::error::Error,
        data: Option<&Properties>,
    ) -> Result<(), TelemetryError> {
        let data = render(data);
        error!(
            sink = %self.name,
            error = %error,
            data = data.as_deref(),
            "Exception"
        );
        Ok(())
    }
}
