//! Sink trait - Logger output interface
//!
//! Defines the capability every output destination must provide.

use crate::{LogLevel, TelemetryError};

/// Structured data attached to an event
pub type Properties = serde_json::Map<String, serde_json::Value>;

/// Optional aggregate figures reported alongside a metric value
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MetricStats {
    pub count: Option<u64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Event output trait
///
/// All sink implementations must implement this trait. A sink called
/// directly always performs its action; `level` only decides whether a
/// `Logger` forwards to it.
pub trait Sink: Send + Sync {
    /// Registry key, fixed at construction
    fn name(&self) -> &str;

    /// Current level mask
    fn level(&self) -> LogLevel;

    /// Replace the level mask
    fn set_level(&self, level: LogLevel);

    /// Add `bits` to the level mask
    fn enable_level(&self, bits: LogLevel) {
        self.set_level(self.level().union(bits));
    }

    /// Remove `bits` from the level mask
    fn disable_level(&self, bits: LogLevel) {
        self.set_level(self.level().subtract(bits));
    }

    fn error(&self, message: &str, data: Option<&Properties>) -> Result<(), TelemetryError>;

    fn warn(&self, message: &str, data: Option<&Properties>) -> Result<(), TelemetryError>;

    fn info(&self, message: &str, data: Option<&Properties>) -> Result<(), TelemetryError>;

    fn verbose(&self, message: &str, data: Option<&Properties>) -> Result<(), TelemetryError>;

    fn debug(&self, message: &str, data: Option<&Properties>) -> Result<(), TelemetryError>;

    /// Record a named event that took `duration_ms` milliseconds
    fn event(
        &self,
        name: &str,
        duration_ms: f64,
        data: Option<&Properties>,
    ) -> Result<(), TelemetryError>;

    /// Record a metric sample
    fn metric(
        &self,
        name: &str,
        value: f64,
        stats: MetricStats,
        data: Option<&Properties>,
    ) -> Result<(), TelemetryError>;

    /// Record a fault
    fn exception(
        &self,
        error: &dyn std::error::Error,
        data: Option<&Properties>,
    ) -> Result<(), TelemetryError>;
}
