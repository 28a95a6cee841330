//! Logger - sink registry and level-filtered fan-out

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, instrument, warn};

use contracts::{
    EventKind, LevelCell, LogLevel, LoggerConfig, MetricStats, Properties, Sink, SinkConfig,
    SinkFailure, SinkType, TelemetryClient, TelemetryError,
};
use observability::metrics::{record_event_dispatched, record_event_filtered, record_sink_failure};

use crate::registry::SinkRegistry;
use crate::sinks::{ConsoleSink, TelemetrySink, TracingSink};

/// Named dispatcher that forwards events to the sinks enabled for them.
///
/// Sinks are visited in insertion order. A `Logger` is itself a [`Sink`],
/// so one logger can be registered inside another.
///
/// Every sink whose level contains the event's bit is called, even when an
/// earlier sink failed. Failures are collected and returned together as
/// [`TelemetryError::Dispatch`].
pub struct Logger {
    name: String,
    level: LevelCell,
    sinks: RwLock<SinkRegistry>,
}

impl Logger {
    /// Create an empty logger at [`LogLevel::default_global`]
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_level(name, LogLevel::default_global())
    }

    /// Create an empty logger at `level`
    pub fn with_level(name: impl Into<String>, level: LogLevel) -> Self {
        Self {
            name: name.into(),
            level: LevelCell::new(level),
            sinks: RwLock::new(SinkRegistry::default()),
        }
    }

    /// Create a logger and add `sinks` in order.
    ///
    /// `level` defaults to [`LogLevel::default_global`]; it is applied
    /// before the sinks are added so they inherit it.
    pub fn with_sinks(
        name: impl Into<String>,
        sinks: impl IntoIterator<Item = Arc<dyn Sink>>,
        level: Option<LogLevel>,
    ) -> Result<Self, TelemetryError> {
        let logger = Self::with_level(name, level.unwrap_or(LogLevel::default_global()));
        for sink in sinks {
            logger.add_sink(sink)?;
        }
        Ok(logger)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // ===== Registry =====

    /// Register a sink.
    ///
    /// A sink whose level is [`LogLevel::NONE`] takes the logger's current
    /// level. Later changes to the logger level are not bound to it.
    ///
    /// # Errors
    /// [`TelemetryError::DuplicateSink`] if the name is already registered,
    /// [`TelemetryError::Config`] if `sink` is this logger.
    #[instrument(
        name = "logger_add_sink",
        skip(self, sink),
        fields(logger = %self.name, sink = %sink.name())
    )]
    pub fn add_sink(&self, sink: Arc<dyn Sink>) -> Result<(), TelemetryError> {
        if std::ptr::addr_eq(Arc::as_ptr(&sink), self as *const Self) {
            return Err(TelemetryError::config(
                format!("sinks[name={}]", sink.name()),
                "a logger cannot be registered as its own sink",
            ));
        }

        let inherit = sink.level().is_none();
        self.sinks.write().insert(Arc::clone(&sink))?;

        // Outside the registry lock: a nested logger cascades into its own sinks
        if inherit {
            sink.set_level(self.level());
        }
        debug!(level = %sink.level(), "Sink added");
        Ok(())
    }

    /// Unregister a sink, returning it.
    ///
    /// # Errors
    /// [`TelemetryError::SinkNotFound`] if no sink has that name.
    #[instrument(name = "logger_remove_sink", skip(self), fields(logger = %self.name))]
    pub fn remove_sink(&self, name: &str) -> Result<Arc<dyn Sink>, TelemetryError> {
        let removed = self.sinks.write().remove(name)?;
        debug!(sink = %name, "Sink removed");
        Ok(removed)
    }

    pub fn has_sink(&self, name: &str) -> bool {
        self.sinks.read().contains(name)
    }

    pub fn sink(&self, name: &str) -> Option<Arc<dyn Sink>> {
        self.sinks.read().get(name).cloned()
    }

    /// Registered sink names in insertion order (owned copy)
    pub fn sink_ids(&self) -> Vec<String> {
        self.sinks.read().names()
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.read().len()
    }

    // ===== Global level =====

    /// The logger's own level
    pub fn level(&self) -> LogLevel {
        self.level.get()
    }

    /// Set the logger level and overwrite every registered sink's level.
    pub fn set_level(&self, level: LogLevel) {
        let registry = self.sinks.read();
        self.level.set(level);
        for sink in registry.iter() {
            sink.set_level(level);
        }
        debug!(logger = %self.name, %level, sinks = registry.len(), "Level cascaded");
    }

    /// Add `bits` to the logger level and cascade the result.
    pub fn enable_level(&self, bits: LogLevel) {
        self.set_level(self.level().union(bits));
    }

    /// Remove `bits` from the logger level and cascade the result.
    pub fn disable_level(&self, bits: LogLevel) {
        self.set_level(self.level().subtract(bits));
    }

    // ===== Per-sink level =====

    /// Level of one registered sink
    pub fn sink_level(&self, name: &str) -> Result<LogLevel, TelemetryError> {
        self.sinks
            .read()
            .get(name)
            .map(|sink| sink.level())
            .ok_or_else(|| TelemetryError::sink_not_found(name))
    }

    /// Set the level of one sink; the logger level is left alone.
    pub fn set_sink_level(&self, name: &str, level: LogLevel) -> Result<(), TelemetryError> {
        let registry = self.sinks.read();
        let sink = registry
            .get(name)
            .ok_or_else(|| TelemetryError::sink_not_found(name))?;
        sink.set_level(level);
        debug!(logger = %self.name, sink = %name, %level, "Sink level set");
        Ok(())
    }

    pub fn enable_sink_level(&self, name: &str, bits: LogLevel) -> Result<(), TelemetryError> {
        let current = self.sink_level(name)?;
        self.set_sink_level(name, current.union(bits))
    }

    pub fn disable_sink_level(&self, name: &str, bits: LogLevel) -> Result<(), TelemetryError> {
        let current = self.sink_level(name)?;
        self.set_sink_level(name, current.subtract(bits))
    }

    // ===== Fan-out =====

    fn dispatch<F>(&self, kind: EventKind, action: F) -> Result<(), TelemetryError>
    where
        F: Fn(&dyn Sink) -> Result<(), TelemetryError>,
    {
        let bit = kind.level();
        // Lock is released before any sink runs, so sinks may call back in.
        let sinks = self.sinks.read().snapshot();
        let mut failures = Vec::new();

        for sink in &sinks {
            if !sink.level().contains(bit) {
                record_event_filtered(kind);
                continue;
            }

            match action(sink.as_ref()) {
                Ok(()) => record_event_dispatched(sink.name(), kind),
                Err(e) => {
                    record_sink_failure(sink.name(), kind);
                    warn!(
                        logger = %self.name,
                        sink = %sink.name(),
                        kind = %kind,
                        error = %e,
                        "Sink failed during dispatch"
                    );
                    failures.push(SinkFailure::new(sink.name(), kind, e));
                }
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(TelemetryError::Dispatch { failures })
        }
    }
}

impl Sink for Logger {
    fn name(&self) -> &str {
        &self.name
    }

    fn level(&self) -> LogLevel {
        Logger::level(self)
    }

    /// Nested loggers cascade like a global `set_level`.
    fn set_level(&self, level: LogLevel) {
        Logger::set_level(self, level);
    }

    fn error(&self, message: &str, data: Option<&Properties>) -> Result<(), TelemetryError> {
        self.dispatch(EventKind::Error, |s| s.error(message, data))
    }

    fn warn(&self, message: &str, data: Option<&Properties>) -> Result<(), TelemetryError> {
        self.dispatch(EventKind::Warn, |s| s.warn(message, data))
    }

    fn info(&self, message: &str, data: Option<&Properties>) -> Result<(), TelemetryError> {
        self.dispatch(EventKind::Info, |s| s.info(message, data))
    }

    fn verbose(&self, message: &str, data: Option<&Properties>) -> Result<(), TelemetryError> {
        self.dispatch(EventKind::Verbose, |s| s.verbose(message, data))
    }

    fn debug(&self, message: &str, data: Option<&Properties>) -> Result<(), TelemetryError> {
        self.dispatch(EventKind::Debug, |s| s.debug(message, data))
    }

    fn event(
        &self,
        name: &str,
        duration_ms: f64,
        data: Option<&Properties>,
    ) -> Result<(), TelemetryError> {
        self.dispatch(EventKind::Event, |s| s.event(name, duration_ms, data))
    }

    fn metric(
        &self,
        name: &str,
        value: f64,
        stats: MetricStats,
        data: Option<&Properties>,
    ) -> Result<(), TelemetryError> {
        self.dispatch(EventKind::Metric, |s| s.metric(name, value, stats, data))
    }

    fn exception(
        &self,
        error: &dyn std::error::Error,
        data: Option<&Properties>,
    ) -> Result<(), TelemetryError> {
        self.dispatch(EventKind::Exception, |s| s.exception(error, data))
    }
}

/// Create a sink from configuration. The sink keeps its configured level,
/// or `LogLevel::NONE` so that `Logger::add_sink` can hand it the logger level.
#[instrument(
    name = "logger_create_sink",
    skip(config, client),
    fields(sink = %config.name, sink_type = ?config.sink_type)
)]
pub fn create_sink(
    config: &SinkConfig,
    client: Option<&Arc<dyn TelemetryClient>>,
) -> Result<Arc<dyn Sink>, TelemetryError> {
    let level = config.initial_level();
    let sink: Arc<dyn Sink> = match config.sink_type {
        SinkType::Console => Arc::new(ConsoleSink::from_params(
            &config.name,
            level,
            &config.params,
        )?),
        SinkType::Tracing => Arc::new(TracingSink::new(&config.name).with_level(level)),
        SinkType::Telemetry => {
            let client = client.ok_or_else(|| {
                TelemetryError::config(
                    format!("sinks[name={}]", config.name),
                    "telemetry sink configured but no telemetry client was provided",
                )
            })?;
            Arc::new(TelemetrySink::from_params(
                &config.name,
                level,
                &config.params,
                Arc::clone(client),
            )?)
        }
    };
    Ok(sink)
}

/// Build a logger from configuration.
///
/// Telemetry sinks share `client`; it may be `None` when no telemetry sink
/// is configured.
#[instrument(name = "logger_create", skip(config, client), fields(logger = %config.name))]
pub fn create_logger(
    config: &LoggerConfig,
    client: Option<Arc<dyn TelemetryClient>>,
) -> Result<Logger, TelemetryError> {
    let logger = Logger::with_level(&config.name, config.level);
    for sink_config in &config.sinks {
        logger.add_sink(create_sink(sink_config, client.as_ref())?)?;
    }
    debug!(sinks = logger.sink_count(), "Logger created");
    Ok(logger)
}
