//! # Dispatcher
//!
//! Level-filtered log and telemetry fan-out.
//!
//! Responsibilities:
//! - `Logger`: named sink registry with a global level and per-sink levels
//! - Built-in sinks: console, tracing and telemetry
//! - Telemetry clients, including a queued exporter pipeline that keeps slow
//!   outputs off the calling thread

pub mod client;
pub mod dispatcher;
pub mod exporter;
pub mod handle;
pub mod metrics;
mod registry;
pub mod sinks;

pub use client::MemoryClient;
pub use contracts::{
    Envelope, EventKind, LogLevel, LoggerConfig, MetricStats, Payload, Properties, Sink,
    SinkConfig, SinkType, TelemetryClient, TelemetryError,
};
pub use dispatcher::{create_logger, create_sink, Logger};
pub use exporter::{EnvelopeExporter, JsonLinesExporter, LocalEnvelopeExporter};
pub use handle::{ChannelClient, ExporterHandle};
pub use metrics::{ExporterMetrics, MetricsSnapshot};
pub use sinks::{ConsoleSink, TelemetrySink, TracingSink};
