//! Sink implementations
//!
//! Contains ConsoleSink, TracingSink, and TelemetrySink.

mod console;
mod log;
mod telemetry;

pub use self::console::{ConsoleSink, CONSOLE_SINK_NAME};
pub use self::log::{TracingSink, TRACING_SINK_NAME};
pub use self::telemetry::{stringify_properties, TelemetrySink, TELEMETRY_SINK_NAME};
