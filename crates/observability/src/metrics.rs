//! Dispatch metrics
//!
//! Thin wrappers over the `metrics` facade. Without an installed recorder
//! every call is a no-op.

use contracts::EventKind;
use metrics::{counter, gauge};

/// Record an event delivered to a sink
pub fn record_event_dispatched(sink_name: &str, kind: EventKind) {
    counter!(
        "telemetry_events_dispatched_total",
        "sink" => sink_name.to_string(),
        "kind" => kind.as_str()
    )
    .increment(1);
}

/// Record a sink returning an error for an event
pub fn record_sink_failure(sink_name: &str, kind: EventKind) {
    counter!(
        "telemetry_sink_failures_total",
        "sink" => sink_name.to_string(),
        "kind" => kind.as_str()
    )
    .increment(1);
}

/// Record an event skipped because a sink's level excluded it
pub fn record_event_filtered(kind: EventKind) {
    counter!("telemetry_events_filtered_total", "kind" => kind.as_str()).increment(1);
}

/// Record the outcome of one envelope export
pub fn record_envelope_exported(exporter: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "telemetry_envelopes_exported_total",
        "exporter" => exporter.to_string(),
        "status" => status
    )
    .increment(1);
}

/// Record an envelope dropped because the exporter queue was full
pub fn record_envelope_dropped(exporter: &str) {
    counter!(
        "telemetry_envelopes_dropped_total",
        "exporter" => exporter.to_string()
    )
    .increment(1);
}

/// Record exporter queue depth
pub fn record_queue_depth(exporter: &str, depth: usize) {
    gauge!(
        "telemetry_exporter_queue_depth",
        "exporter" => exporter.to_string()
    )
    .set(depth as f64);
}
