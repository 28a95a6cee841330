//! `emit` command implementation.

use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use contracts::{MetricStats, Properties, Sink, SinkType, TelemetryClient, TelemetryError};
use dispatcher::{create_logger, ExporterHandle, JsonLinesExporter, Logger};

use crate::cli::{EmitArgs, EmitKind};

/// Error value handed to sinks for `emit exception`
#[derive(Debug, Error)]
#[error("{0}")]
struct ReportedError(String);

/// Execute the `emit` command
pub async fn run_emit(args: &EmitArgs) -> Result<()> {
    info!(config = %args.config.display(), kind = ?args.kind, "Emitting event");

    let config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    let needs_client = config
        .sinks
        .iter()
        .any(|s| s.sink_type == SinkType::Telemetry);
    let exporter = if needs_client {
        Some(spawn_exporter(args).await?)
    } else {
        None
    };

    let client = exporter
        .as_ref()
        .map(|handle| Arc::new(handle.client()) as Arc<dyn TelemetryClient>);
    let logger = create_logger(&config, client).context("Failed to build logger")?;

    let data = build_properties(&args.data);
    let result = emit(&logger, args, (!data.is_empty()).then_some(&data));

    // Envelopes still queued are written before exit
    if let Some(handle) = exporter {
        let metrics = Arc::clone(handle.metrics());
        handle.shutdown().await;
        let snapshot = metrics.snapshot();
        info!(
            exported = snapshot.export_count,
            failed = snapshot.failure_count,
            dropped = snapshot.dropped_count,
            "Telemetry exporter drained"
        );
    }

    if let Err(TelemetryError::Dispatch { failures }) = &result {
        for failure in failures {
            warn!(sink = %failure.sink_name, error = %failure.error, "Sink failed");
        }
    }
    result.context("Event was not delivered to every enabled sink")
}

async fn spawn_exporter(args: &EmitArgs) -> Result<ExporterHandle> {
    let handle = match &args.output {
        Some(path) => {
            let exporter = JsonLinesExporter::create("file", path)
                .await
                .with_context(|| format!("Failed to open output file {}", path.display()))?;
            ExporterHandle::spawn(exporter, args.queue_capacity)
        }
        None => ExporterHandle::spawn(JsonLinesExporter::stdout("stdout"), args.queue_capacity),
    };
    Ok(handle)
}

fn emit(logger: &Logger, args: &EmitArgs, data: Option<&Properties>) -> Result<(), TelemetryError> {
    let message = args.message.as_str();
    match args.kind {
        EmitKind::Error => logger.error(message, data),
        EmitKind::Warn => logger.warn(message, data),
        EmitKind::Info => logger.info(message, data),
        EmitKind::Verbose => logger.verbose(message, data),
        EmitKind::Debug => logger.debug(message, data),
        EmitKind::Event => logger.event(message, args.duration, data),
        EmitKind::Metric => logger.metric(
            message,
            args.value,
            MetricStats {
                count: args.count,
                min: args.min,
                max: args.max,
            },
            data,
        ),
        EmitKind::Exception => logger.exception(&ReportedError(args.message.clone()), data),
    }
}

/// Values that parse as JSON keep their type; anything else is a string.
fn build_properties(pairs: &[(String, String)]) -> Properties {
    pairs
        .iter()
        .map(|(key, raw)| {
            let value =
                serde_json::from_str::<Value>(raw).unwrap_or_else(|_| Value::String(raw.clone()));
            (key.clone(), value)
        })
        .collect()
}
