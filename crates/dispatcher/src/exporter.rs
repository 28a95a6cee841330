//! EnvelopeExporter - async output side of the telemetry pipeline
//!
//! An exporter runs inside an [`ExporterHandle`](crate::ExporterHandle)
//! worker and receives the envelopes queued by a `ChannelClient`.

use std::path::Path;

use contracts::{Envelope, TelemetryError};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter, Stdout};
use tracing::{debug, instrument};

/// Envelope output trait
#[trait_variant::make(EnvelopeExporter: Send)]
pub trait LocalEnvelopeExporter {
    /// Exporter name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Write one envelope
    ///
    /// # Errors
    /// Returns write error (should include context)
    async fn export(&mut self, envelope: &Envelope) -> Result<(), TelemetryError>;

    /// Flush buffer (if any)
    async fn flush(&mut self) -> Result<(), TelemetryError>;

    /// Close exporter
    async fn close(&mut self) -> Result<(), TelemetryError>;
}

/// Exporter writing one JSON document per line
pub struct JsonLinesExporter<W> {
    name: String,
    writer: BufWriter<W>,
}

impl<W: AsyncWrite + Unpin + Send> JsonLinesExporter<W> {
    pub fn new(name: impl Into<String>, writer: W) -> Self {
        Self {
            name: name.into(),
            writer: BufWriter::new(writer),
        }
    }
}

impl JsonLinesExporter<Stdout> {
    /// Exporter writing to the process stdout
    pub fn stdout(name: impl Into<String>) -> Self {
        Self::new(name, tokio::io::stdout())
    }
}

impl JsonLinesExporter<File> {
    /// Exporter appending to `path`, creating the file if needed
    #[instrument(name = "json_lines_exporter_create", skip(name, path), fields(path = %path.as_ref().display()))]
    pub async fn create(name: impl Into<String>, path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path.as_ref())
            .await?;
        debug!("Envelope output file opened");
        Ok(Self::new(name, file))
    }
}

impl<W: AsyncWrite + Unpin + Send> EnvelopeExporter for JsonLinesExporter<W> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn export(&mut self, envelope: &Envelope) -> Result<(), TelemetryError> {
        let mut line = serde_json::to_vec(envelope)
            .map_err(|e| TelemetryError::sink_write(&self.name, format!("json error: {e}")))?;
        line.push(b'\n');
        self.writer.write_all(&line).await?;
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), TelemetryError> {
        self.writer.flush().await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), TelemetryError> {
        self.writer.shutdown().await?;
        debug!(exporter = %self.name, "JsonLinesExporter closed");
        Ok(())
    }
}
