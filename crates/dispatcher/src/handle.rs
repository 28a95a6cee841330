//! ExporterHandle - runs an exporter behind an isolated queue and worker task

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument, warn};

use contracts::{Envelope, TelemetryClient, TelemetryError};
use observability::metrics::{record_envelope_dropped, record_envelope_exported, record_queue_depth};

use crate::exporter::EnvelopeExporter;
use crate::metrics::ExporterMetrics;

/// Handle to a running exporter worker
///
/// Dropping the handle without calling [`shutdown`](Self::shutdown) also
/// closes the queue; the worker drains what is left and exits.
pub struct ExporterHandle {
    /// Exporter name
    name: String,
    /// Channel to send envelopes to worker
    tx: mpsc::Sender<Envelope>,
    /// Shared metrics
    metrics: Arc<ExporterMetrics>,
    /// Asks the worker to close the queue and drain it
    shutdown_tx: oneshot::Sender<()>,
    /// Worker task handle
    worker_handle: JoinHandle<()>,
}

impl ExporterHandle {
    /// Create a new ExporterHandle and spawn the worker task
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<E: EnvelopeExporter + Send + 'static>(exporter: E, queue_capacity: usize) -> Self {
        let name = exporter.name().to_string();
        let (tx, rx) = mpsc::channel(queue_capacity);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let metrics = Arc::new(ExporterMetrics::new());

        let worker_metrics = Arc::clone(&metrics);
        let worker_name = name.clone();

        let worker_handle = tokio::spawn(async move {
            exporter_worker(exporter, rx, shutdown_rx, worker_metrics, worker_name).await;
        });

        Self {
            name,
            tx,
            metrics,
            shutdown_tx,
            worker_handle,
        }
    }

    /// Get exporter name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get current metrics
    pub fn metrics(&self) -> &Arc<ExporterMetrics> {
        &self.metrics
    }

    /// Telemetry client feeding this exporter's queue
    pub fn client(&self) -> ChannelClient {
        ChannelClient {
            name: self.name.clone(),
            tx: self.tx.clone(),
            metrics: Arc::clone(&self.metrics),
        }
    }

    /// Shutdown the exporter worker gracefully
    ///
    /// Envelopes already queued are exported before this returns; later
    /// submissions through any [`ChannelClient`] fail.
    #[instrument(name = "exporter_handle_shutdown", skip(self), fields(exporter = %self.name))]
    pub async fn shutdown(self) {
        // Worker may already be gone
        let _ = self.shutdown_tx.send(());
        drop(self.tx);
        if let Err(e) = self.worker_handle.await {
            error!(exporter = %self.name, error = ?e, "Worker task panicked");
        }
        debug!(exporter = %self.name, "ExporterHandle shutdown complete");
    }
}

/// Telemetry client that queues envelopes for an [`ExporterHandle`]
///
/// Submission never waits: when the queue is full the envelope is dropped
/// and counted.
#[derive(Clone)]
pub struct ChannelClient {
    name: String,
    tx: mpsc::Sender<Envelope>,
    metrics: Arc<ExporterMetrics>,
}

impl TelemetryClient for ChannelClient {
    fn submit(&self, envelope: Envelope) -> Result<(), TelemetryError> {
        match self.tx.try_send(envelope) {
            Ok(()) => {
                let depth = self.tx.max_capacity() - self.tx.capacity();
                self.metrics.set_queue_len(depth);
                record_queue_depth(&self.name, depth);
                Ok(())
            }
            Err(mpsc::error::TrySendError::Full(dropped)) => {
                self.metrics.inc_dropped_count();
                record_envelope_dropped(&self.name);
                warn!(
                    exporter = %self.name,
                    kind = dropped.payload.kind(),
                    "Queue full, envelope dropped"
                );
                Ok(())
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(TelemetryError::sink_write(
                &self.name,
                "exporter worker has shut down",
            )),
        }
    }
}

/// Worker task that consumes envelopes and writes to the exporter
#[instrument(
    name = "exporter_worker_loop",
    skip(exporter, rx, shutdown_rx, metrics),
    fields(exporter = %name)
)]
async fn exporter_worker<E: EnvelopeExporter>(
    mut exporter: E,
    mut rx: mpsc::Receiver<Envelope>,
    mut shutdown_rx: oneshot::Receiver<()>,
    metrics: Arc<ExporterMetrics>,
    name: String,
) {
    debug!(exporter = %name, "Exporter worker started");

    loop {
        tokio::select! {
            received = rx.recv() => match received {
                Some(envelope) => {
                    metrics.set_queue_len(rx.len());
                    record_queue_depth(&name, rx.len());
                    export_one(&mut exporter, &envelope, &metrics, &name).await;
                }
                None => break,
            },
            _ = &mut shutdown_rx => {
                rx.close();
                while let Some(envelope) = rx.recv().await {
                    metrics.set_queue_len(rx.len());
                    record_queue_depth(&name, rx.len());
                    export_one(&mut exporter, &envelope, &metrics, &name).await;
                }
                break;
            }
        }
    }

    // Cleanup
    if let Err(e) = exporter.flush().await {
        error!(exporter = %name, error = %e, "Flush failed on shutdown");
    }
    if let Err(e) = exporter.close().await {
        error!(exporter = %name, error = %e, "Close failed on shutdown");
    }

    debug!(exporter = %name, "Exporter worker stopped");
}

async fn export_one<E: EnvelopeExporter>(
    exporter: &mut E,
    envelope: &Envelope,
    metrics: &ExporterMetrics,
    name: &str,
) {
    match exporter.export(envelope).await {
        Ok(()) => {
            metrics.inc_export_count();
            record_envelope_exported(name, true);
        }
        Err(e) => {
            metrics.inc_failure_count();
            record_envelope_exported(name, false);
            error!(
                exporter = %name,
                kind = envelope.payload.kind(),
                error = %e,
                "Export failed"
            );
            // Continue processing - don't crash on single failure
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use contracts::{Payload, SeverityLevel};
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicU64, Ordering};
    use tokio::time::{sleep, Duration};

    /// Mock exporter for testing
    struct MockExporter {
        name: String,
        export_count: Arc<AtomicU64>,
        should_fail: bool,
        delay_ms: u64,
    }

    impl MockExporter {
        fn new(name: &str, export_count: &Arc<AtomicU64>) -> Self {
            Self {
                name: name.to_string(),
                export_count: Arc::clone(export_count),
                should_fail: false,
                delay_ms: 0,
            }
        }
    }

    impl EnvelopeExporter for MockExporter {
        fn name(&self) -> &str {
            &self.name
        }

        async fn export(&mut self, _envelope: &Envelope) -> Result<(), TelemetryError> {
            if self.delay_ms > 0 {
                sleep(Duration::from_millis(self.delay_ms)).await;
            }
            if self.should_fail {
                return Err(TelemetryError::sink_write(&self.name, "mock failure"));
            }
            self.export_count.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }

        async fn flush(&mut self) -> Result<(), TelemetryError> {
            Ok(())
        }

        async fn close(&mut self) -> Result<(), TelemetryError> {
            Ok(())
        }
    }

    fn envelope(i: u64) -> Envelope {
        Envelope {
            access_key: "key".to_string(),
            session_id: "session".to_string(),
            time: Utc::now(),
            payload: Payload::Trace {
                message: format!("message {i}"),
                severity: SeverityLevel::Info,
                properties: BTreeMap::new(),
            },
        }
    }

    #[tokio::test]
    async fn test_exporter_handle_basic() {
        let export_count = Arc::new(AtomicU64::new(0));
        let handle = ExporterHandle::spawn(MockExporter::new("test", &export_count), 10);
        let client = handle.client();

        for i in 0..5 {
            client.submit(envelope(i)).unwrap();
        }

        handle.shutdown().await;
        assert_eq!(export_count.load(Ordering::Relaxed), 5);
    }

    #[tokio::test]
    async fn test_exporter_handle_queue_full() {
        let export_count = Arc::new(AtomicU64::new(0));
        let exporter = MockExporter {
            delay_ms: 100, // Slow exporter
            ..MockExporter::new("slow", &export_count)
        };

        // Small queue capacity
        let handle = ExporterHandle::spawn(exporter, 2);
        let client = handle.client();

        // Send more than queue can hold; drops are not submission errors
        for i in 0..10 {
            assert!(client.submit(envelope(i)).is_ok());
        }

        assert!(handle.metrics().dropped_count() > 0);

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_submit_tracks_queue_depth() {
        let export_count = Arc::new(AtomicU64::new(0));
        let handle = ExporterHandle::spawn(MockExporter::new("depth", &export_count), 8);
        let client = handle.client();

        // Current-thread runtime: the worker has not run yet
        for i in 0..3 {
            client.submit(envelope(i)).unwrap();
        }
        assert_eq!(handle.metrics().queue_len(), 3);

        let metrics = Arc::clone(handle.metrics());
        handle.shutdown().await;
        assert_eq!(export_count.load(Ordering::Relaxed), 3);
        assert_eq!(metrics.snapshot().export_count, 3);
    }

    #[tokio::test]
    async fn test_exporter_handle_failure_isolation() {
        let exporter = MockExporter {
            should_fail: true,
            ..MockExporter::new("failing", &Arc::new(AtomicU64::new(0)))
        };

        let handle = ExporterHandle::spawn(exporter, 10);
        let client = handle.client();

        for i in 0..3 {
            client.submit(envelope(i)).unwrap();
        }

        // Give worker time to process
        sleep(Duration::from_millis(50)).await;

        assert_eq!(handle.metrics().failure_count(), 3);

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_drains_queue() {
        let export_count = Arc::new(AtomicU64::new(0));
        let exporter = MockExporter {
            delay_ms: 5,
            ..MockExporter::new("draining", &export_count)
        };
        let handle = ExporterHandle::spawn(exporter, 16);
        let client = handle.client();

        for i in 0..8 {
            client.submit(envelope(i)).unwrap();
        }
        let metrics = Arc::clone(handle.metrics());
        handle.shutdown().await;

        assert_eq!(export_count.load(Ordering::Relaxed), 8);
        assert_eq!(metrics.snapshot().export_count, 8);
    }

    #[tokio::test]
    async fn test_submit_after_shutdown_fails() {
        let export_count = Arc::new(AtomicU64::new(0));
        let handle = ExporterHandle::spawn(MockExporter::new("closed", &export_count), 4);
        let client = handle.client();

        handle.shutdown().await;

        assert!(matches!(
            client.submit(envelope(0)),
            Err(TelemetryError::SinkWrite { .. })
        ));
    }
}
