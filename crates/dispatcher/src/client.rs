//! In-process telemetry client

use contracts::{Envelope, TelemetryClient, TelemetryError};
use parking_lot::Mutex;

/// Client that keeps every submitted envelope in memory
///
/// Handy for inspecting what a telemetry sink produced, e.g. a dry run.
#[derive(Debug, Default)]
pub struct MemoryClient {
    envelopes: Mutex<Vec<Envelope>>,
}

impl MemoryClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything submitted so far, in submission order
    pub fn envelopes(&self) -> Vec<Envelope> {
        self.envelopes.lock().clone()
    }

    /// Drain the buffer
    pub fn take(&self) -> Vec<Envelope> {
        std::mem::take(&mut *self.envelopes.lock())
    }

    pub fn len(&self) -> usize {
        self.envelopes.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.envelopes.lock().is_empty()
    }
}

impl TelemetryClient for MemoryClient {
    fn submit(&self, envelope: Envelope) -> Result<(), TelemetryError> {
        self.envelopes.lock().push(envelope);
        Ok(())
    }
}
