//! SinkRegistry - insertion-ordered, name-keyed sink collection
//!
//! A single `Vec` holds the entries; the key is each sink's own `name()`,
//! so there is no second index to keep in sync.

use std::sync::Arc;

use contracts::{Sink, TelemetryError};

#[derive(Default)]
pub(crate) struct SinkRegistry {
    entries: Vec<Arc<dyn Sink>>,
}

impl SinkRegistry {
    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|sink| sink.name() == name)
    }

    pub(crate) fn get(&self, name: &str) -> Option<&Arc<dyn Sink>> {
        self.position(name).map(|idx| &self.entries[idx])
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Append a sink. Fails without touching the registry if the name is taken.
    pub(crate) fn insert(&mut self, sink: Arc<dyn Sink>) -> Result<(), TelemetryError> {
        if self.contains(sink.name()) {
            return Err(TelemetryError::duplicate_sink(sink.name()));
        }
        self.entries.push(sink);
        Ok(())
    }

    /// Remove by name, keeping the order of the remaining entries.
    pub(crate) fn remove(&mut self, name: &str) -> Result<Arc<dyn Sink>, TelemetryError> {
        let idx = self
            .position(name)
            .ok_or_else(|| TelemetryError::sink_not_found(name))?;
        Ok(self.entries.remove(idx))
    }

    pub(crate) fn names(&self) -> Vec<String> {
        self.entries.iter().map(|s| s.name().to_string()).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Arc<dyn Sink>> {
        self.entries.iter()
    }

    /// Cheap copy of the entries for fan-out outside the lock
    pub(crate) fn snapshot(&self) -> Vec<Arc<dyn Sink>> {
        self.entries.clone()
    }
}
