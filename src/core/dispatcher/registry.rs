//! Immutable snapshot of the configured backends

use crate::core::providers::Backend;
use crate::core::router::WeightedBackend;
use std::sync::Arc;

/// Backends in configuration order
///
/// A registry is never mutated; reloading swaps in a new one, so a request
/// keeps working against the snapshot it started with.
#[derive(Debug, Default)]
pub struct BackendRegistry {
    backends: Vec<Arc<dyn Backend>>,
    selectable: Vec<WeightedBackend>,
}

impl BackendRegistry {
    pub fn new(backends: Vec<Arc<dyn Backend>>) -> Self {
        let selectable = backends
            .iter()
            .filter(|b| b.config().enabled)
            .map(|b| WeightedBackend::new(b.name(), b.config().weight))
            .collect();
        Self {
            backends,
            selectable,
        }
    }

    /// All backends, enabled or not
    pub fn backends(&self) -> &[Arc<dyn Backend>] {
        &self.backends
    }

    /// Enabled backends with their weights, for selection
    pub fn selectable(&self) -> &[WeightedBackend] {
        &self.selectable
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Backend>> {
        self.backends.iter().find(|b| b.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}
