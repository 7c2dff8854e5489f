//! Performance monitor

use super::types::{
    AttemptOutcome, AttemptRecord, BackendAggregate, BackendPerformance, MonitorSummary,
};
use crossbeam_queue::SegQueue;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

/// Queued records that trigger a fold on the write path
const FOLD_THRESHOLD: usize = 1024;

#[derive(Debug, Default)]
struct Aggregates {
    backends: HashMap<String, BackendAggregate>,
    cache_hits: u64,
    /// Backends whose records are kept; `None` keeps every backend
    tracked: Option<HashSet<String>>,
}

impl Aggregates {
    fn apply(&mut self, record: &AttemptRecord) {
        match &record.backend {
            Some(backend) => {
                if self.tracked.as_ref().is_some_and(|t| !t.contains(backend)) {
                    return;
                }
                self.backends
                    .entry(backend.clone())
                    .or_default()
                    .apply(record);
            }
            None => {
                if record.outcome == AttemptOutcome::CacheHit {
                    self.cache_hits += 1;
                }
            }
        }
    }
}

/// Append-only attempt recorder with lazily computed aggregates
#[derive(Debug, Default)]
pub struct PerformanceMonitor {
    pending: SegQueue<AttemptRecord>,
    aggregates: Mutex<Aggregates>,
}

impl PerformanceMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a record; never blocks
    ///
    /// Once the queue grows past a threshold the writer folds it into the
    /// aggregates, unless another thread already holds them.
    pub fn record(&self, record: AttemptRecord) {
        self.pending.push(record);
        if self.pending.len() >= FOLD_THRESHOLD {
            if let Some(mut aggregates) = self.aggregates.try_lock() {
                self.fold(&mut aggregates);
            }
        }
    }

    pub fn record_attempt(&self, backend: &str, latency: Duration, outcome: AttemptOutcome) {
        self.record(AttemptRecord::attempt(backend, latency, outcome));
    }

    pub fn record_cache_hit(&self) {
        self.record(AttemptRecord::cache_hit());
    }

    /// Records queued but not yet folded into the aggregates
    pub fn pending_records(&self) -> usize {
        self.pending.len()
    }

    fn fold(&self, aggregates: &mut Aggregates) {
        while let Some(record) = self.pending.pop() {
            aggregates.apply(&record);
        }
    }

    fn drain(&self) -> parking_lot::MutexGuard<'_, Aggregates> {
        let mut aggregates = self.aggregates.lock();
        self.fold(&mut aggregates);
        aggregates
    }

    /// Aggregates for one backend; empty figures if it was never attempted
    pub fn backend_performance(&self, backend: &str) -> BackendPerformance {
        let aggregates = self.drain();
        aggregates
            .backends
            .get(backend)
            .map(|aggregate| aggregate.performance(backend))
            .unwrap_or_else(|| BackendPerformance::empty(backend))
    }

    pub fn summary(&self) -> MonitorSummary {
        let aggregates = self.drain();
        let mut summary = MonitorSummary {
            cache_hits: aggregates.cache_hits,
            ..MonitorSummary::default()
        };
        for aggregate in aggregates.backends.values() {
            summary.total_attempts += aggregate.total_attempts;
            summary.successes += aggregate.successes;
            summary.failures += aggregate.retryable_failures + aggregate.fatal_failures;
        }
        summary
    }

    /// Start tracking a backend
    ///
    /// Once any backend is registered, records for unregistered names are
    /// ignored, so late records of a removed backend cannot revive it.
    pub fn register(&self, backend: &str) {
        let mut aggregates = self.drain();
        aggregates
            .tracked
            .get_or_insert_with(HashSet::new)
            .insert(backend.to_string());
    }

    /// Drop aggregates of backends for which `keep` returns false
    pub fn retain(&self, keep: impl Fn(&str) -> bool) {
        let mut aggregates = self.drain();
        aggregates.backends.retain(|name, _| keep(name));
        if let Some(tracked) = aggregates.tracked.as_mut() {
            tracked.retain(|name| keep(name));
        }
    }
}
