//! Backend selection
//!
//! Smooth weighted round-robin over the backends that are selectable for a
//! request. Each pick adds every candidate's weight to its running counter,
//! takes the largest counter and subtracts the total weight from it, which
//! interleaves picks in proportion to weight without bursts.
//!
//! Ties are broken by the least recently selected backend, then by
//! configuration order, so the sequence of picks is fully deterministic.

use super::health::{HealthStatus, HealthTracker};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::debug;

/// A backend offered to the balancer, in configuration order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeightedBackend {
    pub name: String,
    pub weight: u32,
}

impl WeightedBackend {
    pub fn new(name: impl Into<String>, weight: u32) -> Self {
        Self {
            name: name.into(),
            weight: weight.max(1),
        }
    }
}

/// Outcome of a selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub name: String,
    /// The backend is unhealthy and this request doubles as its probe
    pub probe: bool,
    /// Also the time a probe slot was claimed for it
    pub selected_at: Instant,
}

#[derive(Debug, Default)]
struct RoundRobinState {
    current: HashMap<String, i64>,
    last_selected: HashMap<String, u64>,
    sequence: u64,
}

/// Picks the next backend for an attempt
#[derive(Debug)]
pub struct LoadBalancer {
    health: Arc<HealthTracker>,
    state: Mutex<RoundRobinState>,
}

impl LoadBalancer {
    pub fn new(health: Arc<HealthTracker>) -> Self {
        Self {
            health,
            state: Mutex::new(RoundRobinState::default()),
        }
    }

    pub fn health(&self) -> &Arc<HealthTracker> {
        &self.health
    }

    /// Select a backend not yet in `exclude`
    ///
    /// Order of preference:
    /// 1. an unhealthy backend whose probe is due (at most one per probe interval),
    /// 2. weighted round-robin over healthy and degraded backends,
    /// 3. the unhealthy backend that failed least recently, as a forced probe.
    ///
    /// Returns `None` once every backend is excluded.
    pub fn select(
        &self,
        backends: &[WeightedBackend],
        exclude: &HashSet<String>,
    ) -> Option<Selection> {
        let now = Instant::now();
        let candidates: Vec<(&WeightedBackend, HealthStatus)> = backends
            .iter()
            .filter(|b| !exclude.contains(&b.name))
            .map(|b| (b, self.health.status(&b.name)))
            .collect();

        if candidates.is_empty() {
            return None;
        }

        for (backend, status) in &candidates {
            if *status == HealthStatus::Unhealthy && self.health.try_claim_probe(&backend.name, now)
            {
                debug!(backend = %backend.name, "probing unhealthy backend");
                return Some(Selection {
                    name: backend.name.clone(),
                    probe: true,
                    selected_at: now,
                });
            }
        }

        let selectable: Vec<&WeightedBackend> = candidates
            .iter()
            .filter(|(_, status)| status.is_selectable())
            .map(|(b, _)| *b)
            .collect();

        if let Some(name) = self.round_robin(&selectable) {
            return Some(Selection {
                name,
                probe: false,
                selected_at: now,
            });
        }

        // Everything left is unhealthy; try the one that has rested longest
        let fallback = candidates
            .iter()
            .map(|(b, _)| (b, self.health.snapshot(&b.name).last_failure_at))
            .min_by_key(|(_, failed_at)| *failed_at)
            .map(|(b, _)| b.name.clone())?;
        self.health.mark_probed(&fallback, now);
        debug!(backend = %fallback, "no healthy backend left, forcing probe");
        Some(Selection {
            name: fallback,
            probe: true,
            selected_at: now,
        })
    }

    /// Give back a selection that was never sent to its backend
    ///
    /// A probe slot claimed by the selection becomes available again.
    pub fn release(&self, selection: &Selection) {
        if selection.probe {
            self.health
                .release_probe(&selection.name, selection.selected_at);
        }
    }

    fn round_robin(&self, selectable: &[&WeightedBackend]) -> Option<String> {
        if selectable.is_empty() {
            return None;
        }

        let mut state = self.state.lock();
        let total: i64 = selectable.iter().map(|b| i64::from(b.weight)).sum();

        let mut best: Option<(&WeightedBackend, i64, u64)> = None;
        for backend in selectable {
            let current = state.current.entry(backend.name.clone()).or_insert(0);
            *current += i64::from(backend.weight);
            let current = *current;
            let last = state.last_selected.get(&backend.name).copied().unwrap_or(0);

            let better = match best {
                None => true,
                Some((_, best_current, best_last)) => {
                    current > best_current || (current == best_current && last < best_last)
                }
            };
            if better {
                best = Some((backend, current, last));
            }
        }

        let (chosen, _, _) = best?;
        state.sequence += 1;
        let sequence = state.sequence;
        if let Some(current) = state.current.get_mut(&chosen.name) {
            *current -= total;
        }
        state.last_selected.insert(chosen.name.clone(), sequence);
        Some(chosen.name.clone())
    }

    /// Forget round-robin state for backends no longer registered
    pub fn retain(&self, keep: impl Fn(&str) -> bool) {
        let mut state = self.state.lock();
        state.current.retain(|name, _| keep(name));
        state.last_selected.retain(|name, _| keep(name));
    }
}
