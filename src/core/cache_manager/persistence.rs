//! Best-effort cache persistence
//!
//! The cache file is a JSON object mapping cache keys to
//! `{value, created_at, ttl}` records. It is read once at startup and
//! rewritten by a background task as entries change. Nothing here can fail a
//! request: read problems yield an empty cache and write problems are logged
//! and counted.

use super::types::AtomicCacheStats;
use crate::utils::serde_duration;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

/// One persisted cache record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedEntry {
    pub value: String,
    pub created_at: DateTime<Utc>,
    #[serde(with = "serde_duration::secs")]
    pub ttl: Duration,
}

impl PersistedEntry {
    /// Age relative to `now`, `None` if the record claims to come from the future
    pub fn age(&self, now: DateTime<Utc>) -> Option<Duration> {
        (now - self.created_at).to_std().ok()
    }
}

pub type PersistedCache = HashMap<String, PersistedEntry>;

/// Read the cache file; a missing or unreadable file yields an empty map
pub fn load(path: &Path) -> PersistedCache {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("No persisted cache at {:?}", path);
            return PersistedCache::new();
        }
        Err(e) => {
            warn!("Failed to read persisted cache {:?}: {}", path, e);
            return PersistedCache::new();
        }
    };

    match serde_json::from_str(&content) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Ignoring corrupt persisted cache {:?}: {}", path, e);
            PersistedCache::new()
        }
    }
}

/// Write the whole map through a temporary file and rename
pub async fn write_atomic(path: &Path, entries: &PersistedCache) -> std::io::Result<()> {
    let json = serde_json::to_vec(entries).map_err(std::io::Error::other)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let tmp = tmp_path(path);
    tokio::fs::write(&tmp, json).await?;
    tokio::fs::rename(&tmp, path).await
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[derive(Debug)]
enum PersistOp {
    Upsert(String, PersistedEntry),
    Remove(String),
    Clear,
    Flush(oneshot::Sender<()>),
}

/// Handle to the background writer
#[derive(Debug, Clone)]
pub struct CacheWriter {
    tx: mpsc::UnboundedSender<PersistOp>,
}

impl CacheWriter {
    /// Start the writer on the current tokio runtime
    ///
    /// Returns `None` outside a runtime; the cache then stays memory-only.
    pub fn spawn(
        path: PathBuf,
        initial: PersistedCache,
        stats: Arc<AtomicCacheStats>,
    ) -> Option<Self> {
        let handle = tokio::runtime::Handle::try_current().ok()?;
        let (tx, rx) = mpsc::unbounded_channel();
        handle.spawn(run_writer(path, initial, rx, stats));
        Some(Self { tx })
    }

    pub fn upsert(&self, key: String, entry: PersistedEntry) {
        let _ = self.tx.send(PersistOp::Upsert(key, entry));
    }

    pub fn remove(&self, key: String) {
        let _ = self.tx.send(PersistOp::Remove(key));
    }

    pub fn clear(&self) {
        let _ = self.tx.send(PersistOp::Clear);
    }

    /// Wait until every change sent so far has been written (or failed)
    pub async fn flush(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.tx.send(PersistOp::Flush(ack_tx)).is_ok() {
            let _ = ack_rx.await;
        }
    }
}

async fn run_writer(
    path: PathBuf,
    mut entries: PersistedCache,
    mut rx: mpsc::UnboundedReceiver<PersistOp>,
    stats: Arc<AtomicCacheStats>,
) {
    while let Some(op) = rx.recv().await {
        let mut acks = Vec::new();
        let mut dirty = apply(&mut entries, op, &mut acks);

        // Coalesce everything already queued into one write
        while let Ok(op) = rx.try_recv() {
            dirty |= apply(&mut entries, op, &mut acks);
        }

        if dirty {
            if let Err(e) = write_atomic(&path, &entries).await {
                stats.persistence_errors.fetch_add(1, Ordering::Relaxed);
                warn!("Failed to persist cache to {:?}: {}", path, e);
            } else {
                debug!("Persisted {} cache entries to {:?}", entries.len(), path);
            }
        }

        for ack in acks {
            let _ = ack.send(());
        }
    }
}

fn apply(entries: &mut PersistedCache, op: PersistOp, acks: &mut Vec<oneshot::Sender<()>>) -> bool {
    match op {
        PersistOp::Upsert(key, entry) => {
            entries.insert(key, entry);
            true
        }
        PersistOp::Remove(key) => entries.remove(&key).is_some(),
        PersistOp::Clear => {
            entries.clear();
            true
        }
        PersistOp::Flush(ack) => {
            acks.push(ack);
            false
        }
    }
}
