//! Cache manager implementation

use super::persistence::{self, CacheWriter, PersistedCache, PersistedEntry};
use super::types::{AtomicCacheStats, CacheEntry, CacheKey, CacheStats};
use crate::config::CacheConfig;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

/// Eviction frees this fraction of the budget beyond the overflow
const EVICTION_HEADROOM_DIVISOR: usize = 16;

/// Concurrent response cache
///
/// Entries live in a sharded map, so readers and writers of different keys
/// rarely contend. The byte counter is only changed while the shard holding
/// the affected entry is locked, which keeps it equal to the sum of stored
/// entry sizes.
#[derive(Debug)]
pub struct ResponseCache {
    entries: DashMap<CacheKey, CacheEntry>,
    bytes_used: AtomicUsize,
    config: CacheConfig,
    stats: Arc<AtomicCacheStats>,
    puts: AtomicU64,
    eviction_lock: Mutex<()>,
    writer: Option<CacheWriter>,
}

enum Lookup {
    Hit(String),
    Expired,
    Missing,
}

impl ResponseCache {
    /// Create a cache, loading persisted entries when a path is configured
    ///
    /// Persistence is only active when called inside a tokio runtime.
    pub fn new(config: CacheConfig) -> Self {
        let stats = Arc::new(AtomicCacheStats::default());
        let mut cache = Self {
            entries: DashMap::new(),
            bytes_used: AtomicUsize::new(0),
            config,
            stats,
            puts: AtomicU64::new(0),
            eviction_lock: Mutex::new(()),
            writer: None,
        };

        if let Some(path) = cache.config.persist_path.clone() {
            let retained = cache.restore(persistence::load(&path));
            cache.writer = CacheWriter::spawn(path, retained, cache.stats.clone());
        }

        cache
    }

    /// Seed the map from persisted records, dropping expired and malformed ones
    fn restore(&self, persisted: PersistedCache) -> PersistedCache {
        let now = Instant::now();
        let wall_now = chrono::Utc::now();
        let mut retained = PersistedCache::new();

        for (hex_key, record) in persisted {
            let Some(key) = CacheKey::from_hex(&hex_key) else {
                continue;
            };
            let Some(age) = record.age(wall_now) else {
                continue;
            };
            if age > record.ttl || record.value.len() > self.config.max_bytes {
                continue;
            }

            let created_at = now.checked_sub(age).unwrap_or(now);
            let mut entry = CacheEntry::new(record.value.clone(), record.ttl, created_at);
            entry.created_wall = record.created_at;
            self.insert_entry(key.clone(), entry);
            retained.insert(key.as_str().to_string(), record);
        }

        if !retained.is_empty() {
            info!("Restored {} cache entries from disk", retained.len());
        }

        let evicted = self.evict_to_fit();
        if evicted > 0 {
            retained.retain(|k, _| {
                CacheKey::from_hex(k).is_some_and(|key| self.entries.contains_key(&key))
            });
        }
        retained
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Look up a cached value; an expired entry is removed and reported as a miss
    pub fn get(&self, key: &CacheKey) -> Option<String> {
        let now = Instant::now();

        let lookup = match self.entries.get_mut(key) {
            Some(mut entry) if !entry.is_expired(now) => {
                entry.mark_accessed(now);
                Lookup::Hit(entry.value.clone())
            }
            Some(_) => Lookup::Expired,
            None => Lookup::Missing,
        };

        match lookup {
            Lookup::Hit(value) => {
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                debug!("Cache hit for key: {}", key);
                Some(value)
            }
            Lookup::Expired => {
                self.remove_expired(key, now);
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                debug!("Cache entry expired for key: {}", key);
                None
            }
            Lookup::Missing => {
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store a value with the configured default TTL
    pub fn put(&self, key: CacheKey, value: String) {
        self.put_with_ttl(key, value, self.config.default_ttl);
    }

    /// Store a value; never fails, values larger than the byte budget are skipped
    pub fn put_with_ttl(&self, key: CacheKey, value: String, ttl: Duration) {
        if value.len() > self.config.max_bytes {
            debug!(
                "Not caching {} byte value: exceeds cache budget of {} bytes",
                value.len(),
                self.config.max_bytes
            );
            return;
        }

        let entry = CacheEntry::new(value, ttl, Instant::now());
        if let Some(writer) = &self.writer {
            writer.upsert(
                key.as_str().to_string(),
                PersistedEntry {
                    value: entry.value.clone(),
                    created_at: entry.created_wall,
                    ttl,
                },
            );
        }
        self.insert_entry(key, entry);

        let puts = self.puts.fetch_add(1, Ordering::Relaxed) + 1;
        if puts.is_multiple_of(self.config.sweep_every_puts.max(1)) {
            self.purge_expired();
        }

        if self.is_over_capacity() {
            self.purge_expired();
            self.evict_to_fit();
        }
    }

    fn insert_entry(&self, key: CacheKey, entry: CacheEntry) {
        let new_size = entry.size_bytes;
        match self.entries.entry(key) {
            Entry::Occupied(mut occupied) => {
                let old = occupied.insert(entry);
                self.bytes_used.fetch_add(new_size, Ordering::Relaxed);
                self.bytes_used.fetch_sub(old.size_bytes, Ordering::Relaxed);
            }
            Entry::Vacant(vacant) => {
                vacant.insert(entry);
                self.bytes_used.fetch_add(new_size, Ordering::Relaxed);
            }
        }
    }

    fn remove_expired(&self, key: &CacheKey, now: Instant) {
        let removed = self.entries.remove_if(key, |_, entry| {
            let expired = entry.is_expired(now);
            if expired {
                self.bytes_used.fetch_sub(entry.size_bytes, Ordering::Relaxed);
            }
            expired
        });

        if removed.is_some() {
            self.stats.expirations.fetch_add(1, Ordering::Relaxed);
            if let Some(writer) = &self.writer {
                writer.remove(key.as_str().to_string());
            }
        }
    }

    /// Remove an entry
    pub fn remove(&self, key: &CacheKey) -> bool {
        let removed = self.entries.remove_if(key, |_, entry| {
            self.bytes_used.fetch_sub(entry.size_bytes, Ordering::Relaxed);
            true
        });

        if removed.is_some() {
            if let Some(writer) = &self.writer {
                writer.remove(key.as_str().to_string());
            }
        }
        removed.is_some()
    }

    fn is_over_capacity(&self) -> bool {
        self.entries.len() > self.config.max_entries
            || self.bytes_used.load(Ordering::Relaxed) > self.config.max_bytes
    }

    fn is_above_low_watermark(&self) -> bool {
        let max_entries = self.config.max_entries;
        let max_bytes = self.config.max_bytes;
        self.entries.len() > max_entries - max_entries / EVICTION_HEADROOM_DIVISOR
            || self.bytes_used.load(Ordering::Relaxed)
                > max_bytes - max_bytes / EVICTION_HEADROOM_DIVISOR
    }

    /// Drop every expired entry; returns how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut expired_keys = Vec::new();

        self.entries.retain(|key, entry| {
            if entry.is_expired(now) {
                self.bytes_used.fetch_sub(entry.size_bytes, Ordering::Relaxed);
                expired_keys.push(key.clone());
                false
            } else {
                true
            }
        });

        let removed = expired_keys.len();
        if removed > 0 {
            self.stats
                .expirations
                .fetch_add(removed as u64, Ordering::Relaxed);
            if let Some(writer) = &self.writer {
                for key in expired_keys {
                    writer.remove(key.as_str().to_string());
                }
            }
            debug!("Cleaned up {} expired cache entries", removed);
        }
        removed
    }

    /// Evict least-recently-accessed entries until within budget
    ///
    /// An over-budget cache is trimmed down to a low watermark one sixteenth
    /// below its limits, so consecutive puts into a full cache sort the
    /// entries once per batch instead of once per put.
    fn evict_to_fit(&self) -> usize {
        let _guard = self.eviction_lock.lock();
        if !self.is_over_capacity() {
            return 0;
        }
        let mut evicted = 0;
        // First passes spare entries touched since the snapshot was taken
        let mut spare_touched = true;

        while self.is_above_low_watermark() {
            let mut candidates: Vec<(CacheKey, Instant)> = self
                .entries
                .iter()
                .map(|entry| (entry.key().clone(), entry.last_accessed))
                .collect();
            candidates.sort_by_key(|(_, last_accessed)| *last_accessed);

            let mut evicted_this_pass = 0;
            for (key, seen_access) in candidates {
                if !self.is_above_low_watermark() {
                    break;
                }

                let removed = self.entries.remove_if(&key, |_, entry| {
                    let stale = !spare_touched || entry.last_accessed <= seen_access;
                    if stale {
                        self.bytes_used.fetch_sub(entry.size_bytes, Ordering::Relaxed);
                    }
                    stale
                });

                if removed.is_some() {
                    evicted_this_pass += 1;
                    if let Some(writer) = &self.writer {
                        writer.remove(key.as_str().to_string());
                    }
                }
            }

            evicted += evicted_this_pass;
            if evicted_this_pass == 0 {
                if !spare_touched || self.entries.is_empty() {
                    break;
                }
                spare_touched = false;
            }
        }

        if evicted > 0 {
            self.stats
                .evictions
                .fetch_add(evicted as u64, Ordering::Relaxed);
            debug!("Evicted {} cache entries to respect capacity", evicted);
        }
        evicted
    }

    /// Empty the cache and the persisted file
    pub fn clear(&self) {
        self.entries.retain(|_, entry| {
            self.bytes_used.fetch_sub(entry.size_bytes, Ordering::Relaxed);
            false
        });
        if let Some(writer) = &self.writer {
            writer.clear();
        }
        info!("Cache cleared");
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total size of stored values
    pub fn bytes_used(&self) -> usize {
        self.bytes_used.load(Ordering::Relaxed)
    }

    /// Get cache statistics (lock-free snapshot)
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            max_entries: self.config.max_entries,
            bytes_used: self.bytes_used(),
            max_bytes: self.config.max_bytes,
            ..self.stats.snapshot()
        }
    }

    /// Wait for pending persistence writes; returns immediately when memory-only
    pub async fn flush(&self) {
        if let Some(writer) = &self.writer {
            writer.flush().await;
        }
    }

    /// Whether changes are being written to disk
    pub fn is_persistent(&self) -> bool {
        self.writer.is_some()
    }

    /// Periodically purge expired entries until the cache is dropped
    pub fn start_sweep_task(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let cache: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                match cache.upgrade() {
                    Some(cache) => {
                        cache.purge_expired();
                    }
                    None => break,
                }
            }
        })
    }

    #[cfg(test)]
    pub(crate) fn recount_bytes(&self) -> usize {
        self.entries.iter().map(|e| e.size_bytes).sum()
    }
}
