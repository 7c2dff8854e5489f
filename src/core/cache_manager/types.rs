//! Cache manager type definitions

use crate::core::types::CompletionRequest;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::Instant;

/// Content hash of a normalized request
///
/// Backend identity is not part of the key, so the same request hashes the
/// same whichever backend ends up serving it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// Create a new cache key from a request
    pub fn from_request(request: &CompletionRequest) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(b"llm-dispatch/v1");

        let prompt = normalize_text(&request.prompt);
        hash_field(&mut hasher, prompt.as_bytes());

        let system = request
            .system
            .as_deref()
            .map(normalize_text)
            .unwrap_or_default();
        hash_field(&mut hasher, system.as_bytes());

        let params = &request.params;
        hash_field(&mut hasher, params.model.as_deref().unwrap_or("").as_bytes());
        hash_field(&mut hasher, &canonical_bits(params.temperature).to_le_bytes());
        hash_field(&mut hasher, &canonical_bits(params.top_p).to_le_bytes());
        hash_field(&mut hasher, &params.top_k.to_le_bytes());
        hash_field(&mut hasher, &params.max_tokens.to_le_bytes());

        Self(hex::encode(hasher.finalize()))
    }

    /// Parse a key read back from persistent storage
    pub fn from_hex(hex_key: &str) -> Option<Self> {
        let valid = hex_key.len() == 64 && hex_key.bytes().all(|b| b.is_ascii_hexdigit());
        valid.then(|| Self(hex_key.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Trim both ends and unify line endings; inner whitespace is significant
fn normalize_text(text: &str) -> String {
    text.replace("\r\n", "\n").trim().to_string()
}

fn canonical_bits(value: f32) -> u32 {
    // -0.0 and 0.0 sample identically
    if value == 0.0 { 0 } else { value.to_bits() }
}

fn hash_field(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}

/// Cache entry with metadata
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The cached text
    pub value: String,
    /// When the entry was created
    pub created_at: Instant,
    /// Wall-clock creation time, used for persistence
    pub created_wall: chrono::DateTime<chrono::Utc>,
    /// Time to live
    pub ttl: Duration,
    /// Last access time
    pub last_accessed: Instant,
    /// Access count for popularity tracking
    pub access_count: u64,
    /// Size in bytes
    pub size_bytes: usize,
}

impl CacheEntry {
    /// Create a new cache entry
    pub fn new(value: String, ttl: Duration, now: Instant) -> Self {
        let size_bytes = value.len();
        Self {
            value,
            created_at: now,
            created_wall: chrono::Utc::now(),
            ttl,
            last_accessed: now,
            access_count: 0,
            size_bytes,
        }
    }

    /// Check if the entry is expired
    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.created_at) > self.ttl
    }

    /// Mark the entry as accessed
    pub fn mark_accessed(&mut self, now: Instant) {
        self.access_count += 1;
        self.last_accessed = now;
    }

    /// Get the age of the entry
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.created_at)
    }
}

/// Atomic cache statistics for lock-free hot path updates
#[derive(Debug, Default)]
pub struct AtomicCacheStats {
    pub hits: AtomicU64,
    pub misses: AtomicU64,
    /// Entries removed to respect capacity
    pub evictions: AtomicU64,
    /// Entries removed because their TTL elapsed
    pub expirations: AtomicU64,
    /// Failed writes of the persisted cache file
    pub persistence_errors: AtomicU64,
}

/// Cache statistics snapshot (returned to callers)
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: usize,
    pub max_entries: usize,
    pub bytes_used: usize,
    pub max_bytes: usize,
    pub hits: u64,
    pub misses: u64,
    /// `hits / (hits + misses)`, `0.0` before the first lookup
    pub hit_rate: f64,
    pub evictions: u64,
    pub expirations: u64,
    pub persistence_errors: u64,
}

impl AtomicCacheStats {
    /// Create a snapshot of the counters; size fields are filled by the cache
    pub fn snapshot(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        CacheStats {
            hits,
            misses,
            hit_rate: if total == 0 {
                0.0
            } else {
                hits as f64 / total as f64
            },
            evictions: self.evictions.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
            persistence_errors: self.persistence_errors.load(Ordering::Relaxed),
            ..Default::default()
        }
    }

    /// Reset all stats to zero
    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.evictions.store(0, Ordering::Relaxed);
        self.expirations.store(0, Ordering::Relaxed);
        self.persistence_errors.store(0, Ordering::Relaxed);
    }
}
