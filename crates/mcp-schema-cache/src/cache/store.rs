//! Bounded in-memory cache store with TTL and hybrid frequency/recency eviction

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::time::Instant;

use super::config::CacheConfig;
use super::preload_status::{PreloadState, PreloadStatus, TablePreloadState};
use crate::constants::EVICTION_FRACTION_DIVISOR;

/// Cache entry with access bookkeeping
struct CacheEntry<V> {
    value: V,
    written_at: Instant,
    access_count: u64,
    last_access: Instant,
    /// Insertion order, breaks score ties
    seq: u64,
}

impl<V> CacheEntry<V> {
    fn is_valid(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.written_at) < ttl
    }

    /// `access_count / (1 + hours_since_last_access)`
    #[allow(clippy::cast_precision_loss)]
    fn score(&self, now: Instant) -> f64 {
        let hours = now.saturating_duration_since(self.last_access).as_secs_f64() / 3600.0;
        self.access_count as f64 / (1.0 + hours)
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Counters {
    hits: u64,
    misses: u64,
    sets: u64,
    evictions: u64,
    expirations: u64,
}

struct Inner<V> {
    entries: HashMap<String, CacheEntry<V>>,
    next_seq: u64,
    counters: Counters,
    preload: PreloadState,
}

impl<V> Inner<V> {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            next_seq: 0,
            counters: Counters::default(),
            preload: PreloadState::default(),
        }
    }

    /// Remove the `count` lowest-scoring entries, returning the evicted keys
    fn evict(&mut self, count: usize, now: Instant) -> Vec<(String, f64)> {
        let mut scored: Vec<(f64, u64, &String)> = self
            .entries
            .iter()
            .map(|(key, entry)| (entry.score(now), entry.seq, key))
            .collect();

        scored.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        let victims: Vec<(String, f64)> = scored
            .into_iter()
            .take(count)
            .map(|(score, _, key)| (key.clone(), score))
            .collect();

        for (key, _) in &victims {
            self.entries.remove(key);
        }
        self.counters.evictions += victims.len() as u64;

        victims
    }
}

/// Cache statistics for diagnostics endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub evictions: u64,
    pub expirations: u64,
    /// Physically stored entries, including expired ones not yet discovered
    pub entry_count: usize,
    pub max_size: usize,
    pub ttl: Duration,
}

/// Thread-safe key→document cache with TTL and size bound.
///
/// # Locking
///
/// A single mutex guards the entry map, all access bookkeeping and the preload
/// status, so every operation (including the lazy-expiry removal performed by
/// [`get`](Self::get)) is mutually exclusive with every other.
///
/// # Expiry
///
/// An entry is valid while `now - last_written < ttl`. Expired entries are
/// removed when they are next looked up; there is no background sweeper.
///
/// # Eviction
///
/// When a new key is inserted at capacity, `ceil(max_size / 10)` entries with
/// the lowest `access_count / (1 + hours_since_last_access)` score are removed
/// first. Ties go to the oldest insertion.
///
/// Cloning the store yields another handle to the same state.
pub struct CacheStore<V> {
    inner: Arc<Mutex<Inner<V>>>,
    config: CacheConfig,
}

impl<V> Clone for CacheStore<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            config: self.config,
        }
    }
}

impl<V> std::fmt::Debug for CacheStore<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheStore")
            .field("max_size", &self.config.max_size())
            .field("ttl", &self.config.ttl())
            .field("entry_count", &self.inner.lock().entries.len())
            .finish_non_exhaustive()
    }
}

impl<V> Default for CacheStore<V> {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl<V> CacheStore<V> {
    #[must_use]
    pub fn new(config: CacheConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::new())),
            config,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &CacheConfig {
        &self.config
    }

    const fn eviction_batch(&self) -> usize {
        self.config.max_size().div_ceil(EVICTION_FRACTION_DIVISOR)
    }

    /// Look up a valid entry, recording the access.
    ///
    /// An expired entry is removed and reported as absent.
    pub fn get(&self, key: &str) -> Option<V>
    where
        V: Clone,
    {
        let now = Instant::now();
        let ttl = self.config.ttl();
        let mut inner = self.inner.lock();

        let hit = match inner.entries.get_mut(key) {
            Some(entry) if entry.is_valid(now, ttl) => {
                entry.access_count += 1;
                entry.last_access = now;
                Some(entry.value.clone())
            }
            Some(_) => {
                inner.entries.remove(key);
                inner.counters.expirations += 1;
                inner.counters.misses += 1;
                drop(inner);
                tracing::debug!(cache.key = key, cache.result = "expired", "Removed expired entry");
                #[cfg(feature = "metrics")]
                crate::observability::record_cache_expiration();
                return None;
            }
            None => None,
        };

        if hit.is_some() {
            inner.counters.hits += 1;
        } else {
            inner.counters.misses += 1;
        }
        let total = inner.entries.len();
        drop(inner);

        tracing::debug!(
            cache.key = key,
            cache.result = if hit.is_some() { "hit" } else { "miss" },
            cache.entries = total,
            "Cache get"
        );

        hit
    }

    /// Insert or overwrite an entry.
    ///
    /// Overwriting a live key keeps its access history; a new key starts with
    /// zero accesses. Inserting a new key at capacity evicts first.
    pub fn set(&self, key: impl Into<String>, value: V) {
        let key = key.into();
        let now = Instant::now();
        let ttl = self.config.ttl();
        let batch = self.eviction_batch();
        let mut inner = self.inner.lock();

        let evicted = if !inner.entries.contains_key(&key)
            && inner.entries.len() >= self.config.max_size()
        {
            inner.evict(batch, now)
        } else {
            Vec::new()
        };

        let seq = inner.next_seq;
        match inner.entries.get_mut(&key) {
            Some(entry) if entry.is_valid(now, ttl) => {
                entry.value = value;
                entry.written_at = now;
            }
            Some(entry) => {
                *entry = CacheEntry {
                    value,
                    written_at: now,
                    access_count: 0,
                    last_access: now,
                    seq,
                };
                inner.next_seq += 1;
            }
            None => {
                inner.entries.insert(
                    key.clone(),
                    CacheEntry {
                        value,
                        written_at: now,
                        access_count: 0,
                        last_access: now,
                        seq,
                    },
                );
                inner.next_seq += 1;
            }
        }
        inner.counters.sets += 1;
        let total = inner.entries.len();
        drop(inner);

        for (evicted_key, score) in &evicted {
            tracing::debug!(cache.key = %evicted_key, cache.score = score, "Evicted entry");
        }
        if !evicted.is_empty() {
            tracing::info!(
                evicted = evicted.len(),
                max_size = self.config.max_size(),
                "Cache at capacity, evicted lowest-scoring entries"
            );
            #[cfg(feature = "metrics")]
            crate::observability::record_cache_eviction(evicted.len() as u64);
        }

        tracing::debug!(cache.key = %key, cache.entries = total, "Cache set");
        #[cfg(feature = "metrics")]
        crate::observability::set_cache_size(total as u64);
    }

    /// Remove an entry and its bookkeeping. Returns whether it was present.
    pub fn invalidate(&self, key: &str) -> bool {
        let removed = self.inner.lock().entries.remove(key).is_some();
        tracing::debug!(cache.key = key, cache.removed = removed, "Cache invalidate");
        removed
    }

    /// Remove every entry. Preload status is left untouched.
    ///
    /// Returns the number of entries removed.
    pub fn clear(&self) -> usize {
        let mut inner = self.inner.lock();
        let cleared = inner.entries.len();
        inner.entries.clear();
        drop(inner);

        tracing::debug!(cache.cleared = cleared, "Cache cleared");
        #[cfg(feature = "metrics")]
        crate::observability::set_cache_size(0);
        cleared
    }

    /// Whether a valid entry exists, without recording an access
    pub fn contains_key(&self, key: &str) -> bool {
        let now = Instant::now();
        self.inner
            .lock()
            .entries
            .get(key)
            .is_some_and(|entry| entry.is_valid(now, self.config.ttl()))
    }

    /// Number of stored entries, including expired ones not yet looked up
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    /// Sorted list of valid keys
    pub fn keys(&self) -> Vec<String> {
        let now = Instant::now();
        let ttl = self.config.ttl();
        let mut keys: Vec<String> = self
            .inner
            .lock()
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_valid(now, ttl))
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort_unstable();
        keys
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        CacheStats {
            hits: inner.counters.hits,
            misses: inner.counters.misses,
            sets: inner.counters.sets,
            evictions: inner.counters.evictions,
            expirations: inner.counters.expirations,
            entry_count: inner.entries.len(),
            max_size: self.config.max_size(),
            ttl: self.config.ttl(),
        }
    }

    pub fn mark_static_preload_complete<I, S>(&self, tables: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut inner = self.inner.lock();
        inner.preload.mark_static(tables);
        let status = inner.preload.snapshot(inner.entries.len());
        drop(inner);
        tracing::info!(tables = status.static_count, "Static preload completed");
    }

    pub fn mark_dynamic_preload_complete<I, S>(&self, tables: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut inner = self.inner.lock();
        inner.preload.mark_dynamic(tables);
        let status = inner.preload.snapshot(inner.entries.len());
        drop(inner);
        tracing::info!(tables = status.dynamic_count, "Dynamic preload completed");
    }

    pub fn preload_status(&self) -> PreloadStatus {
        let inner = self.inner.lock();
        inner.preload.snapshot(inner.entries.len())
    }

    pub fn is_table_preloaded(&self, table: &str) -> TablePreloadState {
        self.inner.lock().preload.table_state(table)
    }
}
