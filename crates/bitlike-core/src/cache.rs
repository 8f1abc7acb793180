//! Query-result cache.
//!
//! A small LRU of `pattern → matching ids` kept on the handle, not on the
//! snapshot. Presence of the cache is invisible to callers apart from
//! wall-clock time: it is cleared on every publication, so it can never
//! serve ids from a replaced snapshot.

use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::index::RecordId;

/// Hit/miss/eviction counters for the query cache.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Number of evictions.
    pub evictions: u64,
}

impl CacheStats {
    /// Hit rate in `[0.0, 1.0]`.
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            #[allow(clippy::cast_precision_loss)]
            {
                self.hits as f64 / total as f64
            }
        }
    }
}

/// LRU cache of pattern results.
///
/// Uses an `IndexMap` whose insertion order doubles as recency order:
/// front = least recently used, back = most recently used.
#[derive(Debug)]
pub(crate) struct QueryCache {
    capacity: usize,
    inner: RwLock<IndexMap<Box<[u8]>, Arc<[RecordId]>>>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl QueryCache {
    /// Creates a cache holding at most `capacity` patterns. Zero disables
    /// caching entirely.
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: RwLock::new(IndexMap::with_capacity(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Looks up a pattern, refreshing its recency on a hit.
    pub(crate) fn get(&self, pattern: &[u8]) -> Option<Arc<[RecordId]>> {
        if self.capacity == 0 {
            return None;
        }
        let mut map = self.inner.write();
        if let Some(ids) = map.shift_remove(pattern) {
            map.insert(pattern.to_vec().into_boxed_slice(), Arc::clone(&ids));
            self.hits.fetch_add(1, Ordering::Relaxed);
            Some(ids)
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            None
        }
    }

    /// Stores a result, evicting the least recently used entry when full.
    pub(crate) fn insert(&self, pattern: &[u8], ids: Arc<[RecordId]>) {
        if self.capacity == 0 {
            return;
        }
        let mut map = self.inner.write();
        if map.shift_remove(pattern).is_none() && map.len() >= self.capacity {
            map.shift_remove_index(0);
            self.evictions.fetch_add(1, Ordering::Relaxed);
        }
        map.insert(pattern.to_vec().into_boxed_slice(), ids);
    }

    /// Drops every entry; called on each index publication.
    pub(crate) fn clear(&self) {
        self.inner.write().clear();
    }

    /// Counter snapshot.
    pub(crate) fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}
