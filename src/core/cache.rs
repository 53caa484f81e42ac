//! Processed-entry cache.
//!
//! Building a hierarchy tree for an entry is the expensive step of the
//! pipeline, so processed entries are cached by entry index and shared
//! as `Arc`s between callers and threads.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

/// Default number of processed entries kept alive.
pub const DEFAULT_CACHE_CAPACITY: usize = 64;

/// Thread-safe cache of processed entries.
///
/// Uses `parking_lot::RwLock` for faster, non-poisoning locks
/// and `AtomicUsize` for lock-free hit statistics.
pub struct EntryCache<T> {
    /// Cache storage.
    cache: RwLock<HashMap<usize, Arc<T>>>,
    /// Maximum number of cached entries (0 disables caching).
    capacity: usize,
    /// Number of successful lookups.
    hits: AtomicUsize,
}

impl<T> EntryCache<T> {
    /// Create a cache holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: RwLock::new(HashMap::new()),
            capacity,
            hits: AtomicUsize::new(0),
        }
    }

    /// Get a cached entry if it exists.
    #[inline]
    pub fn get(&self, index: usize) -> Option<Arc<T>> {
        let hit = self.cache.read().get(&index).map(Arc::clone);
        if hit.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
        hit
    }

    /// Insert a processed entry, returning the instance that is cached.
    ///
    /// When two callers race on the same index the first insertion wins
    /// and both get the same `Arc` back.
    pub fn insert(&self, index: usize, value: Arc<T>) -> Arc<T> {
        if self.capacity == 0 {
            return value;
        }

        let mut cache = self.cache.write();
        if let Some(existing) = cache.get(&index) {
            return Arc::clone(existing);
        }
        if cache.len() >= self.capacity {
            Self::evict_some(&mut cache);
        }
        cache.insert(index, Arc::clone(&value));
        value
    }

    /// Evict approximately half of the cache.
    fn evict_some(cache: &mut HashMap<usize, Arc<T>>) {
        let mut keys: Vec<_> = cache.keys().copied().collect();
        keys.sort_unstable();
        let evict_count = keys.len().div_ceil(2);
        for key in keys.into_iter().take(evict_count) {
            cache.remove(&key);
        }
    }

    /// Clear the entire cache.
    pub fn clear(&self) {
        self.cache.write().clear();
    }

    /// Get the number of cached entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    /// Check if cache is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of cached entries.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of lookups served from the cache.
    #[inline]
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }
}

impl<T> Default for EntryCache<T> {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_insert_get() {
        let cache = EntryCache::new(4);
        cache.insert(3, Arc::new("tree"));
        assert_eq!(cache.get(3).as_deref(), Some(&"tree"));
        assert_eq!(cache.hits(), 1);
    }

    #[test]
    fn test_cache_miss() {
        let cache: EntryCache<u32> = EntryCache::new(4);
        assert!(cache.get(0).is_none());
        assert_eq!(cache.hits(), 0);
    }

    #[test]
    fn test_first_insert_wins() {
        let cache = EntryCache::new(4);
        let first = cache.insert(1, Arc::new(10));
        let second = cache.insert(1, Arc::new(20));
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(*second, 10);
    }

    #[test]
    fn test_cache_eviction() {
        let cache = EntryCache::new(4);
        for i in 0..10 {
            cache.insert(i, Arc::new(i));
        }
        assert!(cache.len() <= 4);
        // Most recent index is always retained
        assert!(cache.get(9).is_some());
    }

    #[test]
    fn test_zero_capacity_disables_cache() {
        let cache = EntryCache::new(0);
        cache.insert(0, Arc::new(1));
        assert!(cache.is_empty());
    }
}
