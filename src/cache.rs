use std::{
    num::NonZeroUsize,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex,
    },
};

use log::trace;
use lru::LruCache;
use serde::Serialize;

use crate::{errors::JSONPathError, Query};

/// Compiled paths, keyed by path text.
pub struct QueryCache {
    entries: Option<Mutex<LruCache<String, Arc<Query>>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub hits: u64,
    pub misses: u64,
    pub hit_ratio: f64,
}

impl QueryCache {
    /// A cache holding up to `capacity` paths. A capacity of zero disables
    /// caching.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: NonZeroUsize::new(capacity).map(|n| Mutex::new(LruCache::new(n))),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn get_or_compile(&self, path: &str) -> Result<Arc<Query>, JSONPathError> {
        let Some(entries) = &self.entries else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return Query::new(path).map(Arc::new);
        };

        if let Some(query) = entries
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .get(path)
        {
            self.hits.fetch_add(1, Ordering::Relaxed);
            trace!("cache hit for {}", path);
            return Ok(Arc::clone(query));
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        trace!("cache miss for {}", path);

        // compile outside the lock
        let query = Arc::new(Query::new(path)?);
        entries
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .put(path.to_owned(), Arc::clone(&query));
        Ok(query)
    }

    pub fn clear(&self) {
        if let Some(entries) = &self.entries {
            entries.lock().unwrap_or_else(|err| err.into_inner()).clear();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.as_ref().map_or(0, |entries| {
            entries.lock().unwrap_or_else(|err| err.into_inner()).len()
        })
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        CacheStats {
            size: self.len(),
            hits,
            misses,
            hit_ratio: if total > 0 {
                hits as f64 / total as f64
            } else {
                0.0
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hits_and_misses() {
        let cache = QueryCache::new(2);
        let a = cache.get_or_compile("$.a").unwrap();
        let again = cache.get_or_compile("$.a").unwrap();
        assert!(Arc::ptr_eq(&a, &again));

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.size, 1);
        assert_eq!(stats.hit_ratio, 0.5);
    }

    #[test]
    fn least_recently_used_is_evicted() {
        let cache = QueryCache::new(2);
        cache.get_or_compile("$.a").unwrap();
        cache.get_or_compile("$.b").unwrap();
        cache.get_or_compile("$.a").unwrap();
        cache.get_or_compile("$.c").unwrap();
        assert_eq!(cache.len(), 2);

        cache.get_or_compile("$.b").unwrap();
        assert_eq!(cache.stats().misses, 4);
    }

    #[test]
    fn zero_capacity_disables_caching() {
        let cache = QueryCache::new(0);
        cache.get_or_compile("$.a").unwrap();
        cache.get_or_compile("$.a").unwrap();
        assert!(cache.is_empty());
        assert_eq!(cache.stats().misses, 2);
    }

    #[test]
    fn errors_are_not_cached() {
        let cache = QueryCache::new(2);
        assert!(cache.get_or_compile("$.x[").is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn clear() {
        let cache = QueryCache::new(2);
        cache.get_or_compile("$.a").unwrap();
        cache.clear();
        assert!(cache.is_empty());
    }
}
