//! Metric path → match result cache.
//!
//! Two backing stores behind one interface: an unbounded `HashMap`, or an
//! `lru::LruCache` when a maximum size is configured.

use std::collections::HashMap;
use std::num::NonZeroUsize;

use lru::LruCache;

/// Cache keyed by metric path.
pub enum RuleCache<V> {
    Unbounded(HashMap<String, V>),
    Bounded(LruCache<String, V>),
}

impl<V: Clone> RuleCache<V> {
    /// Create a cache holding at most `capacity` entries, or an unbounded one for `None`.
    pub fn new(capacity: Option<NonZeroUsize>) -> Self {
        match capacity {
            Some(cap) => Self::Bounded(LruCache::new(cap)),
            None => Self::Unbounded(HashMap::new()),
        }
    }

    /// Look up a path. In bounded mode a hit marks the entry most recently used.
    pub fn get(&mut self, metric_path: &str) -> Option<V> {
        match self {
            Self::Unbounded(map) => map.get(metric_path).cloned(),
            Self::Bounded(lru) => lru.get(metric_path).cloned(),
        }
    }

    /// Store a result. In bounded mode the least recently used entry is evicted when full.
    pub fn insert(&mut self, metric_path: String, value: V) {
        match self {
            Self::Unbounded(map) => {
                map.insert(metric_path, value);
            }
            Self::Bounded(lru) => {
                lru.put(metric_path, value);
            }
        }
    }

    /// Whether a path is cached, without touching its recency.
    pub fn contains(&self, metric_path: &str) -> bool {
        match self {
            Self::Unbounded(map) => map.contains_key(metric_path),
            Self::Bounded(lru) => lru.contains(metric_path),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Unbounded(map) => map.len(),
            Self::Bounded(lru) => lru.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        match self {
            Self::Unbounded(map) => map.clear(),
            Self::Bounded(lru) => lru.clear(),
        }
    }

    /// Configured maximum size; `None` when unbounded.
    pub fn capacity(&self) -> Option<NonZeroUsize> {
        match self {
            Self::Unbounded(_) => None,
            Self::Bounded(lru) => Some(lru.cap()),
        }
    }
}
