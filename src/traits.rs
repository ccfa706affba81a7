//! Facade-facing cache trait.
//!
//! The engine's consumers (a TTL-checking facade, a namespace router, test
//! doubles) program against [`ConcurrentCache`] rather than the concrete
//! [`SegmentedLruCache`](crate::cache::SegmentedLruCache), so backing
//! engines can be swapped without touching the dispatch layer above.
//!
//! All methods take `&self`: implementations synchronize internally.

use std::sync::Arc;

/// Thread-safe cache operations sufficient for a get/put/remove facade.
pub trait ConcurrentCache<K, V>: Send + Sync {
    /// Looks up `key`, marking it recently used on a hit.
    fn get(&self, key: &K) -> Option<Arc<V>>;

    /// Inserts or replaces `key`, returning the previous value if any.
    fn put(&self, key: K, value: V) -> Option<Arc<V>>;

    /// Removes `key`, returning its value if it was present.
    fn remove(&self, key: &K) -> Option<Arc<V>>;

    /// Returns `true` if `key` is present, without marking it used.
    fn contains_key(&self, key: &K) -> bool;

    /// Returns the current number of entries.
    fn len(&self) -> usize;

    /// Returns `true` if the cache holds no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every entry.
    fn clear(&self);
}
