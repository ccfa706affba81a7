//! Segmented LRU cache engine.
//!
//! [`SegmentedLruCache`] routes each key by hash to one of a fixed,
//! power-of-two number of [`Segment`]s and keeps a single cache-wide
//! [`RecencyList`] ordering every live entry from most to least recently
//! used. Segments resize their bucket tables independently; recency order is
//! global, so eviction always removes the coldest entry in the whole cache,
//! not the coldest in some shard.
//!
//! ## Architecture
//!
//! ```text
//!   ┌───────────────────────────────────────────────────────────────┐
//!   │                   SegmentedLruCache<K, V>                     │
//!   │                                                               │
//!   │   hash(key) ──► segments[hash & (n-1)]                        │
//!   │                                                               │
//!   │   ┌─────────────┐ ┌─────────────┐     ┌─────────────┐         │
//!   │   │Mutex<Segment│ │Mutex<Segment│ ... │Mutex<Segment│         │
//!   │   │  buckets    │ │  buckets    │     │  buckets    │         │
//!   │   └──────┬──────┘ └──────┬──────┘     └──────┬──────┘         │
//!   │          │ touch/link/unlink │                │               │
//!   │          ▼               ▼                    ▼               │
//!   │   ┌───────────────────────────────────────────────────┐      │
//!   │   │ Mutex<RecencyList<EntryRef>>   MRU ◄──────► LRU   │      │
//!   │   └───────────────────────────────────────────────────┘      │
//!   └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Locking
//!
//! Two lock domains: one `Mutex` per segment (bucket table, chain links,
//! entry count) and one global `Mutex` over the recency list (all node
//! links). Within an operation the segment lock is always taken first and
//! the recency lock is held only for the single touch/link/unlink at the
//! end; no operation holds two segment locks. Eviction releases the
//! inserting segment's lock before locking the victim's segment, and
//! re-validates the victim through its generational handle — a victim
//! removed concurrently simply fails to resolve and the eviction retries.
//!
//! ## Capacity
//!
//! The cache enforces a fixed total-entry ceiling (`max_entries`). Every
//! `put` that inserts a new entry checks the ceiling afterwards and evicts
//! from the LRU end until the cache is back under it. There is no periodic
//! sweep.

use std::hash::{BuildHasher, BuildHasherDefault, Hash};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHasher;

use crate::ds::recency::RecencyList;
use crate::error::InvariantError;
use crate::segment::{EntryRef, RecencyLock, Segment};
use crate::stats::{CacheStats, StatsSnapshot};

pub(crate) const DEFAULT_SEGMENTS: usize = 16;
pub(crate) const DEFAULT_INITIAL_CAPACITY: usize = 4;
pub(crate) const DEFAULT_LOAD_FACTOR: f32 = 0.75;

/// Default ceiling when none is given: room for the initial tables to fill
/// a few times over before eviction starts.
const DEFAULT_CEILING_FACTOR: usize = 4;

/// A concurrent eviction can race the LRU peek; look again a bounded number
/// of times before giving up on this eviction round.
const EVICT_RETRY_LIMIT: usize = 8;

/// Bounded, concurrent, segmented LRU cache.
///
/// Values are stored as `Arc<V>` so gets can hand out the value without
/// cloning it and callers can keep it past a later eviction; TTL, key
/// validation, and copy-on-store semantics belong to the facade above this
/// engine.
///
/// # Example
///
/// ```
/// use seglru::cache::SegmentedLruCache;
///
/// let cache: SegmentedLruCache<String, u64> = SegmentedLruCache::new(8, 4);
/// assert_eq!(cache.put("answer".to_string(), 42), None);
/// assert_eq!(cache.get(&"answer".to_string()).as_deref(), Some(&42));
/// assert_eq!(cache.remove(&"answer".to_string()).as_deref(), Some(&42));
/// assert!(cache.is_empty());
/// ```
#[derive(Debug)]
pub struct SegmentedLruCache<K, V> {
    segments: Box<[Mutex<Segment<K, V>>]>,
    recency: RecencyLock,
    live: AtomicUsize,
    max_entries: usize,
    stats: CacheStats,
    hasher: BuildHasherDefault<FxHasher>,
}

impl<K, V> SegmentedLruCache<K, V>
where
    K: Eq + Hash,
{
    /// Creates a cache with `segment_count` segments whose bucket tables
    /// start at `initial_capacity` slots.
    ///
    /// Both values are rounded up to the next power of two (minimum 1). The
    /// entry ceiling defaults to `segment_count * initial_capacity * 4`; use
    /// [`CacheBuilder`](crate::builder::CacheBuilder) to pick it explicitly.
    pub fn new(segment_count: usize, initial_capacity: usize) -> Self {
        let segment_count = segment_count.max(1).next_power_of_two();
        let initial_capacity = initial_capacity.max(1).next_power_of_two();
        let max_entries = segment_count * initial_capacity * DEFAULT_CEILING_FACTOR;
        Self::with_parameters(
            segment_count,
            initial_capacity,
            DEFAULT_LOAD_FACTOR,
            max_entries,
        )
    }

    /// Constructs from already-validated parameters (builder entry point).
    pub(crate) fn with_parameters(
        segment_count: usize,
        initial_capacity: usize,
        load_factor: f32,
        max_entries: usize,
    ) -> Self {
        debug_assert!(segment_count.is_power_of_two());
        debug_assert!(initial_capacity.is_power_of_two());
        let segments = (0..segment_count)
            .map(|i| Mutex::new(Segment::new(i as u32, initial_capacity, load_factor)))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self {
            segments,
            recency: Mutex::new(RecencyList::with_capacity(max_entries.min(1 << 16))),
            live: AtomicUsize::new(0),
            max_entries,
            stats: CacheStats::new(),
            hasher: BuildHasherDefault::default(),
        }
    }

    /// Looks up `key`, moving it to the most recently used position on a hit.
    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        let hash = self.hash_of(key);
        let segment = self.segments[self.segment_index(hash)].lock();
        let value = segment.get(key, hash, &self.recency);
        match value {
            Some(_) => self.stats.record_hit(),
            None => self.stats.record_miss(),
        }
        value
    }

    /// Returns `true` if `key` is present, without affecting recency order.
    pub fn contains_key(&self, key: &K) -> bool {
        let hash = self.hash_of(key);
        self.segments[self.segment_index(hash)]
            .lock()
            .contains_key(key, hash)
    }

    /// Inserts or replaces `key`, returning the previous value if any.
    ///
    /// Inserting past the entry ceiling evicts from the LRU end until the
    /// cache is back under it.
    pub fn put(&self, key: K, value: V) -> Option<Arc<V>> {
        self.put_arc(key, Arc::new(value))
    }

    /// Like [`put`](Self::put), for values already wrapped in an `Arc`.
    pub fn put_arc(&self, key: K, value: Arc<V>) -> Option<Arc<V>> {
        let hash = self.hash_of(&key);
        // The live counter moves while the segment lock is still held, so a
        // concurrent remove of this key cannot decrement before the insert's
        // increment lands. Eviction runs after the release: it locks the
        // victim's segment, which may be this one.
        let (previous, over_ceiling) = {
            let mut segment = self.segments[self.segment_index(hash)].lock();
            let previous = segment.put(key, value, hash, &self.recency);
            let over_ceiling = if previous.is_none() {
                self.stats.record_insertion();
                self.live.fetch_add(1, Ordering::Relaxed) + 1 > self.max_entries
            } else {
                false
            };
            (previous, over_ceiling)
        };
        if over_ceiling {
            self.evict_to_ceiling();
        }
        previous
    }

    /// Removes `key`, returning its value if it was present.
    pub fn remove(&self, key: &K) -> Option<Arc<V>> {
        let hash = self.hash_of(key);
        let mut segment = self.segments[self.segment_index(hash)].lock();
        let removed = segment.remove(key, hash, &self.recency);
        if removed.is_some() {
            // decrement under the segment lock, ordered with the unlink
            self.live.fetch_sub(1, Ordering::Relaxed);
        }
        removed
    }

    /// Removes every entry. Afterwards the recency list is as empty as a
    /// freshly constructed cache's.
    pub fn clear(&self) {
        for segment in self.segments.iter() {
            let mut guard = segment.lock();
            let removed = guard.clear(&self.recency);
            if removed > 0 {
                // decrement before the segment unlocks, as in `remove`
                self.live.fetch_sub(removed, Ordering::Relaxed);
            }
        }
    }

    /// Returns the current number of live entries.
    pub fn len(&self) -> usize {
        self.live.load(Ordering::Relaxed)
    }

    /// Returns `true` if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the fixed number of segments.
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Returns the number of entries in segment `index`.
    pub fn segment_len(&self, index: usize) -> usize {
        self.segments[index].lock().count()
    }

    /// Returns the bucket-table length of segment `index` (diagnostic).
    pub fn segment_capacity(&self, index: usize) -> usize {
        self.segments[index].lock().capacity()
    }

    /// Returns the total-entry ceiling.
    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Returns a point-in-time snapshot of the hit/miss/eviction counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Returns every live key from most to least recently used.
    ///
    /// The walk resolves keys segment by segment after snapshotting the
    /// recency order, so under concurrent mutation it is a best-effort view;
    /// with the cache quiescent it is exact. This is the external probe of
    /// the recency list for tests and diagnostics.
    pub fn recency_keys(&self) -> Vec<K>
    where
        K: Clone,
    {
        let refs: Vec<EntryRef> = self.recency.lock().iter().copied().collect();
        let mut keys = Vec::with_capacity(refs.len());
        for entry_ref in refs {
            let segment = self.segments[entry_ref.segment as usize].lock();
            if let Some(key) = segment.key_of(entry_ref.entry) {
                keys.push(key.clone());
            }
        }
        keys
    }

    /// Cross-checks every segment's bucket chains against the recency list.
    ///
    /// Verifies the dual-membership invariant: each live entry appears in
    /// exactly one bucket chain and has exactly one node in the recency
    /// list, and the list holds nothing else. Diagnostic only — it locks
    /// every segment (in index order) and then the recency list, so do not
    /// call it on a hot path.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        let guards: Vec<_> = self.segments.iter().map(|s| s.lock()).collect();
        let list = self.recency.lock();

        let total: usize = guards.iter().map(|g| g.count()).sum();
        if total != list.len() {
            return Err(InvariantError::new(format!(
                "segments hold {} entries but the recency list has {} nodes",
                total,
                list.len()
            )));
        }

        for (index, guard) in guards.iter().enumerate() {
            for (entry, node) in guard.iter_nodes() {
                match list.get(node) {
                    Some(r) if r.segment as usize == index && r.entry == entry => {}
                    Some(_) => {
                        return Err(InvariantError::new(format!(
                            "recency node of segment {index} entry points at a different entry"
                        )))
                    }
                    None => {
                        return Err(InvariantError::new(format!(
                            "segment {index} holds an entry whose recency node is gone"
                        )))
                    }
                }
            }
        }

        for entry_ref in list.iter() {
            let segment = entry_ref.segment as usize;
            if segment >= guards.len() {
                return Err(InvariantError::new(format!(
                    "recency node references segment {segment}, out of range"
                )));
            }
            if guards[segment].node_of(entry_ref.entry).is_none() {
                return Err(InvariantError::new(format!(
                    "recency node references a dead entry in segment {segment}"
                )));
            }
        }

        Ok(())
    }

    /// Returns the keys sharing `key`'s bucket, in chain order (diagnostic).
    #[doc(hidden)]
    pub fn debug_bucket_keys(&self, key: &K) -> Vec<K>
    where
        K: Clone,
    {
        let hash = self.hash_of(key);
        self.segments[self.segment_index(hash)]
            .lock()
            .debug_bucket_keys(hash)
    }

    fn hash_of(&self, key: &K) -> u64 {
        self.hasher.hash_one(key)
    }

    fn segment_index(&self, hash: u64) -> usize {
        (hash as usize) & (self.segments.len() - 1)
    }

    fn evict_to_ceiling(&self) {
        while self.live.load(Ordering::Relaxed) > self.max_entries {
            if !self.evict_one() {
                break;
            }
        }
    }

    /// Evicts the current LRU entry.
    ///
    /// Peeks the LRU node under the recency lock, releases it, then locks
    /// the owning segment — segment-before-recency order, never two segment
    /// locks. The generational handle detects a victim that was removed in
    /// between; a touched-but-live victim is still evicted, since it was the
    /// LRU entry at the moment of the peek.
    fn evict_one(&self) -> bool {
        for _ in 0..EVICT_RETRY_LIMIT {
            let victim = { self.recency.lock().back().copied() };
            let Some(victim) = victim else {
                return false;
            };
            let mut segment = self.segments[victim.segment as usize].lock();
            if segment.evict(victim.entry, &self.recency).is_some() {
                self.live.fetch_sub(1, Ordering::Relaxed);
                self.stats.record_eviction();
                return true;
            }
        }
        false
    }
}

impl<K, V> crate::traits::ConcurrentCache<K, V> for SegmentedLruCache<K, V>
where
    K: Eq + Hash + Send + Sync,
    V: Send + Sync,
{
    fn get(&self, key: &K) -> Option<Arc<V>> {
        SegmentedLruCache::get(self, key)
    }

    fn put(&self, key: K, value: V) -> Option<Arc<V>> {
        SegmentedLruCache::put(self, key, value)
    }

    fn remove(&self, key: &K) -> Option<Arc<V>> {
        SegmentedLruCache::remove(self, key)
    }

    fn contains_key(&self, key: &K) -> bool {
        SegmentedLruCache::contains_key(self, key)
    }

    fn len(&self) -> usize {
        SegmentedLruCache::len(self)
    }

    fn clear(&self) {
        SegmentedLruCache::clear(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::HashCodeKey;

    #[test]
    fn counts_are_rounded_to_powers_of_two() {
        let cache: SegmentedLruCache<u64, u64> = SegmentedLruCache::new(5, 3);
        assert_eq!(cache.segment_count(), 8);
        assert_eq!(cache.segment_capacity(0), 4);
        assert_eq!(cache.max_entries(), 8 * 4 * 4);
    }

    #[test]
    fn put_get_remove_round_trip() {
        let cache = SegmentedLruCache::new(4, 4);
        assert_eq!(cache.put(1u64, "one"), None);
        assert_eq!(cache.put(2u64, "two"), None);

        assert_eq!(cache.get(&1).as_deref(), Some(&"one"));
        assert_eq!(cache.get(&3), None);
        assert_eq!(cache.len(), 2);

        assert_eq!(cache.remove(&1).as_deref(), Some(&"one"));
        assert_eq!(cache.remove(&1), None);
        assert_eq!(cache.len(), 1);
        cache.check_invariants().unwrap();
    }

    #[test]
    fn replacement_returns_previous_and_keeps_one_entry() {
        let cache = SegmentedLruCache::new(4, 4);
        assert_eq!(cache.put(7u64, "v1"), None);
        assert_eq!(cache.put(7u64, "v2").as_deref(), Some(&"v1"));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&7).as_deref(), Some(&"v2"));
        assert_eq!(cache.recency_keys(), vec![7]);
    }

    #[test]
    fn recency_order_spans_segments() {
        let cache = SegmentedLruCache::new(8, 4);
        for key in 0u64..6 {
            cache.put(key, key);
        }
        assert_eq!(cache.recency_keys(), vec![5, 4, 3, 2, 1, 0]);

        cache.get(&2);
        assert_eq!(cache.recency_keys(), vec![2, 5, 4, 3, 1, 0]);
        cache.check_invariants().unwrap();
    }

    #[test]
    fn same_bucket_keys_stay_distinct() {
        // identical routing hash, different checksum: one bucket, two entries
        let cache = SegmentedLruCache::new(4, 4);
        let a = HashCodeKey::from_parts(99, 1);
        let b = HashCodeKey::from_parts(99, 2);

        cache.put(a, "a");
        cache.put(b, "b");
        assert_eq!(cache.get(&a).as_deref(), Some(&"a"));
        assert_eq!(cache.get(&b).as_deref(), Some(&"b"));
        assert_eq!(cache.debug_bucket_keys(&a), vec![b, a]);
    }

    #[test]
    fn clear_resets_everything() {
        let cache = SegmentedLruCache::new(4, 4);
        for key in 0u64..10 {
            cache.put(key, key);
        }
        cache.clear();

        assert_eq!(cache.len(), 0);
        assert!(cache.is_empty());
        assert!(cache.recency_keys().is_empty());
        for index in 0..cache.segment_count() {
            assert_eq!(cache.segment_len(index), 0);
        }
        cache.check_invariants().unwrap();

        cache.put(3u64, 3);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn ceiling_evicts_least_recently_used() {
        let cache = {
            let mut c = SegmentedLruCache::new(2, 4);
            c.max_entries = 3;
            c
        };
        cache.put(1u64, 1);
        cache.put(2u64, 2);
        cache.put(3u64, 3);
        cache.get(&1); // 1 is now MRU; 2 is LRU

        cache.put(4u64, 4);
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.get(&2), None);
        assert!(cache.contains_key(&1));
        assert!(cache.contains_key(&3));
        assert!(cache.contains_key(&4));
        assert_eq!(cache.stats().evictions, 1);
        cache.check_invariants().unwrap();
    }

    #[test]
    fn stats_track_hits_and_misses() {
        let cache = SegmentedLruCache::new(4, 4);
        cache.put(1u64, 1);
        cache.get(&1);
        cache.get(&1);
        cache.get(&2);

        let stats = cache.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.insertions, 1);
        assert_eq!(stats.evictions, 0);
    }
}
