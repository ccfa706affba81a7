//! Independently lockable shard of the cache's hash table.
//!
//! A [`Segment`] owns a power-of-two bucket table and the entries that hash
//! into it. Entries live in the segment's own generational [`Arena`]; bucket
//! chains link them by [`Handle`] through each entry's `bucket_next`. The
//! entry's *other* link set — its position in the cache-wide recency list —
//! is a single node handle, relinked through the shared recency lock that
//! every segment operation receives.
//!
//! ```text
//!   table (len = power of two)           arena
//!   ┌─────┬──────────────┐     ┌────────┬───────────────────────────────┐
//!   │ 0   │ None         │     │ Handle │ Entry                         │
//!   │ 1   │ Some(h_c) ───┼──►  │ h_c    │ { key: C, next: Some(h_a),    │
//!   │ 2   │ None         │     │        │   node: ─► recency list }     │
//!   │ 3   │ Some(h_b) ───┼──►  │ h_a    │ { key: A, next: None, .. }    │
//!   └─────┴──────────────┘     │ h_b    │ { key: B, next: None, .. }    │
//!                              └────────┴───────────────────────────────┘
//! ```
//!
//! A new key always becomes the head of its bucket chain: insertion is O(1)
//! and the most recently inserted key is checked first on later lookups.
//! This chain order is independent of LRU order.
//!
//! Locking is the caller's job. The cache wraps each segment in a
//! `parking_lot::Mutex` and acquires it before any method here runs; the
//! recency lock is only taken inside, for the duration of the single
//! touch/link/unlink, which preserves the segment-before-recency lock order.

use std::hash::Hash;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::ds::arena::{Arena, Handle};
use crate::ds::recency::RecencyList;

/// Bucket tables never grow beyond this many slots.
const MAX_TABLE_LEN: usize = 1 << 30;

/// The cache-wide recency list under its lock, as passed to segment calls.
pub type RecencyLock = Mutex<RecencyList<EntryRef>>;

/// Stable cross-segment reference to an entry: the owning segment's index
/// plus the entry's handle in that segment's arena.
///
/// Recency-list nodes store these so eviction can walk from the LRU node
/// back to the segment that owns the victim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryRef {
    pub segment: u32,
    pub entry: Handle,
}

#[derive(Debug)]
struct Entry<K, V> {
    key: K,
    value: Arc<V>,
    hash: u64,
    bucket_next: Option<Handle>,
    node: Handle,
}

/// One shard of the cache: bucket table, entry arena, and counters.
#[derive(Debug)]
pub struct Segment<K, V> {
    index: u32,
    arena: Arena<Entry<K, V>>,
    table: Box<[Option<Handle>]>,
    count: usize,
    load_factor: f32,
    threshold: usize,
}

impl<K, V> Segment<K, V>
where
    K: Eq + Hash,
{
    /// Creates an empty segment.
    ///
    /// `initial_capacity` must be a power of two (the cache constructor and
    /// builder guarantee this); `load_factor` is the fill ratio at which the
    /// bucket table doubles.
    pub(crate) fn new(index: u32, initial_capacity: usize, load_factor: f32) -> Self {
        debug_assert!(initial_capacity.is_power_of_two());
        debug_assert!(load_factor > 0.0 && load_factor <= 1.0);
        Self {
            index,
            arena: Arena::with_capacity(initial_capacity),
            table: vec![None; initial_capacity].into_boxed_slice(),
            count: 0,
            load_factor,
            threshold: threshold(initial_capacity, load_factor),
        }
    }

    /// Looks up `key`, touching it to the MRU position on a hit.
    ///
    /// A miss has no side effect on either structure.
    pub fn get(&self, key: &K, hash: u64, recency: &RecencyLock) -> Option<Arc<V>> {
        let (handle, _) = self.find(key, hash)?;
        let entry = self.arena.get(handle)?;
        recency.lock().move_to_front(entry.node);
        Some(Arc::clone(&entry.value))
    }

    /// Returns `true` if `key` is present, without touching it.
    pub fn contains_key(&self, key: &K, hash: u64) -> bool {
        self.find(key, hash).is_some()
    }

    /// Inserts or replaces `key`, returning the previous value if any.
    ///
    /// Replacement swaps the value in place and touches the entry; the entry
    /// count and the bucket-chain position are unchanged. A new key becomes
    /// the head of its bucket chain and the MRU end of the recency list,
    /// growing the table first if the insert would cross the load-factor
    /// threshold.
    pub fn put(&mut self, key: K, value: Arc<V>, hash: u64, recency: &RecencyLock) -> Option<Arc<V>> {
        if let Some((handle, _)) = self.find(&key, hash) {
            let entry = self.arena.get_mut(handle)?;
            let previous = std::mem::replace(&mut entry.value, value);
            let node = entry.node;
            recency.lock().move_to_front(node);
            return Some(previous);
        }

        if self.count + 1 > self.threshold {
            self.grow();
        }

        let bucket = self.bucket(hash);
        let chain_head = self.table[bucket];
        let segment = self.index;
        let mut list = recency.lock();
        let handle = self.arena.insert_with(|entry| Entry {
            key,
            value,
            hash,
            bucket_next: chain_head,
            node: list.push_front(EntryRef { segment, entry }),
        });
        drop(list);
        self.table[bucket] = Some(handle);
        self.count += 1;
        None
    }

    /// Removes `key`, unlinking it from both the bucket chain and the
    /// recency list. Absent keys leave both structures untouched.
    pub fn remove(&mut self, key: &K, hash: u64, recency: &RecencyLock) -> Option<Arc<V>> {
        let (handle, predecessor) = self.find(key, hash)?;
        self.unlink(handle, predecessor, recency)
    }

    /// Removes the entry at `handle`, if it is still live.
    ///
    /// Eviction path: the cache resolves the LRU node to an [`EntryRef`] and
    /// calls in here under this segment's lock. A stale handle (the entry was
    /// removed between the LRU peek and this call) returns `None`.
    pub(crate) fn evict(&mut self, handle: Handle, recency: &RecencyLock) -> Option<Arc<V>> {
        let hash = self.arena.get(handle)?.hash;
        let mut predecessor = None;
        let mut current = self.table[self.bucket(hash)];
        while let Some(h) = current {
            if h == handle {
                return self.unlink(handle, predecessor, recency);
            }
            predecessor = Some(h);
            current = self.arena.get(h)?.bucket_next;
        }
        None
    }

    /// Drops every entry, bulk-unlinking their recency nodes.
    ///
    /// Returns the number of entries removed so the cache can settle its
    /// live-entry counter.
    pub fn clear(&mut self, recency: &RecencyLock) -> usize {
        if self.count == 0 {
            return 0;
        }
        let removed = self.count;
        {
            let mut list = recency.lock();
            for (_, entry) in self.arena.iter() {
                list.remove(entry.node);
            }
        }
        self.arena.clear();
        self.table.iter_mut().for_each(|slot| *slot = None);
        self.count = 0;
        removed
    }

    /// Returns the number of live entries in this segment.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Returns the current bucket-table length.
    ///
    /// Diagnostic probe of the table size, not an entry bound.
    pub fn capacity(&self) -> usize {
        self.table.len()
    }

    pub(crate) fn key_of(&self, entry: Handle) -> Option<&K> {
        self.arena.get(entry).map(|e| &e.key)
    }

    pub(crate) fn node_of(&self, entry: Handle) -> Option<Handle> {
        self.arena.get(entry).map(|e| e.node)
    }

    /// Iterates `(entry handle, recency node handle)` over live entries.
    pub(crate) fn iter_nodes(&self) -> impl Iterator<Item = (Handle, Handle)> + '_ {
        self.arena.iter().map(|(handle, entry)| (handle, entry.node))
    }

    /// Returns the keys of the bucket `hash` maps to, in chain order.
    #[doc(hidden)]
    pub fn debug_bucket_keys(&self, hash: u64) -> Vec<K>
    where
        K: Clone,
    {
        let mut keys = Vec::new();
        let mut current = self.table[self.bucket(hash)];
        while let Some(h) = current {
            match self.arena.get(h) {
                Some(entry) => {
                    keys.push(entry.key.clone());
                    current = entry.bucket_next;
                }
                None => break,
            }
        }
        keys
    }

    fn bucket(&self, hash: u64) -> usize {
        (hash as usize) & (self.table.len() - 1)
    }

    /// Scans the bucket chain for `key`, comparing the precomputed hash
    /// before key equality. Returns the entry and its chain predecessor.
    fn find(&self, key: &K, hash: u64) -> Option<(Handle, Option<Handle>)> {
        let mut predecessor = None;
        let mut current = self.table[self.bucket(hash)];
        while let Some(h) = current {
            let entry = self.arena.get(h)?;
            if entry.hash == hash && entry.key == *key {
                return Some((h, predecessor));
            }
            predecessor = Some(h);
            current = entry.bucket_next;
        }
        None
    }

    fn unlink(
        &mut self,
        handle: Handle,
        predecessor: Option<Handle>,
        recency: &RecencyLock,
    ) -> Option<Arc<V>> {
        let entry = self.arena.remove(handle)?;
        match predecessor {
            Some(prev) => {
                if let Some(prev_entry) = self.arena.get_mut(prev) {
                    prev_entry.bucket_next = entry.bucket_next;
                }
            }
            None => {
                let bucket = self.bucket(entry.hash);
                self.table[bucket] = entry.bucket_next;
            }
        }
        recency.lock().remove(entry.node);
        self.count -= 1;
        Some(entry.value)
    }

    /// Doubles the bucket table and rehashes every entry into it.
    ///
    /// Chain order within a bucket is not preserved across a grow; only
    /// membership matters.
    fn grow(&mut self) {
        let old_len = self.table.len();
        if old_len >= MAX_TABLE_LEN {
            return;
        }
        let new_len = old_len << 1;

        let handles: Vec<Handle> = {
            let mut handles = Vec::with_capacity(self.count);
            for slot in self.table.iter() {
                let mut current = *slot;
                while let Some(h) = current {
                    handles.push(h);
                    current = self.arena.get(h).and_then(|e| e.bucket_next);
                }
            }
            handles
        };

        let mut new_table = vec![None; new_len].into_boxed_slice();
        let mask = new_len - 1;
        for handle in handles {
            if let Some(entry) = self.arena.get_mut(handle) {
                let bucket = (entry.hash as usize) & mask;
                entry.bucket_next = new_table[bucket];
                new_table[bucket] = Some(handle);
            }
        }
        self.table = new_table;
        self.threshold = threshold(new_len, self.load_factor);
    }
}

fn threshold(table_len: usize, load_factor: f32) -> usize {
    ((table_len as f32) * load_factor) as usize
}
