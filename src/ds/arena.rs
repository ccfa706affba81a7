//! Generational slot arena.
//!
//! Backing storage for cache entries and recency-list nodes. Values are
//! addressed by [`Handle`], a (index, generation) pair: the index gives O(1)
//! access, the generation detects handles that outlived their slot. A slot's
//! generation is bumped every time it is freed, so a handle taken before a
//! `remove` (or `clear`) no longer resolves afterwards, even if the slot has
//! been reused for a new value.
//!
//! ```text
//!   slots
//!   ┌─────┬────────────────────────────────┐
//!   │ idx │ { generation, value }          │
//!   ├─────┼────────────────────────────────┤
//!   │  0  │ { gen: 2, Some(A) }            │  Handle { index: 0, generation: 2 } ── resolves
//!   │  1  │ { gen: 5, None    }            │  Handle { index: 1, generation: 4 } ── stale
//!   │  2  │ { gen: 0, Some(B) }            │
//!   └─────┴────────────────────────────────┘
//!   free: [1]
//! ```
//!
//! Stale-handle detection is what makes the dual-membership invariant of the
//! cache (bucket chain + recency list referencing the same entry) mechanically
//! checkable: a link set holding a dead handle observes `None` instead of
//! silently reading a recycled slot.

/// Stable, generation-checked reference to a value in an [`Arena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    index: u32,
    generation: u32,
}

impl Handle {
    /// Returns the slot index, for diagnostics and deterministic test output.
    pub fn index(self) -> usize {
        self.index as usize
    }
}

#[derive(Debug)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Dense, free-list backed store handing out generational [`Handle`]s.
#[derive(Debug)]
pub struct Arena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    len: usize,
}

impl<T> Arena<T> {
    /// Creates an empty arena.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }

    /// Creates an empty arena with reserved slot capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            len: 0,
        }
    }

    /// Inserts a value and returns its handle.
    pub fn insert(&mut self, value: T) -> Handle {
        self.insert_with(|_| value)
    }

    /// Inserts the value produced by `init`, which receives the handle the
    /// value will live under.
    ///
    /// Useful when the stored value must record its own handle in some other
    /// structure (an entry registering itself in a linked list, for example).
    pub fn insert_with(&mut self, init: impl FnOnce(Handle) -> T) -> Handle {
        let handle = match self.free.pop() {
            Some(index) => Handle {
                index,
                generation: self.slots[index as usize].generation,
            },
            None => {
                debug_assert!(self.slots.len() < u32::MAX as usize);
                self.slots.push(Slot {
                    generation: 0,
                    value: None,
                });
                Handle {
                    index: (self.slots.len() - 1) as u32,
                    generation: 0,
                }
            }
        };
        self.slots[handle.index as usize].value = Some(init(handle));
        self.len += 1;
        handle
    }

    /// Removes the value at `handle`, returning it if the handle was live.
    pub fn remove(&mut self, handle: Handle) -> Option<T> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        self.len -= 1;
        Some(value)
    }

    /// Returns the value at `handle`, if the handle is still live.
    pub fn get(&self, handle: Handle) -> Option<&T> {
        let slot = self.slots.get(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.value.as_ref()
    }

    /// Returns the value at `handle` mutably, if the handle is still live.
    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.value.as_mut()
    }

    /// Returns `true` if `handle` still resolves to a value.
    pub fn contains(&self, handle: Handle) -> bool {
        self.get(handle).is_some()
    }

    /// Returns the number of live values.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the arena holds no values.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Drops every value and invalidates every outstanding handle.
    pub fn clear(&mut self) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.value.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(index as u32);
            }
        }
        self.len = 0;
    }

    /// Iterates over live `(Handle, &T)` pairs in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (Handle, &T)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.value.as_ref().map(|value| {
                (
                    Handle {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    value,
                )
            })
        })
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}
