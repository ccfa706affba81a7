//! Cache-wide recency list.
//!
//! A doubly linked list whose nodes live in a generational [`Arena`] and link
//! each other by [`Handle`], ordering values from most recently used (front)
//! to least recently used (back). This is the single, cache-wide structure
//! that spans every segment of the cache; segments hold the [`Handle`] of
//! their entries' nodes and relink them through the cache's lock.
//!
//! ```text
//!   front (MRU)                                     back (LRU)
//!      │                                                │
//!      ▼                                                ▼
//!   ┌──────┐ next ┌──────┐ next ┌──────┐ next ┌──────┐
//!   │ node │ ───► │ node │ ───► │ node │ ───► │ node │ ───► None
//!   │      │ ◄─── │      │ ◄─── │      │ ◄─── │      │
//!   └──────┘ prev └──────┘ prev └──────┘ prev └──────┘
//! ```
//!
//! All mutating operations are O(1). `move_to_front` is the touch-on-access
//! primitive; `pop_back` is the eviction primitive. Because node handles are
//! generational, a handle held by a concurrently removed entry simply stops
//! resolving instead of corrupting the links.

use crate::ds::arena::{Arena, Handle};

#[derive(Debug)]
struct Node<T> {
    value: T,
    prev: Option<Handle>,
    next: Option<Handle>,
}

/// Doubly linked MRU→LRU list with arena-backed nodes.
#[derive(Debug)]
pub struct RecencyList<T> {
    arena: Arena<Node<T>>,
    front: Option<Handle>,
    back: Option<Handle>,
}

impl<T> RecencyList<T> {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            front: None,
            back: None,
        }
    }

    /// Creates an empty list with reserved node capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            arena: Arena::with_capacity(capacity),
            front: None,
            back: None,
        }
    }

    /// Returns the number of nodes.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    /// Returns `true` if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Returns `true` if `node` is currently linked into this list.
    pub fn contains(&self, node: Handle) -> bool {
        self.arena.contains(node)
    }

    /// Returns the most recently used value.
    pub fn front(&self) -> Option<&T> {
        self.front.and_then(|h| self.arena.get(h)).map(|n| &n.value)
    }

    /// Returns the least recently used value.
    pub fn back(&self) -> Option<&T> {
        self.back.and_then(|h| self.arena.get(h)).map(|n| &n.value)
    }

    /// Returns the handle of the least recently used node.
    pub fn back_id(&self) -> Option<Handle> {
        self.back
    }

    /// Returns the value stored in `node`, if the node is still linked.
    pub fn get(&self, node: Handle) -> Option<&T> {
        self.arena.get(node).map(|n| &n.value)
    }

    /// Links a new value at the most recently used position.
    pub fn push_front(&mut self, value: T) -> Handle {
        let old_front = self.front;
        let node = self.arena.insert(Node {
            value,
            prev: None,
            next: old_front,
        });
        match old_front {
            Some(front) => {
                if let Some(front_node) = self.arena.get_mut(front) {
                    front_node.prev = Some(node);
                }
            }
            None => self.back = Some(node),
        }
        self.front = Some(node);
        node
    }

    /// Moves an existing node to the most recently used position.
    ///
    /// Returns `false` if `node` is not (or no longer) in the list. A node
    /// already at the front is left where it is.
    pub fn move_to_front(&mut self, node: Handle) -> bool {
        if !self.arena.contains(node) {
            return false;
        }
        if self.front == Some(node) {
            return true;
        }
        self.detach(node);
        let old_front = self.front;
        if let Some(n) = self.arena.get_mut(node) {
            n.prev = None;
            n.next = old_front;
        }
        if let Some(front) = old_front {
            if let Some(front_node) = self.arena.get_mut(front) {
                front_node.prev = Some(node);
            }
        } else {
            self.back = Some(node);
        }
        self.front = Some(node);
        true
    }

    /// Unlinks `node` and returns its value.
    pub fn remove(&mut self, node: Handle) -> Option<T> {
        if !self.arena.contains(node) {
            return None;
        }
        self.detach(node);
        self.arena.remove(node).map(|n| n.value)
    }

    /// Unlinks and returns the least recently used value.
    pub fn pop_back(&mut self) -> Option<T> {
        let back = self.back?;
        self.remove(back)
    }

    /// Drops every node. The list ends in the same state as a fresh one.
    pub fn clear(&mut self) {
        self.arena.clear();
        self.front = None;
        self.back = None;
    }

    /// Iterates values from most to least recently used.
    pub fn iter(&self) -> RecencyIter<'_, T> {
        RecencyIter {
            list: self,
            current: self.front,
        }
    }

    fn detach(&mut self, node: Handle) {
        let (prev, next) = match self.arena.get(node) {
            Some(n) => (n.prev, n.next),
            None => return,
        };
        match prev {
            Some(prev) => {
                if let Some(prev_node) = self.arena.get_mut(prev) {
                    prev_node.next = next;
                }
            }
            None => self.front = next,
        }
        match next {
            Some(next) => {
                if let Some(next_node) = self.arena.get_mut(next) {
                    next_node.prev = prev;
                }
            }
            None => self.back = prev,
        }
    }

    #[cfg(any(test, debug_assertions))]
    /// Walks the list both ways and asserts the link structure is symmetric.
    pub fn debug_validate(&self) {
        if self.front.is_none() || self.back.is_none() {
            assert!(self.front.is_none() && self.back.is_none());
            assert_eq!(self.len(), 0);
            return;
        }

        let mut count = 0usize;
        let mut prev = None;
        let mut current = self.front;
        while let Some(node) = current {
            let n = self.arena.get(node).expect("linked node missing");
            assert_eq!(n.prev, prev);
            prev = Some(node);
            current = n.next;
            count += 1;
            assert!(count <= self.len());
        }
        assert_eq!(prev, self.back);
        assert_eq!(count, self.len());
    }
}

impl<T> Default for RecencyList<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over values from MRU to LRU.
pub struct RecencyIter<'a, T> {
    list: &'a RecencyList<T>,
    current: Option<Handle>,
}

impl<'a, T> Iterator for RecencyIter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.list.arena.get(self.current?)?;
        self.current = node.next;
        Some(&node.value)
    }
}
