//! Validated cache construction.
//!
//! [`CacheBuilder`] is the fallible front door for user-supplied
//! configuration: it checks the power-of-two requirements and ranges that
//! [`SegmentedLruCache::new`] papers over by rounding, and returns a
//! [`ConfigError`] instead of adjusting anything silently.
//!
//! ## Example
//!
//! ```
//! use seglru::builder::CacheBuilder;
//!
//! let cache = CacheBuilder::new(10_000)
//!     .segments(32)
//!     .initial_capacity(8)
//!     .load_factor(0.8)
//!     .try_build::<u64, String>()
//!     .unwrap();
//! assert_eq!(cache.max_entries(), 10_000);
//! assert_eq!(cache.segment_count(), 32);
//! ```

use std::hash::Hash;

use crate::cache::{
    SegmentedLruCache, DEFAULT_INITIAL_CAPACITY, DEFAULT_LOAD_FACTOR, DEFAULT_SEGMENTS,
};
use crate::error::ConfigError;

/// Builder for [`SegmentedLruCache`].
#[derive(Debug, Clone)]
pub struct CacheBuilder {
    max_entries: usize,
    segments: usize,
    initial_capacity: usize,
    load_factor: f32,
}

impl CacheBuilder {
    /// Starts a builder for a cache bounded to `max_entries` total entries.
    pub fn new(max_entries: usize) -> Self {
        Self {
            max_entries,
            segments: DEFAULT_SEGMENTS,
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            load_factor: DEFAULT_LOAD_FACTOR,
        }
    }

    /// Sets the number of segments (must be a power of two).
    pub fn segments(mut self, segments: usize) -> Self {
        self.segments = segments;
        self
    }

    /// Sets the initial bucket-table length per segment (must be a power of
    /// two).
    pub fn initial_capacity(mut self, initial_capacity: usize) -> Self {
        self.initial_capacity = initial_capacity;
        self
    }

    /// Sets the fill ratio at which a segment's bucket table doubles
    /// (must be in `(0.0, 1.0]`).
    pub fn load_factor(mut self, load_factor: f32) -> Self {
        self.load_factor = load_factor;
        self
    }

    /// Validates the configuration and builds the cache.
    pub fn try_build<K, V>(self) -> Result<SegmentedLruCache<K, V>, ConfigError>
    where
        K: Eq + Hash,
    {
        if self.max_entries == 0 {
            return Err(ConfigError::new("max_entries must be greater than zero"));
        }
        if !self.segments.is_power_of_two() {
            return Err(ConfigError::new(format!(
                "segment count must be a power of two, got {}",
                self.segments
            )));
        }
        if !self.initial_capacity.is_power_of_two() {
            return Err(ConfigError::new(format!(
                "initial capacity must be a power of two, got {}",
                self.initial_capacity
            )));
        }
        if !(self.load_factor > 0.0 && self.load_factor <= 1.0) {
            return Err(ConfigError::new(format!(
                "load factor must be in (0.0, 1.0], got {}",
                self.load_factor
            )));
        }
        Ok(SegmentedLruCache::with_parameters(
            self.segments,
            self.initial_capacity,
            self.load_factor,
            self.max_entries,
        ))
    }
}
