//! Error types for the seglru library.
//!
//! ## Key Components
//!
//! - [`ConfigError`]: Returned when cache construction parameters are invalid
//!   (e.g. zero capacity, non-power-of-two sizes, out-of-range load factor).
//! - [`InvariantError`]: Returned when the cache's internal structures
//!   disagree (diagnostic `check_invariants` methods).
//!
//! ## Example Usage
//!
//! ```
//! use seglru::builder::CacheBuilder;
//! use seglru::cache::SegmentedLruCache;
//! use seglru::error::ConfigError;
//!
//! let cache: Result<SegmentedLruCache<u64, String>, ConfigError> =
//!     CacheBuilder::new(1024).segments(8).try_build();
//! assert!(cache.is_ok());
//!
//! // A non-power-of-two segment count is caught without panicking.
//! let bad = CacheBuilder::new(1024).segments(6).try_build::<u64, String>();
//! assert!(bad.is_err());
//! ```

use std::fmt;

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Error returned when cache construction parameters are invalid.
///
/// Produced by [`CacheBuilder::try_build`](crate::builder::CacheBuilder::try_build).
/// Carries a human-readable description of which parameter failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError(String);

impl ConfigError {
    /// Creates a new `ConfigError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// InvariantError
// ---------------------------------------------------------------------------

/// Error returned when the hash index and the recency list disagree.
///
/// Produced by
/// [`SegmentedLruCache::check_invariants`](crate::cache::SegmentedLruCache::check_invariants),
/// which cross-checks the bucket chains of every segment against the
/// cache-wide recency list. Carries a description of the first mismatch found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantError(String);

impl InvariantError {
    /// Creates a new `InvariantError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for InvariantError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
