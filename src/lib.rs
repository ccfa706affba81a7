//! seglru: bounded, concurrent, segmented LRU cache engine.
//!
//! A fixed set of independently-lockable segments shards the hash index;
//! one cache-wide recency list orders every live entry from most to least
//! recently used, so eviction is globally LRU even though lookups contend
//! only on their own segment. See the [`cache`] module for the architecture
//! and locking discipline.
//!
//! ```
//! use seglru::prelude::*;
//!
//! let cache = CacheBuilder::new(1_000)
//!     .segments(16)
//!     .try_build::<String, Vec<u8>>()
//!     .unwrap();
//!
//! cache.put("page:1".to_string(), vec![1, 2, 3]);
//! assert_eq!(cache.get(&"page:1".to_string()).as_deref(), Some(&vec![1, 2, 3]));
//! ```

pub mod builder;
pub mod cache;
pub mod ds;
pub mod error;
pub mod key;
pub mod prelude;
pub mod segment;
pub mod stats;
pub mod traits;
