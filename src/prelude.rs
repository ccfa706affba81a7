pub use crate::builder::CacheBuilder;
pub use crate::cache::SegmentedLruCache;
pub use crate::ds::{Arena, Handle, RecencyList};
pub use crate::error::{ConfigError, InvariantError};
pub use crate::key::{HashCodeKey, HashCodeKeyGenerator};
pub use crate::segment::{EntryRef, Segment};
pub use crate::stats::StatsSnapshot;
pub use crate::traits::ConcurrentCache;
