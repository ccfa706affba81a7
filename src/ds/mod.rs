pub mod arena;
pub mod recency;

pub use arena::{Arena, Handle};
pub use recency::RecencyList;
