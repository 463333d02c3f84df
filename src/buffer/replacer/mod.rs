//! Eviction ordering.
//!
//! - [`LruReplacer`] - Index-linked LRU list with head/tail sentinels

mod lru;

pub use lru::LruReplacer;
