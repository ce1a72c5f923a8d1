//! Eviction policy implementations (replacers).
//!
//! - [`LruReplacer`] - evicts the unpinned frame touched longest ago

mod lru;

pub use lru::LruReplacer;
