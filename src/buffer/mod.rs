//! Buffer pool management.
//!
//! The buffer pool is the page cache between the B+ tree and disk. It
//! manages a fixed pool of frames, each holding one page.
//!
//! # Components
//! - [`BufferPoolManager`] - The page cache, page allocator and file directory
//! - [`Frame`] - A slot in the buffer pool holding a page + metadata
//! - [`PageReadGuard`] / [`PageWriteGuard`] / [`PagePin`] - RAII pins
//! - [`replacer`] - Eviction policy

mod buffer_pool_manager;
mod frame;
mod page_guard;
pub mod replacer;

pub use buffer_pool_manager::BufferPoolManager;
pub use frame::Frame;
pub use page_guard::{PagePin, PageReadGuard, PageWriteGuard};
