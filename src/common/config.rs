//! Configuration constants for bplusdb.

use super::PageId;

/// Size of a page in bytes (4KB).
///
/// Every tree node, the file directory and each B+ tree header occupies
/// exactly one page.
pub const PAGE_SIZE: usize = 4096;

/// Maximum number of pages with u32 PageId.
///
/// `u32::MAX` itself is reserved for [`PageId::INVALID`].
pub const MAX_PAGES: u64 = u32::MAX as u64;

/// Maximum theoretical database size in bytes.
pub const MAX_DB_SIZE_BYTES: u64 = MAX_PAGES * PAGE_SIZE as u64;

/// Page 0 of every database file holds the file directory.
pub const DIRECTORY_PAGE_ID: PageId = PageId(0);

/// Longest name a file-directory entry can carry, in bytes.
pub const MAX_FILE_NAME_LEN: usize = 50;

/// Magic number stamped into every B+ tree header page.
pub const BTREE_MAGIC: u32 = 1989;

/// Frame count used by [`BufferPoolManager::with_default_size`].
///
/// [`BufferPoolManager::with_default_size`]: crate::buffer::BufferPoolManager::with_default_size
pub const DEFAULT_POOL_SIZE: usize = 64;
