//! Storage layer - disk I/O and page formats.
//!
//! This module handles persistent storage:
//! - [`DiskManager`] - Low-level file I/O and page allocation
//! - [`DirectoryPage`] - The name → header page directory in page 0
//! - [`page`] - Page types and layouts

mod directory;
mod disk_manager;
pub mod page;

pub use directory::DirectoryPage;
pub use disk_manager::DiskManager;
