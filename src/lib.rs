//! bplusdb - A disk-resident B+ tree index engine.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                            bplusdb                              │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │               Index Layer (index/btree/)                 │   │
//! │  │   BTreeFile: insert / delete / find_run_start / destroy  │   │
//! │  │   BTreeFileScan  ·  Leaf/Index/Header page views         │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │               Buffer Pool (buffer/)                      │   │
//! │  │   BufferPoolManager + Frame + LRU replacer               │   │
//! │  │   PageReadGuard · PageWriteGuard · PagePin               │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │               Storage Layer (storage/)                   │   │
//! │  │   DiskManager + Page + PageHeader + file directory       │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//! - [`common`] - Shared primitives (PageId, FrameId, Error, config)
//! - [`storage`] - Disk I/O, page formats, the file directory
//! - [`buffer`] - Buffer pool and page guards
//! - [`index`] - The B+ tree
//!
//! # Quick Start
//! ```no_run
//! use bplusdb::{BTreeConfig, BTreeFile, BufferPoolManager, DiskManager, Key, PageId, RecordId};
//!
//! let dm = DiskManager::open_or_create("my_index.db").unwrap();
//! let bpm = BufferPoolManager::with_default_size(dm);
//!
//! let mut tree = BTreeFile::create_or_open(&bpm, "people_by_age", BTreeConfig::integer()).unwrap();
//! tree.insert(&Key::Int(42), RecordId::new(PageId::new(9), 3)).unwrap();
//!
//! for entry in tree.new_scan(Some(&Key::Int(40)), None).unwrap() {
//!     let (key, rid) = entry.unwrap();
//!     println!("{key} -> {rid}");
//! }
//!
//! tree.close();
//! bpm.flush_all_pages().unwrap();
//! ```

pub mod buffer;
pub mod common;
pub mod index;
pub mod storage;

// Re-export commonly used items at crate root for convenience
pub use common::config::PAGE_SIZE;
pub use common::{Error, ErrorKind, FrameId, PageId, Result};

pub use buffer::{BufferPoolManager, PagePin, PageReadGuard, PageWriteGuard};
pub use index::btree::{
    BTreeConfig, BTreeFile, BTreeFileScan, BTreeHeader, DeleteMode, Key, KeyType, RecordId,
};
pub use storage::page::{Page, PageType};
pub use storage::DiskManager;
