//! Disk-resident B+ tree.
//!
//! # Structure
//! ```text
//!                 header page (pinned while open)
//!                        │ root
//!                        ▼
//!                ┌──────────────┐
//!                │  index page  │  leftmost child + (key, child) entries
//!                └──────────────┘
//!                 │      │     │
//!                 ▼      ▼     ▼
//!              ┌────┐ ┌────┐ ┌────┐
//!              │leaf│⇄│leaf│⇄│leaf│  (key, record id) entries
//!              └────┘ └────┘ └────┘
//! ```
//!
//! Nodes name each other by [`PageId`](crate::PageId) only and are
//! re-pinned through the buffer pool on every visit.
//!
//! - [`BTreeFile`] - open/create/destroy, insert, delete, search
//! - [`BTreeFileScan`] - inclusive range iterator over the leaf chain
//! - [`LeafPage`], [`IndexPage`], [`SortedPage`] - typed views over node pages
//! - [`BTreeHeader`] - the header record
//! - [`TraceSink`] - optional visualization output

mod config;
mod file;
mod header_page;
mod index_page;
mod insert;
mod key;
mod leaf_page;
mod scan;
mod sorted_page;
mod trace;

pub use config::BTreeConfig;
pub use file::{BTreeFile, RunStart};
pub use header_page::BTreeHeader;
pub use index_page::IndexPage;
pub use key::{DeleteMode, Key, KeyType, RecordId};
pub use leaf_page::LeafPage;
pub use scan::BTreeFileScan;
pub use sorted_page::{NodeType, SortedPage, MAX_NODE_CAPACITY, NODE_HEADER_SIZE, SLOT_SIZE};
pub use trace::TraceSink;
