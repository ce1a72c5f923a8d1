//! Index structures built on the buffer pool.
//!
//! - [`btree`] - Disk-resident B+ tree with duplicate keys and range scans

pub mod btree;
