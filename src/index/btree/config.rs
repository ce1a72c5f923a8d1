//! Per-tree configuration, persisted in the header page at creation.

use crate::common::{Error, Result};

use super::key::{DeleteMode, KeyType, RecordId};
use super::sorted_page::{MAX_NODE_CAPACITY, SLOT_SIZE};

/// Settings chosen when a tree is created.
///
/// Reopening a tree ignores the caller's config: whatever the header page
/// recorded wins.
///
/// # Example
/// ```
/// use bplusdb::{BTreeConfig, DeleteMode, KeyType};
///
/// let config = BTreeConfig::string(32)
///     .with_delete_mode(DeleteMode::Naive)
///     .with_node_capacity(512);
/// assert_eq!(config.key_type, KeyType::String);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BTreeConfig {
    pub key_type: KeyType,
    /// Largest encoded key accepted by `insert`.
    pub max_key_size: usize,
    pub delete_mode: DeleteMode,
    /// Bytes each node may spend on slots and entries.
    pub node_capacity: usize,
}

impl BTreeConfig {
    pub fn new(key_type: KeyType, max_key_size: usize) -> Self {
        Self {
            key_type,
            max_key_size,
            delete_mode: DeleteMode::Naive,
            node_capacity: MAX_NODE_CAPACITY,
        }
    }

    /// Integer keys, full-page nodes.
    pub fn integer() -> Self {
        Self::new(KeyType::Integer, KeyType::Integer.min_key_size())
    }

    /// String keys of up to `max_key_size` encoded bytes.
    pub fn string(max_key_size: usize) -> Self {
        Self::new(KeyType::String, max_key_size)
    }

    pub fn with_delete_mode(mut self, delete_mode: DeleteMode) -> Self {
        self.delete_mode = delete_mode;
        self
    }

    pub fn with_node_capacity(mut self, node_capacity: usize) -> Self {
        self.node_capacity = node_capacity;
        self
    }

    /// Check that every node can hold at least four maximal leaf entries.
    ///
    /// With less room a split may leave the half that must take the new
    /// entry without space for it.
    pub fn validate(&self) -> Result<()> {
        let min = self.key_type.min_key_size();
        if self.max_key_size < min {
            return Err(Error::InvalidConfig(format!(
                "max key size {} is below the {} bytes a {} key needs",
                self.max_key_size,
                min,
                self.key_type.name()
            )));
        }
        if self.node_capacity > MAX_NODE_CAPACITY {
            return Err(Error::InvalidConfig(format!(
                "node capacity {} exceeds {MAX_NODE_CAPACITY}",
                self.node_capacity
            )));
        }

        let widest = self.max_key_size.checked_add(RecordId::SIZE + SLOT_SIZE);
        match widest.and_then(|w| w.checked_mul(4).map(|need| (w, need))) {
            Some((_, need)) if need <= self.node_capacity => Ok(()),
            Some((w, _)) => Err(Error::InvalidConfig(format!(
                "node capacity {} cannot hold four {w}-byte entries",
                self.node_capacity
            ))),
            None => Err(Error::InvalidConfig(format!(
                "max key size {} is out of range",
                self.max_key_size
            ))),
        }
    }
}
