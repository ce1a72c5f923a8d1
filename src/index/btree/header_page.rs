//! Header page - the one fixed record that anchors a tree.
//!
//! ```text
//! offset  field
//! 0       PageHeader (type = BTreeHeader)
//! 13      magic          u32   (BTREE_MAGIC)
//! 17      root           u32   (PageId::INVALID while the tree is empty)
//! 21      key_type       u8
//! 22      max_key_size   u16
//! 24      delete_mode    u8
//! 25      node_capacity  u16
//! ```

use crate::common::config::BTREE_MAGIC;
use crate::common::{Error, PageId, Result};
use crate::storage::page::{Page, PageType};

use super::config::BTreeConfig;
use super::key::{DeleteMode, KeyType};

const OFFSET_MAGIC: usize = 13;
const OFFSET_ROOT: usize = 17;
const OFFSET_KEY_TYPE: usize = 21;
const OFFSET_MAX_KEY_SIZE: usize = 22;
const OFFSET_DELETE_MODE: usize = 24;
const OFFSET_NODE_CAPACITY: usize = 25;

/// Decoded contents of a header page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BTreeHeader {
    pub root: PageId,
    pub key_type: KeyType,
    pub max_key_size: usize,
    pub delete_mode: DeleteMode,
    pub node_capacity: usize,
}

impl BTreeHeader {
    /// Header of a freshly created, empty tree.
    pub fn empty(config: &BTreeConfig) -> Self {
        Self {
            root: PageId::INVALID,
            key_type: config.key_type,
            max_key_size: config.max_key_size,
            delete_mode: config.delete_mode,
            node_capacity: config.node_capacity,
        }
    }

    /// Decode and validate the header stored in `page`.
    pub fn read(page: &Page, page_id: PageId) -> Result<Self> {
        if page.page_type() != PageType::BTreeHeader {
            return Err(Error::corrupted(
                page_id.0,
                format!("expected a B+ tree header, found {:?}", page.page_type()),
            ));
        }

        let magic = page.read_u32(OFFSET_MAGIC);
        if magic != BTREE_MAGIC {
            return Err(Error::corrupted(page_id.0, format!("bad magic {magic}")));
        }

        let raw_key_type = page.as_slice()[OFFSET_KEY_TYPE];
        let key_type = KeyType::from_u8(raw_key_type).ok_or_else(|| {
            Error::corrupted(page_id.0, format!("unknown key type tag {raw_key_type}"))
        })?;
        let raw_mode = page.as_slice()[OFFSET_DELETE_MODE];
        let delete_mode = DeleteMode::from_u8(raw_mode).ok_or_else(|| {
            Error::corrupted(page_id.0, format!("unknown delete mode tag {raw_mode}"))
        })?;

        Ok(Self {
            root: PageId::read_at(page.as_slice(), OFFSET_ROOT),
            key_type,
            max_key_size: page.read_u16(OFFSET_MAX_KEY_SIZE) as usize,
            delete_mode,
            node_capacity: page.read_u16(OFFSET_NODE_CAPACITY) as usize,
        })
    }

    /// Format `page` as a header page holding `self`.
    pub fn write(&self, page: &mut Page) {
        page.format(PageType::BTreeHeader);
        page.write_u32(OFFSET_MAGIC, BTREE_MAGIC);
        self.root.write_at(page.as_mut_slice(), OFFSET_ROOT);
        page.as_mut_slice()[OFFSET_KEY_TYPE] = self.key_type as u8;
        page.write_u16(OFFSET_MAX_KEY_SIZE, self.max_key_size as u16);
        page.as_mut_slice()[OFFSET_DELETE_MODE] = self.delete_mode as u8;
        page.write_u16(OFFSET_NODE_CAPACITY, self.node_capacity as u16);
    }

    /// Overwrite only the root pointer of an existing header page.
    pub fn set_root(page: &mut Page, root: PageId) {
        root.write_at(page.as_mut_slice(), OFFSET_ROOT);
    }
}
