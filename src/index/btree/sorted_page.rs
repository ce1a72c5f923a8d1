//! Sorted page - the slotted layout shared by index and leaf nodes.
//!
//! # Layout
//! ```text
//! +----------------+---------------------------+------------------+------------+---------------+
//! | PageHeader(13) | node header (19)          | slot directory → |  free      | ← entry bytes |
//! +----------------+---------------------------+------------------+------------+---------------+
//! 0                13                          32                               data_start    limit
//! ```
//!
//! Node header fields (little-endian):
//! - `self_id` u32 @13, `prev_page` u32 @17, `next_page` u32 @21
//! - `slot_count` u16 @25, `data_start` u16 @27, `limit` u16 @29
//!
//! Each slot is `(offset u16, len u16)`. Slots are kept in key order;
//! entry bytes are packed downward from `limit`. `limit` is
//! `32 + node_capacity`, so a tree can ask for small nodes inside a full
//! 4 KiB page.

use std::ops::{Deref, DerefMut};

use crate::common::config::PAGE_SIZE;
use crate::common::{Error, PageId, Result};
use crate::storage::page::{Page, PageType};

use super::key::{Key, KeyRef, KeyType};

const OFFSET_SELF: usize = 13;
const OFFSET_PREV: usize = 17;
const OFFSET_NEXT: usize = 21;
const OFFSET_SLOT_COUNT: usize = 25;
const OFFSET_DATA_START: usize = 27;
const OFFSET_LIMIT: usize = 29;

/// Bytes before the slot directory.
pub const NODE_HEADER_SIZE: usize = 32;

/// Bytes per slot directory entry.
pub const SLOT_SIZE: usize = 4;

/// Largest node capacity: everything after the node header.
pub const MAX_NODE_CAPACITY: usize = PAGE_SIZE - NODE_HEADER_SIZE;

/// The closed set of page kinds a tree is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Header,
    Index,
    Leaf,
}

impl NodeType {
    /// Classify a page by its type tag. Any tag the tree never writes is
    /// corruption.
    pub fn of(page: &Page, page_id: PageId) -> Result<Self> {
        match page.page_type() {
            PageType::BTreeHeader => Ok(NodeType::Header),
            PageType::BTreeIndex => Ok(NodeType::Index),
            PageType::BTreeLeaf => Ok(NodeType::Leaf),
            other => Err(Error::corrupted(
                page_id.0,
                format!("expected a B+ tree page, found {other:?}"),
            )),
        }
    }

    pub fn page_type(self) -> PageType {
        match self {
            NodeType::Header => PageType::BTreeHeader,
            NodeType::Index => PageType::BTreeIndex,
            NodeType::Leaf => PageType::BTreeLeaf,
        }
    }
}

/// A typed view over a node page.
///
/// `P` is anything that derefs to a [`Page`]: `&Page`, `&mut Page`, or a
/// buffer pool guard. Mutating methods need `P: DerefMut`.
pub struct SortedPage<P> {
    page: P,
    key_type: KeyType,
}

#[inline]
fn slot_offset(index: usize) -> usize {
    NODE_HEADER_SIZE + index * SLOT_SIZE
}

impl<P: Deref<Target = Page>> SortedPage<P> {
    /// View an already formatted node page.
    pub fn new(page: P, key_type: KeyType) -> Self {
        Self { page, key_type }
    }

    pub fn into_inner(self) -> P {
        self.page
    }

    pub fn key_type(&self) -> KeyType {
        self.key_type
    }

    /// The id this page was formatted with.
    pub fn page_id(&self) -> PageId {
        PageId::read_at(self.page.as_slice(), OFFSET_SELF)
    }

    pub fn node_type(&self) -> Result<NodeType> {
        NodeType::of(&self.page, self.page_id())
    }

    pub fn prev_page(&self) -> PageId {
        PageId::read_at(self.page.as_slice(), OFFSET_PREV)
    }

    pub fn next_page(&self) -> PageId {
        PageId::read_at(self.page.as_slice(), OFFSET_NEXT)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.page.read_u16(OFFSET_SLOT_COUNT) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn data_start(&self) -> usize {
        self.page.read_u16(OFFSET_DATA_START) as usize
    }

    fn limit(&self) -> usize {
        self.page.read_u16(OFFSET_LIMIT) as usize
    }

    /// Bytes available to slots and entries when the page is empty.
    pub fn capacity(&self) -> usize {
        self.limit().saturating_sub(NODE_HEADER_SIZE)
    }

    /// Largest entry (key plus payload) that still fits, after reserving
    /// room for its slot.
    pub fn available_space(&self) -> usize {
        let slots_end = slot_offset(self.len());
        self.data_start()
            .saturating_sub(slots_end)
            .saturating_sub(SLOT_SIZE)
    }

    fn slot(&self, index: usize) -> Result<(usize, usize)> {
        let count = self.len();
        if index >= count {
            return Err(Error::corrupted(
                self.page_id().0,
                format!("slot {index} out of range ({count} entries)"),
            ));
        }
        let at = slot_offset(index);
        let offset = self.page.read_u16(at) as usize;
        let len = self.page.read_u16(at + 2) as usize;
        if offset < slot_offset(count) || offset + len > self.limit().min(PAGE_SIZE) {
            return Err(Error::corrupted(
                self.page_id().0,
                format!("slot {index} points outside the data area"),
            ));
        }
        Ok((offset, len))
    }

    /// Raw bytes of entry `index`: encoded key followed by the payload.
    pub fn entry_bytes(&self, index: usize) -> Result<&[u8]> {
        let (offset, len) = self.slot(index)?;
        Ok(&self.page.as_slice()[offset..offset + len])
    }

    /// Borrowed key of entry `index` and the entry's payload bytes.
    pub(crate) fn split_entry(&self, index: usize) -> Result<(KeyRef<'_>, &[u8])> {
        let bytes = self.entry_bytes(index)?;
        match KeyRef::decode(bytes, self.key_type) {
            Some((key, key_len)) => Ok((key, &bytes[key_len..])),
            None => Err(Error::corrupted(
                self.page_id().0,
                format!("undecodable {} key in slot {index}", self.key_type.name()),
            )),
        }
    }

    pub fn key_at(&self, index: usize) -> Result<Key> {
        let (key, _) = self.split_entry(index)?;
        key.to_key().ok_or_else(|| {
            Error::corrupted(self.page_id().0, format!("invalid UTF-8 key in slot {index}"))
        })
    }

    /// Index of the first entry whose key is greater than `key`.
    ///
    /// Inserting there places a new entry after all existing equal keys.
    pub fn upper_bound(&self, key: &Key) -> Result<usize> {
        self.partition(|k| k.cmp_key(key).is_le())
    }

    /// Index of the first entry whose key is not less than `key`.
    pub fn lower_bound(&self, key: &Key) -> Result<usize> {
        self.partition(|k| k.cmp_key(key).is_lt())
    }

    /// Binary search for the first entry where `before` is false.
    fn partition(&self, before: impl Fn(KeyRef<'_>) -> bool) -> Result<usize> {
        let (mut lo, mut hi) = (0, self.len());
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let (k, _) = self.split_entry(mid)?;
            if before(k) {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        Ok(lo)
    }
}

impl<P: DerefMut<Target = Page>> SortedPage<P> {
    /// Format `page` as an empty node of the given kind.
    ///
    /// `capacity` is clamped to [`MAX_NODE_CAPACITY`].
    pub fn init(
        mut page: P,
        node_type: NodeType,
        page_id: PageId,
        key_type: KeyType,
        capacity: usize,
    ) -> Self {
        let limit = NODE_HEADER_SIZE + capacity.min(MAX_NODE_CAPACITY);

        page.format(node_type.page_type());
        let data = page.as_mut_slice();
        page_id.write_at(data, OFFSET_SELF);
        PageId::INVALID.write_at(data, OFFSET_PREV);
        PageId::INVALID.write_at(data, OFFSET_NEXT);
        page.write_u16(OFFSET_SLOT_COUNT, 0);
        page.write_u16(OFFSET_DATA_START, limit as u16);
        page.write_u16(OFFSET_LIMIT, limit as u16);

        Self { page, key_type }
    }

    pub fn set_prev_page(&mut self, page_id: PageId) {
        page_id.write_at(self.page.as_mut_slice(), OFFSET_PREV);
    }

    pub fn set_next_page(&mut self, page_id: PageId) {
        page_id.write_at(self.page.as_mut_slice(), OFFSET_NEXT);
    }

    /// Insert `key` + `payload` in key order, after any equal keys.
    /// Returns the new entry's index.
    ///
    /// Callers check [`available_space`](Self::available_space) first; an
    /// entry that does not fit is reported as corruption of this page.
    pub fn insert(&mut self, key: &Key, payload: &[u8]) -> Result<usize> {
        self.check_fit(key, payload)?;
        let pos = self.upper_bound(key)?;
        self.place(pos, key, payload);
        Ok(pos)
    }

    /// Insert an entry at slot `index`, shifting later entries right.
    ///
    /// Among equal keys the caller picks the position. `key` must still sort
    /// between its neighbours; a position that would break key order is
    /// rejected as corruption.
    pub fn insert_at(&mut self, index: usize, key: &Key, payload: &[u8]) -> Result<()> {
        self.check_fit(key, payload)?;
        let count = self.len();
        if index > count {
            return Err(Error::corrupted(
                self.page_id().0,
                format!("insert position {index} past {count} entries"),
            ));
        }
        let after_prev = index == 0 || self.split_entry(index - 1)?.0.cmp_key(key).is_le();
        let before_next = index == count || self.split_entry(index)?.0.cmp_key(key).is_ge();
        if !(after_prev && before_next) {
            return Err(Error::corrupted(
                self.page_id().0,
                format!("key {key} out of order at slot {index}"),
            ));
        }
        self.place(index, key, payload);
        Ok(())
    }

    fn check_fit(&self, key: &Key, payload: &[u8]) -> Result<()> {
        if key.key_type() != self.key_type {
            return Err(Error::KeyTypeMismatch {
                expected: self.key_type.name(),
                found: key.key_type().name(),
            });
        }

        let len = key.encoded_len() + payload.len();
        let available = self.available_space();
        if len > available {
            return Err(Error::corrupted(
                self.page_id().0,
                format!("entry of {len} bytes does not fit in {available} free bytes"),
            ));
        }
        Ok(())
    }

    /// Write the entry bytes and open slot `pos` for them. Space and type
    /// are already checked.
    fn place(&mut self, pos: usize, key: &Key, payload: &[u8]) {
        let len = key.encoded_len() + payload.len();
        let count = self.len();
        let start = self.data_start() - len;

        let mut entry = Vec::with_capacity(len);
        key.encode_into(&mut entry);
        entry.extend_from_slice(payload);

        let data = self.page.as_mut_slice();
        data[start..start + len].copy_from_slice(&entry);
        data.copy_within(slot_offset(pos)..slot_offset(count), slot_offset(pos + 1));

        self.page.write_u16(slot_offset(pos), start as u16);
        self.page.write_u16(slot_offset(pos) + 2, len as u16);
        self.page.write_u16(OFFSET_SLOT_COUNT, (count + 1) as u16);
        self.page.write_u16(OFFSET_DATA_START, start as u16);
    }

    /// Remove entry `index`, compacting the slot directory and data area.
    pub fn delete(&mut self, index: usize) -> Result<()> {
        let (offset, len) = self.slot(index)?;
        let count = self.len();
        let start = self.data_start();

        // Slide everything packed below the victim up over it.
        let data = self.page.as_mut_slice();
        data.copy_within(start..offset, start + len);
        data[start..start + len].fill(0);

        for i in (0..count).filter(|&i| i != index) {
            let at = slot_offset(i);
            let entry_offset = self.page.read_u16(at) as usize;
            if entry_offset < offset {
                self.page.write_u16(at, (entry_offset + len) as u16);
            }
        }

        let data = self.page.as_mut_slice();
        data.copy_within(slot_offset(index + 1)..slot_offset(count), slot_offset(index));
        data[slot_offset(count - 1)..slot_offset(count)].fill(0);

        self.page.write_u16(OFFSET_SLOT_COUNT, (count - 1) as u16);
        self.page.write_u16(OFFSET_DATA_START, (start + len) as u16);
        Ok(())
    }
}
