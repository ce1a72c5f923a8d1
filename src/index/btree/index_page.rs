//! Index page - sorted (key, child page id) entries plus a leftmost child.

use std::ops::{Deref, DerefMut};

use crate::common::{Error, PageId, Result};
use crate::storage::page::Page;

use super::key::{Key, KeyType};
use super::sorted_page::{NodeType, SortedPage};

/// Bytes an index entry for `key` occupies, slot excluded.
pub fn entry_len(key: &Key) -> usize {
    key.encoded_len() + PageId::SIZE
}

/// View of an index node.
///
/// The child of entry `i` holds keys in `[key_i, key_{i+1}]`; copies of a
/// key may straddle a separator equal to it, so separators can repeat.
/// The node's `prev_page` field is the leftmost child, holding keys up to
/// `key_0`.
pub struct IndexPage<P>(SortedPage<P>);

impl<P: Deref<Target = Page>> IndexPage<P> {
    pub fn new(page: P, key_type: KeyType) -> Self {
        Self(SortedPage::new(page, key_type))
    }

    /// The child for keys below the first separator.
    pub fn leftmost_child(&self) -> PageId {
        self.prev_page()
    }

    pub fn child_at(&self, index: usize) -> Result<PageId> {
        let (_, payload) = self.0.split_entry(index)?;
        match <[u8; PageId::SIZE]>::try_from(payload) {
            Ok(raw) => Ok(PageId::from_le_bytes(raw)),
            Err(_) => Err(Error::corrupted(
                self.page_id().0,
                format!("index slot {index} has a {} byte child id", payload.len()),
            )),
        }
    }

    pub fn entry(&self, index: usize) -> Result<(Key, PageId)> {
        Ok((self.key_at(index)?, self.child_at(index)?))
    }

    /// The child whose subtree holds `key`: the child of the greatest
    /// separator not above `key`, else the leftmost child.
    pub fn child_for_key(&self, key: &Key) -> Result<PageId> {
        Ok(self.route(key)?.1)
    }

    /// Like [`child_for_key`](Self::child_for_key), also returning the slot
    /// just after the chosen child. A separator promoted out of that child
    /// belongs in exactly this slot, even when equal separators follow it.
    pub fn route(&self, key: &Key) -> Result<(usize, PageId)> {
        let pos = self.upper_bound(key)?;
        let child = match pos {
            0 => self.leftmost_child(),
            n => self.child_at(n - 1)?,
        };
        Ok((pos, child))
    }

    /// The child a search for the leftmost `key` descends into: the child of
    /// the last separator strictly below `key`, else the leftmost child.
    ///
    /// Duplicates of `key` may straddle a separator equal to `key`, so the
    /// search must start to its left.
    pub fn child_left_of(&self, key: &Key) -> Result<PageId> {
        match self.lower_bound(key)? {
            0 => Ok(self.leftmost_child()),
            n => self.child_at(n - 1),
        }
    }

    /// Every child, leftmost first.
    pub fn children(&self) -> Result<Vec<PageId>> {
        let mut children = Vec::with_capacity(self.len() + 1);
        children.push(self.leftmost_child());
        for i in 0..self.len() {
            children.push(self.child_at(i)?);
        }
        Ok(children)
    }
}

impl<P: DerefMut<Target = Page>> IndexPage<P> {
    /// Format `page` as an index node with no separators.
    pub fn init(page: P, page_id: PageId, key_type: KeyType, capacity: usize) -> Self {
        Self(SortedPage::init(page, NodeType::Index, page_id, key_type, capacity))
    }

    pub fn set_leftmost_child(&mut self, child: PageId) {
        self.set_prev_page(child);
    }

    pub fn insert_key(&mut self, key: &Key, child: PageId) -> Result<usize> {
        self.0.insert(key, &child.to_le_bytes())
    }

    /// Insert a separator at slot `index`, ahead of any equal separators
    /// from that slot on.
    pub fn insert_key_at(&mut self, index: usize, key: &Key, child: PageId) -> Result<()> {
        self.0.insert_at(index, key, &child.to_le_bytes())
    }
}

impl<P> Deref for IndexPage<P> {
    type Target = SortedPage<P>;

    fn deref(&self) -> &SortedPage<P> {
        &self.0
    }
}

impl<P> DerefMut for IndexPage<P> {
    fn deref_mut(&mut self) -> &mut SortedPage<P> {
        &mut self.0
    }
}
