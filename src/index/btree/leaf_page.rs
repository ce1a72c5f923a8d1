//! Leaf page - sorted (key, record id) entries chained to their siblings.

use std::ops::{Deref, DerefMut};

use crate::common::{Error, PageId, Result};
use crate::storage::page::Page;

use super::key::{Key, KeyType, RecordId};
use super::sorted_page::{NodeType, SortedPage};

/// Bytes a leaf entry for `key` occupies, slot excluded.
pub fn entry_len(key: &Key) -> usize {
    key.encoded_len() + RecordId::SIZE
}

/// View of a leaf node.
///
/// `prev_page` / `next_page` link all leaves in ascending key order.
pub struct LeafPage<P>(SortedPage<P>);

impl<P: Deref<Target = Page>> LeafPage<P> {
    pub fn new(page: P, key_type: KeyType) -> Self {
        Self(SortedPage::new(page, key_type))
    }

    pub fn entry(&self, index: usize) -> Result<(Key, RecordId)> {
        Ok((self.key_at(index)?, self.record_id_at(index)?))
    }

    pub fn record_id_at(&self, index: usize) -> Result<RecordId> {
        let (_, payload) = self.0.split_entry(index)?;
        RecordId::from_bytes(payload).ok_or_else(|| {
            Error::corrupted(
                self.page_id().0,
                format!("leaf slot {index} has a {} byte record id", payload.len()),
            )
        })
    }

    /// All entries in key order.
    pub fn entries(&self) -> Result<Vec<(Key, RecordId)>> {
        (0..self.len()).map(|i| self.entry(i)).collect()
    }
}

impl<P: DerefMut<Target = Page>> LeafPage<P> {
    /// Format `page` as an empty, unlinked leaf.
    pub fn init(page: P, page_id: PageId, key_type: KeyType, capacity: usize) -> Self {
        Self(SortedPage::init(page, NodeType::Leaf, page_id, key_type, capacity))
    }

    pub fn insert_record(&mut self, key: &Key, rid: RecordId) -> Result<usize> {
        self.0.insert(key, &rid.to_bytes())
    }
}

impl<P> Deref for LeafPage<P> {
    type Target = SortedPage<P>;

    fn deref(&self) -> &SortedPage<P> {
        &self.0
    }
}

impl<P> DerefMut for LeafPage<P> {
    fn deref_mut(&mut self) -> &mut SortedPage<P> {
        &mut self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rid(n: u32) -> RecordId {
        RecordId::new(PageId::new(100 + n), n)
    }

    #[test]
    fn test_leaf_entries_and_links() {
        let mut raw = Page::new();
        let mut leaf = LeafPage::init(&mut raw, PageId::new(7), KeyType::Integer, 256);

        leaf.insert_record(&Key::Int(20), rid(2)).unwrap();
        leaf.insert_record(&Key::Int(10), rid(1)).unwrap();
        leaf.set_next_page(PageId::new(8));
        leaf.set_prev_page(PageId::new(6));

        assert_eq!(
            leaf.entries().unwrap(),
            vec![(Key::Int(10), rid(1)), (Key::Int(20), rid(2))]
        );
        assert_eq!(leaf.next_page(), PageId::new(8));
        assert_eq!(leaf.prev_page(), PageId::new(6));
    }

    #[test]
    fn test_view_over_shared_page() {
        let mut raw = Page::new();
        {
            let mut leaf = LeafPage::init(&mut raw, PageId::new(2), KeyType::String, 256);
            leaf.insert_record(&Key::from("k"), rid(9)).unwrap();
        }

        let leaf = LeafPage::new(&raw, KeyType::String);
        assert_eq!(leaf.node_type().unwrap(), NodeType::Leaf);
        assert_eq!(leaf.entry(0).unwrap(), (Key::from("k"), rid(9)));
        assert_eq!(entry_len(&Key::from("k")), 3 + RecordId::SIZE);
    }

    #[test]
    fn test_delete_entry() {
        let mut raw = Page::new();
        let mut leaf = LeafPage::init(&mut raw, PageId::new(2), KeyType::Integer, 256);
        for k in 0..5 {
            leaf.insert_record(&Key::Int(k), rid(k as u32)).unwrap();
        }

        leaf.delete(1).unwrap();
        leaf.delete(3).unwrap();

        let keys: Vec<Key> = leaf.entries().unwrap().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, [0, 2, 3].map(Key::Int));
        assert_eq!(leaf.record_id_at(2).unwrap(), rid(3));
    }
}
