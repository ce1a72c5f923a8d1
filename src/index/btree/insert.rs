//! Insertion with recursive, capacity-balanced node splits.
//!
//! A split first moves every entry of the full node into a fresh right
//! sibling, then moves entries back from the front of the sibling until
//! the left node no longer has more free space than the right one. The
//! halves are balanced by bytes, not entry counts.

use std::cmp::Ordering;

use tracing::debug;

use crate::common::{Error, PageId, Result};

use super::file::BTreeFile;
use super::index_page::{self, IndexPage};
use super::key::{Key, RecordId};
use super::leaf_page::{self, LeafPage};
use super::sorted_page::NodeType;

/// A separator a split hands up to its parent.
type Promoted = (Key, PageId);

impl<'a> BTreeFile<'a> {
    /// Insert `(key, rid)`. Duplicate keys are kept in insertion order.
    ///
    /// # Errors
    /// - `Error::KeyTypeMismatch` / `Error::KeyTooLong` before any page is
    ///   touched
    /// - buffer pool errors while pinning or allocating pages; the tree may
    ///   then be left partly split
    pub fn insert(&mut self, key: &Key, rid: RecordId) -> Result<()> {
        self.header_pin()?;
        self.check_key(key)?;

        let root = self.root_page_id()?;
        if !root.is_valid() {
            let leaf_id = {
                let mut guard = self.bpm.new_page()?;
                let leaf_id = guard.page_id();
                let mut leaf = LeafPage::init(
                    &mut *guard,
                    leaf_id,
                    self.config.key_type,
                    self.config.node_capacity,
                );
                leaf.insert_record(key, rid)?;
                leaf_id
            };
            debug!(name = %self.name(), root = %leaf_id, "created root leaf");
            return self.update_header(leaf_id);
        }

        let Some((separator, right)) = self.insert_into(key, rid, root)? else {
            return Ok(());
        };

        let new_root = {
            let mut guard = self.bpm.new_page()?;
            let new_root = guard.page_id();
            let mut index = IndexPage::init(
                &mut *guard,
                new_root,
                self.config.key_type,
                self.config.node_capacity,
            );
            index.set_leftmost_child(root);
            index.insert_key(&separator, right)?;
            new_root
        };
        debug!(
            name = %self.name(),
            old_root = %root,
            new_root = %new_root,
            separator = %separator,
            "root split, tree grew one level"
        );
        self.update_header(new_root)
    }

    fn insert_into(&self, key: &Key, rid: RecordId, page_id: PageId) -> Result<Option<Promoted>> {
        let node_type = {
            let guard = self.bpm.fetch_page_read(page_id)?;
            NodeType::of(&guard, page_id)?
        };

        match node_type {
            NodeType::Index => self.insert_into_index(key, rid, page_id),
            NodeType::Leaf => self.insert_into_leaf(key, rid, page_id),
            NodeType::Header => Err(Error::corrupted(
                page_id.0,
                "header page linked inside the tree",
            )),
        }
    }

    fn insert_into_index(
        &self,
        key: &Key,
        rid: RecordId,
        page_id: PageId,
    ) -> Result<Option<Promoted>> {
        let key_type = self.config.key_type;
        let (pos, child) = {
            let guard = self.bpm.fetch_page_read(page_id)?;
            IndexPage::new(&*guard, key_type).route(key)?
        };

        let Some((up_key, up_child)) = self.insert_into(key, rid, child)? else {
            return Ok(None);
        };

        let mut guard = self.bpm.fetch_page_write(page_id)?;
        let mut current = IndexPage::new(&mut *guard, key_type);
        if index_page::entry_len(&up_key) <= current.available_space() {
            current.insert_key_at(pos, &up_key, up_child)?;
            return Ok(None);
        }

        let mut fresh_guard = self.bpm.new_page()?;
        let fresh_id = fresh_guard.page_id();
        let mut fresh =
            IndexPage::init(&mut *fresh_guard, fresh_id, key_type, self.config.node_capacity);

        while !current.is_empty() {
            let (k, c) = current.entry(0)?;
            fresh.insert_key(&k, c)?;
            current.delete(0)?;
        }
        while fresh.len() > 1 && fresh.available_space() < current.available_space() {
            let (k, c) = fresh.entry(0)?;
            current.insert_key(&k, c)?;
            fresh.delete(0)?;
        }

        // The new separator belongs at `pos` in the combined entry order.
        // Against an equal first separator only that position decides.
        let split = current.len();
        let (fresh_first, _) = fresh.entry(0)?;
        let to_fresh = match up_key.cmp(&fresh_first) {
            Ordering::Greater => true,
            Ordering::Less => false,
            Ordering::Equal => pos > split,
        };
        if to_fresh {
            let at = pos.checked_sub(split).ok_or_else(|| {
                Error::corrupted(page_id.0, format!("separator {up_key} routed left of the split"))
            })?;
            fresh.insert_key_at(at, &up_key, up_child)?;
        } else {
            current.insert_key_at(pos, &up_key, up_child)?;
        }

        // The fresh node's first separator moves up; its child becomes the
        // fresh node's leftmost child.
        let (promoted, leftmost) = fresh.entry(0)?;
        fresh.set_leftmost_child(leftmost);
        fresh.delete(0)?;

        debug!(
            page_id = %page_id,
            fresh = %fresh_id,
            left = current.len(),
            right = fresh.len(),
            separator = %promoted,
            "split index page"
        );
        Ok(Some((promoted, fresh_id)))
    }

    fn insert_into_leaf(
        &self,
        key: &Key,
        rid: RecordId,
        page_id: PageId,
    ) -> Result<Option<Promoted>> {
        let key_type = self.config.key_type;
        let mut guard = self.bpm.fetch_page_write(page_id)?;
        let mut current = LeafPage::new(&mut *guard, key_type);
        if leaf_page::entry_len(key) <= current.available_space() {
            current.insert_record(key, rid)?;
            return Ok(None);
        }

        let mut fresh_guard = self.bpm.new_page()?;
        let fresh_id = fresh_guard.page_id();
        let mut fresh =
            LeafPage::init(&mut *fresh_guard, fresh_id, key_type, self.config.node_capacity);

        let old_next = current.next_page();
        fresh.set_prev_page(page_id);
        fresh.set_next_page(old_next);
        current.set_next_page(fresh_id);

        while !current.is_empty() {
            let (k, r) = current.entry(0)?;
            fresh.insert_record(&k, r)?;
            current.delete(0)?;
        }
        while fresh.len() > 1 && fresh.available_space() < current.available_space() {
            let (k, r) = fresh.entry(0)?;
            current.insert_record(&k, r)?;
            fresh.delete(0)?;
        }

        let (fresh_first, _) = fresh.entry(0)?;
        if *key < fresh_first {
            current.insert_record(key, rid)?;
        } else {
            fresh.insert_record(key, rid)?;
        }

        let (promoted, _) = fresh.entry(0)?;
        debug!(
            page_id = %page_id,
            fresh = %fresh_id,
            left = current.len(),
            right = fresh.len(),
            separator = %promoted,
            "split leaf page"
        );
        drop(fresh_guard);
        drop(guard);

        if old_next.is_valid() {
            let mut next_guard = self.bpm.fetch_page_write(old_next)?;
            LeafPage::new(&mut *next_guard, key_type).set_prev_page(fresh_id);
        }
        Ok(Some((promoted, fresh_id)))
    }
}
