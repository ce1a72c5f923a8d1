//! BTreeFile - one named B+ tree inside a database file.
//!
//! The tree is reached only through its header page, registered in the
//! file directory under the tree's name. The header stays pinned while the
//! tree is open; every other page is pinned for the shortest scope that
//! needs it and re-fetched by id on the next visit.

use std::cell::RefCell;
use std::io::Write;

use tracing::{debug, trace, warn};

use crate::buffer::{BufferPoolManager, PagePin};
use crate::common::{Error, PageId, Result};

use super::config::BTreeConfig;
use super::header_page::BTreeHeader;
use super::index_page::IndexPage;
use super::key::{DeleteMode, Key, KeyType, RecordId};
use super::leaf_page::LeafPage;
use super::scan::BTreeFileScan;
use super::sorted_page::NodeType;
use super::trace::TraceSink;

/// A disk-resident B+ tree index.
///
/// # Example
/// ```
/// use bplusdb::{BTreeConfig, BTreeFile, BufferPoolManager, DiskManager, Key, PageId, RecordId};
///
/// let dir = tempfile::tempdir().unwrap();
/// let dm = DiskManager::create(dir.path().join("index.db")).unwrap();
/// let bpm = BufferPoolManager::new(16, dm);
///
/// let mut tree = BTreeFile::create_or_open(&bpm, "by_id", BTreeConfig::integer()).unwrap();
/// tree.insert(&Key::Int(7), RecordId::new(PageId::new(3), 0)).unwrap();
///
/// let hits: Vec<_> = tree
///     .new_scan(Some(&Key::Int(7)), Some(&Key::Int(7)))
///     .unwrap()
///     .collect::<Result<_, _>>()
///     .unwrap();
/// assert_eq!(hits, vec![(Key::Int(7), RecordId::new(PageId::new(3), 0))]);
/// ```
pub struct BTreeFile<'a> {
    pub(super) bpm: &'a BufferPoolManager,
    name: String,
    header_page_id: PageId,
    header_pin: Option<PagePin<'a>>,
    pub(super) config: BTreeConfig,
    trace: RefCell<Option<TraceSink>>,
}

/// Where a search landed: a pinned leaf and a slot in it.
///
/// The pin is owned by this value and released when it is dropped.
pub struct RunStart<'a> {
    pin: PagePin<'a>,
    slot: usize,
    key_type: KeyType,
}

impl<'a> RunStart<'a> {
    pub fn page_id(&self) -> PageId {
        self.pin.page_id()
    }

    pub fn slot(&self) -> usize {
        self.slot
    }

    /// The entry the search landed on.
    pub fn entry(&self) -> Result<(Key, RecordId)> {
        let guard = self.pin.read()?;
        LeafPage::new(&*guard, self.key_type).entry(self.slot)
    }

    pub(super) fn into_parts(self) -> (PagePin<'a>, usize) {
        (self.pin, self.slot)
    }
}

/// Outcome of looking for a delete victim in one leaf.
enum Lookup {
    Found(usize),
    /// Passed every entry with the target key.
    Passed,
    /// Ran off the end of the leaf.
    Exhausted(PageId),
}

impl<'a> BTreeFile<'a> {
    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Open an existing tree.
    ///
    /// # Errors
    /// - `Error::FileNotFound` if no tree is registered under `name`
    /// - `Error::Corrupted` if the registered page is not a valid header
    pub fn open(bpm: &'a BufferPoolManager, name: &str) -> Result<Self> {
        let header_page_id = bpm
            .get_file_entry(name)?
            .ok_or_else(|| Error::FileNotFound(name.to_string()))?;
        Self::attach(bpm, name, header_page_id)
    }

    /// Open the tree registered under `name`, or create an empty one with
    /// `config` if there is none.
    pub fn create_or_open(
        bpm: &'a BufferPoolManager,
        name: &str,
        config: BTreeConfig,
    ) -> Result<Self> {
        if let Some(header_page_id) = bpm.get_file_entry(name)? {
            return Self::attach(bpm, name, header_page_id);
        }

        config.validate()?;
        let header_page_id = {
            let mut guard = bpm.new_page()?;
            BTreeHeader::empty(&config).write(&mut guard);
            guard.page_id()
        };

        if let Err(e) = bpm.add_file_entry(name, header_page_id) {
            if let Err(free_err) = bpm.free_page(header_page_id) {
                warn!(page_id = %header_page_id, error = %free_err, "leaked header page");
            }
            return Err(e);
        }

        debug!(
            name,
            header_page = %header_page_id,
            key_type = config.key_type.name(),
            node_capacity = config.node_capacity,
            "created B+ tree"
        );
        Self::attach(bpm, name, header_page_id)
    }

    fn attach(bpm: &'a BufferPoolManager, name: &str, header_page_id: PageId) -> Result<Self> {
        let pin = bpm.pin_page(header_page_id)?;
        let header = {
            let guard = pin.read()?;
            BTreeHeader::read(&guard, header_page_id)?
        };
        debug!(name, header_page = %header_page_id, root = %header.root, "opened B+ tree");

        Ok(Self {
            bpm,
            name: name.to_string(),
            header_page_id,
            header_pin: Some(pin),
            config: BTreeConfig {
                key_type: header.key_type,
                max_key_size: header.max_key_size,
                delete_mode: header.delete_mode,
                node_capacity: header.node_capacity,
            },
            trace: RefCell::new(None),
        })
    }

    /// Release the header pin. Closing twice is a no-op.
    pub fn close(&mut self) {
        if self.header_pin.take().is_some() {
            debug!(name = %self.name, "closed B+ tree");
        }
    }

    pub fn is_open(&self) -> bool {
        self.header_pin.is_some()
    }

    /// Free every page of the tree, its header, and its directory entry.
    ///
    /// On error the tree may be partly reclaimed.
    pub fn destroy(mut self) -> Result<()> {
        let root = self.root_page_id()?;
        if root.is_valid() {
            self.free_subtree(root)?;
        }

        self.header_pin = None;
        self.bpm.free_page(self.header_page_id)?;
        self.bpm.delete_file_entry(&self.name)?;
        debug!(name = %self.name, "destroyed B+ tree");
        Ok(())
    }

    fn free_subtree(&self, page_id: PageId) -> Result<()> {
        let children = {
            let guard = self.bpm.fetch_page_read(page_id)?;
            match NodeType::of(&guard, page_id)? {
                NodeType::Index => IndexPage::new(&*guard, self.config.key_type).children()?,
                NodeType::Leaf => Vec::new(),
                NodeType::Header => {
                    return Err(Error::corrupted(page_id.0, "header page linked inside the tree"))
                }
            }
        };

        for child in children {
            self.free_subtree(child)?;
        }
        self.bpm.free_page(page_id)?;
        trace!(page_id = %page_id, "freed tree page");
        Ok(())
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn header_page_id(&self) -> PageId {
        self.header_page_id
    }

    pub fn key_type(&self) -> KeyType {
        self.config.key_type
    }

    /// The settings recorded when the tree was created.
    pub fn config(&self) -> BTreeConfig {
        self.config
    }

    /// A fresh snapshot of the header page.
    pub fn header(&self) -> Result<BTreeHeader> {
        let guard = self.header_pin()?.read()?;
        BTreeHeader::read(&guard, self.header_page_id)
    }

    /// The root page, or `PageId::INVALID` for an empty tree.
    pub fn root_page_id(&self) -> Result<PageId> {
        Ok(self.header()?.root)
    }

    pub(super) fn header_pin(&self) -> Result<&PagePin<'a>> {
        self.header_pin
            .as_ref()
            .ok_or_else(|| Error::Closed(self.name.clone()))
    }

    /// Point the header at a new root.
    pub(super) fn update_header(&self, root: PageId) -> Result<()> {
        self.header_pin()?;
        let mut guard = self.bpm.fetch_page_write(self.header_page_id)?;
        BTreeHeader::set_root(&mut guard, root);
        debug!(name = %self.name, root = %root, "root changed");
        Ok(())
    }

    pub(super) fn check_key_type(&self, key: &Key) -> Result<()> {
        if key.key_type() == self.config.key_type {
            Ok(())
        } else {
            Err(Error::KeyTypeMismatch {
                expected: self.config.key_type.name(),
                found: key.key_type().name(),
            })
        }
    }

    /// Reject keys this tree cannot store, before any page is touched.
    pub(super) fn check_key(&self, key: &Key) -> Result<()> {
        self.check_key_type(key)?;
        let size = key.encoded_len();
        if size > self.config.max_key_size {
            return Err(Error::KeyTooLong {
                size,
                max: self.config.max_key_size,
            });
        }
        Ok(())
    }

    // ========================================================================
    // Search
    // ========================================================================

    /// Find the leftmost entry with key `>= low` (or the leftmost entry
    /// overall when `low` is `None`).
    ///
    /// Returns the pinned leaf and slot, or `None` if no such entry exists.
    /// Index nodes are descended through the last separator strictly below
    /// `low`, so the first of several duplicates is always found.
    pub fn find_run_start(&self, low: Option<&Key>) -> Result<Option<RunStart<'a>>> {
        self.header_pin()?;
        if let Some(low) = low {
            self.check_key_type(low)?;
        }
        let key_type = self.config.key_type;

        let mut page_id = self.root_page_id()?;
        if !page_id.is_valid() {
            return Ok(None);
        }
        self.trace_visit(page_id)?;

        loop {
            let guard = self.bpm.fetch_page_read(page_id)?;
            match NodeType::of(&guard, page_id)? {
                NodeType::Index => {
                    let index = IndexPage::new(&*guard, key_type);
                    let child = match low {
                        Some(low) => index.child_left_of(low)?,
                        None => index.leftmost_child(),
                    };
                    drop(guard);
                    trace!(from = %page_id, to = %child, "descend");
                    page_id = child;
                    self.trace_visit(page_id)?;
                }
                NodeType::Leaf => break,
                NodeType::Header => {
                    return Err(Error::corrupted(page_id.0, "header page linked inside the tree"))
                }
            }
        }

        let mut pin = self.bpm.pin_page(page_id)?;
        loop {
            let (found, next) = {
                let guard = pin.read()?;
                let leaf_id = pin.page_id();
                if NodeType::of(&guard, leaf_id)? != NodeType::Leaf {
                    return Err(Error::corrupted(leaf_id.0, "sibling chain leaves the leaf level"));
                }
                let leaf = LeafPage::new(&*guard, key_type);
                let start = match low {
                    Some(low) => leaf.lower_bound(low)?,
                    None => 0,
                };
                ((start < leaf.len()).then_some(start), leaf.next_page())
            };

            if let Some(slot) = found {
                return Ok(Some(RunStart { pin, slot, key_type }));
            }
            if !next.is_valid() {
                return Ok(None);
            }
            drop(pin);
            pin = self.bpm.pin_page(next)?;
        }
    }

    /// Iterate entries with `lo <= key <= hi`; either bound may be open.
    pub fn new_scan(&self, lo: Option<&Key>, hi: Option<&Key>) -> Result<BTreeFileScan<'a>> {
        if let Some(hi) = hi {
            self.check_key_type(hi)?;
        }
        let start = self.find_run_start(lo)?;
        Ok(BTreeFileScan::new(
            self.bpm,
            self.config.key_type,
            start,
            hi.cloned(),
        ))
    }

    // ========================================================================
    // Delete
    // ========================================================================

    /// Remove the entry `(key, rid)`.
    ///
    /// Returns `Ok(false)` if the tree holds no such pair. Leaves are never
    /// merged; an emptied leaf stays in the sibling chain.
    pub fn delete(&mut self, key: &Key, rid: RecordId) -> Result<bool> {
        if !self.is_open() {
            warn!(name = %self.name, key = %key, "delete on a closed tree");
            return Err(Error::Closed(self.name.clone()));
        }
        if self.config.delete_mode != DeleteMode::Naive {
            return Err(Error::UnsupportedDeleteMode(self.config.delete_mode.name()));
        }
        self.check_key_type(key)?;
        let key_type = self.config.key_type;

        let Some(start) = self.find_run_start(Some(key))? else {
            return Ok(false);
        };
        let (mut pin, mut slot) = start.into_parts();

        loop {
            let lookup = {
                let guard = pin.read()?;
                let leaf = LeafPage::new(&*guard, key_type);
                let mut lookup = Lookup::Exhausted(leaf.next_page());
                while slot < leaf.len() {
                    let (k, r) = leaf.entry(slot)?;
                    match k.cmp(key) {
                        std::cmp::Ordering::Less => slot += 1,
                        std::cmp::Ordering::Greater => {
                            lookup = Lookup::Passed;
                            break;
                        }
                        std::cmp::Ordering::Equal if r == rid => {
                            lookup = Lookup::Found(slot);
                            break;
                        }
                        std::cmp::Ordering::Equal => slot += 1,
                    }
                }
                lookup
            };

            match lookup {
                Lookup::Found(slot) => {
                    let mut guard = pin.write()?;
                    LeafPage::new(&mut *guard, key_type).delete(slot)?;
                    debug!(page_id = %pin.page_id(), slot, key = %key, "deleted entry");
                    return Ok(true);
                }
                Lookup::Passed => return Ok(false),
                Lookup::Exhausted(next) if next.is_valid() => {
                    drop(pin);
                    pin = self.bpm.pin_page(next)?;
                    slot = 0;
                }
                Lookup::Exhausted(_) => return Ok(false),
            }
        }
    }

    // ========================================================================
    // Trace sink
    // ========================================================================

    /// Start writing visualization lines to `out`. Returns the previously
    /// attached writer, if any.
    pub fn attach_trace(&mut self, out: Box<dyn Write>) -> Option<Box<dyn Write>> {
        self.trace
            .replace(Some(TraceSink::new(out)))
            .map(TraceSink::into_inner)
    }

    pub fn detach_trace(&mut self) -> Option<Box<dyn Write>> {
        self.trace.take().map(TraceSink::into_inner)
    }

    fn trace_visit(&self, page_id: PageId) -> Result<()> {
        if let Some(sink) = self.trace.borrow_mut().as_mut() {
            sink.visit(page_id)?;
        }
        Ok(())
    }

    /// Dump the entries of `page_id` to the trace sink. Does nothing when
    /// no sink is attached.
    pub fn trace_children(&self, page_id: PageId) -> Result<()> {
        let mut trace = self.trace.borrow_mut();
        let Some(sink) = trace.as_mut() else {
            return Ok(());
        };
        self.header_pin()?;

        let guard = self.bpm.fetch_page_read(page_id)?;
        match NodeType::of(&guard, page_id)? {
            NodeType::Index => {
                let index = IndexPage::new(&*guard, self.config.key_type);
                let children = (0..index.len())
                    .map(|i| index.child_at(i))
                    .collect::<Result<Vec<_>>>()?;
                sink.index_children(page_id, index.leftmost_child(), children)?;
            }
            NodeType::Leaf => {
                let entries = LeafPage::new(&*guard, self.config.key_type).entries()?;
                sink.leaf_children(page_id, &entries)?;
            }
            NodeType::Header => {
                return Err(Error::corrupted(page_id.0, "header page has no children"));
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for BTreeFile<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BTreeFile")
            .field("name", &self.name)
            .field("header_page_id", &self.header_page_id)
            .field("open", &self.is_open())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use tempfile::{tempdir, TempDir};

    use super::*;
    use crate::index::btree::trace::testing::SharedBuffer;
    use crate::storage::DiskManager;

    fn create_bpm(pool_size: usize) -> (TempDir, BufferPoolManager) {
        let dir = tempdir().unwrap();
        let dm = DiskManager::create(dir.path().join("tree.db")).unwrap();
        (dir, BufferPoolManager::new(pool_size, dm))
    }

    fn rid(n: u32) -> RecordId {
        RecordId::new(PageId::new(900), n)
    }

    fn small_config() -> BTreeConfig {
        BTreeConfig::integer().with_node_capacity(64)
    }

    /// Every page reachable from the root.
    fn tree_pages(tree: &BTreeFile<'_>, page_id: PageId, out: &mut Vec<PageId>) {
        out.push(page_id);
        let children = {
            let guard = tree.bpm.fetch_page_read(page_id).unwrap();
            match NodeType::of(&guard, page_id).unwrap() {
                NodeType::Index => IndexPage::new(&*guard, tree.key_type()).children().unwrap(),
                _ => Vec::new(),
            }
        };
        for child in children {
            tree_pages(tree, child, out);
        }
    }

    fn scan_rids(tree: &BTreeFile<'_>) -> Vec<u32> {
        tree.new_scan(None, None)
            .unwrap()
            .map(|entry| entry.unwrap().1.slot)
            .collect()
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    #[test]
    fn test_create_registers_header() {
        let (_dir, bpm) = create_bpm(8);
        let tree = BTreeFile::create_or_open(&bpm, "idx", small_config()).unwrap();

        assert_eq!(bpm.get_file_entry("idx").unwrap(), Some(tree.header_page_id()));
        assert_eq!(bpm.pin_count(tree.header_page_id()), Some(1));

        let header = tree.header().unwrap();
        assert_eq!(header.root, PageId::INVALID);
        assert_eq!(header.node_capacity, 64);
        assert_eq!(tree.key_type(), KeyType::Integer);
    }

    #[test]
    fn test_reopen_keeps_persisted_config() {
        let (_dir, bpm) = create_bpm(8);
        let header_page_id = {
            let mut tree = BTreeFile::create_or_open(&bpm, "idx", small_config()).unwrap();
            tree.insert(&Key::Int(1), rid(1)).unwrap();
            tree.header_page_id()
        };
        assert_eq!(bpm.pinned_frame_count(), 0);

        let tree = BTreeFile::create_or_open(&bpm, "idx", BTreeConfig::string(40)).unwrap();
        assert_eq!(tree.header_page_id(), header_page_id);
        assert_eq!(tree.config(), small_config());
        assert_eq!(scan_rids(&tree), vec![1]);
    }

    #[test]
    fn test_open_missing() {
        let (_dir, bpm) = create_bpm(8);
        let err = BTreeFile::open(&bpm, "nope").unwrap_err();
        assert!(matches!(err, Error::FileNotFound(ref name) if name == "nope"));
    }

    #[test]
    fn test_open_rejects_non_header_page() {
        let (_dir, bpm) = create_bpm(8);
        let page_id = bpm.new_page().unwrap().page_id();
        bpm.add_file_entry("junk", page_id).unwrap();

        let err = BTreeFile::open(&bpm, "junk").unwrap_err();
        assert!(matches!(err, Error::Corrupted { .. }));
        assert_eq!(bpm.pinned_frame_count(), 0);
    }

    #[test]
    fn test_create_rejects_invalid_config() {
        let (_dir, bpm) = create_bpm(8);
        let err = BTreeFile::create_or_open(&bpm, "idx", BTreeConfig::integer().with_node_capacity(20))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
        assert_eq!(bpm.get_file_entry("idx").unwrap(), None);
    }

    #[test]
    fn test_create_with_bad_name_releases_header() {
        let (_dir, bpm) = create_bpm(8);
        let long_name = "n".repeat(80);

        let err = BTreeFile::create_or_open(&bpm, &long_name, small_config()).unwrap_err();
        assert!(matches!(err, Error::InvalidFileName(_)));
        assert_eq!(bpm.pinned_frame_count(), 0);
        assert!(!bpm.is_allocated(PageId::new(1)));
    }

    #[test]
    fn test_close_is_idempotent() {
        let (_dir, bpm) = create_bpm(8);
        let mut tree = BTreeFile::create_or_open(&bpm, "idx", small_config()).unwrap();

        tree.close();
        tree.close();

        assert!(!tree.is_open());
        assert_eq!(bpm.pinned_frame_count(), 0);
        assert!(matches!(tree.root_page_id(), Err(Error::Closed(_))));
        assert!(matches!(tree.find_run_start(None), Err(Error::Closed(_))));
        assert!(matches!(tree.delete(&Key::Int(1), rid(1)), Err(Error::Closed(_))));
    }

    // ========================================================================
    // Search
    // ========================================================================

    #[test]
    fn test_find_run_start_empty_tree() {
        let (_dir, bpm) = create_bpm(8);
        let tree = BTreeFile::create_or_open(&bpm, "idx", small_config()).unwrap();

        assert!(tree.find_run_start(None).unwrap().is_none());
        assert!(tree.find_run_start(Some(&Key::Int(3))).unwrap().is_none());
    }

    #[test]
    fn test_find_run_start_leftmost_duplicate_across_leaves() {
        let (_dir, bpm) = create_bpm(8);
        // Eight leaf entries per node; the root never splits.
        let config = BTreeConfig::integer().with_node_capacity(128);
        let mut tree = BTreeFile::create_or_open(&bpm, "idx", config).unwrap();

        for k in 0..6 {
            tree.insert(&Key::Int(k), rid(k as u32)).unwrap();
        }
        for n in 100..120 {
            tree.insert(&Key::Int(7), rid(n)).unwrap();
        }
        for k in 8..14 {
            tree.insert(&Key::Int(k), rid(k as u32)).unwrap();
        }

        let start = tree.find_run_start(Some(&Key::Int(7))).unwrap().unwrap();
        assert_eq!(start.entry().unwrap(), (Key::Int(7), rid(100)));
        drop(start);

        // A bound between keys lands on the next larger key.
        let start = tree.find_run_start(Some(&Key::Int(6))).unwrap().unwrap();
        assert_eq!(start.entry().unwrap(), (Key::Int(7), rid(100)));
        drop(start);

        let sevens: Vec<u32> = tree
            .new_scan(Some(&Key::Int(7)), Some(&Key::Int(7)))
            .unwrap()
            .map(|entry| entry.unwrap().1.slot)
            .collect();
        assert_eq!(sevens, (100..120).collect::<Vec<_>>());

        assert!(tree.find_run_start(Some(&Key::Int(14))).unwrap().is_none());
        assert_eq!(bpm.pinned_frame_count(), 1);
    }

    #[test]
    fn test_find_run_start_rejects_mismatched_key() {
        let (_dir, bpm) = create_bpm(8);
        let tree = BTreeFile::create_or_open(&bpm, "idx", small_config()).unwrap();

        let err = tree.find_run_start(Some(&Key::from("x"))).err().unwrap();
        assert!(matches!(err, Error::KeyTypeMismatch { .. }));
    }

    // ========================================================================
    // Delete
    // ========================================================================

    #[test]
    fn test_delete_requires_matching_record_id() {
        let (_dir, bpm) = create_bpm(8);
        let mut tree = BTreeFile::create_or_open(&bpm, "idx", small_config()).unwrap();
        for n in 0..3 {
            tree.insert(&Key::Int(4), rid(n)).unwrap();
        }

        assert!(!tree.delete(&Key::Int(4), rid(9)).unwrap());
        assert!(tree.delete(&Key::Int(4), rid(1)).unwrap());
        assert!(!tree.delete(&Key::Int(4), rid(1)).unwrap());
        assert_eq!(scan_rids(&tree), vec![0, 2]);
        assert_eq!(bpm.pinned_frame_count(), 1);
    }

    #[test]
    fn test_delete_absent_key_between_entries() {
        let (_dir, bpm) = create_bpm(8);
        let mut tree = BTreeFile::create_or_open(&bpm, "idx", small_config()).unwrap();
        for k in [10, 20, 30] {
            tree.insert(&Key::Int(k), rid(k as u32)).unwrap();
        }

        // First entry >= 15 is 20, which is larger.
        assert!(!tree.delete(&Key::Int(15), rid(20)).unwrap());
        assert!(!tree.delete(&Key::Int(99), rid(99)).unwrap());
        assert_eq!(scan_rids(&tree), vec![10, 20, 30]);
    }

    #[test]
    fn test_delete_duplicate_in_later_leaf() {
        let (_dir, bpm) = create_bpm(8);
        let mut tree = BTreeFile::create_or_open(&bpm, "idx", small_config()).unwrap();
        for n in 0..12 {
            tree.insert(&Key::Int(5), rid(n)).unwrap();
        }

        assert!(tree.delete(&Key::Int(5), rid(10)).unwrap());
        let mut expected: Vec<u32> = (0..12).collect();
        expected.retain(|&n| n != 10);
        assert_eq!(scan_rids(&tree), expected);
    }

    #[test]
    fn test_delete_full_mode_unsupported() {
        let (_dir, bpm) = create_bpm(8);
        let config = small_config().with_delete_mode(DeleteMode::Full);
        let mut tree = BTreeFile::create_or_open(&bpm, "idx", config).unwrap();
        tree.insert(&Key::Int(1), rid(1)).unwrap();

        let err = tree.delete(&Key::Int(1), rid(1)).unwrap_err();
        assert!(matches!(err, Error::UnsupportedDeleteMode("full")));
        assert_eq!(err.kind(), crate::common::ErrorKind::Configuration);
        assert_eq!(scan_rids(&tree), vec![1]);
    }

    // ========================================================================
    // Destroy
    // ========================================================================

    #[test]
    fn test_destroy_frees_every_page() {
        let (_dir, bpm) = create_bpm(8);
        let mut tree = BTreeFile::create_or_open(&bpm, "idx", small_config()).unwrap();
        for k in 0..150 {
            tree.insert(&Key::Int(k), rid(k as u32)).unwrap();
        }

        let mut pages = Vec::new();
        tree_pages(&tree, tree.root_page_id().unwrap(), &mut pages);
        pages.push(tree.header_page_id());
        assert!(pages.len() > 40);

        tree.destroy().unwrap();

        for page_id in pages {
            assert!(!bpm.is_allocated(page_id), "{page_id} still allocated");
        }
        assert_eq!(bpm.get_file_entry("idx").unwrap(), None);
        assert_eq!(bpm.pinned_frame_count(), 0);
        assert!(matches!(BTreeFile::open(&bpm, "idx"), Err(Error::FileNotFound(_))));
    }

    #[test]
    fn test_destroy_empty_tree() {
        let (_dir, bpm) = create_bpm(8);
        let tree = BTreeFile::create_or_open(&bpm, "idx", small_config()).unwrap();
        let header_page_id = tree.header_page_id();

        tree.destroy().unwrap();

        assert!(!bpm.is_allocated(header_page_id));
        assert_eq!(bpm.get_file_entry("idx").unwrap(), None);
    }

    #[test]
    fn test_destroy_closed_tree_fails() {
        let (_dir, bpm) = create_bpm(8);
        let mut tree = BTreeFile::create_or_open(&bpm, "idx", small_config()).unwrap();
        tree.close();

        assert!(matches!(tree.destroy(), Err(Error::Closed(_))));
        assert!(bpm.get_file_entry("idx").unwrap().is_some());
    }

    // ========================================================================
    // Trace sink
    // ========================================================================

    #[test]
    fn test_trace_visits_search_path() {
        let (_dir, bpm) = create_bpm(8);
        let mut tree = BTreeFile::create_or_open(&bpm, "idx", small_config()).unwrap();
        for k in 0..8 {
            tree.insert(&Key::Int(k), rid(k as u32)).unwrap();
        }
        let root = tree.root_page_id().unwrap();

        let buf = SharedBuffer::default();
        assert!(tree.attach_trace(Box::new(buf.clone())).is_none());

        let start = tree.find_run_start(Some(&Key::Int(6))).unwrap().unwrap();
        let leaf = start.page_id();
        drop(start);

        assert_eq!(buf.contents(), format!("VISIT node {}\nVISIT node {}\n", root.0, leaf.0));

        assert!(tree.detach_trace().is_some());
        tree.find_run_start(None).unwrap();
        assert_eq!(buf.contents().lines().count(), 2);
    }

    #[test]
    fn test_trace_children_dumps_pages() {
        let (_dir, bpm) = create_bpm(8);
        let mut tree = BTreeFile::create_or_open(&bpm, "idx", small_config()).unwrap();
        for k in 0..5 {
            tree.insert(&Key::Int(k), RecordId::new(PageId::new(1), k as u32)).unwrap();
        }
        let root = tree.root_page_id().unwrap();

        // No sink: nothing happens.
        tree.trace_children(root).unwrap();

        let buf = SharedBuffer::default();
        tree.attach_trace(Box::new(buf.clone()));
        tree.trace_children(root).unwrap();

        let (leftmost, right) = {
            let guard = bpm.fetch_page_read(root).unwrap();
            let index = IndexPage::new(&*guard, KeyType::Integer);
            (index.leftmost_child(), index.child_at(0).unwrap())
        };
        assert_eq!(
            buf.contents(),
            format!("INDEX CHILDREN {} nodes\n {}   {}\n", root.0, leftmost.0, right.0)
        );

        tree.trace_children(leftmost).unwrap();
        let dump = buf.contents();
        let last = dump.lines().last().unwrap();
        assert_eq!(last, "   0 [1,0]   1 [1,1]");
    }
}
