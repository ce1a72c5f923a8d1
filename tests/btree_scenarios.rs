//! Integration tests for the B+ tree: end-to-end scenarios, pin balance,
//! persistence across sessions.

use bplusdb::index::btree::{IndexPage, LeafPage, NodeType};
use bplusdb::{
    BTreeConfig, BTreeFile, BufferPoolManager, DiskManager, Error, ErrorKind, Key, KeyType, PageId,
    RecordId,
};
use tempfile::{tempdir, TempDir};

fn create_bpm(pool_size: usize) -> (BufferPoolManager, TempDir) {
    let dir = tempdir().unwrap();
    let dm = DiskManager::create(dir.path().join("btree.db")).unwrap();
    (BufferPoolManager::new(pool_size, dm), dir)
}

/// Four integer entries per leaf, five separators per index node.
fn small_ints() -> BTreeConfig {
    BTreeConfig::integer().with_node_capacity(64)
}

fn rid(n: u32) -> RecordId {
    RecordId::new(PageId::new(7000 + n / 100), n % 100)
}

fn scan_keys(tree: &BTreeFile<'_>, lo: Option<&Key>, hi: Option<&Key>) -> Vec<i32> {
    tree.new_scan(lo, hi)
        .unwrap()
        .map(|entry| match entry.unwrap().0 {
            Key::Int(k) => k,
            other => panic!("unexpected key {other}"),
        })
        .collect()
}

fn leaf_keys(bpm: &BufferPoolManager, page_id: PageId) -> Vec<Key> {
    let guard = bpm.fetch_page_read(page_id).unwrap();
    LeafPage::new(&*guard, KeyType::Integer)
        .entries()
        .unwrap()
        .into_iter()
        .map(|(k, _)| k)
        .collect()
}

// ============================================================================
// Scenarios
// ============================================================================

/// Out-of-order inserts split the root and still scan in order.
#[test]
fn test_scan_after_splits_is_sorted() {
    let (bpm, _dir) = create_bpm(8);
    let mut tree = BTreeFile::create_or_open(&bpm, "s1", small_ints()).unwrap();

    for k in [5, 3, 8, 1, 9, 2, 7] {
        tree.insert(&Key::Int(k), rid(k as u32)).unwrap();
    }

    let root = tree.root_page_id().unwrap();
    let guard = bpm.fetch_page_read(root).unwrap();
    assert_eq!(NodeType::of(&guard, root).unwrap(), NodeType::Index);
    drop(guard);

    assert_eq!(scan_keys(&tree, None, None), vec![1, 2, 3, 5, 7, 8, 9]);
}

/// Duplicates come back leftmost first, in insertion order.
#[test]
fn test_duplicates_in_insertion_order() {
    let (bpm, _dir) = create_bpm(8);
    let mut tree = BTreeFile::create_or_open(&bpm, "s2", small_ints()).unwrap();
    let (l1, l2, l3) = (rid(1), rid(2), rid(3));

    tree.insert(&Key::Int(4), l1).unwrap();
    tree.insert(&Key::Int(4), l2).unwrap();
    tree.insert(&Key::Int(4), l3).unwrap();

    let start = tree.find_run_start(Some(&Key::Int(4))).unwrap().unwrap();
    assert_eq!(start.entry().unwrap(), (Key::Int(4), l1));
    drop(start);

    let hits: Vec<RecordId> = tree
        .new_scan(Some(&Key::Int(4)), Some(&Key::Int(4)))
        .unwrap()
        .map(|entry| entry.unwrap().1)
        .collect();
    assert_eq!(hits, vec![l1, l2, l3]);
}

/// The first root split makes a new index root over two disjoint leaves.
#[test]
fn test_root_split_partitions_keys() {
    let (bpm, _dir) = create_bpm(8);
    let mut tree = BTreeFile::create_or_open(&bpm, "s3", small_ints()).unwrap();

    for k in 1..=4 {
        tree.insert(&Key::Int(k * 10), rid(k as u32)).unwrap();
    }
    let old_root = tree.root_page_id().unwrap();
    let before = leaf_keys(&bpm, old_root);

    tree.insert(&Key::Int(25), rid(25)).unwrap();
    let new_root = tree.root_page_id().unwrap();
    assert_ne!(new_root, old_root);
    assert_eq!(tree.header().unwrap().root, new_root);

    let (left, right, separator) = {
        let guard = bpm.fetch_page_read(new_root).unwrap();
        assert_eq!(NodeType::of(&guard, new_root).unwrap(), NodeType::Index);
        let index = IndexPage::new(&*guard, KeyType::Integer);
        assert_eq!(index.len(), 1);
        let (separator, right) = index.entry(0).unwrap();
        (index.leftmost_child(), right, separator)
    };
    assert_eq!(left, old_root);

    let left_keys = leaf_keys(&bpm, left);
    let right_keys = leaf_keys(&bpm, right);
    assert!(left_keys.iter().all(|k| *k < separator));
    assert!(right_keys.iter().all(|k| *k >= separator));
    assert_eq!(right_keys.first(), Some(&separator));

    let mut all: Vec<Key> = left_keys.into_iter().chain(right_keys).collect();
    all.retain(|k| *k != Key::Int(25));
    assert_eq!(all, before);
}

/// Deleting an absent pair changes nothing.
#[test]
fn test_delete_missing_key() {
    let (bpm, _dir) = create_bpm(8);
    let mut tree = BTreeFile::create_or_open(&bpm, "s4", small_ints()).unwrap();
    for k in (0..20).map(|k| k * 3) {
        tree.insert(&Key::Int(k), rid(k as u32)).unwrap();
    }
    let root = tree.root_page_id().unwrap();
    let before = scan_keys(&tree, None, None);

    assert!(!tree.delete(&Key::Int(4), rid(4)).unwrap());
    assert!(!tree.delete(&Key::Int(1000), rid(1)).unwrap());
    assert!(!tree.delete(&Key::Int(-5), rid(1)).unwrap());

    assert_eq!(tree.root_page_id().unwrap(), root);
    assert_eq!(scan_keys(&tree, None, None), before);
}

/// Deleting every key one at a time loses nothing else.
#[test]
fn test_delete_everything_from_multiple_levels() {
    let (bpm, _dir) = create_bpm(8);
    let mut tree = BTreeFile::create_or_open(&bpm, "s5", small_ints()).unwrap();
    let keys: Vec<i32> = (0..16).map(|k| (k * 7) % 16).collect();
    for &k in &keys {
        tree.insert(&Key::Int(k), rid(k as u32)).unwrap();
    }
    let root = tree.root_page_id().unwrap();

    let mut remaining: Vec<i32> = (0..16).collect();
    for &k in keys.iter().rev() {
        assert!(tree.delete(&Key::Int(k), rid(k as u32)).unwrap());
        remaining.retain(|&r| r != k);
        assert_eq!(scan_keys(&tree, None, None), remaining);
    }

    // Naive delete never shrinks the tree.
    assert_eq!(tree.root_page_id().unwrap(), root);
    assert!(tree.find_run_start(None).unwrap().is_none());
    assert_eq!(bpm.pinned_frame_count(), 1);
}

/// Destroy removes the directory entry; the name no longer opens.
#[test]
fn test_destroy_then_open() {
    let (bpm, _dir) = create_bpm(8);
    let mut tree = BTreeFile::create_or_open(&bpm, "s6", small_ints()).unwrap();
    for k in 0..100 {
        tree.insert(&Key::Int(k), rid(k as u32)).unwrap();
    }

    tree.destroy().unwrap();

    assert_eq!(bpm.get_file_entry("s6").unwrap(), None);
    let err = BTreeFile::open(&bpm, "s6").unwrap_err();
    assert!(matches!(err, Error::FileNotFound(_)));
    assert_eq!(err.kind(), ErrorKind::Collaborator);

    // The name is free again.
    let tree = BTreeFile::create_or_open(&bpm, "s6", small_ints()).unwrap();
    assert!(tree.find_run_start(None).unwrap().is_none());
}

// ============================================================================
// Pin balance
// ============================================================================

#[test]
fn test_no_pins_leak_through_public_operations() {
    // A tiny pool fails fast if any operation leaks a pin.
    let (bpm, _dir) = create_bpm(5);
    let mut tree = BTreeFile::create_or_open(&bpm, "pins", small_ints()).unwrap();
    assert_eq!(bpm.pinned_frame_count(), 1);

    for i in 0..300 {
        let k = (i * 37) % 300;
        tree.insert(&Key::Int(k), rid(k as u32)).unwrap();
        assert_eq!(bpm.pinned_frame_count(), 1, "after insert {k}");
    }

    for k in (0..300).step_by(3) {
        assert!(tree.delete(&Key::Int(k), rid(k as u32)).unwrap());
        assert_eq!(bpm.pinned_frame_count(), 1, "after delete {k}");
    }
    // A miss walks to the end of the chain.
    assert!(!tree.delete(&Key::Int(1000), rid(0)).unwrap());
    assert_eq!(bpm.pinned_frame_count(), 1);

    let count = tree.new_scan(None, None).unwrap().count();
    assert_eq!(count, 200);
    assert_eq!(bpm.pinned_frame_count(), 1);

    let mut partial = tree.new_scan(Some(&Key::Int(50)), None).unwrap();
    partial.next().unwrap().unwrap();
    drop(partial);
    assert_eq!(bpm.pinned_frame_count(), 1);

    // Errors release their pins too.
    assert!(tree.insert(&Key::from("x"), rid(0)).is_err());
    assert!(tree.find_run_start(Some(&Key::from("x"))).is_err());
    assert_eq!(bpm.pinned_frame_count(), 1);

    tree.close();
    assert_eq!(bpm.pinned_frame_count(), 0);
}

// ============================================================================
// Persistence
// ============================================================================

#[test]
fn test_tree_survives_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("persist.db");

    {
        let bpm = BufferPoolManager::new(6, DiskManager::create(&path).unwrap());
        let mut tree =
            BTreeFile::create_or_open(&bpm, "names", BTreeConfig::string(24).with_node_capacity(200))
                .unwrap();
        for (i, name) in ["mallory", "alice", "trent", "bob", "eve", "carol", "dave", "peggy"]
            .iter()
            .cycle()
            .take(40)
            .enumerate()
        {
            tree.insert(&Key::from(format!("{name}-{i:02}")), rid(i as u32)).unwrap();
        }
        tree.close();
        bpm.flush_all_pages().unwrap();
    }

    let bpm = BufferPoolManager::new(6, DiskManager::open(&path).unwrap());
    let tree = BTreeFile::open(&bpm, "names").unwrap();
    assert_eq!(tree.key_type(), KeyType::String);
    assert_eq!(tree.config().node_capacity, 200);

    let lo = Key::from("b");
    let hi = Key::from("c");
    let bobs: Vec<String> = tree
        .new_scan(Some(&lo), Some(&hi))
        .unwrap()
        .map(|entry| entry.unwrap().0.to_string())
        .collect();
    assert_eq!(bobs, vec!["bob-03", "bob-11", "bob-19", "bob-27", "bob-35"]);

    let all = tree.new_scan(None, None).unwrap().count();
    assert_eq!(all, 40);
}

#[test]
fn test_two_trees_share_one_file() {
    let (bpm, _dir) = create_bpm(8);
    let mut ints = BTreeFile::create_or_open(&bpm, "ints", small_ints()).unwrap();
    let mut strs = BTreeFile::create_or_open(&bpm, "strs", BTreeConfig::string(16)).unwrap();

    for k in 0..30 {
        ints.insert(&Key::Int(k), rid(k as u32)).unwrap();
        strs.insert(&Key::from(format!("k{k:02}")), rid(k as u32)).unwrap();
    }
    ints.destroy().unwrap();

    assert_eq!(strs.new_scan(None, None).unwrap().count(), 30);
    assert!(strs.delete(&Key::from("k07"), rid(7)).unwrap());
    assert_eq!(strs.new_scan(None, None).unwrap().count(), 29);
    assert_eq!(bpm.file_entries().unwrap().len(), 1);
}
