//! # Storage Core Integration Tests
//!
//! End-to-end exercises of the physical layer working together the way the
//! transaction layer drives it: acquire the file lock, map the database
//! file, construct page views inside the mapping, and read element bytes
//! back out exactly as written.

use std::fs::File;
use std::io::Write;
use std::time::Duration;

use tempfile::tempdir;

use boltkv::storage::{
    self, FileLock, LeafPageElement, MappedRegion, PageHeader, PageIdSet, PageType,
};
use zerocopy::IntoBytes;

const PAGE_SIZE: usize = 4096;

/// Builds a single 4KB leaf page holding ("key", "value") and ("k", "").
fn leaf_page_file(path: &std::path::Path) -> File {
    let mut data = vec![0u8; PAGE_SIZE];

    let mut header = PageHeader::new(0, storage::LEAF_PAGE_FLAG);
    header.set_count(2);
    header.write_to(&mut data).unwrap();

    // Element records right after the header; key/value bytes after them.
    // pos is relative to each element's own offset.
    let elem0 = LeafPageElement::new(0, 32, 3, 5); // key at 16+32=48
    data[16..32].copy_from_slice(elem0.as_bytes());
    let elem1 = LeafPageElement::new(0, 24, 1, 0); // key at 32+24=56
    data[32..48].copy_from_slice(elem1.as_bytes());

    data[48..51].copy_from_slice(b"key");
    data[51..56].copy_from_slice(b"value");
    data[56..57].copy_from_slice(b"k");

    let mut file = File::create(path).unwrap();
    file.write_all(&data).unwrap();
    file.sync_all().unwrap();
    File::open(path).unwrap()
}

#[test]
fn read_leaf_page_through_mapping() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.db");
    let file = leaf_page_file(&path);

    let region = MappedRegion::map(&file, PAGE_SIZE).unwrap();
    let page = region.page_at(0).unwrap();

    assert_eq!(page.id(), 0);
    assert_eq!(page.typ(), PageType::Leaf);
    assert_eq!(page.count(), 2);
    assert_eq!(page.overflow(), 0);

    let elem0 = page.leaf_element(0).unwrap();
    assert_eq!(elem0.key().unwrap(), b"key");
    assert_eq!(elem0.value().unwrap(), b"value");

    let elem1 = page.leaf_element(1).unwrap();
    assert_eq!(elem1.key().unwrap(), b"k");
    assert_eq!(elem1.value().unwrap(), b"");

    assert!(page.leaf_element(2).is_err());
}

#[test]
fn locked_map_read_unlock_cycle() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.db");
    let file = leaf_page_file(&path);

    // The order a read transaction uses: lock, map, read, unmap, unlock.
    let lock = FileLock::new(&file);
    lock.lock(false, Duration::from_millis(500)).unwrap();

    let mut region = MappedRegion::map(&file, PAGE_SIZE).unwrap();
    {
        let page = region.page_at(0).unwrap();
        let elements = page.leaf_elements().unwrap();
        assert_eq!(elements.len(), 2);
        assert_eq!(elements[0].ksize(), 3);
        assert_eq!(elements[1].vsize(), 0);
    }
    region.unmap();
    assert_eq!(region.size(), 0);

    lock.unlock().unwrap();

    // A writer can take exclusivity once the reader is gone.
    let writer = File::open(&path).unwrap();
    let writer_lock = FileLock::new(&writer);
    writer_lock.lock(true, Duration::from_millis(500)).unwrap();
    writer_lock.unlock().unwrap();
}

#[test]
fn freed_pages_merge_into_freelist_set() {
    // Freelist rewrite: existing free set merged with a transaction's
    // newly freed pages, result stays sorted.
    let free = PageIdSet::from_sorted(vec![3, 4, 9, 15]);
    let freed_by_txn = PageIdSet::from_unsorted(vec![12, 5, 2]);

    let merged = free.merge(&freed_by_txn);

    assert_eq!(merged.as_slice(), &[2, 3, 4, 5, 9, 12, 15]);
    assert_eq!(merged.len(), free.len() + freed_by_txn.len());
}

#[test]
fn page_views_cover_multiple_pages_of_one_mapping() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.db");

    let mut data = vec![0u8; PAGE_SIZE * 2];
    let mut meta = PageHeader::new(0, storage::META_PAGE_FLAG);
    meta.write_to(&mut data).unwrap();
    let mut leaf = PageHeader::new(1, storage::LEAF_PAGE_FLAG);
    leaf.set_count(0);
    leaf.write_to(&mut data[PAGE_SIZE..]).unwrap();

    let mut file = File::create(&path).unwrap();
    file.write_all(&data).unwrap();
    file.sync_all().unwrap();
    let file = File::open(&path).unwrap();

    let region = MappedRegion::map(&file, PAGE_SIZE * 2).unwrap();

    let page0 = region.page_at(0).unwrap();
    assert_eq!(page0.typ(), PageType::Meta);
    assert_eq!(page0.info().page_type, "meta");

    let page1 = region.page_at(PAGE_SIZE).unwrap();
    assert_eq!(page1.id(), 1);
    assert_eq!(page1.typ(), PageType::Leaf);
    assert!(page1.leaf_elements().unwrap().is_empty());
}
