//! # Storage Module
//!
//! Foundational storage layer for BoltKV: the on-disk page format, the
//! sorted page-id sets used by the freelist, memory-mapped file access, and
//! advisory file locking.
//!
//! ## On-Disk Page Layout
//!
//! Every page starts with the same 16-byte header regardless of its type:
//!
//! ```text
//! Offset  Size  Field     Description
//! ------  ----  --------  ----------------------------------------
//! 0       8     id        Page identifier
//! 8       2     flags     Type bitmask (branch/leaf/meta/freelist)
//! 10      2     count     Number of elements on the page
//! 12      4     overflow  Extra contiguous pages in this extent
//! ```
//!
//! Branch and leaf elements are fixed-size records stored contiguously
//! right after the header; keys and values live in a trailing
//! variable-length area addressed by per-element offsets. All
//! type-specific interpretation happens in those trailing bytes.
//!
//! ## Module Organization
//!
//! - `page`: page header, page type tag, branch/leaf element views
//! - `pgids`: sorted page-id sequences and the freelist merge algorithm
//! - `mmap`: read-only memory-mapped view of the database file
//! - `flock`: advisory shared/exclusive file locks with retry
//!
//! ## Thread Safety
//!
//! Nothing in this module carries its own synchronization. The file lock
//! is the sole cross-process ordering primitive; in-process ordering (when
//! to read vs. remap vs. write) belongs to the transaction layer above.

mod flock;
mod mmap;
mod page;
mod pgids;

pub use flock::{FileLock, LockTimeout, FLOCK_RETRY_INTERVAL};
pub use mmap::MappedRegion;
pub use page::{
    BranchElement, BranchPageElement, LeafElement, LeafPageElement, Page, PageHeader, PageInfo,
    PageType,
};
pub use pgids::{merge, merge_into, PageId, PageIdSet};

pub const PAGE_HEADER_SIZE: usize = 16;
pub const BRANCH_ELEMENT_SIZE: usize = 16;
pub const LEAF_ELEMENT_SIZE: usize = 16;

/// Minimum number of keys the tree layer keeps on any page.
pub const MIN_KEYS_PER_PAGE: usize = 2;

pub const BRANCH_PAGE_FLAG: u16 = 0x01;
pub const LEAF_PAGE_FLAG: u16 = 0x02;
pub const META_PAGE_FLAG: u16 = 0x04;
pub const FREELIST_PAGE_FLAG: u16 = 0x10;

/// Set on a leaf element's own `flags` field (a namespace separate from the
/// page-type bits) when its value is a nested-bucket header rather than
/// plain data.
pub const BUCKET_LEAF_FLAG: u32 = 0x01;
