//! # BoltKV - Single-File B+Tree Key-Value Store (Storage Core)
//!
//! BoltKV keeps an entire database in one file. All durable state lives in
//! fixed-size pages inside that file, and the running process reads those
//! pages by mapping the file directly into its address space instead of
//! copying bytes through a buffer cache.
//!
//! This crate is the physical-layout and memory-mapping core:
//!
//! - **Page format**: a fixed 16-byte header plus a trailing region
//!   interpreted as an array of branch or leaf elements, accessed zero-copy
//!   through bounds-checked views
//! - **Page-id sets**: the sorted sequences of page ids the freelist keeps,
//!   with a run-skipping sorted-union merge
//! - **Memory mapping**: read-only, process-shared mapping of the database
//!   file with a random-access kernel advice hint
//! - **File locking**: advisory shared/exclusive locks with bounded-wait
//!   retry and a distinguished timeout error
//!
//! ## Architecture
//!
//! The B+tree, transaction, cursor, and bucket layers live above this crate
//! and manipulate pages only through the accessors defined here:
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │  B+Tree / Transactions / Cursors     │   (external collaborators)
//! ├──────────────────────────────────────┤
//! │  Page & element views  │  PageIdSet  │
//! ├────────────────────────┴─────────────┤
//! │  MappedRegion (mmap)   │  FileLock   │
//! └──────────────────────────────────────┘
//! ```
//!
//! A write transaction asks [`storage::FileLock`] for exclusivity, asks
//! [`storage::MappedRegion`] for the current byte buffer, then constructs
//! [`storage::Page`] views at page offsets within that buffer. The freelist
//! merges newly freed pages into its existing set with
//! [`storage::PageIdSet::merge`].
//!
//! ## Safety Model
//!
//! Mapped memory becomes invalid when the region is unmapped (for example
//! right before a larger remap during file growth). Instead of hazard
//! pointers or epoch tracking, the borrow checker enforces validity at
//! compile time: page views borrow the region immutably while
//! [`storage::MappedRegion::unmap`] requires `&mut self`, so no view can
//! outlive the mapping it points into.

pub mod storage;

pub use storage::{
    FileLock, LockTimeout, MappedRegion, Page, PageHeader, PageId, PageIdSet, PageInfo, PageType,
};
