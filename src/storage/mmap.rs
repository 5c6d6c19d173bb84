//! # Memory-Mapped File Access
//!
//! This module implements `MappedRegion`, the read-only memory-mapped view
//! of the database file. Instead of copying page data between kernel
//! buffers and a user-space page cache, the file is mapped directly into
//! the process address space and page views are sliced out of the mapping.
//!
//! ## Access Pattern
//!
//! B+tree traversal jumps around the file, so the mapping is advised as
//! `MADV_RANDOM`. Kernels that do not implement `madvise` return `ENOSYS`;
//! the mapping still works without the hint, so that one error is
//! tolerated. Any other advise failure fails the map call.
//!
//! ## Growth and Remapping
//!
//! Growing the database means unmapping and re-mapping at a larger size.
//! This module does not decide when to grow; the transaction layer calls
//! `unmap` followed by a new `map`. Unmap is idempotent: unmapping an
//! already-unmapped region is a no-op, and accessors report the buffer as
//! absent afterward.
//!
//! ## Safety Considerations
//!
//! Page views obtained from a region must never outlive the mapping.
//! `unmap` takes `&mut self`, so the borrow checker statically rejects any
//! caller still holding a `&[u8]` or `Page` borrowed from the region. This
//! replaces the hazard-pointer/epoch schemes a runtime-checked design
//! would need, at zero runtime cost.
//!
//! ## Writes
//!
//! The mapping is established read-only (`PROT_READ`, `MAP_SHARED`).
//! Writes go through a separate file-write path owned by the transaction
//! layer; nothing in this crate mutates mapped bytes.

use std::fs::File;

use eyre::{ensure, Result, WrapErr};
use memmap2::{Mmap, MmapOptions};

use super::Page;

#[derive(Debug, Default)]
pub struct MappedRegion {
    mmap: Option<Mmap>,
}

impl MappedRegion {
    /// Establishes a read-only, process-shared mapping of the first `sz`
    /// bytes of `file` and advises the kernel of random access.
    pub fn map(file: &File, sz: usize) -> Result<Self> {
        ensure!(sz > 0, "mapping size must be at least 1 byte");

        // SAFETY: Mmap::map is unsafe because the underlying file can be
        // modified externally while mapped. This is safe because:
        // 1. The database file is exclusively owned by the database handle,
        //    which holds an advisory lock while writing
        // 2. The mapping is read-only; no aliasing writable mapping is
        //    created by this crate
        // 3. All access goes through data()/page_at() which bounds-check
        let mmap = unsafe {
            MmapOptions::new()
                .len(sz)
                .map(file)
                .wrap_err_with(|| format!("failed to memory-map {} bytes of database file", sz))?
        };

        #[cfg(unix)]
        if let Err(err) = mmap.advise(memmap2::Advice::Random) {
            // Kernels without madvise still map fine; everything else is fatal.
            if err.raw_os_error() != Some(libc::ENOSYS) {
                return Err(err).wrap_err("madvise(MADV_RANDOM) failed");
            }
        }

        Ok(Self { mmap: Some(mmap) })
    }

    /// Releases the mapping. A no-op when nothing is currently mapped, so
    /// repeated unmaps are always safe.
    pub fn unmap(&mut self) {
        self.mmap = None;
    }

    pub fn is_mapped(&self) -> bool {
        self.mmap.is_some()
    }

    /// The mapped byte buffer, or `None` after unmap.
    pub fn data(&self) -> Option<&[u8]> {
        self.mmap.as_deref()
    }

    /// Mapped length in bytes; 0 after unmap.
    pub fn size(&self) -> usize {
        self.mmap.as_ref().map_or(0, |m| m.len())
    }

    /// Constructs a page view starting at byte `offset` of the mapping and
    /// extending to the end of it. The caller decides where pages start;
    /// this only guarantees the view cannot escape the mapping.
    pub fn page_at(&self, offset: usize) -> Result<Page<'_>> {
        let data = self
            .data()
            .ok_or_else(|| eyre::eyre!("cannot read page at offset {}: region is unmapped", offset))?;

        ensure!(
            offset < data.len(),
            "page offset {} out of mapped bounds (size={})",
            offset,
            data.len()
        );

        Page::parse(&data[offset..])
    }
}
