//! # Page Format and Element Views
//!
//! This module defines the on-disk page structure for BoltKV. Every page
//! begins with a 16-byte header; branch and leaf pages follow it with a
//! contiguous array of fixed-size element records, and those records point
//! into a trailing variable-length area holding the actual keys and values.
//!
//! ## Page Header Layout (16 bytes)
//!
//! ```text
//! Offset  Size  Field     Description
//! ------  ----  --------  ----------------------------------------
//! 0       8     id        Page identifier
//! 8       2     flags     Page type bitmask
//! 10      2     count     Number of elements on this page
//! 12      4     overflow  Extra contiguous pages in this extent
//! ```
//!
//! ## Element Records
//!
//! ```text
//! Branch: pos (4) | ksize (4) | pgid (8)
//! Leaf:   flags (4) | pos (4) | ksize (4) | vsize (4)
//! ```
//!
//! `pos` is a byte offset relative to the element's *own* address, not the
//! page start. A branch element's key occupies `ksize` bytes at that
//! offset; a leaf element's key occupies `ksize` bytes there with the value
//! in the `vsize` bytes immediately after it.
//!
//! ## Zero-Copy Access
//!
//! All records use `zerocopy` for safe transmutation from raw bytes, so
//! headers and element arrays are read directly out of the mmap'd buffer
//! without copying. Fields are explicit little-endian (`U16`/`U32`/`U64`),
//! which also makes every record alignment-free: a view is valid at any
//! byte offset of the buffer.
//!
//! ## Bounds Checking
//!
//! An element index at or beyond `count`, or a `pos`/`ksize`/`vsize` range
//! that escapes the page extent, is reported as an explicit error rather
//! than reading adjacent memory. The page type tag is decoded once into
//! [`PageType`] when the view is constructed; it exists for diagnostics
//! only and is never consulted for control flow.

use std::fmt;

use eyre::{ensure, Result};
use zerocopy::byteorder::little_endian::{U16, U32, U64};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use super::{
    PageId, BRANCH_ELEMENT_SIZE, BRANCH_PAGE_FLAG, BUCKET_LEAF_FLAG, FREELIST_PAGE_FLAG,
    LEAF_ELEMENT_SIZE, LEAF_PAGE_FLAG, META_PAGE_FLAG, PAGE_HEADER_SIZE,
};

/// Page type decoded from the header's `flags` bitmask.
///
/// Decoded once when a [`Page`] view is constructed. `Unknown` carries the
/// raw flag value for diagnostics; it is never an error by itself because
/// this layer does not decide what to do with unrecognized pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageType {
    Branch,
    Leaf,
    Meta,
    Freelist,
    Unknown(u16),
}

impl PageType {
    pub fn from_flags(flags: u16) -> Self {
        if flags & BRANCH_PAGE_FLAG != 0 {
            PageType::Branch
        } else if flags & LEAF_PAGE_FLAG != 0 {
            PageType::Leaf
        } else if flags & META_PAGE_FLAG != 0 {
            PageType::Meta
        } else if flags & FREELIST_PAGE_FLAG != 0 {
            PageType::Freelist
        } else {
            PageType::Unknown(flags)
        }
    }
}

impl fmt::Display for PageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageType::Branch => write!(f, "branch"),
            PageType::Leaf => write!(f, "leaf"),
            PageType::Meta => write!(f, "meta"),
            PageType::Freelist => write!(f, "freelist"),
            PageType::Unknown(flags) => write!(f, "unknown<{:02x}>", flags),
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct PageHeader {
    id: U64,
    flags: U16,
    count: U16,
    overflow: U32,
}

impl PageHeader {
    pub fn new(id: PageId, flags: u16) -> Self {
        Self {
            id: U64::new(id),
            flags: U16::new(flags),
            count: U16::new(0),
            overflow: U32::new(0),
        }
    }

    pub fn from_bytes(data: &[u8]) -> Result<&Self> {
        ensure!(
            data.len() >= PAGE_HEADER_SIZE,
            "buffer too small for PageHeader: {} < {}",
            data.len(),
            PAGE_HEADER_SIZE
        );

        Self::ref_from_bytes(&data[..PAGE_HEADER_SIZE])
            .map_err(|e| eyre::eyre!("failed to read PageHeader: {:?}", e))
    }

    pub fn from_bytes_mut(data: &mut [u8]) -> Result<&mut Self> {
        ensure!(
            data.len() >= PAGE_HEADER_SIZE,
            "buffer too small for PageHeader: {} < {}",
            data.len(),
            PAGE_HEADER_SIZE
        );

        Self::mut_from_bytes(&mut data[..PAGE_HEADER_SIZE])
            .map_err(|e| eyre::eyre!("failed to read PageHeader: {:?}", e))
    }

    pub fn write_to(&self, data: &mut [u8]) -> Result<()> {
        ensure!(
            data.len() >= PAGE_HEADER_SIZE,
            "buffer too small for PageHeader: {} < {}",
            data.len(),
            PAGE_HEADER_SIZE
        );

        data[..PAGE_HEADER_SIZE].copy_from_slice(self.as_bytes());
        Ok(())
    }

    pub fn id(&self) -> PageId {
        self.id.get()
    }

    pub fn set_id(&mut self, id: PageId) {
        self.id = U64::new(id);
    }

    pub fn flags(&self) -> u16 {
        self.flags.get()
    }

    pub fn set_flags(&mut self, flags: u16) {
        self.flags = U16::new(flags);
    }

    pub fn count(&self) -> u16 {
        self.count.get()
    }

    pub fn set_count(&mut self, count: u16) {
        self.count = U16::new(count);
    }

    pub fn overflow(&self) -> u32 {
        self.overflow.get()
    }

    pub fn set_overflow(&mut self, overflow: u32) {
        self.overflow = U32::new(overflow);
    }
}

/// Raw branch element record: key position, key size, child page id.
#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct BranchPageElement {
    pos: U32,
    ksize: U32,
    pgid: U64,
}

impl BranchPageElement {
    pub fn new(pos: u32, ksize: u32, pgid: PageId) -> Self {
        Self {
            pos: U32::new(pos),
            ksize: U32::new(ksize),
            pgid: U64::new(pgid),
        }
    }

    pub fn pos(&self) -> u32 {
        self.pos.get()
    }

    pub fn ksize(&self) -> u32 {
        self.ksize.get()
    }

    pub fn pgid(&self) -> PageId {
        self.pgid.get()
    }
}

/// Raw leaf element record: element flags, key position, key size, value size.
#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct LeafPageElement {
    flags: U32,
    pos: U32,
    ksize: U32,
    vsize: U32,
}

impl LeafPageElement {
    pub fn new(flags: u32, pos: u32, ksize: u32, vsize: u32) -> Self {
        Self {
            flags: U32::new(flags),
            pos: U32::new(pos),
            ksize: U32::new(ksize),
            vsize: U32::new(vsize),
        }
    }

    pub fn flags(&self) -> u32 {
        self.flags.get()
    }

    pub fn pos(&self) -> u32 {
        self.pos.get()
    }

    pub fn ksize(&self) -> u32 {
        self.ksize.get()
    }

    pub fn vsize(&self) -> u32 {
        self.vsize.get()
    }

    /// True when the element's value is a nested-bucket header rather than
    /// plain data.
    pub fn is_bucket(&self) -> bool {
        self.flags.get() & BUCKET_LEAF_FLAG != 0
    }
}

/// A branch element resolved against its page extent. `key()` slices the
/// trailing key area using the record's own offset and is bounds-checked
/// against the extent.
#[derive(Debug, Clone, Copy)]
pub struct BranchElement<'a> {
    raw: &'a BranchPageElement,
    data: &'a [u8],
    offset: usize,
}

impl<'a> BranchElement<'a> {
    pub fn pgid(&self) -> PageId {
        self.raw.pgid()
    }

    pub fn key(&self) -> Result<&'a [u8]> {
        // pos is relative to the element's own address, not the page start.
        let start = self.offset + self.raw.pos() as usize;
        let end = start + self.raw.ksize() as usize;
        ensure!(
            end <= self.data.len(),
            "branch element key [{}..{}] out of page bounds (len={})",
            start,
            end,
            self.data.len()
        );
        Ok(&self.data[start..end])
    }
}

/// A leaf element resolved against its page extent. The key occupies
/// `ksize` bytes at the record's offset; the value is the `vsize` bytes
/// immediately after the key.
#[derive(Debug, Clone, Copy)]
pub struct LeafElement<'a> {
    raw: &'a LeafPageElement,
    data: &'a [u8],
    offset: usize,
}

impl<'a> LeafElement<'a> {
    pub fn flags(&self) -> u32 {
        self.raw.flags()
    }

    pub fn is_bucket(&self) -> bool {
        self.raw.is_bucket()
    }

    pub fn key(&self) -> Result<&'a [u8]> {
        let start = self.offset + self.raw.pos() as usize;
        let end = start + self.raw.ksize() as usize;
        ensure!(
            end <= self.data.len(),
            "leaf element key [{}..{}] out of page bounds (len={})",
            start,
            end,
            self.data.len()
        );
        Ok(&self.data[start..end])
    }

    pub fn value(&self) -> Result<&'a [u8]> {
        let start = self.offset + self.raw.pos() as usize + self.raw.ksize() as usize;
        let end = start + self.raw.vsize() as usize;
        ensure!(
            end <= self.data.len(),
            "leaf element value [{}..{}] out of page bounds (len={})",
            start,
            end,
            self.data.len()
        );
        Ok(&self.data[start..end])
    }
}

/// Human-readable summary of a page, for tooling and debugging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageInfo {
    pub id: PageId,
    pub page_type: String,
    pub count: usize,
    pub overflow_count: usize,
}

/// A read-only view of one page inside a larger byte buffer.
///
/// `data` starts at the page header and spans the page's full extent,
/// including any overflow pages. The caller decides the extent length; this
/// view only guarantees that nothing it returns escapes it.
#[derive(Debug, Clone, Copy)]
pub struct Page<'a> {
    header: &'a PageHeader,
    data: &'a [u8],
    page_type: PageType,
}

impl<'a> Page<'a> {
    /// Interprets `data` as a page, starting at its header.
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        let header = PageHeader::from_bytes(data)?;
        let page_type = PageType::from_flags(header.flags());
        Ok(Self {
            header,
            data,
            page_type,
        })
    }

    pub fn id(&self) -> PageId {
        self.header.id()
    }

    pub fn flags(&self) -> u16 {
        self.header.flags()
    }

    pub fn count(&self) -> u16 {
        self.header.count()
    }

    pub fn overflow(&self) -> u32 {
        self.header.overflow()
    }

    /// Page type for diagnostics. Never used for control flow.
    pub fn typ(&self) -> PageType {
        self.page_type
    }

    pub fn info(&self) -> PageInfo {
        PageInfo {
            id: self.id(),
            page_type: self.page_type.to_string(),
            count: self.count() as usize,
            overflow_count: self.overflow() as usize,
        }
    }

    pub fn branch_element(&self, index: u16) -> Result<BranchElement<'a>> {
        ensure!(
            index < self.count(),
            "branch element index {} out of range (count={})",
            index,
            self.count()
        );

        let offset = PAGE_HEADER_SIZE + index as usize * BRANCH_ELEMENT_SIZE;
        ensure!(
            offset + BRANCH_ELEMENT_SIZE <= self.data.len(),
            "branch element {} at [{}..{}] out of page bounds (len={})",
            index,
            offset,
            offset + BRANCH_ELEMENT_SIZE,
            self.data.len()
        );

        let raw = BranchPageElement::ref_from_bytes(&self.data[offset..offset + BRANCH_ELEMENT_SIZE])
            .map_err(|e| eyre::eyre!("failed to read branch element {}: {:?}", index, e))?;

        Ok(BranchElement {
            raw,
            data: self.data,
            offset,
        })
    }

    /// The whole branch element array as one typed slice. A page with
    /// `count == 0` yields an empty slice without touching the bytes after
    /// the header.
    pub fn branch_elements(&self) -> Result<&'a [BranchPageElement]> {
        let count = self.count() as usize;
        if count == 0 {
            return Ok(&[]);
        }

        let (elements, _) =
            <[BranchPageElement]>::ref_from_prefix_with_elems(&self.data[PAGE_HEADER_SIZE..], count)
                .map_err(|e| eyre::eyre!("failed to read {} branch elements: {:?}", count, e))?;
        Ok(elements)
    }

    pub fn leaf_element(&self, index: u16) -> Result<LeafElement<'a>> {
        ensure!(
            index < self.count(),
            "leaf element index {} out of range (count={})",
            index,
            self.count()
        );

        let offset = PAGE_HEADER_SIZE + index as usize * LEAF_ELEMENT_SIZE;
        ensure!(
            offset + LEAF_ELEMENT_SIZE <= self.data.len(),
            "leaf element {} at [{}..{}] out of page bounds (len={})",
            index,
            offset,
            offset + LEAF_ELEMENT_SIZE,
            self.data.len()
        );

        let raw = LeafPageElement::ref_from_bytes(&self.data[offset..offset + LEAF_ELEMENT_SIZE])
            .map_err(|e| eyre::eyre!("failed to read leaf element {}: {:?}", index, e))?;

        Ok(LeafElement {
            raw,
            data: self.data,
            offset,
        })
    }

    /// The whole leaf element array as one typed slice. A page with
    /// `count == 0` yields an empty slice without touching the bytes after
    /// the header.
    pub fn leaf_elements(&self) -> Result<&'a [LeafPageElement]> {
        let count = self.count() as usize;
        if count == 0 {
            return Ok(&[]);
        }

        let (elements, _) =
            <[LeafPageElement]>::ref_from_prefix_with_elems(&self.data[PAGE_HEADER_SIZE..], count)
                .map_err(|e| eyre::eyre!("failed to read {} leaf elements: {:?}", count, e))?;
        Ok(elements)
    }

    /// First `n` bytes of the page as hex, for debugging.
    pub fn hexdump(&self, n: usize) -> String {
        let n = n.min(self.data.len());
        let mut out = String::with_capacity(n * 2);
        for byte in &self.data[..n] {
            out.push_str(&format!("{:02x}", byte));
        }
        out
    }
}
