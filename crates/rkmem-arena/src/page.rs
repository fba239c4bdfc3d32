//! Fixed-capacity pages with a bump offset.
//!
//! A [`Page`] is one block acquired from a [`PageSource`](crate::PageSource)
//! plus a cursor. Pages are owned by exactly one arena and only give their
//! memory back when the arena is freed or dropped.

use std::ptr::NonNull;

use crate::raw::RawRegion;

/// A single contiguous byte region with bump allocation.
///
/// Invariant: `offset <= size` at all times.
#[derive(Debug)]
pub struct Page {
    /// Backing block. Its length is the page capacity.
    region: RawRegion,
    /// Bump pointer: index of the next free byte.
    offset: usize,
}

impl Page {
    /// Wrap a freshly acquired region as an empty page.
    pub(crate) fn new(region: RawRegion) -> Self {
        Self { region, offset: 0 }
    }

    /// Bump-allocate `len` bytes from this page.
    ///
    /// Returns the offset the allocation starts at, or `None` if the
    /// remaining capacity is too small. A failed bump leaves the page
    /// untouched.
    pub fn try_bump(&mut self, len: usize) -> Option<usize> {
        let end = self.offset.checked_add(len)?;
        if end > self.size() {
            return None;
        }
        let start = self.offset;
        self.offset = end;
        Some(start)
    }

    /// Pointer to byte `offset` of this page.
    pub(crate) fn ptr_at(&self, offset: usize) -> NonNull<u8> {
        self.region.at(offset)
    }

    /// Whether `[addr, addr + len)` lies inside the bytes handed out so far.
    pub fn contains(&self, addr: usize, len: usize) -> bool {
        let base = self.region.addr();
        let Some(end) = addr.checked_add(len) else {
            return false;
        };
        addr >= base && end <= base + self.offset
    }

    /// Rewind the bump pointer to zero.
    ///
    /// Memory contents are left as they are.
    pub fn reset(&mut self) {
        self.offset = 0;
    }

    /// Address of the first byte of the page.
    pub fn base_addr(&self) -> usize {
        self.region.addr()
    }

    /// Bytes handed out since creation or the last reset.
    pub fn used(&self) -> usize {
        self.offset
    }

    /// Capacity in bytes.
    pub fn size(&self) -> usize {
        self.region.len()
    }

    /// Give up the backing region, for release to its source.
    pub(crate) fn into_region(self) -> RawRegion {
        self.region
    }
}
