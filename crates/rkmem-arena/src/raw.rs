//! Low-level primitives for arena memory operations.
//!
//! Every raw-pointer dereference in the crate funnels through this module
//! or through a [`PageSource`](crate::source::PageSource) implementation.
//! Each `unsafe` block carries a `// SAFETY:` comment.

#![allow(unsafe_code)]

use std::ptr::NonNull;

/// One block of memory handed out by a page source.
///
/// A region is a linear token: it is not `Copy` or `Clone`, so the only
/// way to give it back is to move it into
/// [`PageSource::release`](crate::source::PageSource::release). It records
/// the length it was acquired with, which makes a size-mismatched release
/// impossible to express.
#[derive(Debug)]
pub struct RawRegion {
    ptr: NonNull<u8>,
    len: usize,
}

// SAFETY: a RawRegion is the sole owner of its block; nothing else holds
// the pointer, so moving it to another thread moves the whole block.
unsafe impl Send for RawRegion {}

impl RawRegion {
    /// Wrap a block obtained from an allocator.
    ///
    /// # Safety
    ///
    /// `ptr` must point to `len` writable bytes that stay valid until the
    /// region is released, and no other owner may exist for them.
    pub unsafe fn from_raw_parts(ptr: NonNull<u8>, len: usize) -> Self {
        Self { ptr, len }
    }

    /// Start of the block.
    pub fn as_ptr(&self) -> NonNull<u8> {
        self.ptr
    }

    /// Length the block was acquired with.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the block is zero bytes long.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Address of the first byte.
    pub fn addr(&self) -> usize {
        self.ptr.as_ptr() as usize
    }

    /// Pointer to byte `offset` of the block.
    ///
    /// `offset` may equal `len` (one-past-the-end) but no more.
    pub(crate) fn at(&self, offset: usize) -> NonNull<u8> {
        debug_assert!(offset <= self.len);
        // SAFETY: offset <= len keeps the result inside the block or one
        // past its end, and the block base is non-null.
        unsafe { NonNull::new_unchecked(self.ptr.as_ptr().add(offset)) }
    }
}

/// Overwrite `len` bytes at `dst` with zero.
///
/// # Safety
///
/// `dst` must be valid for `len` byte writes.
pub(crate) unsafe fn zero(dst: NonNull<u8>, len: usize) {
    // SAFETY: forwarded from the caller's contract.
    unsafe { std::ptr::write_bytes(dst.as_ptr(), 0, len) };
}

/// Copy `len` bytes from `src` to `dst`.
///
/// # Safety
///
/// `src` must be valid for `len` reads, `dst` for `len` writes, and the
/// two ranges must not overlap.
pub(crate) unsafe fn copy(src: NonNull<u8>, dst: NonNull<u8>, len: usize) {
    // SAFETY: forwarded from the caller's contract.
    unsafe { std::ptr::copy_nonoverlapping(src.as_ptr(), dst.as_ptr(), len) };
}
