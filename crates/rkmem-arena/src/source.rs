//! Page sources: where arena pages come from.
//!
//! A [`PageSource`] hands out large writable blocks and takes them back,
//! one call per block. The arena never talks to the operating system
//! directly; it only ever sees this trait.
//!
//! Two sources ship with the crate:
//!
//! - [`VirtualPages`]: anonymous private mappings straight from the kernel
//!   (`mmap`/`munmap` on Unix, `VirtualAlloc`/`VirtualFree` on Windows).
//!   Bypasses the global allocator entirely.
//! - [`HeapPages`]: the global allocator, for targets without a virtual
//!   memory API and for builds with the `heap-pages` feature.
//!
//! [`DefaultSource`] picks one of them at build-configuration time.

#![allow(unsafe_code)]

use std::alloc::{self, Layout};
use std::ptr::NonNull;

use crate::error::ArenaError;
use crate::raw::RawRegion;

/// A supplier of raw memory blocks for arena pages.
///
/// Implementations must not retry on failure: a refused request is
/// reported as `None` and surfaced to the arena's caller unchanged.
pub trait PageSource {
    /// Acquire at least `len` writable bytes.
    ///
    /// Returns `None` if the underlying allocator refuses (or `len` is 0).
    /// The returned region's [`len`](RawRegion::len) is exactly `len`.
    fn acquire(&mut self, len: usize) -> Option<RawRegion>;

    /// Give a region back.
    ///
    /// # Safety
    ///
    /// `region` must have been returned by [`acquire`](Self::acquire) on
    /// this same source, and no pointer into it may be used afterwards.
    unsafe fn release(&mut self, region: RawRegion) -> Result<(), ArenaError>;

    /// Short name shown in diagnostic dumps.
    fn name(&self) -> &'static str;
}

/// The page source used by [`Arena::new`](crate::Arena::new).
#[cfg(all(any(unix, windows), not(feature = "heap-pages")))]
pub type DefaultSource = VirtualPages;

/// The page source used by [`Arena::new`](crate::Arena::new).
#[cfg(any(not(any(unix, windows)), feature = "heap-pages"))]
pub type DefaultSource = HeapPages;

// ── Heap-backed ──────────────────────────────────────────────────

/// Page source backed by the global allocator.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeapPages;

impl HeapPages {
    /// Alignment of every block handed out, matching a typical `malloc`.
    pub const ALIGN: usize = 16;
}

impl PageSource for HeapPages {
    fn acquire(&mut self, len: usize) -> Option<RawRegion> {
        if len == 0 {
            return None;
        }
        let layout = Layout::from_size_align(len, Self::ALIGN).ok()?;
        // SAFETY: layout has non-zero size.
        let ptr = NonNull::new(unsafe { alloc::alloc(layout) })?;
        // SAFETY: the allocator just returned `len` fresh bytes.
        Some(unsafe { RawRegion::from_raw_parts(ptr, len) })
    }

    unsafe fn release(&mut self, region: RawRegion) -> Result<(), ArenaError> {
        let len = region.len();
        let layout = Layout::from_size_align(len, Self::ALIGN)
            .map_err(|_| ArenaError::ReleaseFailed { len, os_code: None })?;
        // SAFETY: the caller guarantees the region came from `acquire`,
        // which used this exact layout.
        unsafe { alloc::dealloc(region.as_ptr().as_ptr(), layout) };
        Ok(())
    }

    fn name(&self) -> &'static str {
        "heap"
    }
}

// ── Virtual-memory-backed ────────────────────────────────────────

/// Page source that maps anonymous memory directly from the kernel.
#[cfg(any(unix, windows))]
#[derive(Clone, Copy, Debug, Default)]
pub struct VirtualPages;

#[cfg(unix)]
impl PageSource for VirtualPages {
    fn acquire(&mut self, len: usize) -> Option<RawRegion> {
        if len == 0 {
            return None;
        }
        // SAFETY: anonymous private mapping with no address hint; the
        // kernel validates every argument.
        let ptr = unsafe {
            libc::mmap(
                std::ptr::null_mut(),
                len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
                -1,
                0,
            )
        };
        if ptr == libc::MAP_FAILED {
            return None;
        }
        let ptr = NonNull::new(ptr.cast::<u8>())?;
        // SAFETY: the mapping is `len` bytes, readable and writable, and
        // owned by nobody else.
        Some(unsafe { RawRegion::from_raw_parts(ptr, len) })
    }

    unsafe fn release(&mut self, region: RawRegion) -> Result<(), ArenaError> {
        let len = region.len();
        // SAFETY: the caller guarantees this is a mapping we created with
        // exactly `len` bytes.
        let r = unsafe { libc::munmap(region.as_ptr().as_ptr().cast(), len) };
        if r != 0 {
            return Err(ArenaError::ReleaseFailed {
                len,
                os_code: std::io::Error::last_os_error().raw_os_error(),
            });
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "mmap"
    }
}

#[cfg(windows)]
impl PageSource for VirtualPages {
    fn acquire(&mut self, len: usize) -> Option<RawRegion> {
        use windows_sys::Win32::System::Memory::{
            VirtualAlloc, MEM_COMMIT, MEM_RESERVE, PAGE_READWRITE,
        };

        if len == 0 {
            return None;
        }
        // SAFETY: no address hint; the OS validates every argument.
        let ptr = unsafe {
            VirtualAlloc(
                std::ptr::null(),
                len,
                MEM_COMMIT | MEM_RESERVE,
                PAGE_READWRITE,
            )
        };
        let ptr = NonNull::new(ptr.cast::<u8>())?;
        // SAFETY: committed read/write block of `len` bytes, owned by
        // nobody else.
        Some(unsafe { RawRegion::from_raw_parts(ptr, len) })
    }

    unsafe fn release(&mut self, region: RawRegion) -> Result<(), ArenaError> {
        use windows_sys::Win32::System::Memory::{VirtualFree, MEM_RELEASE};

        let len = region.len();
        // SAFETY: the caller guarantees this block came from VirtualAlloc.
        // MEM_RELEASE requires a size of 0 and frees the whole reservation.
        let ok = unsafe { VirtualFree(region.as_ptr().as_ptr().cast(), 0, MEM_RELEASE) };
        if ok == 0 {
            return Err(ArenaError::ReleaseFailed {
                len,
                os_code: std::io::Error::last_os_error().raw_os_error(),
            });
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "virtual"
    }
}
