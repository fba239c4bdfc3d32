//! The page-chained bump arena.
//!
//! An [`Arena`] owns an ordered list of equally sized pages. Requests
//! are served by bumping the offset of the current page; when it cannot
//! fit a request the arena moves on to the next retained page, or acquires
//! a new one from its [`PageSource`]. A request is never split across
//! pages, so the unused tail of a page is stranded until the next
//! [`reset`](Arena::reset).
//!
//! Memory is reclaimed only in bulk: [`reset`](Arena::reset) rewinds every
//! page, [`free`](Arena::free) (or dropping the arena) returns every page
//! to its source exactly once.

#![allow(unsafe_code)]

use std::ptr::NonNull;

use smallvec::{smallvec, SmallVec};

use crate::config::ArenaConfig;
use crate::error::ArenaError;
use crate::page::Page;
use crate::raw;
use crate::source::{DefaultSource, PageSource};

/// Page-chained bump allocator.
///
/// Pages are stored oldest first. `current` indexes the page being filled;
/// every page after it is empty. Pointers returned by the allocation
/// methods stay valid until the next [`reset`](Self::reset) or until the
/// arena is freed; the arena never moves or frees an individual region.
///
/// An arena is `Send` when its source is, and never `Sync`: concurrent use
/// needs one arena per thread or an external lock.
pub struct Arena<S: PageSource = DefaultSource> {
    source: S,
    page_size: usize,
    pages: SmallVec<[Page; 4]>,
    current: usize,
}

impl Arena<DefaultSource> {
    /// Create an arena with the default 8 KiB page size.
    pub fn new() -> Result<Self, ArenaError> {
        Self::with_config(ArenaConfig::default())
    }

    /// Create an arena whose pages hold `page_size` bytes each.
    pub fn with_page_size(page_size: usize) -> Result<Self, ArenaError> {
        Self::with_config(ArenaConfig::new(page_size))
    }

    /// Create an arena from a config, using the default page source.
    pub fn with_config(config: ArenaConfig) -> Result<Self, ArenaError> {
        Self::with_source(config, DefaultSource::default())
    }
}

impl<S: PageSource> Arena<S> {
    /// Create an arena drawing pages from `source`.
    ///
    /// The first page is acquired immediately.
    pub fn with_source(config: ArenaConfig, mut source: S) -> Result<Self, ArenaError> {
        config.validate()?;
        let region = source
            .acquire(config.page_size)
            .ok_or(ArenaError::AllocationFailed {
                requested: config.page_size,
            })?;
        Ok(Self {
            source,
            page_size: config.page_size,
            pages: smallvec![Page::new(region)],
            current: 0,
        })
    }

    /// Allocate `len` bytes.
    ///
    /// The bytes are uninitialised from the caller's point of view: they
    /// may hold whatever an allocation before the last reset wrote.
    ///
    /// # Errors
    ///
    /// - [`ArenaError::ZeroSizedRequest`] if `len == 0`.
    /// - [`ArenaError::RequestTooLarge`] if `len > page_size`.
    /// - [`ArenaError::AllocationFailed`] if a new page was needed and the
    ///   source refused it. The arena is unchanged in that case.
    pub fn alloc(&mut self, len: usize) -> Result<NonNull<u8>, ArenaError> {
        self.check_request(len)?;

        if let Some(page) = self.pages.get_mut(self.current) {
            if let Some(offset) = page.try_bump(len) {
                return Ok(page.ptr_at(offset));
            }
        }

        // Pages after `current` are empty, so the next one always fits.
        if let Some(page) = self.pages.get_mut(self.current + 1) {
            if let Some(offset) = page.try_bump(len) {
                self.current += 1;
                return Ok(page.ptr_at(offset));
            }
        }

        self.grow(len)
    }

    /// Allocate `len` bytes and set them all to zero.
    ///
    /// Fails exactly when [`alloc`](Self::alloc) would.
    pub fn alloc_zeroed(&mut self, len: usize) -> Result<NonNull<u8>, ArenaError> {
        let ptr = self.alloc(len)?;
        // SAFETY: alloc just handed out `len` writable bytes at `ptr`.
        unsafe { raw::zero(ptr, len) };
        Ok(ptr)
    }

    /// Grow a region by copying it into a fresh allocation.
    ///
    /// Allocates `new_size` bytes and copies the first `old_size` bytes of
    /// `ptr` into them. The old region is abandoned in place: it is neither
    /// reused nor modified, and is reclaimed with everything else on the
    /// next reset or free.
    ///
    /// # Errors
    ///
    /// - [`ArenaError::ShrinkingRealloc`] if `old_size > new_size`.
    /// - [`ArenaError::ForeignRegion`] if `[ptr, ptr + old_size)` is not
    ///   memory this arena has handed out since its last reset.
    /// - Any error of [`alloc`](Self::alloc) for `new_size`.
    pub fn realloc(
        &mut self,
        ptr: NonNull<u8>,
        old_size: usize,
        new_size: usize,
    ) -> Result<NonNull<u8>, ArenaError> {
        if old_size > new_size {
            return Err(ArenaError::ShrinkingRealloc { old_size, new_size });
        }
        self.check_request(new_size)?;
        if !self.contains(ptr, old_size) {
            return Err(ArenaError::ForeignRegion { len: old_size });
        }

        let new_ptr = self.alloc(new_size)?;
        // SAFETY: the source range is live arena memory (checked above) and
        // the destination was just bumped past every live byte, so the
        // ranges are valid and disjoint.
        unsafe { raw::copy(ptr, new_ptr, old_size) };
        Ok(new_ptr)
    }

    /// Rewind every page to empty.
    ///
    /// Pages and their memory are kept; contents are not touched. Every
    /// pointer handed out before the reset is logically dead, and the next
    /// allocation starts at the beginning of the oldest page.
    pub fn reset(&mut self) {
        for page in self.pages.iter_mut().rev() {
            page.reset();
        }
        self.current = 0;
    }

    /// Release every page back to the source and consume the arena.
    ///
    /// Every page is released exactly once even if some releases fail; the
    /// first failure is reported. Dropping the arena does the same thing
    /// but can only log failures.
    pub fn free(mut self) -> Result<(), ArenaError> {
        self.release_pages()
    }

    /// Whether `[ptr, ptr + len)` lies in bytes handed out since the last reset.
    pub fn contains(&self, ptr: NonNull<u8>, len: usize) -> bool {
        let addr = ptr.as_ptr() as usize;
        self.pages.iter().any(|page| page.contains(addr, len))
    }

    /// Fixed capacity of every page in bytes.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Number of pages currently owned.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Total bytes handed out across all pages since the last reset.
    pub fn used_bytes(&self) -> usize {
        self.pages.iter().map(Page::used).sum()
    }

    /// Total capacity across all pages in bytes.
    pub fn capacity_bytes(&self) -> usize {
        self.pages.iter().map(Page::size).sum()
    }

    /// The page source pages are drawn from.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Pages in creation order, oldest first.
    pub(crate) fn pages_oldest_first(&self) -> &[Page] {
        &self.pages
    }

    /// Index of the page currently being filled.
    pub(crate) fn current_index(&self) -> usize {
        self.current
    }

    fn check_request(&self, len: usize) -> Result<(), ArenaError> {
        if len == 0 {
            return Err(ArenaError::ZeroSizedRequest);
        }
        if len > self.page_size {
            return Err(ArenaError::RequestTooLarge {
                requested: len,
                page_size: self.page_size,
            });
        }
        Ok(())
    }

    /// Acquire a new page, serve `len` bytes from it and make it current.
    fn grow(&mut self, len: usize) -> Result<NonNull<u8>, ArenaError> {
        let region = self
            .source
            .acquire(self.page_size)
            .ok_or(ArenaError::AllocationFailed {
                requested: self.page_size,
            })?;
        let mut page = Page::new(region);
        let Some(offset) = page.try_bump(len) else {
            // The source handed back a region shorter than asked for.
            // SAFETY: the region came from this source just now.
            if let Err(e) = unsafe { self.source.release(page.into_region()) } {
                eprintln!("rkmem: short page release: {e}");
            }
            return Err(ArenaError::AllocationFailed {
                requested: self.page_size,
            });
        };
        let ptr = page.ptr_at(offset);
        self.pages.push(page);
        self.current = self.pages.len() - 1;
        Ok(ptr)
    }

    fn release_pages(&mut self) -> Result<(), ArenaError> {
        let mut first_err = None;
        for page in self.pages.drain(..) {
            // SAFETY: every page was acquired from `self.source` and is
            // drained, so it is released exactly once.
            if let Err(e) = unsafe { self.source.release(page.into_region()) } {
                first_err.get_or_insert(e);
            }
        }
        self.current = 0;
        first_err.map_or(Ok(()), Err)
    }
}

impl<S: PageSource> Drop for Arena<S> {
    fn drop(&mut self) {
        if let Err(e) = self.release_pages() {
            eprintln!("rkmem: arena drop: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::HeapPages;

    fn heap_arena(page_size: usize) -> Arena<HeapPages> {
        Arena::with_source(ArenaConfig::new(page_size), HeapPages).unwrap()
    }

    fn addr(ptr: NonNull<u8>) -> usize {
        ptr.as_ptr() as usize
    }

    #[test]
    fn new_arena_has_one_empty_page() {
        let arena = Arena::new().unwrap();
        assert_eq!(arena.page_size(), ArenaConfig::DEFAULT_PAGE_SIZE);
        assert_eq!(arena.page_count(), 1);
        assert_eq!(arena.used_bytes(), 0);
    }

    #[test]
    fn zero_page_size_is_rejected() {
        assert!(matches!(
            Arena::with_page_size(0),
            Err(ArenaError::InvalidPageSize)
        ));
    }

    #[test]
    fn sequential_allocs_are_adjacent() {
        let mut arena = heap_arena(100);
        let a = arena.alloc(10).unwrap();
        let b = arena.alloc(30).unwrap();
        assert_eq!(addr(b), addr(a) + 10);
        assert_eq!(arena.used_bytes(), 40);
        assert_eq!(arena.page_count(), 1);
    }

    #[test]
    fn overflow_creates_page_and_serves_whole_request() {
        let mut arena = heap_arena(80);
        let first = arena.alloc(20).unwrap();
        let second = arena.alloc(70).unwrap();
        assert_eq!(arena.page_count(), 2);
        // The 60-byte tail of the first page is stranded.
        let first_page = &arena.pages_oldest_first()[0];
        assert_eq!(first_page.used(), 20);
        assert!(!first_page.contains(addr(second), 1));
        assert!(arena.pages_oldest_first()[1].contains(addr(second), 70));
        assert!(arena.contains(first, 20));
    }

    #[test]
    fn capacity_grows_by_whole_pages_and_survives_reset() {
        let mut arena = heap_arena(48);
        assert_eq!(arena.capacity_bytes(), 48);
        arena.alloc(40).unwrap();
        arena.alloc(40).unwrap();
        arena.alloc(1).unwrap();
        assert_eq!(arena.capacity_bytes(), 96);
        assert_eq!(arena.used_bytes(), 81);

        arena.reset();
        assert_eq!(arena.capacity_bytes(), 96);
        assert_eq!(arena.used_bytes(), 0);
    }

    #[test]
    fn exact_page_size_request_succeeds() {
        let mut arena = heap_arena(64);
        arena.alloc(64).unwrap();
        arena.alloc(64).unwrap();
        assert_eq!(arena.page_count(), 2);
    }

    #[test]
    fn oversized_request_is_an_error_not_a_panic() {
        let mut arena = heap_arena(64);
        assert_eq!(
            arena.alloc(65),
            Err(ArenaError::RequestTooLarge {
                requested: 65,
                page_size: 64
            })
        );
        assert_eq!(arena.page_count(), 1);
        assert_eq!(arena.used_bytes(), 0);
    }

    #[test]
    fn zero_sized_request_is_rejected() {
        let mut arena = heap_arena(64);
        assert_eq!(arena.alloc(0), Err(ArenaError::ZeroSizedRequest));
        assert_eq!(arena.alloc_zeroed(0), Err(ArenaError::ZeroSizedRequest));
    }

    #[test]
    fn reset_rewinds_to_first_allocation_address() {
        let mut arena = heap_arena(32);
        let first = arena.alloc(8).unwrap();
        arena.alloc(30).unwrap();
        arena.alloc(30).unwrap();
        assert_eq!(arena.page_count(), 3);

        arena.reset();
        assert_eq!(arena.page_count(), 3);
        assert_eq!(arena.used_bytes(), 0);
        assert_eq!(arena.alloc(8).unwrap(), first);
    }

    #[test]
    fn reset_reuses_retained_pages_before_growing() {
        let mut arena = heap_arena(32);
        arena.alloc(32).unwrap();
        arena.alloc(32).unwrap();
        arena.reset();

        arena.alloc(32).unwrap();
        arena.alloc(32).unwrap();
        assert_eq!(arena.page_count(), 2);
        assert_eq!(arena.current_index(), 1);

        arena.alloc(1).unwrap();
        assert_eq!(arena.page_count(), 3);
    }

    #[test]
    fn alloc_zeroed_clears_stale_bytes() {
        let mut arena = heap_arena(64);
        let p = arena.alloc(64).unwrap();
        // SAFETY: p points to 64 bytes we own.
        unsafe { std::ptr::write_bytes(p.as_ptr(), 0xFF, 64) };
        arena.reset();

        let z = arena.alloc_zeroed(64).unwrap();
        assert_eq!(z, p);
        // SAFETY: z points to 64 freshly zeroed bytes.
        let bytes = unsafe { std::slice::from_raw_parts(z.as_ptr(), 64) };
        assert!(bytes.iter().all(|&b| b == 0));
    }

    #[test]
    fn realloc_copies_prefix_and_leaves_old_region() {
        let mut arena = heap_arena(64);
        let old = arena.alloc(4).unwrap();
        // SAFETY: old points to 4 bytes we own.
        unsafe { std::ptr::copy_nonoverlapping([1u8, 2, 3, 4].as_ptr(), old.as_ptr(), 4) };

        let new = arena.realloc(old, 4, 16).unwrap();
        assert_ne!(new, old);
        // SAFETY: both regions are live arena memory.
        unsafe {
            assert_eq!(std::slice::from_raw_parts(new.as_ptr(), 4), &[1, 2, 3, 4]);
            assert_eq!(std::slice::from_raw_parts(old.as_ptr(), 4), &[1, 2, 3, 4]);
        }
        assert_eq!(arena.used_bytes(), 20);
    }

    #[test]
    fn realloc_into_new_page_keeps_contents() {
        let mut arena = heap_arena(16);
        let old = arena.alloc(10).unwrap();
        // SAFETY: old points to 10 bytes we own.
        unsafe { std::ptr::write_bytes(old.as_ptr(), 7, 10) };
        let new = arena.realloc(old, 10, 16).unwrap();
        assert_eq!(arena.page_count(), 2);
        // SAFETY: new points to 16 live bytes.
        let bytes = unsafe { std::slice::from_raw_parts(new.as_ptr(), 10) };
        assert!(bytes.iter().all(|&b| b == 7));
    }

    #[test]
    fn realloc_rejects_shrinking() {
        let mut arena = heap_arena(64);
        let p = arena.alloc(8).unwrap();
        assert_eq!(
            arena.realloc(p, 8, 4),
            Err(ArenaError::ShrinkingRealloc {
                old_size: 8,
                new_size: 4
            })
        );
    }

    #[test]
    fn realloc_rejects_foreign_and_stale_regions() {
        let mut arena = heap_arena(64);
        let mut local = [0u8; 8];
        let foreign = NonNull::new(local.as_mut_ptr()).unwrap();
        assert_eq!(
            arena.realloc(foreign, 8, 16),
            Err(ArenaError::ForeignRegion { len: 8 })
        );

        let p = arena.alloc(8).unwrap();
        arena.reset();
        assert_eq!(
            arena.realloc(p, 8, 16),
            Err(ArenaError::ForeignRegion { len: 8 })
        );
        assert_eq!(arena.used_bytes(), 0);
    }

    #[test]
    fn realloc_past_page_size_is_rejected() {
        let mut arena = heap_arena(16);
        let p = arena.alloc(8).unwrap();
        assert!(matches!(
            arena.realloc(p, 8, 17),
            Err(ArenaError::RequestTooLarge { .. })
        ));
    }

    #[test]
    fn free_releases_cleanly() {
        let mut arena = heap_arena(16);
        arena.alloc(16).unwrap();
        arena.alloc(16).unwrap();
        assert_eq!(arena.free(), Ok(()));
    }

    #[test]
    fn default_source_serves_real_memory() {
        let mut arena = Arena::with_page_size(4096).unwrap();
        let p = arena.alloc_zeroed(4096).unwrap();
        // SAFETY: p points to 4096 live bytes.
        let bytes = unsafe { std::slice::from_raw_parts_mut(p.as_ptr(), 4096) };
        bytes[4095] = 1;
        assert_eq!(bytes.iter().map(|&b| b as usize).sum::<usize>(), 1);
        arena.free().unwrap();
    }

    #[test]
    fn arena_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<Arena<HeapPages>>();
        assert_send::<Arena>();
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn allocations_never_overlap(
                page_size in 1usize..256,
                sizes in proptest::collection::vec(1usize..256, 1..64),
            ) {
                let mut arena = heap_arena(page_size);
                let mut spans: Vec<(usize, usize)> = Vec::new();
                for len in sizes.into_iter().filter(|&n| n <= page_size) {
                    let p = addr(arena.alloc(len).unwrap());
                    for &(start, end) in &spans {
                        prop_assert!(p + len <= start || p >= end);
                    }
                    spans.push((p, p + len));
                }
            }

            #[test]
            fn requests_are_never_split(
                page_size in 8usize..128,
                sizes in proptest::collection::vec(1usize..128, 1..64),
            ) {
                let mut arena = heap_arena(page_size);
                for len in sizes.into_iter().filter(|&n| n <= page_size) {
                    let p = arena.alloc(len).unwrap();
                    let holders = arena
                        .pages_oldest_first()
                        .iter()
                        .filter(|page| page.contains(addr(p), len))
                        .count();
                    prop_assert_eq!(holders, 1);
                }
                for page in arena.pages_oldest_first() {
                    prop_assert!(page.used() <= page.size());
                }
            }

            #[test]
            fn reset_restores_first_address(
                sizes in proptest::collection::vec(1usize..64, 1..32),
            ) {
                let mut arena = heap_arena(64);
                let first = arena.alloc(sizes[0]).unwrap();
                for &len in &sizes[1..] {
                    arena.alloc(len).unwrap();
                }
                let pages = arena.page_count();
                arena.reset();
                prop_assert_eq!(arena.page_count(), pages);
                prop_assert_eq!(arena.alloc(1).unwrap(), first);
            }

            #[test]
            fn realloc_preserves_prefix(
                data in proptest::collection::vec(any::<u8>(), 1..32),
                extra in 0usize..32,
            ) {
                let mut arena = heap_arena(64);
                let old = arena.alloc(data.len()).unwrap();
                // SAFETY: old points to data.len() bytes we own.
                unsafe { std::ptr::copy_nonoverlapping(data.as_ptr(), old.as_ptr(), data.len()) };
                let new = arena.realloc(old, data.len(), data.len() + extra).unwrap();
                // SAFETY: both ranges are live arena memory.
                unsafe {
                    prop_assert_eq!(std::slice::from_raw_parts(new.as_ptr(), data.len()), &data[..]);
                    prop_assert_eq!(std::slice::from_raw_parts(old.as_ptr(), data.len()), &data[..]);
                }
            }
        }
    }
}
