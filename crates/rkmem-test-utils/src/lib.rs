//! Test utilities and mock page sources for rkmem development.
//!
//! Provides [`MockPageSource`], a [`PageSource`] that serves real heap
//! memory while recording every acquire and release in a shared
//! [`SourceLedger`]. Tests keep a [`LedgerHandle`] and inspect it after
//! the arena is freed or dropped.

#![deny(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::sync::{Arc, Mutex, MutexGuard};

use indexmap::IndexMap;
use rkmem_arena::{ArenaError, HeapPages, PageSource, RawRegion};

/// Everything a [`MockPageSource`] has seen.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SourceLedger {
    /// Live regions: base address to length, in acquisition order.
    pub live: IndexMap<usize, usize>,
    /// Successful acquisitions.
    pub acquired: usize,
    /// Successful releases.
    pub released: usize,
    /// Acquisitions refused because the failure budget ran out.
    pub refused: usize,
    /// Releases of regions this source never handed out (or already took back).
    pub unknown_releases: usize,
    /// Releases whose length differed from the acquired length.
    pub length_mismatches: usize,
    /// Releases that freed the region but were reported as failed.
    pub failed_releases: usize,
}

/// Shared read access to a [`MockPageSource`]'s ledger.
#[derive(Clone, Debug)]
pub struct LedgerHandle(Arc<Mutex<SourceLedger>>);

impl LedgerHandle {
    fn lock(&self) -> MutexGuard<'_, SourceLedger> {
        self.0.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Copy of the current ledger.
    pub fn snapshot(&self) -> SourceLedger {
        self.lock().clone()
    }

    pub fn acquired(&self) -> usize {
        self.lock().acquired
    }

    pub fn released(&self) -> usize {
        self.lock().released
    }

    pub fn refused(&self) -> usize {
        self.lock().refused
    }

    pub fn failed_releases(&self) -> usize {
        self.lock().failed_releases
    }

    /// Number of regions acquired and not yet released.
    pub fn live_count(&self) -> usize {
        self.lock().live.len()
    }

    /// Total bytes acquired and not yet released.
    pub fn live_bytes(&self) -> usize {
        self.lock().live.values().sum()
    }

    /// Every acquisition was released exactly once, with its original size.
    pub fn is_balanced(&self) -> bool {
        let l = self.lock();
        l.acquired == l.released
            && l.live.is_empty()
            && l.unknown_releases == 0
            && l.length_mismatches == 0
    }
}

/// Heap-backed page source that records its traffic.
///
/// Optionally refuses acquisitions once a budget is spent, reports
/// releases as failed once a second budget is spent, or hands out regions
/// shorter than requested. These drive the arena's failure paths.
#[derive(Debug)]
pub struct MockPageSource {
    inner: HeapPages,
    ledger: Arc<Mutex<SourceLedger>>,
    budget: Option<usize>,
    release_budget: Option<usize>,
    shortfall: usize,
}

impl MockPageSource {
    /// A source that never refuses.
    pub fn new() -> Self {
        Self {
            inner: HeapPages,
            ledger: Arc::new(Mutex::new(SourceLedger::default())),
            budget: None,
            release_budget: None,
            shortfall: 0,
        }
    }

    /// A source that grants `n` acquisitions and refuses every later one.
    pub fn failing_after(n: usize) -> Self {
        Self {
            budget: Some(n),
            ..Self::new()
        }
    }

    /// A source whose first `n` releases succeed and every later one
    /// reports `ReleaseFailed`.
    ///
    /// A failed release still frees the memory and is counted in the
    /// ledger, so the ledger stays balanced when every page is given back.
    pub fn failing_release_after(n: usize) -> Self {
        Self {
            release_budget: Some(n),
            ..Self::new()
        }
    }

    /// A source that hands out `by` bytes fewer than each request.
    ///
    /// Requests of `by` bytes or fewer are refused.
    pub fn short_by(by: usize) -> Self {
        Self {
            shortfall: by,
            ..Self::new()
        }
    }

    /// Handle for inspecting the ledger after the source moves into an arena.
    pub fn ledger(&self) -> LedgerHandle {
        LedgerHandle(Arc::clone(&self.ledger))
    }

    /// Change the number of acquisitions still granted (`None` = unlimited).
    pub fn set_budget(&mut self, budget: Option<usize>) {
        self.budget = budget;
    }

    fn lock(&self) -> MutexGuard<'_, SourceLedger> {
        self.ledger.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for MockPageSource {
    fn default() -> Self {
        Self::new()
    }
}

impl PageSource for MockPageSource {
    fn acquire(&mut self, len: usize) -> Option<RawRegion> {
        if let Some(remaining) = self.budget.as_mut() {
            if *remaining == 0 {
                self.lock().refused += 1;
                return None;
            }
            *remaining -= 1;
        }
        let region = self.inner.acquire(len.saturating_sub(self.shortfall))?;
        let mut ledger = self.lock();
        ledger.acquired += 1;
        ledger.live.insert(region.addr(), region.len());
        Some(region)
    }

    #[allow(unsafe_code)]
    unsafe fn release(&mut self, region: RawRegion) -> Result<(), ArenaError> {
        let len = region.len();
        {
            let mut ledger = self.lock();
            match ledger.live.shift_remove(&region.addr()) {
                None => {
                    ledger.unknown_releases += 1;
                    // Not ours: leak it rather than hand it to the heap.
                    std::mem::forget(region);
                    return Err(ArenaError::ReleaseFailed { len, os_code: None });
                }
                Some(acquired_len) if acquired_len != len => ledger.length_mismatches += 1,
                Some(_) => {}
            }
            ledger.released += 1;
        }
        // SAFETY: the ledger confirmed the region came from `self.inner`.
        unsafe { self.inner.release(region) }?;

        if let Some(remaining) = self.release_budget.as_mut() {
            if *remaining == 0 {
                self.lock().failed_releases += 1;
                return Err(ArenaError::ReleaseFailed { len, os_code: None });
            }
            *remaining -= 1;
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
