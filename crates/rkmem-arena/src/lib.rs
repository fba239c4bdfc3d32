//! Page-chained bump arena backed directly by OS virtual memory.
//!
//! An [`Arena`] hands out byte ranges from large pages by advancing an
//! offset, and reclaims everything in bulk instead of tracking individual
//! frees. This crate is one of two that may contain `unsafe` code (along
//! with `rkmem-ffi`).
//!
//! # Architecture
//!
//! ```text
//! Arena<S: PageSource>
//! ├── ArenaConfig (fixed page size, default 8 KiB)
//! ├── Page[] (oldest first; one "current" page, later pages empty)
//! │   └── RawRegion (one block from the source, released exactly once)
//! └── S: PageSource
//!     ├── VirtualPages (mmap / VirtualAlloc)
//!     └── HeapPages (global allocator)
//! ```
//!
//! # Example
//!
//! ```
//! use rkmem_arena::Arena;
//!
//! let mut arena = Arena::with_page_size(80)?;
//! let a = arena.alloc(20)?;
//! let b = arena.alloc(70)?; // does not fit the first page: new page
//! assert_eq!(arena.page_count(), 2);
//! assert!(arena.contains(a, 20) && arena.contains(b, 70));
//!
//! arena.reset();
//! assert_eq!(arena.alloc(20)?, a);
//! arena.free()?;
//! # Ok::<(), rkmem_arena::ArenaError>(())
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod arena;
pub mod config;
pub mod dump;
pub mod error;
mod page;
mod raw;
pub mod source;

// Public re-exports for the primary API surface.
pub use arena::Arena;
pub use config::ArenaConfig;
pub use dump::PageInfo;
pub use error::ArenaError;
pub use raw::RawRegion;
pub use source::{DefaultSource, HeapPages, PageSource};

#[cfg(any(unix, windows))]
pub use source::VirtualPages;
