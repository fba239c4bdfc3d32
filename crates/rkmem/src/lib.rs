//! rkmem: a region-based bump arena backed by OS pages.
//!
//! This is the facade crate that re-exports the public API of the rkmem
//! sub-crates. For most users, adding `rkmem` as a single dependency is
//! sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use rkmem::prelude::*;
//!
//! let mut arena = Arena::with_page_size(80).unwrap();
//! let first = arena.alloc(20).unwrap();
//! let second = arena.alloc(20).unwrap();
//! assert_eq!(second.as_ptr() as usize, first.as_ptr() as usize + 20);
//!
//! // Bigger than what is left on the page: a new page is chained on.
//! arena.alloc(60).unwrap();
//! assert_eq!(arena.page_count(), 2);
//!
//! // Reset rewinds every page; the next request reuses the first address.
//! arena.reset();
//! assert_eq!(arena.alloc(4).unwrap(), first);
//!
//! arena.free().unwrap();
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`arena`] | `rkmem-arena` | `Arena`, page sources, errors, diagnostics |
//! | `ffi` | `rkmem-ffi` | C entry points and status codes (feature `ffi`) |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// The arena, its page sources, and its error type (`rkmem-arena`).
pub use rkmem_arena as arena;

/// C entry points and status codes (`rkmem-ffi`).
#[cfg(feature = "ffi")]
pub use rkmem_ffi as ffi;

/// Common imports for typical rkmem usage.
///
/// ```rust
/// use rkmem::prelude::*;
/// ```
pub mod prelude {
    pub use rkmem_arena::{
        Arena, ArenaConfig, ArenaError, DefaultSource, HeapPages, PageInfo, PageSource,
    };
}
