//! Arena-specific error types.

use std::error::Error;
use std::fmt;

/// Errors that can occur during arena operations.
///
/// Two families share this enum: the page source refusing memory
/// ([`AllocationFailed`](Self::AllocationFailed),
/// [`ReleaseFailed`](Self::ReleaseFailed)) and caller contract violations
/// (everything else). No arena operation panics on bad input; it returns
/// one of these instead.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArenaError {
    /// The page source refused to hand out a new region.
    AllocationFailed {
        /// Number of bytes requested from the source.
        requested: usize,
    },
    /// The operating system refused to unmap a region.
    ReleaseFailed {
        /// Length of the region that could not be released.
        len: usize,
        /// Raw OS error code, if one was available.
        os_code: Option<i32>,
    },
    /// A page size of zero was configured.
    InvalidPageSize,
    /// An allocation of zero bytes was requested.
    ZeroSizedRequest,
    /// The request can never fit in a single page.
    RequestTooLarge {
        /// Number of bytes requested.
        requested: usize,
        /// Fixed capacity of every page in the arena.
        page_size: usize,
    },
    /// `realloc` was asked to shrink a region.
    ShrinkingRealloc {
        /// Size of the existing region.
        old_size: usize,
        /// Requested new size.
        new_size: usize,
    },
    /// The source range of a `realloc` is not live memory of this arena.
    ForeignRegion {
        /// Length of the rejected range.
        len: usize,
    },
}

impl ArenaError {
    /// Whether this error reports a caller mistake rather than an OS refusal.
    pub fn is_contract_violation(&self) -> bool {
        !matches!(
            self,
            Self::AllocationFailed { .. } | Self::ReleaseFailed { .. }
        )
    }
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllocationFailed { requested } => {
                write!(f, "page source refused to map {requested} bytes")
            }
            Self::ReleaseFailed { len, os_code } => match os_code {
                Some(code) => write!(f, "failed to release {len}-byte region (os error {code})"),
                None => write!(f, "failed to release {len}-byte region"),
            },
            Self::InvalidPageSize => write!(f, "page size cannot be zero"),
            Self::ZeroSizedRequest => write!(f, "cannot allocate zero bytes"),
            Self::RequestTooLarge {
                requested,
                page_size,
            } => {
                write!(
                    f,
                    "cannot allocate {requested} bytes from a page size of {page_size} bytes"
                )
            }
            Self::ShrinkingRealloc { old_size, new_size } => {
                write!(
                    f,
                    "old size {old_size} cannot be greater than new size {new_size}"
                )
            }
            Self::ForeignRegion { len } => {
                write!(f, "{len}-byte region is not live memory of this arena")
            }
        }
    }
}

impl Error for ArenaError {}
