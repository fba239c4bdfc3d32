//! C-compatible status codes.
//!
//! [`RkStatus`] is a `repr(i32)` enum covering every way an arena call
//! can fail. `ArenaError` converts into it.

use rkmem_arena::ArenaError;

/// C-compatible status code returned by all FFI functions.
///
/// `Ok` = 0, all errors are negative. Values are ABI-stable.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RkStatus {
    /// Success.
    Ok = 0,
    /// Handle is null, unknown, or was already freed.
    InvalidHandle = -1,
    /// An argument is null, zero, or otherwise violates the call contract.
    InvalidArgument = -2,
    /// The OS refused to map a new page.
    AllocationFailed = -3,
    /// The request is larger than the arena's page size.
    RequestTooLarge = -4,
    /// The OS refused to unmap a page.
    ReleaseFailed = -5,
    /// Internal error (e.g. poisoned mutex after a prior panic).
    InternalError = -6,
    /// A Rust panic was caught at the FFI boundary.
    Panicked = -128,
}

impl From<&ArenaError> for RkStatus {
    fn from(e: &ArenaError) -> Self {
        match e {
            ArenaError::AllocationFailed { .. } => RkStatus::AllocationFailed,
            ArenaError::ReleaseFailed { .. } => RkStatus::ReleaseFailed,
            ArenaError::RequestTooLarge { .. } => RkStatus::RequestTooLarge,
            ArenaError::InvalidPageSize
            | ArenaError::ZeroSizedRequest
            | ArenaError::ShrinkingRealloc { .. }
            | ArenaError::ForeignRegion { .. } => RkStatus::InvalidArgument,
        }
    }
}
