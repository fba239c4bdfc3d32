//! Arena configuration parameters.

use crate::error::ArenaError;

/// Configuration for an [`Arena`](crate::Arena).
///
/// The page size is the only knob. It is validated at construction and
/// immutable afterwards: every page the arena ever creates has exactly
/// this capacity, and no single allocation may exceed it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Capacity of every page in bytes.
    ///
    /// Default: 8192. Must be non-zero.
    pub page_size: usize,
}

impl ArenaConfig {
    /// Default page size: 8 KiB.
    pub const DEFAULT_PAGE_SIZE: usize = 8 * 1024;

    /// Create a config with the given page size.
    pub fn new(page_size: usize) -> Self {
        Self { page_size }
    }

    /// Check that the config describes a usable arena.
    pub fn validate(&self) -> Result<(), ArenaError> {
        if self.page_size == 0 {
            return Err(ArenaError::InvalidPageSize);
        }
        Ok(())
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PAGE_SIZE)
    }
}
