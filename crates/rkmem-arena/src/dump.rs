//! Read-only diagnostics for arenas.
//!
//! Nothing here is part of the allocation contract: it renders page
//! sizes, offsets and chain order for humans and tests.

use std::fmt;

use crate::arena::Arena;
use crate::source::PageSource;

/// Snapshot of one page, as seen by [`Arena::pages`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageInfo {
    /// Address of the first byte of the page.
    pub base: usize,
    /// Bytes handed out from the page.
    pub offset: usize,
    /// Page capacity in bytes.
    pub size: usize,
}

impl<S: PageSource> Arena<S> {
    /// Page snapshots, newest page first.
    pub fn pages(&self) -> impl ExactSizeIterator<Item = PageInfo> + '_ {
        self.pages_oldest_first().iter().rev().map(|page| PageInfo {
            base: page.base_addr(),
            offset: page.used(),
            size: page.size(),
        })
    }

    /// Render the arena state as text. Same as `to_string()`.
    pub fn dump(&self) -> String {
        self.to_string()
    }

    /// Write [`dump`](Self::dump) to stderr.
    pub fn debug_dump(&self) {
        eprintln!("{self}");
    }
}

impl<S: PageSource> fmt::Display for Arena<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Arena {{")?;
        writeln!(f, "    page_size={}", self.page_size())?;
        writeln!(f, "    source={}", self.source().name())?;
        write!(f, "    pages=")?;
        let current = self.page_count().saturating_sub(1 + self.current_index());
        for (i, page) in self.pages().enumerate() {
            let marker = if i == current { "*" } else { "" };
            write!(
                f,
                "{marker}Page {{ region={:#x}, offset={}, size={} }} -> ",
                page.base, page.offset, page.size
            )?;
        }
        writeln!(f, "NULL")?;
        write!(f, "}}")
    }
}

impl<S: PageSource> fmt::Debug for Arena<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("page_size", &self.page_size())
            .field("source", &self.source().name())
            .field("pages", &self.pages().collect::<Vec<_>>())
            .finish()
    }
}
