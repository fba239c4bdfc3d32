//! Workload profiles for benchmarking rkmem arenas.
//!
//! - [`size_stream`]: deterministic request sizes from a seed
//! - [`churn`]: serve a size stream from an arena, resetting between rounds
//! - [`walkthrough`]: the create, alloc, reset, free tour used by the demo

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::mem::size_of;

use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rkmem_arena::{Arena, ArenaError, PageSource};

/// Page size used by the reference workloads: the default 8 KiB.
pub const REFERENCE_PAGE_SIZE: usize = 8 * 1024;

/// Generate `count` request sizes in `1..=max_size`, reproducible per seed.
pub fn size_stream(seed: u64, count: usize, max_size: usize) -> Vec<usize> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let max = max_size.max(1) as u64;
    (0..count)
        .map(|_| (rng.next_u64() % max) as usize + 1)
        .collect()
}

/// Serve every size in `sizes` from `arena`, `rounds` times, resetting
/// between rounds.
///
/// Returns the total number of bytes handed out.
pub fn churn<S: PageSource>(
    arena: &mut Arena<S>,
    sizes: &[usize],
    rounds: usize,
) -> Result<usize, ArenaError> {
    let mut total = 0;
    for _ in 0..rounds {
        for &len in sizes {
            arena.alloc(len)?;
            total += len;
        }
        arena.reset();
    }
    Ok(total)
}

/// Create a twenty-`i32` arena, allocate five `i32`s, reset and free it.
///
/// Progress lines and arena dumps are appended to `transcript` in the order
/// they happen. On error the transcript holds everything up to the failing
/// step.
pub fn walkthrough(transcript: &mut String) -> Result<(), ArenaError> {
    transcript.push_str("Creating arena...\n");
    let mut arena = Arena::with_page_size(size_of::<i32>() * 20)?;
    transcript.push_str(&format!("{arena}\n"));

    let len = size_of::<i32>() * 5;
    transcript.push_str(&format!("Allocating {len} bytes...\n"));
    arena.alloc(len)?;
    transcript.push_str(&format!("{arena}\n"));

    arena.reset();
    transcript.push_str(&format!("{arena}\n"));

    arena.free()
}
