//! Workloads shared by the scoped-arena benchmarks.
//!
//! - [`MIXED_SIZES`]: a request-size pattern cycling through small and
//!   medium blocks
//! - [`bump_cycle`]: fill a dynamic arena with typed blocks, then reset it
//! - [`collect_in`]: push a run of values into any `allocator_api2` vector
//!
//! Every workload returns a value derived from its allocations so the
//! benchmarks can pass it through `black_box`.

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use allocator_api2::alloc::Allocator;
use allocator_api2::vec::Vec;
use scoped_arena::{ArenaAllocator, ArenaError, DynamicArena};

/// Request sizes in bytes, in allocation order.
pub const MIXED_SIZES: [usize; 8] = [8, 24, 64, 16, 128, 40, 256, 32];

/// Total of [`MIXED_SIZES`] after rounding each request up to `alignment`.
pub fn mixed_footprint(alignment: usize) -> usize {
    MIXED_SIZES
        .iter()
        .map(|&s| s.div_ceil(alignment) * alignment)
        .sum()
}

/// Allocate `rounds` passes over [`MIXED_SIZES`] from `arena`, then reset it.
///
/// Returns the bytes in use just before the reset.
pub fn bump_cycle(arena: &mut DynamicArena, rounds: usize) -> Result<usize, ArenaError> {
    for _ in 0..rounds {
        for &size in &MIXED_SIZES {
            arena.allocate(size, 8)?;
        }
    }
    let used = arena.used()?;
    arena.reset()?;
    Ok(used)
}

/// Push `0..count` into a fresh vector drawing from `alloc`, returning the sum.
pub fn collect_in<A: Allocator>(alloc: A, count: u32) -> u64 {
    let mut v: Vec<u32, A> = Vec::new_in(alloc);
    v.extend(0..count);
    v.iter().map(|&x| u64::from(x)).sum()
}

/// A `u32` handle on `arena`.
pub fn u32_handle(arena: &DynamicArena) -> Result<ArenaAllocator<'_, u32>, ArenaError> {
    ArenaAllocator::new(arena)
}
