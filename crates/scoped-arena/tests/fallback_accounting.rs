//! Integration test: when arenas overflow and where overflow blocks go.
//!
//! Every arena here overflows into a `CountingFallback`, which panics on a
//! double or mismatched free, so each test also checks that fallback blocks
//! are routed back to the fallback and never rewound over.

use std::mem;

use scoped_arena::buffer::aligned_size;
use scoped_arena::fixed::Align32;
use scoped_arena::{
    AlignedBytes, ArenaAllocator, ArenaConfig, ArenaError, ArenaVec, DynamicArena, FixedArena,
};
use scoped_arena_test_utils::fixtures::Wide;
use scoped_arena_test_utils::CountingFallback;

// ── Bump region ─────────────────────────────────────────────────────

#[test]
fn cumulative_fit_never_reaches_fallback() {
    let arena = FixedArena::<[u64; 128], _>::with_fallback(CountingFallback::new());
    let sizes = [1, 7, 8, 9, 100, 255, 256, 300];
    let total: usize = sizes.iter().map(|&s| aligned_size(s, 8).unwrap()).sum();
    assert!(total <= arena.capacity());

    for size in sizes {
        let p = arena.allocate(size, 8).unwrap();
        assert!(arena.contains(p));
    }
    assert_eq!(arena.used().unwrap(), total);
    assert_eq!(arena.fallback().allocations(), 0);
}

#[test]
fn example_scenario_with_fallback_accounting() {
    let config = ArenaConfig::new(8);
    let mut arena = DynamicArena::with_fallback(config, CountingFallback::new()).unwrap();
    arena.alloc(1024).unwrap();

    let a = arena.allocate(100, 8).unwrap();
    let b = arena.allocate(200, 8).unwrap();
    let c = arena.allocate(300, 8).unwrap();
    assert_eq!(arena.used().unwrap(), 608);

    // SAFETY: each block is returned once with its allocation size.
    unsafe {
        arena.deallocate(c, 300).unwrap();
        assert_eq!(arena.used().unwrap(), 304);
        arena.deallocate(b, 200).unwrap();
        assert_eq!(arena.used().unwrap(), 104);
        arena.deallocate(a, 100).unwrap();
    }
    assert_eq!(arena.used().unwrap(), 0);
    arena.reset().unwrap();
    assert_eq!(arena.used().unwrap(), 0);
    assert_eq!(arena.fallback().allocations(), 0);
}

// ── Overflow ────────────────────────────────────────────────────────

#[test]
fn n_elements_fit_and_n_plus_one_overflows() {
    const N: usize = 16;
    let arena = FixedArena::<[u32; N], _>::with_fallback(CountingFallback::new());
    let alloc = ArenaAllocator::<u32>::new(&arena).unwrap();

    let inline = alloc.allocate_n(N).unwrap();
    assert!(arena.contains(inline.cast()));
    assert_eq!(arena.fallback().allocations(), 0);
    // SAFETY: returned once with the count it was allocated with.
    unsafe { alloc.deallocate_n(inline, N).unwrap() };

    let spilled = alloc.allocate_n(N + 1).unwrap();
    assert!(!arena.contains(spilled.cast()));
    assert_eq!(arena.fallback().allocations(), 1);
    assert_eq!(arena.fallback().live_bytes(), (N + 1) * mem::size_of::<u32>());
    // SAFETY: returned once with the count it was allocated with.
    unsafe { alloc.deallocate_n(spilled, N + 1).unwrap() };
    assert_eq!(arena.fallback().live(), 0);
    assert_eq!(arena.used().unwrap(), 0);
}

#[test]
fn over_aligned_overflow_stays_aligned() {
    let config = ArenaConfig::new(32);
    let mut arena = DynamicArena::with_fallback(config, CountingFallback::new()).unwrap();
    arena.alloc(64).unwrap();

    let mut blocks = Vec::new();
    for size in [24, 40, 1, 33] {
        let p = arena.allocate(size, 32).unwrap();
        assert_eq!(p.as_ptr().addr() % 32, 0, "block of {size} bytes misaligned");
        blocks.push((p, size));
    }
    assert_eq!(arena.fallback().allocations(), 2);

    for (p, size) in blocks.into_iter().rev() {
        // SAFETY: each block is returned once with its allocation size.
        unsafe { arena.deallocate(p, size).unwrap() };
    }
    assert_eq!(arena.fallback().live(), 0);
}

#[test]
fn over_aligned_elements_in_fixed_storage() {
    let arena = FixedArena::<AlignedBytes<128, Align32>, _>::with_fallback(CountingFallback::new());
    let mut v: ArenaVec<'_, Wide> = ArenaVec::new_in(ArenaAllocator::new(&arena).unwrap());
    v.reserve_exact(4);
    v.extend((0..4).map(|i| Wide::splat(i as f32)));
    assert_eq!(arena.fallback().allocations(), 0);

    v.push(Wide::splat(4.0));
    assert_eq!(arena.fallback().allocations(), 1);
    assert_eq!(v.as_ptr().addr() % 32, 0);
    assert_eq!(v[4], Wide::splat(4.0));
    drop(v);
    assert_eq!(arena.fallback().live(), 0);
}

#[test]
fn reset_leaves_fallback_blocks_to_the_caller() {
    let config = ArenaConfig::new(16);
    let mut arena = DynamicArena::with_fallback(config, CountingFallback::new()).unwrap();
    arena.alloc(32).unwrap();

    arena.allocate(32, 16).unwrap();
    let spilled = arena.allocate(64, 16).unwrap();
    arena.reset().unwrap();
    assert_eq!(arena.used().unwrap(), 0);
    assert_eq!(arena.fallback().live(), 1);

    // SAFETY: spilled came from this arena's fallback with this size.
    unsafe { arena.deallocate(spilled, 64).unwrap() };
    assert_eq!(arena.fallback().live(), 0);
}

#[test]
fn rebinding_discards_bump_state_but_not_fallback_blocks() {
    let config = ArenaConfig::new(8);
    let mut arena = DynamicArena::with_fallback(config, CountingFallback::new()).unwrap();
    arena.alloc(16).unwrap();
    arena.allocate(16, 8).unwrap();
    let spilled = arena.allocate(8, 8).unwrap();

    arena.alloc(128).unwrap();
    assert_eq!(arena.used().unwrap(), 0);
    // SAFETY: spilled came from the fallback, which survives rebinding.
    unsafe { arena.deallocate(spilled, 8).unwrap() };
    assert_eq!(arena.fallback().frees(), 1);
}

#[test]
fn arenas_can_share_one_fallback_by_reference() {
    let shared = CountingFallback::new();
    let first = FixedArena::<[u64; 2], _>::with_fallback(&shared);
    let config = ArenaConfig::new(8);
    let mut second = DynamicArena::with_fallback(config, &shared).unwrap();
    second.alloc(16).unwrap();

    let a = first.allocate(32, 8).unwrap();
    let b = second.allocate(32, 8).unwrap();
    assert_eq!(shared.allocations(), 2);
    assert_eq!(shared.live(), 2);

    // SAFETY: each block is returned once to the arena that produced it.
    unsafe {
        first.deallocate(a, 32).unwrap();
        second.deallocate(b, 32).unwrap();
    }
    assert_eq!(shared.frees(), 2);
    assert_eq!(shared.live(), 0);
}

// ── Unbound arenas ──────────────────────────────────────────────────

#[test]
fn unbound_arena_reports_instead_of_falling_back() {
    let arena = DynamicArena::with_fallback(ArenaConfig::default(), CountingFallback::new()).unwrap();
    assert_eq!(arena.allocate(8, 8), Err(ArenaError::UnboundArena));
    assert_eq!(arena.used(), Err(ArenaError::UnboundArena));
    assert_eq!(arena.fallback().allocations(), 0);
}
