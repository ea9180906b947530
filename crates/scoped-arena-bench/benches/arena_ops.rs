//! Criterion micro-benchmarks: bump allocation, overflow, and small-buffer
//! containers against `smallvec` and the global heap.

use std::hint::black_box;

use allocator_api2::alloc::Global;
use criterion::{criterion_group, criterion_main, Criterion};
use scoped_arena::{ArenaConfig, DynamicArena, FixedArena, SmallBuffer};
use scoped_arena_bench::{bump_cycle, collect_in, mixed_footprint, u32_handle};
use smallvec::SmallVec;

const ROUNDS: usize = 64;

fn bench_bump_cycle(c: &mut Criterion) {
    let capacity = ROUNDS * mixed_footprint(8);
    let mut arena = DynamicArena::with_capacity(capacity, ArenaConfig::new(8)).unwrap();
    c.bench_function("bump_cycle_512", |b| {
        b.iter(|| black_box(bump_cycle(&mut arena, ROUNDS).unwrap()));
    });
    assert_eq!(arena.fallback_allocations(), 0);
}

fn bench_overflow(c: &mut Criterion) {
    // Every request misses the 64-byte buffer and goes to the heap.
    let arena: FixedArena<[u64; 8]> = FixedArena::new();
    c.bench_function("overflow_alloc_free_256", |b| {
        b.iter(|| {
            let handle = scoped_arena::ArenaAllocator::<u64>::new(&arena).unwrap();
            let p = handle.allocate_n(32).unwrap();
            // SAFETY: p came from allocate_n(32) on this handle.
            unsafe { handle.deallocate_n(black_box(p), 32).unwrap() };
        });
    });
}

fn bench_containers(c: &mut Criterion) {
    let mut group = c.benchmark_group("push_16_u32");
    group.bench_function("small_buffer", |b| {
        b.iter(|| {
            let buf: SmallBuffer<u32, 16> = SmallBuffer::new();
            let mut v = buf.container().unwrap();
            v.extend(0..16);
            black_box(v.iter().sum::<u32>())
        });
    });
    group.bench_function("smallvec", |b| {
        b.iter(|| {
            let mut v: SmallVec<[u32; 16]> = SmallVec::new();
            v.extend(0..16);
            black_box(v.iter().sum::<u32>())
        });
    });
    group.bench_function("heap_vec", |b| {
        b.iter(|| black_box(collect_in(Global, 16)));
    });
    let mut arena = DynamicArena::with_capacity(1024, ArenaConfig::new(8)).unwrap();
    group.bench_function("dynamic_arena", |b| {
        b.iter(|| {
            let sum = collect_in(u32_handle(&arena).unwrap(), 16);
            arena.reset().unwrap();
            black_box(sum)
        });
    });
    group.finish();
}

criterion_group!(benches, bench_bump_cycle, bench_overflow, bench_containers);
criterion_main!(benches);
