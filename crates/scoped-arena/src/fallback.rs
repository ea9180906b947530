//! Overflow strategies.
//!
//! When a request does not fit in the remaining bump space, the arena hands
//! it to its [`Fallback`]. Fallback blocks are not part of the bump region:
//! the arena never rewinds over them and returns them to the same strategy
//! on `deallocate`.

#![allow(unsafe_code)]

use std::alloc::Layout;
use std::ptr::NonNull;

use crate::error::ArenaError;
use crate::raw;

/// Strategy for requests an arena cannot serve from its buffer.
///
/// # Safety
///
/// `allocate` must return memory valid for reads and writes of
/// `layout.size()` bytes, aligned to `layout.align()`, and disjoint from
/// every other live block. It stays valid until passed to `deallocate`
/// with the same layout.
pub unsafe trait Fallback {
    /// Allocate a block for `layout`. `layout.size()` is never zero.
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, ArenaError>;

    /// Release a block.
    ///
    /// # Safety
    ///
    /// `ptr` must come from `allocate` on this strategy with the same
    /// `layout`, and must not have been released already.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout);
}

/// Direct aligned allocation from the platform heap.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HeapFallback;

// SAFETY: blocks come straight from the global allocator with the
// requested layout.
unsafe impl Fallback for HeapFallback {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, ArenaError> {
        raw::alloc_aligned(layout.size(), layout.align())
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: forwarded caller contract; allocate used the same layout.
        unsafe { raw::free_aligned(ptr, layout.size(), layout.align()) }
    }
}

// SAFETY: forwards to the referenced strategy.
unsafe impl<F: Fallback + ?Sized> Fallback for &F {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, ArenaError> {
        (**self).allocate(layout)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: forwarded caller contract.
        unsafe { (**self).deallocate(ptr, layout) }
    }
}
