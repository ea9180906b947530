//! Test utilities for scoped-arena development.
//!
//! Provides a [`CountingFallback`] that records every overflow allocation
//! an arena makes, and element fixtures in [`fixtures`].

#![deny(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::alloc::Layout;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::ptr::NonNull;

use scoped_arena::{ArenaError, Fallback, HeapFallback};

/// Heap fallback that counts what passes through it.
///
/// Live blocks are tracked by address, so freeing a block twice or with a
/// different layout than it was allocated with panics.
#[derive(Default)]
pub struct CountingFallback {
    inner: HeapFallback,
    allocations: Cell<usize>,
    frees: Cell<usize>,
    live: RefCell<HashMap<usize, Layout>>,
}

impl CountingFallback {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total blocks handed out.
    pub fn allocations(&self) -> usize {
        self.allocations.get()
    }

    /// Total blocks returned.
    pub fn frees(&self) -> usize {
        self.frees.get()
    }

    /// Blocks handed out and not yet returned.
    pub fn live(&self) -> usize {
        self.live.borrow().len()
    }

    /// Bytes handed out and not yet returned.
    pub fn live_bytes(&self) -> usize {
        self.live.borrow().values().map(Layout::size).sum()
    }
}

// SAFETY: every block comes from HeapFallback unchanged.
#[allow(unsafe_code)]
unsafe impl Fallback for CountingFallback {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, ArenaError> {
        let ptr = self.inner.allocate(layout)?;
        self.allocations.set(self.allocations.get() + 1);
        self.live.borrow_mut().insert(ptr.as_ptr().addr(), layout);
        Ok(ptr)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        let recorded = self.live.borrow_mut().remove(&ptr.as_ptr().addr());
        assert_eq!(
            recorded,
            Some(layout),
            "fallback block {ptr:?} freed with an unknown or mismatched layout"
        );
        self.frees.set(self.frees.get() + 1);
        // SAFETY: the block was allocated by inner with this layout and is
        // freed exactly once, checked above.
        unsafe { self.inner.deallocate(ptr, layout) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[allow(unsafe_code)]
    fn counts_allocations_and_frees() {
        let fallback = CountingFallback::new();
        let layout = Layout::from_size_align(48, 16).unwrap();
        let ptr = fallback.allocate(layout).unwrap();
        assert_eq!(fallback.allocations(), 1);
        assert_eq!(fallback.live_bytes(), 48);
        // SAFETY: allocated above with this layout.
        unsafe { fallback.deallocate(ptr, layout) };
        assert_eq!(fallback.frees(), 1);
        assert_eq!(fallback.live(), 0);
    }
}
