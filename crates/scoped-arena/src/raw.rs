//! Low-level primitives for arena memory operations.
//!
//! Every call into `std::alloc` made by this crate lives here, each with a
//! `// SAFETY:` comment.

#![allow(unsafe_code)]

use std::alloc::{self, Layout};
use std::ptr::{self, NonNull};

use crate::error::ArenaError;

/// Allocate `byte_count` bytes aligned to `alignment` from the platform
/// allocator.
///
/// `byte_count` must be non-zero. Fails if the layout is unrepresentable
/// or the allocator reports exhaustion.
pub(crate) fn alloc_aligned(byte_count: usize, alignment: usize) -> Result<NonNull<u8>, ArenaError> {
    let failure = ArenaError::PlatformAllocationFailure {
        byte_count,
        alignment,
    };
    if byte_count == 0 {
        return Err(failure);
    }
    let layout = Layout::from_size_align(byte_count, alignment).map_err(|_| failure.clone())?;
    // SAFETY: layout has non-zero size, checked above.
    let ptr = unsafe { alloc::alloc(layout) };
    NonNull::new(ptr).ok_or(failure)
}

/// Release memory obtained from [`alloc_aligned`].
///
/// # Safety
///
/// `ptr` must have been returned by `alloc_aligned(byte_count, alignment)`
/// with the same arguments and not freed since.
pub(crate) unsafe fn free_aligned(ptr: NonNull<u8>, byte_count: usize, alignment: usize) {
    // SAFETY: the same size and alignment formed a valid layout when the
    // block was allocated.
    let layout = unsafe { Layout::from_size_align_unchecked(byte_count, alignment) };
    // SAFETY: caller guarantees ptr came from alloc::alloc with this layout.
    unsafe { alloc::dealloc(ptr.as_ptr(), layout) };
}

/// A non-null pointer aligned to `alignment` that owns no memory.
///
/// Returned for zero-byte requests.
pub(crate) fn dangling(alignment: usize) -> NonNull<u8> {
    NonNull::new(ptr::without_provenance_mut(alignment)).unwrap_or(NonNull::dangling())
}
