//! Buffer descriptors and size rounding.
//!
//! An [`AlignedBuffer`] is a plain view of a memory region: pointer, size
//! and the alignment the pointer is known to satisfy. It carries no
//! ownership; whoever constructs an arena from one decides who frees it.

use std::ptr::NonNull;

use crate::config::is_power_of_two;

/// Round `byte_count` up to the next multiple of `alignment`.
///
/// `alignment` must be a power of two. Returns `None` on overflow.
#[inline]
pub const fn aligned_size(byte_count: usize, alignment: usize) -> Option<usize> {
    debug_assert!(is_power_of_two(alignment));
    match byte_count.checked_add(alignment - 1) {
        Some(n) => Some(n & !(alignment - 1)),
        None => None,
    }
}

/// Descriptor of an aligned memory region.
///
/// Invariant: a descriptor with a pointer has `size > 0`, and the pointer
/// satisfies `alignment`. [`AlignedBuffer::empty`] is the only descriptor
/// without a pointer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AlignedBuffer {
    ptr: Option<NonNull<u8>>,
    size: usize,
    alignment: usize,
}

impl AlignedBuffer {
    /// Describe `size` bytes at `ptr`, aligned to `alignment`.
    ///
    /// Returns `None` if `size` is zero, `alignment` is not a power of
    /// two, or `ptr` does not satisfy `alignment`.
    pub fn new(ptr: NonNull<u8>, size: usize, alignment: usize) -> Option<Self> {
        if size == 0 || !is_power_of_two(alignment) || ptr.as_ptr().addr() % alignment != 0 {
            return None;
        }
        Some(Self {
            ptr: Some(ptr),
            size,
            alignment,
        })
    }

    /// Describe a region the crate allocated itself.
    ///
    /// The caller guarantees the invariant that [`AlignedBuffer::new`] checks.
    pub(crate) fn from_raw_parts(ptr: NonNull<u8>, size: usize, alignment: usize) -> Self {
        debug_assert!(size > 0 && ptr.as_ptr().addr() % alignment == 0);
        Self {
            ptr: Some(ptr),
            size,
            alignment,
        }
    }

    /// A descriptor with no memory behind it.
    pub const fn empty(alignment: usize) -> Self {
        Self {
            ptr: None,
            size: 0,
            alignment,
        }
    }

    /// Start of the region, if any.
    pub fn ptr(&self) -> Option<NonNull<u8>> {
        self.ptr
    }

    /// Size of the region in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Alignment of the start of the region.
    pub fn alignment(&self) -> usize {
        self.alignment
    }

    /// Whether the descriptor refers to memory.
    pub fn is_empty(&self) -> bool {
        self.ptr.is_none()
    }

    /// Byte offset of `ptr` from the start of the region, if `ptr` points
    /// at one of its bytes.
    ///
    /// The one-past-the-end address is excluded: no block starts there,
    /// and a heap block placed right after the region may.
    pub fn offset_of(&self, ptr: NonNull<u8>) -> Option<usize> {
        let start = self.ptr?.as_ptr().addr();
        let offset = ptr.as_ptr().addr().checked_sub(start)?;
        (offset < self.size).then_some(offset)
    }

    /// Whether `ptr` points at a byte of the region.
    pub fn contains(&self, ptr: NonNull<u8>) -> bool {
        self.offset_of(ptr).is_some()
    }
}
