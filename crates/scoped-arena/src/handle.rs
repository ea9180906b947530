//! Allocator handles.
//!
//! An [`ArenaAllocator`] is a copyable, non-owning reference to an arena
//! that speaks the container allocator protocol
//! ([`allocator_api2::alloc::Allocator`]). Any number of containers may
//! share one arena through copies of the same handle. The borrow ties each
//! handle to its arena, so a handle can never outlive the arena, and the
//! arena cannot be reset or rebound while one exists.

#![allow(unsafe_code)]

use std::alloc::Layout;
use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::ptr::{self, NonNull};

use allocator_api2::alloc::{AllocError, Allocator};

use crate::arena::RawArena;
use crate::error::ArenaError;

/// Growable array drawing from an arena.
pub type ArenaVec<'a, T> = allocator_api2::vec::Vec<T, ArenaAllocator<'a, T>>;

/// Box drawing from an arena.
pub type ArenaBox<'a, T> = allocator_api2::boxed::Box<T, ArenaAllocator<'a, T>>;

/// Handle to an arena, typed by the element it allocates.
///
/// Copying a handle copies the reference, never the arena. Two handles
/// compare equal when they reference the same arena instance with the
/// same alignment, whatever their element types; containers use this to
/// decide whether storage can move between them without copying.
pub struct ArenaAllocator<'a, T = u8> {
    arena: &'a dyn RawArena,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, T> ArenaAllocator<'a, T> {
    /// A handle allocating `T`s from `arena`.
    ///
    /// Fails with [`ArenaError::InvalidConfiguration`] if `T` needs a
    /// stricter alignment than the arena provides.
    pub fn new(arena: &'a dyn RawArena) -> Result<Self, ArenaError> {
        let alignment = mem::align_of::<T>();
        if alignment > arena.alignment() {
            return Err(ArenaError::InvalidConfiguration {
                alignment,
                reason: "element alignment exceeds arena alignment",
            });
        }
        Ok(Self {
            arena,
            _marker: PhantomData,
        })
    }

    /// The same arena, allocating `U`s instead.
    pub fn rebind<U>(&self) -> Result<ArenaAllocator<'a, U>, ArenaError> {
        ArenaAllocator::new(self.arena)
    }

    /// The referenced arena.
    pub fn arena(&self) -> &'a dyn RawArena {
        self.arena
    }

    /// Alignment of the referenced arena.
    pub fn alignment(&self) -> usize {
        self.arena.alignment()
    }

    /// Storage for `n` contiguous `T`s.
    pub fn allocate_n(&self, n: usize) -> Result<NonNull<T>, ArenaError> {
        let byte_count = n.checked_mul(mem::size_of::<T>()).ok_or(
            ArenaError::PlatformAllocationFailure {
                byte_count: usize::MAX,
                alignment: mem::align_of::<T>(),
            },
        )?;
        self.arena
            .allocate(byte_count, mem::align_of::<T>())
            .map(NonNull::cast)
    }

    /// Return storage obtained from [`ArenaAllocator::allocate_n`].
    ///
    /// # Safety
    ///
    /// `ptr` must come from `allocate_n(n)` on a handle equal to this one,
    /// must not have been returned already, and must not be used afterwards.
    /// The arena must not have been moved since `ptr` was allocated.
    pub unsafe fn deallocate_n(&self, ptr: NonNull<T>, n: usize) -> Result<(), ArenaError> {
        // allocate_n succeeded for n, so the product did not overflow.
        let byte_count = n * mem::size_of::<T>();
        // SAFETY: forwarded caller contract.
        unsafe { self.arena.deallocate(ptr.cast(), byte_count) }
    }
}

impl<T> Clone for ArenaAllocator<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ArenaAllocator<'_, T> {}

impl<T, U> PartialEq<ArenaAllocator<'_, U>> for ArenaAllocator<'_, T> {
    fn eq(&self, other: &ArenaAllocator<'_, U>) -> bool {
        self.alignment() == other.alignment()
            && ptr::addr_eq(ptr::from_ref(self.arena), ptr::from_ref(other.arena))
    }
}

impl<T> Eq for ArenaAllocator<'_, T> {}

impl<T> fmt::Debug for ArenaAllocator<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArenaAllocator")
            .field("arena", &ptr::from_ref(self.arena).cast::<()>())
            .field("alignment", &self.alignment())
            .finish()
    }
}

// SAFETY: blocks come from the referenced arena, which outlives every copy
// of this handle; equal handles share that arena and free into it.
unsafe impl<T> Allocator for ArenaAllocator<'_, T> {
    fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        match self.arena.allocate(layout.size(), layout.align()) {
            Ok(ptr) => Ok(NonNull::slice_from_raw_parts(ptr, layout.size())),
            Err(err) => {
                tracing::debug!(%err, size = layout.size(), "arena allocation refused");
                Err(AllocError)
            }
        }
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: the Allocator contract guarantees ptr was allocated by a
        // handle equal to this one with the same layout.
        if let Err(err) = unsafe { self.arena.deallocate(ptr, layout.size()) } {
            tracing::error!(%err, size = layout.size(), "arena deallocation failed, block leaked");
        }
    }
}
