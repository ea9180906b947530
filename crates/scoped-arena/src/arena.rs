//! The bump-pointer arena core.
//!
//! [`Arena`] owns a buffer through its [`Storage`] and serves requests by
//! advancing a cursor. Requests that do not fit go to its
//! [`Fallback`]. Only the topmost block can be handed back to the bump
//! region; everything else is reclaimed at once by [`Arena::reset`].
//!
//! The cursor is a byte offset from the start of the buffer. An arena may
//! be moved only while nothing borrows it and no block it handed out is
//! still outstanding: a [`FixedArena`](crate::fixed::FixedArena) carries
//! its buffer inline, so a move relocates the buffer and earlier blocks no
//! longer fall inside it. Handles borrow the arena, which turns such a
//! move into a compile error:
//!
//! ```compile_fail
//! use scoped_arena::{ArenaAllocator, FixedArena};
//!
//! let arena: FixedArena<[u64; 16]> = FixedArena::new();
//! let handle = ArenaAllocator::<u64>::new(&arena).unwrap();
//! let block = handle.allocate_n(2).unwrap();
//! let moved = Box::new(arena); // arena is still borrowed by `handle`
//! unsafe { handle.deallocate_n(block, 2).unwrap() };
//! # drop(moved);
//! ```
//!
//! ```compile_fail
//! use scoped_arena::{ArenaAllocator, ArenaVec, FixedArena};
//!
//! let arena: FixedArena<[u32; 8]> = FixedArena::new();
//! let mut v: ArenaVec<'_, u32> = ArenaVec::new_in(ArenaAllocator::new(&arena).unwrap());
//! v.push(1);
//! let moved = arena;
//! v.push(2);
//! # drop(moved);
//! ```

#![allow(unsafe_code)]

use std::alloc::Layout;
use std::cell::Cell;
use std::fmt;
use std::ptr::NonNull;

use crate::buffer::{aligned_size, AlignedBuffer};
use crate::config::{is_power_of_two, ArenaConfig, OutlivePolicy};
use crate::error::ArenaError;
use crate::fallback::{Fallback, HeapFallback};
use crate::raw;

/// Buffer-acquisition strategy behind an [`Arena`].
///
/// # Safety
///
/// A non-empty buffer returned by `buffer` must be valid for reads and
/// writes of its full size, must satisfy its advertised alignment, and must
/// not be accessed by anything but the arena for as long as it stays
/// bound. Calls to `buffer` made through a shared reference must keep
/// returning the same descriptor.
pub unsafe trait Storage {
    /// The bound buffer, or [`AlignedBuffer::empty`] if none is bound.
    fn buffer(&self) -> AlignedBuffer;
}

/// Object-safe view of an arena, used by [`ArenaAllocator`] to reference
/// arenas of any storage and fallback type.
///
/// [`ArenaAllocator`]: crate::handle::ArenaAllocator
pub trait RawArena {
    /// Alignment of every block this arena hands out.
    fn alignment(&self) -> usize;

    /// See [`Arena::allocate`].
    fn allocate(&self, byte_count: usize, alignment: usize) -> Result<NonNull<u8>, ArenaError>;

    /// See [`Arena::deallocate`].
    ///
    /// # Safety
    ///
    /// Same contract as [`Arena::deallocate`], including that the arena has
    /// not been moved since `ptr` was allocated.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, byte_count: usize) -> Result<(), ArenaError>;

    /// Whether `ptr` points into the bound buffer.
    fn contains(&self, ptr: NonNull<u8>) -> bool;
}

/// A bump-pointer arena over a buffer provided by `S`, overflowing into `F`.
///
/// # Thread safety
///
/// Arenas are not thread-safe: the cursor is a [`Cell`], so an arena and
/// every handle borrowing it are `!Sync`. Callers that need to share one
/// across threads must wrap it in their own lock.
pub struct Arena<S, F = HeapFallback> {
    storage: S,
    config: ArenaConfig,
    fallback: F,
    /// Offset of the next free byte. Always a multiple of the alignment.
    cursor: Cell<usize>,
    fallback_allocations: Cell<usize>,
}

impl<S: Storage, F: Fallback> Arena<S, F> {
    /// Assemble an arena. `config` must already be validated against the
    /// storage's alignment.
    pub(crate) fn from_parts(storage: S, config: ArenaConfig, fallback: F) -> Self {
        Self {
            storage,
            config,
            fallback,
            cursor: Cell::new(0),
            fallback_allocations: Cell::new(0),
        }
    }

    pub(crate) fn storage(&self) -> &S {
        &self.storage
    }

    pub(crate) fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    #[cfg(test)]
    pub(crate) fn force_cursor(&self, cursor: usize) {
        self.cursor.set(cursor);
    }

    /// Move the cursor back to the start of whatever buffer is bound.
    pub(crate) fn rewind(&mut self) {
        self.cursor.set(0);
    }

    /// The configuration this arena was built with.
    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Alignment of every block handed out.
    pub fn alignment(&self) -> usize {
        self.config.alignment
    }

    /// The overflow strategy.
    pub fn fallback(&self) -> &F {
        &self.fallback
    }

    /// Number of requests served by the fallback so far.
    pub fn fallback_allocations(&self) -> usize {
        self.fallback_allocations.get()
    }

    /// Whether a buffer is bound.
    pub fn has_buffer(&self) -> bool {
        !self.storage.buffer().is_empty()
    }

    /// The bound buffer, empty if there is none.
    pub fn buffer(&self) -> AlignedBuffer {
        self.storage.buffer()
    }

    /// The bound buffer, or [`ArenaError::UnboundArena`].
    pub fn bound_buffer(&self) -> Result<AlignedBuffer, ArenaError> {
        let buf = self.storage.buffer();
        if buf.is_empty() {
            return Err(ArenaError::UnboundArena);
        }
        Ok(buf)
    }

    /// Size of the bound buffer in bytes, zero if unbound.
    pub fn capacity(&self) -> usize {
        self.storage.buffer().size()
    }

    /// Bytes consumed by bump allocations.
    pub fn used(&self) -> Result<usize, ArenaError> {
        self.bound_buffer()?;
        Ok(self.cursor.get())
    }

    /// Bytes left for bump allocation.
    pub fn remaining(&self) -> Result<usize, ArenaError> {
        let buf = self.bound_buffer()?;
        Ok(buf.size().saturating_sub(self.cursor.get()))
    }

    /// Fraction of the buffer consumed, in `[0, 1]`.
    pub fn usage(&self) -> Result<f32, ArenaError> {
        let buf = self.bound_buffer()?;
        Ok(self.cursor.get() as f32 / buf.size() as f32)
    }

    /// Whether `ptr` points into the bound buffer.
    pub fn contains(&self, ptr: NonNull<u8>) -> bool {
        self.storage.buffer().contains(ptr)
    }

    /// Discard every bump allocation at once.
    ///
    /// Fallback blocks already handed out are unaffected and must still be
    /// returned through [`Arena::deallocate`].
    pub fn reset(&mut self) -> Result<(), ArenaError> {
        self.bound_buffer()?;
        self.rewind();
        Ok(())
    }

    /// Allocate `byte_count` bytes aligned to `alignment`.
    ///
    /// The request is rounded up to a multiple of the arena alignment and
    /// bumped from the buffer if it fits; otherwise exactly `byte_count`
    /// bytes come from the fallback. A zero-byte request returns a
    /// dangling, well-aligned pointer without touching the buffer.
    ///
    /// # Errors
    ///
    /// - [`ArenaError::InvalidConfiguration`] if `alignment` is not a power of
    ///   two or exceeds the arena alignment.
    /// - [`ArenaError::UnboundArena`] if no buffer is bound.
    /// - [`ArenaError::LifetimeViolation`] if the cursor lies outside the buffer.
    /// - [`ArenaError::PlatformAllocationFailure`] if the fallback fails.
    pub fn allocate(&self, byte_count: usize, alignment: usize) -> Result<NonNull<u8>, ArenaError> {
        if !is_power_of_two(alignment) || alignment > self.config.alignment {
            return Err(ArenaError::InvalidConfiguration {
                alignment,
                reason: "request must be a power of two no stricter than the arena",
            });
        }
        let buf = self.detect_outlive()?;

        if byte_count == 0 {
            return Ok(raw::dangling(self.config.alignment));
        }

        let cursor = self.cursor.get();
        if let (Some(start), Some(aligned)) = (buf.ptr(), aligned_size(byte_count, self.config.alignment)) {
            if buf.size().saturating_sub(cursor) >= aligned {
                self.cursor.set(cursor + aligned);
                // SAFETY: cursor + aligned <= size, so the block lies inside
                // the buffer the storage vouches for.
                return Ok(unsafe { start.add(cursor) });
            }
        }

        let layout = self.fallback_layout(byte_count)?;
        let ptr = self.fallback.allocate(layout)?;
        self.fallback_allocations.set(self.fallback_allocations.get() + 1);
        tracing::trace!(byte_count, alignment = layout.align(), "arena exhausted, using fallback");
        Ok(ptr)
    }

    /// Return a block obtained from [`Arena::allocate`].
    ///
    /// A block inside the buffer is reclaimed only if it is the topmost
    /// one; any other block stays consumed until [`Arena::reset`]. A block
    /// outside the buffer goes back to the fallback.
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by `allocate` on this arena with the
    /// same `byte_count` and must not have been deallocated already. The
    /// arena must not have been moved since `ptr` was allocated, otherwise
    /// an inline block is mistaken for a fallback block. `ptr` must not be
    /// used afterwards.
    ///
    /// # Errors
    ///
    /// [`ArenaError::UnboundArena`] or [`ArenaError::LifetimeViolation`],
    /// as for `allocate`.
    pub unsafe fn deallocate(&self, ptr: NonNull<u8>, byte_count: usize) -> Result<(), ArenaError> {
        let buf = self.detect_outlive()?;

        if byte_count == 0 {
            return Ok(());
        }

        if let Some(offset) = buf.offset_of(ptr) {
            if let Some(aligned) = aligned_size(byte_count, self.config.alignment) {
                if offset + aligned == self.cursor.get() {
                    self.cursor.set(offset);
                }
            }
            // Blocks below the top stay consumed until reset().
            return Ok(());
        }

        let layout = self.fallback_layout(byte_count)?;
        // SAFETY: the block is outside the buffer, so allocate() obtained it
        // from the fallback with this layout.
        unsafe { self.fallback.deallocate(ptr, layout) };
        tracing::trace!(byte_count, alignment = layout.align(), "released fallback block");
        Ok(())
    }

    fn fallback_layout(&self, byte_count: usize) -> Result<Layout, ArenaError> {
        Layout::from_size_align(byte_count, self.config.alignment).map_err(|_| {
            ArenaError::PlatformAllocationFailure {
                byte_count,
                alignment: self.config.alignment,
            }
        })
    }

    /// Best-effort check that the cursor still lies within the bound buffer.
    fn detect_outlive(&self) -> Result<AlignedBuffer, ArenaError> {
        let buf = self.bound_buffer()?;
        let cursor = self.cursor.get();
        if cursor <= buf.size() {
            return Ok(buf);
        }
        match self.config.outlive_policy {
            OutlivePolicy::Error => {
                tracing::error!(cursor, size = buf.size(), "allocator has outlived its arena");
                Err(ArenaError::LifetimeViolation {
                    cursor,
                    size: buf.size(),
                })
            }
            OutlivePolicy::DebugAssert => {
                debug_assert!(cursor <= buf.size(), "allocator has outlived its arena");
                Ok(buf)
            }
        }
    }
}

impl<S: Storage, F: Fallback> RawArena for Arena<S, F> {
    fn alignment(&self) -> usize {
        self.config.alignment
    }

    fn allocate(&self, byte_count: usize, alignment: usize) -> Result<NonNull<u8>, ArenaError> {
        Arena::allocate(self, byte_count, alignment)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, byte_count: usize) -> Result<(), ArenaError> {
        // SAFETY: forwarded caller contract.
        unsafe { Arena::deallocate(self, ptr, byte_count) }
    }

    fn contains(&self, ptr: NonNull<u8>) -> bool {
        Arena::contains(self, ptr)
    }
}

impl<S: Storage, F> fmt::Debug for Arena<S, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("config", &self.config)
            .field("buffer", &self.storage.buffer())
            .field("cursor", &self.cursor.get())
            .field("fallback_allocations", &self.fallback_allocations.get())
            .finish()
    }
}
