//! Arenas over heap buffers.
//!
//! A [`DynamicArena`] either allocates its own buffer ([`Ownership::Owned`],
//! freed on rebinding and on drop) or adopts one supplied by the caller
//! ([`Ownership::Borrowed`], never freed by the arena). Rebinding takes
//! `&mut self`, so no allocator handle can observe the old buffer
//! disappearing.

#![allow(unsafe_code)]

use crate::arena::{Arena, Storage};
use crate::buffer::AlignedBuffer;
use crate::config::ArenaConfig;
use crate::error::ArenaError;
use crate::fallback::{Fallback, HeapFallback};
use crate::raw;

/// Who is responsible for freeing a [`DynamicArena`]'s buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ownership {
    /// No buffer bound.
    Unbound,
    /// Allocated by the arena; freed on rebinding and on drop.
    Owned,
    /// Supplied by the caller; never freed by the arena.
    Borrowed,
}

/// Heap buffer slot with explicit ownership.
pub struct Heap {
    buffer: AlignedBuffer,
    ownership: Ownership,
}

impl Heap {
    fn unbound(alignment: usize) -> Self {
        Self {
            buffer: AlignedBuffer::empty(alignment),
            ownership: Ownership::Unbound,
        }
    }

    fn bind(&mut self, buffer: AlignedBuffer, ownership: Ownership) {
        self.release();
        self.buffer = buffer;
        self.ownership = ownership;
    }

    fn release(&mut self) {
        if let (Ownership::Owned, Some(ptr)) = (self.ownership, self.buffer.ptr()) {
            // SAFETY: owned buffers come from raw::alloc_aligned with
            // exactly this size and alignment.
            unsafe { raw::free_aligned(ptr, self.buffer.size(), self.buffer.alignment()) };
            tracing::debug!(size = self.buffer.size(), "dynamic arena released owned buffer");
        }
        self.buffer = AlignedBuffer::empty(self.buffer.alignment());
        self.ownership = Ownership::Unbound;
    }
}

// SAFETY: owned buffers are exclusive to this slot; borrowed buffers are
// vouched for by the caller of `adopt`.
unsafe impl Storage for Heap {
    fn buffer(&self) -> AlignedBuffer {
        self.buffer
    }
}

impl Drop for Heap {
    fn drop(&mut self) {
        self.release();
    }
}

/// An arena whose buffer lives on the heap and can be rebound.
pub type DynamicArena<F = HeapFallback> = Arena<Heap, F>;

impl DynamicArena {
    /// An arena with no buffer bound.
    pub fn new(config: ArenaConfig) -> Result<Self, ArenaError> {
        Self::with_fallback(config, HeapFallback)
    }

    /// An arena owning a fresh buffer of `byte_count` bytes.
    ///
    /// A `byte_count` of zero leaves the arena unbound.
    pub fn with_capacity(byte_count: usize, config: ArenaConfig) -> Result<Self, ArenaError> {
        let mut arena = Self::new(config)?;
        if byte_count > 0 {
            arena.alloc(byte_count)?;
        }
        Ok(arena)
    }

    /// An arena over a caller-supplied buffer it will never free.
    ///
    /// # Safety
    ///
    /// The buffer must be valid for reads and writes of its full size,
    /// must not be accessed by anything else, and must outlive the arena
    /// (or its next rebinding).
    pub unsafe fn from_buffer(buffer: AlignedBuffer, config: ArenaConfig) -> Result<Self, ArenaError> {
        let mut arena = Self::new(config)?;
        // SAFETY: forwarded caller contract.
        unsafe { arena.adopt(buffer)? };
        Ok(arena)
    }
}

impl<F: Fallback> DynamicArena<F> {
    /// An unbound arena that overflows into `fallback`.
    pub fn with_fallback(config: ArenaConfig, fallback: F) -> Result<Self, ArenaError> {
        config.validate()?;
        Ok(Arena::from_parts(Heap::unbound(config.alignment), config, fallback))
    }

    /// Who frees the current buffer.
    pub fn ownership(&self) -> Ownership {
        self.storage().ownership
    }

    /// Bind a fresh owned buffer of `byte_count` bytes.
    ///
    /// Any owned buffer bound before is freed first and the cursor moves to
    /// the start of the new one. If the platform allocation fails the
    /// arena is left unbound.
    pub fn alloc(&mut self, byte_count: usize) -> Result<(), ArenaError> {
        if byte_count == 0 {
            return Err(ArenaError::InvalidAllocation);
        }
        let alignment = self.alignment();
        self.storage_mut().release();
        self.rewind();

        let ptr = raw::alloc_aligned(byte_count, alignment)?;
        let buffer = AlignedBuffer::from_raw_parts(ptr, byte_count, alignment);
        self.storage_mut().bind(buffer, Ownership::Owned);
        tracing::debug!(byte_count, alignment, "dynamic arena bound owned buffer");
        Ok(())
    }

    /// Bind a caller-supplied buffer the arena will never free.
    ///
    /// # Safety
    ///
    /// Same contract as [`DynamicArena::from_buffer`].
    pub unsafe fn adopt(&mut self, buffer: AlignedBuffer) -> Result<(), ArenaError> {
        if buffer.is_empty() {
            return Err(ArenaError::InvalidAllocation);
        }
        if buffer.alignment() < self.alignment() {
            return Err(ArenaError::InvalidConfiguration {
                alignment: buffer.alignment(),
                reason: "adopted buffer is less aligned than the arena",
            });
        }
        self.storage_mut().bind(buffer, Ownership::Borrowed);
        self.rewind();
        tracing::debug!(size = buffer.size(), "dynamic arena adopted borrowed buffer");
        Ok(())
    }

    /// Unbind the current buffer, freeing it if owned.
    pub fn release(&mut self) {
        self.storage_mut().release();
        self.rewind();
    }
}
