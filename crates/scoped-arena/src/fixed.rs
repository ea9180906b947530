//! Arenas over inline storage.
//!
//! A [`FixedArena<B>`] embeds `size_of::<B>()` bytes aligned to
//! `align_of::<B>()` in the arena object itself. The buffer is bound for
//! the arena's whole life and needs no freeing. `B` is only a layout:
//! its bytes are never read as a `B` and never dropped.
//!
//! ```
//! use scoped_arena::{AlignedBytes, FixedArena};
//! use scoped_arena::fixed::Align32;
//!
//! // 4 KiB of 32-byte aligned bump space, no heap allocation.
//! let arena: FixedArena<AlignedBytes<4096, Align32>> = FixedArena::new();
//! assert_eq!(arena.capacity(), 4096);
//! assert_eq!(arena.alignment(), 32);
//! ```

#![allow(unsafe_code)]

use std::cell::UnsafeCell;
use std::mem::{self, MaybeUninit};
use std::ptr::NonNull;

use crate::arena::{Arena, Storage};
use crate::buffer::AlignedBuffer;
use crate::config::ArenaConfig;
use crate::error::ArenaError;
use crate::fallback::{Fallback, HeapFallback};

/// Inline storage laid out like a `B`.
pub struct Inline<B> {
    slot: UnsafeCell<MaybeUninit<B>>,
}

impl<B> Inline<B> {
    fn new() -> Self {
        Self {
            slot: UnsafeCell::new(MaybeUninit::uninit()),
        }
    }
}

// SAFETY: the slot is owned by this value and only reached through the
// arena; its address is stable while the arena is borrowed.
unsafe impl<B> Storage for Inline<B> {
    fn buffer(&self) -> AlignedBuffer {
        let alignment = mem::align_of::<B>();
        NonNull::new(self.slot.get().cast::<u8>())
            .and_then(|ptr| AlignedBuffer::new(ptr, mem::size_of::<B>(), alignment))
            .unwrap_or(AlignedBuffer::empty(alignment))
    }
}

/// An arena whose buffer is the inline storage of a `B`.
pub type FixedArena<B, F = HeapFallback> = Arena<Inline<B>, F>;

impl<B> FixedArena<B> {
    /// An arena over fresh inline storage, aligned to `align_of::<B>()`.
    pub fn new() -> Self {
        Self::with_fallback(HeapFallback)
    }
}

impl<B> Default for FixedArena<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B, F: Fallback> FixedArena<B, F> {
    /// An arena aligned to `align_of::<B>()` that overflows into `fallback`.
    pub fn with_fallback(fallback: F) -> Self {
        // Any type's alignment is a power of two, and the default config
        // accepts every power of two.
        Arena::from_parts(Inline::new(), ArenaConfig::new(mem::align_of::<B>()), fallback)
    }

    /// An arena with an explicit configuration.
    ///
    /// `config.alignment` may be smaller than `align_of::<B>()` but not
    /// larger, since the storage cannot guarantee it.
    pub fn with_config(config: ArenaConfig, fallback: F) -> Result<Self, ArenaError> {
        config.validate()?;
        if config.alignment > mem::align_of::<B>() {
            return Err(ArenaError::InvalidConfiguration {
                alignment: config.alignment,
                reason: "inline storage is less aligned than the arena",
            });
        }
        Ok(Arena::from_parts(Inline::new(), config, fallback))
    }
}

/// `N` bytes aligned like `A`.
///
/// Use as the layout parameter of a [`FixedArena`]. The size is `N`
/// rounded up to a multiple of `align_of::<A>()`.
#[repr(C)]
pub struct AlignedBytes<const N: usize, A = MaxAlign> {
    _align: [A; 0],
    _bytes: [u8; N],
}

macro_rules! alignment_markers {
    ($($(#[$doc:meta])* $name:ident = $align:literal;)*) => {
        $(
            $(#[$doc])*
            #[derive(Clone, Copy, Debug, Default)]
            #[repr(align($align))]
            pub struct $name;
        )*
    };
}

alignment_markers! {
    /// 8-byte alignment.
    Align8 = 8;
    /// 16-byte alignment, the natural maximum on 64-bit targets.
    Align16 = 16;
    /// 32-byte alignment.
    Align32 = 32;
    /// 64-byte alignment (a cache line on most targets).
    Align64 = 64;
    /// 4096-byte alignment (a page on most targets).
    Align4096 = 4096;
}

/// Alignment marker for [`MAX_NATURAL_ALIGN`](crate::config::MAX_NATURAL_ALIGN).
#[cfg(target_pointer_width = "64")]
pub type MaxAlign = Align16;

/// Alignment marker for [`MAX_NATURAL_ALIGN`](crate::config::MAX_NATURAL_ALIGN).
#[cfg(not(target_pointer_width = "64"))]
pub type MaxAlign = Align8;
