//! Small-buffer-optimized containers.
//!
//! [`SmallBuffer<T, N>`] owns an inline arena sized for exactly `N` values
//! of `T` and hands out an [`ArenaVec`] pre-reserved to that capacity, so
//! the first `N` pushes never touch the heap:
//!
//! ```
//! use scoped_arena::SmallBuffer;
//!
//! let buf: SmallBuffer<u32, 4> = SmallBuffer::new();
//! let mut v = buf.container().unwrap();
//! assert_eq!(v.capacity(), 4);
//! v.extend([1, 2, 3, 4]);
//! assert_eq!(buf.arena().fallback_allocations(), 0);
//! ```
//!
//! # Copies of the container
//!
//! Cloning the container clones its allocator handle, which still refers
//! to this buffer's arena. Once the inline space is taken (by the original
//! or by the clone) every further allocation made through either of them
//! goes to the heap. The borrow keeps all of them from outliving the
//! arena; the arena's outlive check remains as a runtime backstop.

use std::fmt;
use std::mem;
use std::ptr::NonNull;

use crate::error::ArenaError;
use crate::fixed::FixedArena;
use crate::handle::{ArenaAllocator, ArenaVec};

/// Inline storage for `N` values of `T` plus the arena that serves it.
pub struct SmallBuffer<T, const N: usize> {
    arena: FixedArena<[T; N]>,
}

impl<T, const N: usize> SmallBuffer<T, N> {
    /// Fresh inline storage. Nothing is reserved until
    /// [`SmallBuffer::container`] is called.
    pub fn new() -> Self {
        Self {
            arena: FixedArena::new(),
        }
    }

    /// The number of elements served without heap allocation.
    pub const fn inline_capacity(&self) -> usize {
        N
    }

    /// The arena behind the inline storage.
    pub fn arena(&self) -> &FixedArena<[T; N]> {
        &self.arena
    }

    /// A container bound to the inline arena with capacity `N` reserved.
    ///
    /// # Errors
    ///
    /// - [`ArenaError::UnboundArena`] if `N * size_of::<T>()` is zero.
    /// - [`ArenaError::CapacityViolation`] if the reservation ends up larger
    ///   than `N` or outside the inline storage (for instance because a
    ///   container from an earlier call still holds it).
    /// - [`ArenaError::PlatformAllocationFailure`] if the reservation fails.
    pub fn container(&self) -> Result<ArenaVec<'_, T>, ArenaError> {
        self.arena.bound_buffer()?;
        let mut vec: ArenaVec<'_, T> = ArenaVec::new_in(ArenaAllocator::new(&self.arena)?);
        vec.try_reserve_exact(N)
            .map_err(|_| ArenaError::PlatformAllocationFailure {
                byte_count: N * mem::size_of::<T>(),
                alignment: mem::align_of::<T>(),
            })?;

        let reserved = vec.capacity();
        let inline = NonNull::new(vec.as_mut_ptr().cast::<u8>()).is_some_and(|p| self.arena.contains(p));
        if reserved > N || !inline {
            tracing::warn!(inline = N, reserved, "small buffer reservation left inline storage");
            return Err(ArenaError::CapacityViolation { inline: N, reserved });
        }
        Ok(vec)
    }
}

impl<T, const N: usize> Default for SmallBuffer<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> fmt::Debug for SmallBuffer<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmallBuffer")
            .field("inline_capacity", &N)
            .field("arena", &self.arena)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container_reserves_exactly_inline_capacity() {
        let buf: SmallBuffer<u64, 8> = SmallBuffer::new();
        let v = buf.container().unwrap();
        assert_eq!(v.capacity(), 8);
        assert_eq!(buf.inline_capacity(), 8);
        assert_eq!(buf.arena().used().unwrap(), 64);
        assert_eq!(buf.arena().fallback_allocations(), 0);
    }

    #[test]
    fn byte_elements_are_not_over_reserved() {
        // Amortized growth would round 4 bytes up to 8; the reservation is exact.
        let buf: SmallBuffer<u8, 4> = SmallBuffer::new();
        let v = buf.container().unwrap();
        assert_eq!(v.capacity(), 4);
    }

    #[test]
    fn second_live_container_is_a_capacity_violation() {
        let buf: SmallBuffer<u32, 4> = SmallBuffer::new();
        let first = buf.container().unwrap();
        assert!(matches!(
            buf.container(),
            Err(ArenaError::CapacityViolation { inline: 4, .. })
        ));
        drop(first);
        assert!(buf.container().is_ok());
    }

    #[test]
    fn zero_sized_storage_is_unbound() {
        let empty: SmallBuffer<u64, 0> = SmallBuffer::new();
        assert_eq!(empty.container().unwrap_err(), ArenaError::UnboundArena);
        let zst: SmallBuffer<(), 4> = SmallBuffer::new();
        assert_eq!(zst.container().unwrap_err(), ArenaError::UnboundArena);
    }

    #[test]
    fn elements_are_dropped_with_the_container() {
        use std::rc::Rc;

        let marker = Rc::new(());
        let buf: SmallBuffer<Rc<()>, 2> = SmallBuffer::new();
        {
            let mut v = buf.container().unwrap();
            v.push(Rc::clone(&marker));
            v.push(Rc::clone(&marker));
            assert_eq!(Rc::strong_count(&marker), 3);
        }
        assert_eq!(Rc::strong_count(&marker), 1);
        assert_eq!(buf.arena().used().unwrap(), 0);
    }
}
