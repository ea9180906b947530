//! Arena-specific error types.

/// Errors that can occur during arena operations.
///
/// Running out of bump space is deliberately absent: an exhausted arena
/// serves the request from its [`Fallback`](crate::fallback::Fallback)
/// instead of failing.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ArenaError {
    /// The alignment is not a power of two, is an over-alignment the
    /// configuration does not permit, or a request asked for a stricter
    /// alignment than the arena guarantees.
    #[error("invalid alignment {alignment}: {reason}")]
    InvalidConfiguration {
        /// The offending alignment in bytes.
        alignment: usize,
        /// Which rule was broken.
        reason: &'static str,
    },

    /// An operation that needs a buffer was invoked on an arena with none bound.
    #[error("no valid buffer attached to arena")]
    UnboundArena,

    /// The cursor was found outside the bound buffer. The arena was rebound,
    /// released or corrupted while an allocator still referenced it.
    #[error("allocator has outlived its arena: cursor {cursor} outside buffer of {size} bytes")]
    LifetimeViolation {
        /// Cursor offset observed.
        cursor: usize,
        /// Size of the bound buffer in bytes.
        size: usize,
    },

    /// A dynamic arena was asked to allocate a zero-byte buffer.
    #[error("invalid allocation: byte_count = 0")]
    InvalidAllocation,

    /// The platform's aligned allocation primitive failed.
    #[error("aligned allocation failed: byte_count = {byte_count}, alignment = {alignment}")]
    PlatformAllocationFailure {
        /// Number of bytes requested.
        byte_count: usize,
        /// Alignment requested.
        alignment: usize,
    },

    /// A small-buffer container could not keep its reservation inside the
    /// inline arena.
    #[error("inline capacity {inline} violated: container reserved {reserved} elements")]
    CapacityViolation {
        /// Declared inline capacity in elements.
        inline: usize,
        /// Capacity the container actually reserved.
        reserved: usize,
    },
}
