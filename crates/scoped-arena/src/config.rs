//! Arena configuration parameters.

use std::mem;

use crate::error::ArenaError;

/// Largest alignment the platform allocator guarantees for any object
/// without being asked for it explicitly.
pub const MAX_NATURAL_ALIGN: usize = 2 * mem::size_of::<usize>();

/// Whether `n` is a non-zero power of two.
pub const fn is_power_of_two(n: usize) -> bool {
    n > 0 && (n & (n - 1)) == 0
}

/// Whether `alignment` can back an arena.
///
/// It must be a power of two. Alignments above [`MAX_NATURAL_ALIGN`] are
/// over-alignments: they additionally require `allow_over_alignment` and
/// must be a multiple of the native pointer width.
pub const fn check_alignment(alignment: usize, allow_over_alignment: bool) -> bool {
    if !is_power_of_two(alignment) {
        return false;
    }
    if alignment <= MAX_NATURAL_ALIGN {
        return true;
    }
    allow_over_alignment && alignment % mem::size_of::<*const ()>() == 0
}

/// What an arena does when it finds its cursor outside its buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutlivePolicy {
    /// Report [`ArenaError::LifetimeViolation`] to the caller.
    #[default]
    Error,
    /// `debug_assert!` on the violation. Release builds skip the check; the
    /// arena then serves every request from its fallback.
    DebugAssert,
}

/// Configuration for an arena.
///
/// Validated at construction; all values are immutable after creation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Alignment of every block handed out, in bytes.
    ///
    /// Default: [`MAX_NATURAL_ALIGN`]. Every allocation is rounded up to a
    /// multiple of this value.
    pub alignment: usize,

    /// Whether alignments above [`MAX_NATURAL_ALIGN`] are accepted.
    ///
    /// Default: `true`.
    pub allow_over_alignment: bool,

    /// Reaction to a cursor found outside the bound buffer.
    pub outlive_policy: OutlivePolicy,
}

impl ArenaConfig {
    /// Create a config with the given alignment and defaults elsewhere.
    pub const fn new(alignment: usize) -> Self {
        Self {
            alignment,
            allow_over_alignment: true,
            outlive_policy: OutlivePolicy::Error,
        }
    }

    /// Replace the outlive policy.
    pub const fn with_outlive_policy(mut self, policy: OutlivePolicy) -> Self {
        self.outlive_policy = policy;
        self
    }

    /// Forbid alignments above [`MAX_NATURAL_ALIGN`].
    pub const fn without_over_alignment(mut self) -> Self {
        self.allow_over_alignment = false;
        self
    }

    /// Check the alignment rules.
    pub fn validate(&self) -> Result<(), ArenaError> {
        if !is_power_of_two(self.alignment) {
            return Err(ArenaError::InvalidConfiguration {
                alignment: self.alignment,
                reason: "alignment must be a power of two",
            });
        }
        if !check_alignment(self.alignment, self.allow_over_alignment) {
            return Err(ArenaError::InvalidConfiguration {
                alignment: self.alignment,
                reason: "over-alignment not supported",
            });
        }
        Ok(())
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::new(MAX_NATURAL_ALIGN)
    }
}
