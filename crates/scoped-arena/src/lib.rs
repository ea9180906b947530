//! Bump-pointer arenas with heap fallback, for containers whose contents
//! have a bounded lifetime.
//!
//! An arena owns a contiguous, aligned buffer and serves allocations by
//! advancing a cursor through it. When the buffer is exhausted, requests
//! go to a fallback strategy (aligned heap allocation by default) instead
//! of failing. Containers reach an arena through [`ArenaAllocator`], a
//! copyable handle implementing the [`allocator_api2`] allocator protocol.
//!
//! # Architecture
//!
//! ```text
//! ArenaVec / ArenaBox / any allocator_api2 container
//! └── ArenaAllocator<'a, T> (Copy, borrows the arena)
//!     └── dyn RawArena
//!         └── Arena<S: Storage, F: Fallback>
//!             ├── Inline<B>  → FixedArena<B>   (buffer embedded in the arena)
//!             ├── Heap       → DynamicArena    (owned or borrowed heap buffer)
//!             └── F          → HeapFallback    (aligned platform allocation)
//!
//! SmallBuffer<T, N> = FixedArena<[T; N]> + ArenaVec pre-reserved to N
//! ```
//!
//! # Reclaiming space
//!
//! Only the most recently allocated block goes back to the buffer when it
//! is deallocated. Everything else stays consumed until [`Arena::reset`].
//!
//! # Thread safety
//!
//! None. Arenas and handles are `!Sync`; there is no internal locking.
//!
//! This crate contains `unsafe` code, confined to `raw`, `fallback`,
//! `arena`, `fixed`, `dynamic` and `handle`.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod arena;
pub mod buffer;
pub mod config;
pub mod dynamic;
pub mod error;
pub mod fallback;
pub mod fixed;
pub mod handle;
mod raw;
pub mod small_buffer;

// Public re-exports for the primary API surface.
pub use arena::{Arena, RawArena, Storage};
pub use buffer::AlignedBuffer;
pub use config::{ArenaConfig, OutlivePolicy, MAX_NATURAL_ALIGN};
pub use dynamic::{DynamicArena, Ownership};
pub use error::ArenaError;
pub use fallback::{Fallback, HeapFallback};
pub use fixed::{AlignedBytes, FixedArena};
pub use handle::{ArenaAllocator, ArenaBox, ArenaVec};
pub use small_buffer::SmallBuffer;
