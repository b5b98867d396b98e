//! A user-space allocator over a single contiguous byte buffer.
//!
//! [`BufferArena`] owns a fixed-length byte buffer and an ordered sequence of
//! regions that exactly partitions it. Callers request a number of bytes and
//! receive a [`Handle`]; the bytes behind a handle can be read and written
//! until the handle is freed. Placement is first-fit, adjacent free regions
//! are coalesced on every free, and [`BufferArena::compact`] relocates all
//! live regions to a contiguous prefix when fragmentation becomes unworkable.
//!
//! The design is single-threaded: a `BufferArena` is exclusively owned and
//! every operation runs to completion synchronously.

// public module: contains implementation details (hidden via pub(crate))
// and TEST_MUTEX (public for tests)
pub mod memory;

// allocator
pub use memory::arena::{ArenaStats, BufferArena};

// handles
pub use memory::handle::Handle;

// errors
pub use memory::error::AllocError;
