use std::fmt;

/// Errors surfaced by the arena allocator.
///
/// None of these are retried internally; each is the terminal result of the
/// single call that produced it. `OutOfMemory` is non-fatal to the arena —
/// the caller may free other handles or compact and retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllocError {
    /// No free region large enough exists for the requested size.
    OutOfMemory { requested: usize },
    /// A handle that does not name a live region: already freed, never
    /// issued by this arena, or stale after its slot was recycled.
    InvalidPointer,
    /// A write longer than the target region.
    InvalidWrite { len: usize, size: usize },
    /// A region's span exceeds the storage length. Unreachable while the
    /// arena's sequence invariant holds; checked rather than trusted.
    OutOfBounds {
        offset: usize,
        size: usize,
        capacity: usize,
    },
}

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllocError::OutOfMemory { requested } => {
                write!(f, "out of memory: no free region of {requested} bytes")
            }
            AllocError::InvalidPointer => write!(f, "invalid pointer: handle is not live"),
            AllocError::InvalidWrite { len, size } => {
                write!(f, "invalid write: {len} bytes into a {size}-byte region")
            }
            AllocError::OutOfBounds {
                offset,
                size,
                capacity,
            } => write!(
                f,
                "region [{offset}, {}) exceeds storage length {capacity}",
                offset + size
            ),
        }
    }
}

impl std::error::Error for AllocError {}
