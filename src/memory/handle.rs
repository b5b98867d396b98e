/// Capability naming one occupied region of a [`BufferArena`].
///
/// A handle is an opaque `(slot, generation)` pair resolved through the arena
/// that issued it, not a direct reference into the region sequence. The slot
/// index is stable across structural edits (split, coalesce, compaction), and
/// the generation is bumped whenever the slot's region is freed or vacated,
/// so a stale handle — double free, use after free, a handle from a different
/// lifetime of the slot — is rejected with `InvalidPointer` instead of
/// silently aliasing someone else's bytes.
///
/// Handles to occupied regions remain valid across [`BufferArena::compact`]:
/// compaction rewrites the region's offset in place and leaves the slot and
/// generation untouched.
///
/// [`BufferArena`]: super::arena::BufferArena
/// [`BufferArena::compact`]: super::arena::BufferArena::compact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    pub(crate) slot: u32,
    pub(crate) generation: u32,
}

impl Handle {
    pub(crate) fn new(slot: u32, generation: u32) -> Self {
        Self { slot, generation }
    }
}
