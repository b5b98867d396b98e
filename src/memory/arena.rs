use fixedbitset::FixedBitSet;
use tracing::{debug, trace};

use super::error::AllocError;
use super::handle::Handle;
use super::region::Region;
use super::stats;

/// Sentinel generation indicating a permanently retired slot.
///
/// A slot whose generation saturates at `u32::MAX` has been recycled ~4
/// billion times; it is dropped from the vacant list and never handed out
/// again, which avoids the ABA hazard of wrapping back to an old generation.
const GENERATION_RETIRED: u32 = u32::MAX;

/// One entry of the slot table. Hosts a region while its id is in the
/// arena's offset-ordered sequence; vacant (awaiting reuse) otherwise.
struct Slot {
    region: Region,
    generation: u32,
}

/// First-fit allocator over a single fixed-length byte buffer.
///
/// The storage is exactly partitioned by an offset-ordered sequence of
/// regions, each free or occupied. Regions live in a stable-index slot
/// table; the sequence is a separate ordered list of slot ids, so structural
/// edits (split, coalesce, compaction) never move a region out from under a
/// live [`Handle`]. Slot generations are bumped on free and on reuse, which
/// turns double frees and stale handles into [`AllocError::InvalidPointer`]
/// instead of aliased state.
///
/// Single-threaded by design: no internal locking, no background activity.
/// Compaction runs only when [`compact`](Self::compact) is called.
pub struct BufferArena {
    storage: Vec<u8>,
    slots: Vec<Slot>,
    /// Slot ids in offset order. This is the region sequence: contiguous,
    /// exhaustive over the storage, never two adjacent free regions after a
    /// public operation completes.
    order: Vec<u32>,
    /// Vacant slot ids available for reuse.
    vacant: Vec<u32>,
    /// Bytes currently handed out. Mirrors the occupied sizes in `order`.
    live_bytes: usize,
}

/// Point-in-time snapshot of one arena's bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArenaStats {
    pub capacity: usize,
    pub live_bytes: usize,
    pub free_bytes: usize,
    pub live_regions: usize,
    pub free_regions: usize,
    /// Largest single free region. An allocation strictly larger than this
    /// fails with `OutOfMemory` even when `free_bytes` would cover it.
    pub largest_free: usize,
}

impl BufferArena {
    /// Create an arena over `capacity` zero-filled bytes, with one free
    /// region spanning the whole storage.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self::with_storage(vec![0; capacity])
    }

    /// Adopt an existing buffer as the arena storage. Resident bytes are
    /// preserved; they become visible through handles until overwritten.
    #[must_use]
    pub fn with_storage(storage: Vec<u8>) -> Self {
        let capacity = storage.len();
        let mut arena = Self {
            storage,
            slots: Vec::new(),
            order: Vec::new(),
            vacant: Vec::new(),
            live_bytes: 0,
        };
        let root = arena.take_slot(Region::new(0, capacity, true));
        arena.order.push(root);
        stats::TOTAL_ARENA_BYTES.add(capacity);
        arena
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Raw view of the arena storage, free and occupied spans alike.
    #[must_use]
    pub fn storage(&self) -> &[u8] {
        &self.storage
    }

    /// Allocate `size` bytes.
    ///
    /// Placement is first-fit: the sequence is scanned in offset order and
    /// the first free region of at least `size` bytes is taken. An exact-fit
    /// region is flipped to occupied as-is; a larger region is split, with
    /// the occupied piece at the lower offset and the leftover free piece
    /// inserted immediately after it. First-fit trades fragmentation for
    /// simplicity — callers must not assume minimal fragmentation.
    ///
    /// # Errors
    ///
    /// Returns `OutOfMemory` if no free region of sufficient size exists.
    pub fn alloc(&mut self, size: usize) -> Result<Handle, AllocError> {
        for pos in 0..self.order.len() {
            let id = self.order[pos];
            let (r_offset, r_size, r_free) = {
                let r = &self.slots[id as usize].region;
                (r.offset, r.size, r.free)
            };
            if !r_free || r_size < size {
                continue;
            }

            if r_size > size {
                // Split: the leftover free piece covers the high end of the
                // old span and sits right after the occupied piece.
                let leftover = self.take_slot(Region::new(r_offset + size, r_size - size, true));
                self.order.insert(pos + 1, leftover);
            }

            let slot = &mut self.slots[id as usize];
            slot.region.size = size;
            slot.region.free = false;
            let handle = Handle::new(id, slot.generation);

            self.live_bytes += size;
            stats::TOTAL_LIVE_BYTES.add(size);
            trace!(size, offset = r_offset, "alloc");
            self.audit();
            return Ok(handle);
        }

        trace!(size, "alloc failed, no free region large enough");
        Err(AllocError::OutOfMemory { requested: size })
    }

    /// Return the bytes behind `handle` to the arena and coalesce adjacent
    /// free regions. The handle is invalid afterwards.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPointer` if the handle does not name a live region
    /// of this arena — including a second free of the same handle.
    pub fn free(&mut self, handle: Handle) -> Result<(), AllocError> {
        self.resolve(handle)?;

        let slot = &mut self.slots[handle.slot as usize];
        slot.region.free = true;
        // Invalidate the handle. The slot keeps hosting the (now free)
        // region; the id is only recycled once the region itself is dropped.
        slot.generation = slot.generation.saturating_add(1);
        let size = slot.region.size;

        self.live_bytes -= size;
        stats::TOTAL_LIVE_BYTES.sub(size);
        self.coalesce();
        trace!(size, "free");
        self.audit();
        Ok(())
    }

    /// Relocate every occupied region to a contiguous prefix of the storage,
    /// leaving all free space as a single trailing free region (or none, if
    /// the arena is fully occupied).
    ///
    /// Regions are mutated in place: handles to occupied regions stay valid
    /// and observe the new offsets. Only the physical placement changes —
    /// no bytes become allocated or freed.
    pub fn compact(&mut self) {
        let capacity = self.storage.len();
        let mut cursor = 0usize;
        let mut kept: Vec<u32> = Vec::with_capacity(self.order.len());
        let mut dropped: Vec<u32> = Vec::new();
        let mut moved_bytes = 0usize;

        for &id in &self.order {
            let (offset, size, free) = {
                let r = &self.slots[id as usize].region;
                (r.offset, r.size, r.free)
            };
            if free {
                dropped.push(id);
                continue;
            }
            if offset != cursor {
                // The ranges overlap whenever the region slides backward by
                // less than its own length; copy_within is a move, so the
                // source is never clobbered mid-copy.
                self.storage.copy_within(offset..offset + size, cursor);
                self.slots[id as usize].region.offset = cursor;
                moved_bytes += size;
            }
            cursor += size;
            kept.push(id);
        }

        self.order = kept;
        for id in dropped {
            self.release_slot(id);
        }
        if cursor < capacity {
            let tail = self.take_slot(Region::new(cursor, capacity - cursor, true));
            self.order.push(tail);
        }

        debug!(live_bytes = cursor, moved_bytes, "compact");
        self.audit();
    }

    /// Copy out the bytes behind `handle`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPointer` for a stale or foreign handle, `OutOfBounds`
    /// if the region's span somehow exceeds the storage.
    pub fn read(&self, handle: Handle) -> Result<Vec<u8>, AllocError> {
        self.resolve(handle)?.read(&self.storage)
    }

    /// Overwrite the first `value.len()` bytes behind `handle`. Short writes
    /// leave the remainder of the span untouched.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPointer` for a stale or foreign handle and
    /// `InvalidWrite` if `value` is longer than the region.
    pub fn write(&mut self, handle: Handle, value: &[u8]) -> Result<(), AllocError> {
        let region = self.resolve(handle)?.clone();
        region.write(&mut self.storage, value)
    }

    #[must_use]
    pub fn stats(&self) -> ArenaStats {
        let mut out = ArenaStats {
            capacity: self.storage.len(),
            live_bytes: 0,
            free_bytes: 0,
            live_regions: 0,
            free_regions: 0,
            largest_free: 0,
        };
        for &id in &self.order {
            let region = &self.slots[id as usize].region;
            if region.free {
                out.free_bytes += region.size;
                out.free_regions += 1;
                out.largest_free = out.largest_free.max(region.size);
            } else {
                out.live_bytes += region.size;
                out.live_regions += 1;
            }
        }
        out
    }

    /// Resolve a handle against the slot table.
    ///
    /// A handle is live iff its slot exists, the generations match, and the
    /// hosted region is occupied. Every transition away from "occupied on
    /// behalf of this handle" bumps the generation, so all three checks
    /// reduce to cheap comparisons.
    fn resolve(&self, handle: Handle) -> Result<&Region, AllocError> {
        let slot = self
            .slots
            .get(handle.slot as usize)
            .ok_or(AllocError::InvalidPointer)?;
        if slot.generation != handle.generation || slot.region.free {
            return Err(AllocError::InvalidPointer);
        }
        Ok(&slot.region)
    }

    /// Merge each maximal run of consecutive free regions into its first
    /// member.
    ///
    /// Single pass over the sequence: a free region whose kept predecessor
    /// is also free is folded into that predecessor (offsets are ordered, so
    /// the predecessor already holds the lowest offset of the run) and its
    /// slot is vacated.
    fn coalesce(&mut self) {
        let mut kept: Vec<u32> = Vec::with_capacity(self.order.len());
        let mut merged: Vec<u32> = Vec::new();

        for &id in &self.order {
            if self.slots[id as usize].region.free {
                if let Some(&prev) = kept.last() {
                    if self.slots[prev as usize].region.free {
                        let extra = self.slots[id as usize].region.size;
                        self.slots[prev as usize].region.size += extra;
                        merged.push(id);
                        continue;
                    }
                }
            }
            kept.push(id);
        }

        self.order = kept;
        for id in merged {
            self.release_slot(id);
        }
    }

    fn take_slot(&mut self, region: Region) -> u32 {
        if let Some(id) = self.vacant.pop() {
            self.slots[id as usize].region = region;
            return id;
        }
        assert!(
            self.slots.len() < GENERATION_RETIRED as usize,
            "BufferArena: slot table exhausted"
        );
        let id = self.slots.len() as u32;
        self.slots.push(Slot {
            region,
            generation: 0,
        });
        id
    }

    fn release_slot(&mut self, id: u32) {
        let slot = &mut self.slots[id as usize];
        slot.generation = slot.generation.saturating_add(1);
        if slot.generation != GENERATION_RETIRED {
            self.vacant.push(id);
        }
        // A retired slot stays out of the vacant list forever; its region
        // entry is dead weight, which is acceptable at this scale.
    }

    fn audit(&self) {
        if cfg!(debug_assertions) {
            self.check_invariants();
        }
    }

    /// Verify the sequence invariant: offset-contiguous, exhaustive over the
    /// storage, no two adjacent free regions, byte-accurate accounting.
    ///
    /// # Panics
    ///
    /// Panics if any invariant is violated. Run after every mutating public
    /// operation in debug builds.
    pub(crate) fn check_invariants(&self) {
        let capacity = self.storage.len();
        let mut coverage = FixedBitSet::with_capacity(capacity);
        let mut expected_offset = 0usize;
        let mut prev_free = false;
        let mut live = 0usize;

        for (pos, &id) in self.order.iter().enumerate() {
            let region = &self.slots[id as usize].region;
            assert_eq!(
                region.offset, expected_offset,
                "sequence not offset-contiguous at position {pos}"
            );
            assert!(
                region.fits_in(capacity),
                "region [{}, {}) exceeds storage length {capacity}",
                region.offset,
                region.end()
            );
            assert!(
                !(pos > 0 && prev_free && region.free),
                "adjacent free regions at position {pos}"
            );
            for byte in region.offset..region.end() {
                assert!(!coverage.put(byte), "byte {byte} covered twice");
            }
            if !region.free {
                live += region.size;
            }
            prev_free = region.free;
            expected_offset = region.end();
        }

        assert_eq!(
            expected_offset, capacity,
            "sequence does not cover the storage"
        );
        assert_eq!(coverage.count_ones(..), capacity, "coverage gap");
        assert_eq!(live, self.live_bytes, "live byte accounting drifted");
    }
}

impl Drop for BufferArena {
    fn drop(&mut self) {
        stats::TOTAL_ARENA_BYTES.sub(self.storage.len());
        stats::TOTAL_LIVE_BYTES.sub(self.live_bytes);
    }
}
