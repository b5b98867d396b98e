//! Process-global diagnostic counters, aggregated across every live
//! [`BufferArena`](super::arena::BufferArena).
//!
//! All counters use `Relaxed` ordering and are for diagnostic display only.
//! Cross-counter snapshots may be transiently inconsistent. Do NOT use these
//! values for allocation decisions; per-arena answers come from
//! [`BufferArena::stats`](super::arena::BufferArena::stats).

use std::sync::atomic::{AtomicUsize, Ordering};

/// Diagnostic-only gauge counter.
pub struct Counter(AtomicUsize);

impl Counter {
    pub const fn new() -> Self {
        Self(AtomicUsize::new(0))
    }

    #[inline]
    pub fn add(&self, val: usize) {
        self.0.fetch_add(val, Ordering::Relaxed);
    }

    /// Best-effort subtract: clamps at zero instead of wrapping.
    #[inline]
    pub fn sub(&self, val: usize) {
        let _ = self
            .0
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |cur| {
                Some(cur.saturating_sub(val))
            });
    }

    #[inline]
    pub fn get(&self) -> usize {
        self.0.load(Ordering::Relaxed)
    }
}

impl Default for Counter {
    fn default() -> Self {
        Self::new()
    }
}

// Total storage bytes owned by live arenas.
pub static TOTAL_ARENA_BYTES: Counter = Counter::new();
// Total bytes currently handed out to callers across all arenas.
pub static TOTAL_LIVE_BYTES: Counter = Counter::new();
