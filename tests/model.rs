//! Model-based test: drive random operation sequences against a naive
//! mirror of the allocator's contract and check that arena contents and
//! byte accounting never drift.

use bufalloc::{AllocError, BufferArena, Handle};
use proptest::prelude::*;

const CAPACITY: usize = 64;

#[derive(Debug, Clone)]
enum Op {
    Alloc(usize),
    Free(usize),
    Rewrite(usize),
    Compact,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0usize..24).prop_map(Op::Alloc),
        3 => (0usize..16).prop_map(Op::Free),
        2 => (0usize..16).prop_map(Op::Rewrite),
        1 => Just(Op::Compact),
    ]
}

proptest! {
    #[test]
    fn arena_matches_model(ops in proptest::collection::vec(op_strategy(), 1..80)) {
        let mut arena = BufferArena::new(CAPACITY);
        // Live handles with the exact bytes we last wrote through them.
        let mut live: Vec<(Handle, Vec<u8>)> = Vec::new();
        let mut fill = 0u8;

        for op in ops {
            match op {
                Op::Alloc(size) => match arena.alloc(size) {
                    Ok(handle) => {
                        fill = fill.wrapping_add(1);
                        let pattern = vec![fill; size];
                        arena.write(handle, &pattern).unwrap();
                        live.push((handle, pattern));
                    }
                    Err(AllocError::OutOfMemory { requested }) => {
                        prop_assert_eq!(requested, size);
                        // OutOfMemory is legitimate exactly when no single
                        // free region can hold the request.
                        prop_assert!(arena.stats().largest_free < size);
                    }
                    Err(other) => prop_assert!(false, "unexpected alloc error: {other}"),
                },
                Op::Free(pick) => {
                    if !live.is_empty() {
                        let (handle, _) = live.remove(pick % live.len());
                        arena.free(handle).unwrap();
                        // Freed exactly once; a second free must fail.
                        prop_assert_eq!(arena.free(handle), Err(AllocError::InvalidPointer));
                    }
                }
                Op::Rewrite(pick) => {
                    if !live.is_empty() {
                        let index = pick % live.len();
                        fill = fill.wrapping_add(1);
                        let fresh = vec![fill; live[index].1.len()];
                        arena.write(live[index].0, &fresh).unwrap();
                        live[index].1 = fresh;
                    }
                }
                Op::Compact => arena.compact(),
            }

            // Capacity conservation and byte accounting after every step.
            let stats = arena.stats();
            prop_assert_eq!(stats.live_bytes + stats.free_bytes, CAPACITY);
            let expected_live: usize = live.iter().map(|(_, p)| p.len()).sum();
            prop_assert_eq!(stats.live_bytes, expected_live);

            // No operation may disturb the bytes behind any other handle.
            for (handle, pattern) in &live {
                prop_assert_eq!(&arena.read(*handle).unwrap(), pattern);
            }
        }

        // Freeing everything collapses the arena back to one free region.
        for (handle, _) in live.drain(..) {
            arena.free(handle).unwrap();
        }
        let stats = arena.stats();
        prop_assert_eq!(stats.free_bytes, CAPACITY);
        prop_assert_eq!(stats.free_regions, 1);
    }
}
