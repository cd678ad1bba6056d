//! Property-based tests for the heap
//!
//! Random allocate / free / resize sequences; after every step the heap must pass its own
//! consistency check and every live allocation must still hold what was written into it

use proptest::prelude::*;
use tagalloc::{ErrorKind, Heap, Ptr, ALIGN_SIZE, MIN_BLOCK_SIZE, WORD_SIZE};

#[derive(Clone, Debug)]
enum Op {
    Allocate(usize),
    Free(usize),
    Resize(usize, usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (1usize..6000).prop_map(Op::Allocate),
        2 => any::<usize>().prop_map(Op::Free),
        1 => (any::<usize>(), 0usize..6000).prop_map(|(i, size)| Op::Resize(i, size)),
    ]
}

fn pattern(seed: usize, len: usize) -> Vec<u8> {
    (0..len).map(|i| (seed * 31 + i) as u8).collect()
}

fn block_size(requested: usize) -> usize {
    let size = (requested + 2 * WORD_SIZE).max(MIN_BLOCK_SIZE);
    (size + ALIGN_SIZE - 1) / ALIGN_SIZE * ALIGN_SIZE
}

fn verify(heap: &Heap, live: &[(Ptr, Vec<u8>)]) -> Result<(), TestCaseError> {
    prop_assert_eq!(heap.check(), Ok(()));

    let mut spans = Vec::new();
    for (ptr, data) in live {
        prop_assert_eq!(ptr.offset() % ALIGN_SIZE, 0);
        prop_assert_eq!(heap.payload(*ptr), Ok(&data[..]));
        spans.push((ptr.offset(), data.len()));
    }

    spans.sort();
    for pair in spans.windows(2) {
        prop_assert!(
            pair[0].0 + pair[0].1 <= pair[1].0,
            "allocations at {:#x} and {:#x} overlap",
            pair[0].0,
            pair[1].0
        );
    }

    Ok(())
}

proptest! {
    #[test]
    fn prop_invariants_hold(ops in prop::collection::vec(op(), 1..80)) {
        let mut heap = Heap::new();
        let mut live: Vec<(Ptr, Vec<u8>)> = Vec::new();

        for (step, op) in ops.into_iter().enumerate() {
            match op {
                Op::Allocate(size) => match heap.allocate(size) {
                    Ok(ptr) => {
                        let data = pattern(step, size);
                        heap.payload_mut(ptr).unwrap().copy_from_slice(&data);
                        live.push((ptr, data));
                    }
                    Err(e) => {
                        prop_assert_eq!(e.kind(), ErrorKind::OutOfMemory);
                    }
                },
                Op::Free(i) => {
                    if live.is_empty() {
                        continue;
                    }

                    let (ptr, _) = live.swap_remove(i % live.len());
                    prop_assert_eq!(heap.free(ptr), Ok(()));
                    prop_assert!(heap.free(ptr).is_err(), "double free of {:?} went through", ptr);
                }
                Op::Resize(i, size) => {
                    if live.is_empty() {
                        continue;
                    }

                    let idx = i % live.len();
                    let (ptr, data) = live[idx].clone();
                    match heap.resize(ptr, size) {
                        Ok(Some(new)) => {
                            let keep = size.min(data.len());
                            prop_assert_eq!(&heap.payload(new).unwrap()[..keep], &data[..keep]);

                            let fresh = pattern(step, size);
                            heap.payload_mut(new).unwrap().copy_from_slice(&fresh);
                            live[idx] = (new, fresh);
                        }
                        Ok(None) => {
                            prop_assert_eq!(size, 0);
                            live.swap_remove(idx);
                        }
                        Err(e) => {
                            prop_assert_eq!(e.kind(), ErrorKind::OutOfMemory);
                        }
                    }
                }
            }

            verify(&heap, &live)?;
        }
    }

    #[test]
    fn prop_serves_smallest_fitting_block(
        sizes in prop::collection::vec(1usize..2000, 1..40),
        frees in prop::collection::vec(any::<bool>(), 40),
        requests in prop::collection::vec(1usize..2000, 1..20)
    ) {
        let mut heap = Heap::new();

        let ptrs = sizes
            .iter()
            .map(|&size| heap.allocate(size).unwrap())
            .collect::<Vec<_>>();
        for (ptr, &free) in ptrs.iter().zip(&frees) {
            if free {
                heap.free(*ptr).unwrap();
            }
        }

        for size in requests {
            let need = block_size(size);
            let expected = heap.free_blocks().find(|info| info.size >= need).map(|info| info.ptr);

            let ptr = heap.allocate(size).unwrap();
            if let Some(expected) = expected {
                prop_assert_eq!(ptr, expected);
            }
            prop_assert_eq!(heap.check(), Ok(()));
        }
    }

    #[test]
    fn prop_freeing_everything_leaves_one_block(
        (sizes, order) in (1usize..40).prop_flat_map(|n| {
            (
                prop::collection::vec(1usize..3000, n),
                Just((0..n).collect::<Vec<_>>()).prop_shuffle(),
            )
        })
    ) {
        let mut heap = Heap::new();

        let ptrs = sizes
            .iter()
            .map(|&size| heap.allocate(size).unwrap())
            .collect::<Vec<_>>();
        for i in order {
            heap.free(ptrs[i]).unwrap();
            prop_assert_eq!(heap.check(), Ok(()));
        }

        let blocks = heap.blocks().collect::<Vec<_>>();
        prop_assert_eq!(blocks.len(), 1);
        prop_assert!(!blocks[0].allocated);
        prop_assert_eq!(blocks[0].size, heap.committed() - 2 * WORD_SIZE);
        prop_assert_eq!(heap.free_blocks().count(), 1);
    }
}
