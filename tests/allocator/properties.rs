//! Randomized allocator properties.
//!
//! Random allocate/free sequences (no double-frees, no mid-block frees)
//! must keep the partition gap-free, overlap-free, and eagerly coalesced,
//! and allocation must stay first-fit deterministic.

use proptest::prelude::*;

use pl0vm_foundation::Heap;
use pl0vm_machine::allocator::{allocate, first_fit, free};

const CAPACITY: usize = 64;

#[derive(Clone, Debug)]
enum Command {
    /// Allocate this many cells (ignored when nothing fits).
    Allocate(usize),
    /// Free the n-th live allocation, if any.
    Free(usize),
}

fn command() -> impl Strategy<Value = Command> {
    prop_oneof![
        (1usize..=16).prop_map(Command::Allocate),
        (0usize..8).prop_map(Command::Free),
    ]
}

/// The lowest-addressed free block that fits, computed independently of the
/// allocator's own scan order.
fn lowest_fit(heap: &Heap, count: usize) -> Option<usize> {
    heap.blocks
        .iter()
        .filter(|block| block.free && block.size >= count)
        .map(|block| block.index)
        .min()
}

fn assert_partition(heap: &Heap) {
    let mut expected_start = 0;
    let mut previous_free = false;
    for block in &heap.blocks {
        assert_eq!(block.index, expected_start);
        assert_eq!(block.values.len(), block.size);
        assert!(!(previous_free && block.free));
        expected_start = block.end();
        previous_free = block.free;
    }
    assert_eq!(expected_start, heap.capacity);
}

proptest! {
    #[test]
    fn random_sequences_preserve_the_partition(commands in prop::collection::vec(command(), 1..64)) {
        let mut heap = Heap::new(CAPACITY);
        let mut live: Vec<usize> = Vec::new();

        for command in commands {
            match command {
                Command::Allocate(count) => {
                    let predicted = first_fit(&heap, count);
                    let lowest = lowest_fit(&heap, count);
                    let address = allocate(&mut heap, count);
                    // First-fit determinism: the pure probe, an independent
                    // lowest-fit scan, and the real allocation all agree.
                    prop_assert_eq!(predicted, address);
                    prop_assert_eq!(lowest, address);
                    if let Some(address) = address {
                        live.push(address);
                    }
                }
                Command::Free(choice) => {
                    if live.is_empty() {
                        continue;
                    }
                    let address = live.remove(choice % live.len());
                    prop_assert!(free(&mut heap, address as i64).is_ok());
                }
            }
            assert_partition(&heap);
        }

        // Freeing everything restores the single free block.
        for address in live {
            prop_assert!(free(&mut heap, address as i64).is_ok());
            assert_partition(&heap);
        }
        prop_assert_eq!(heap.blocks.len(), 1);
        prop_assert!(heap.blocks[0].free);
    }
}

proptest! {
    #[test]
    fn allocate_always_returns_the_lowest_fit(sizes in prop::collection::vec(1usize..=8, 1..12)) {
        let mut heap = Heap::new(CAPACITY);
        let mut live = Vec::new();
        for size in &sizes {
            if let Some(address) = allocate(&mut heap, *size) {
                live.push(address);
            }
        }
        // Free every other allocation to open holes.
        for address in live.iter().copied().step_by(2) {
            free(&mut heap, address as i64).unwrap();
        }
        assert_partition(&heap);

        for count in 1..=8 {
            prop_assert_eq!(first_fit(&heap, count), lowest_fit(&heap, count));
        }
    }
}
