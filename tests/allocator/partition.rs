//! Partition-shape tests: the heap always covers `[0, capacity)` exactly.

use pl0vm_foundation::Heap;
use pl0vm_machine::allocator::{allocate, first_fit, free, read_cell, write_cell};

/// Asserts the structural invariants of the partition: sorted, gap-free,
/// covering, eagerly coalesced, with consistent value storage.
fn assert_partition(heap: &Heap) {
    let mut expected_start = 0;
    let mut previous_free = false;

    for (position, block) in heap.blocks.iter().enumerate() {
        assert_eq!(
            block.index, expected_start,
            "block {position} does not start where the previous one ended"
        );
        assert_eq!(
            block.values.len(),
            block.size,
            "block {position} has inconsistent value storage"
        );
        assert!(
            !(previous_free && block.free),
            "blocks {} and {position} are adjacent and both free",
            position - 1
        );
        expected_start = block.end();
        previous_free = block.free;
    }

    assert_eq!(expected_start, heap.capacity, "partition does not cover the heap");
}

#[test]
fn fresh_heap_is_one_free_block() {
    let heap = Heap::new(10);
    assert_partition(&heap);
    assert_eq!(heap.blocks.len(), 1);
    assert!(heap.blocks[0].free);
}

#[test]
fn allocate_then_free_restores_the_partition() {
    // Capacity 10, one free block; NEW 4 allocates [0,4); DEL 0 restores it.
    let mut heap = Heap::new(10);
    assert_eq!(allocate(&mut heap, 4), Some(0));
    assert_partition(&heap);
    assert_eq!(heap.blocks.len(), 2);
    assert!(!heap.blocks[0].free);
    assert_eq!(heap.blocks[0].size, 4);
    assert!(heap.blocks[1].free);
    assert_eq!(heap.blocks[1].index, 4);
    assert_eq!(heap.blocks[1].size, 6);

    free(&mut heap, 0).unwrap();
    assert_partition(&heap);
    assert_eq!(heap.blocks.len(), 1);
    assert!(heap.blocks[0].free);
    assert_eq!(heap.blocks[0].size, 10);
}

#[test]
fn interleaved_alloc_free_keeps_the_partition() {
    let mut heap = Heap::new(32);
    let a = allocate(&mut heap, 8).unwrap();
    let b = allocate(&mut heap, 8).unwrap();
    let c = allocate(&mut heap, 8).unwrap();
    assert_partition(&heap);

    free(&mut heap, a as i64).unwrap();
    assert_partition(&heap);
    free(&mut heap, c as i64).unwrap();
    assert_partition(&heap);

    // The hole at [a, a+8) is the lowest fit for a 4-cell request.
    assert_eq!(first_fit(&heap, 4), Some(a));
    assert_eq!(allocate(&mut heap, 4), Some(a));
    assert_partition(&heap);

    free(&mut heap, b as i64).unwrap();
    assert_partition(&heap);
    free(&mut heap, a as i64).unwrap();
    assert_partition(&heap);
}

#[test]
fn coalescing_in_either_order_matches_simultaneous() {
    let mut ab = Heap::new(16);
    allocate(&mut ab, 8).unwrap();
    allocate(&mut ab, 8).unwrap();
    let mut ba = ab.clone();

    free(&mut ab, 0).unwrap();
    free(&mut ab, 8).unwrap();
    free(&mut ba, 8).unwrap();
    free(&mut ba, 0).unwrap();

    assert_partition(&ab);
    assert_partition(&ba);
    assert_eq!(ab.blocks.len(), 1);
    assert_eq!(ab, ba);
}

#[test]
fn values_survive_while_allocated() {
    let mut heap = Heap::new(16);
    let a = allocate(&mut heap, 4).unwrap() as i64;
    let b = allocate(&mut heap, 4).unwrap() as i64;

    for offset in 0..4 {
        write_cell(&mut heap, a + offset, 100 + offset).unwrap();
        write_cell(&mut heap, b + offset, 200 + offset).unwrap();
    }
    free(&mut heap, a).unwrap();

    for offset in 0..4 {
        assert_eq!(read_cell(&heap, b + offset), Ok(200 + offset));
        assert!(read_cell(&heap, a + offset).is_err());
    }
}
