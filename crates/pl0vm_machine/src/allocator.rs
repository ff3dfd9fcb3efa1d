//! First-fit heap allocation over an address-ordered block partition.
//!
//! The heap is a gap-free partition of `[0, capacity)` into blocks. Allocation
//! scans for the lowest-addressed free block that fits and splits it when it
//! is larger than needed; freeing coalesces with free neighbors eagerly, so
//! two adjacent free blocks never coexist. Keeping the partition minimal and
//! deterministic is what lets the explanation layer predict the exact address
//! an allocation will produce.
//!
//! Mutating operations live next to their pure probes ([`first_fit`],
//! [`free_target`], [`write_status`]); the probes answer "what would happen"
//! without touching the heap.

use thiserror::Error;

use pl0vm_foundation::{ErrorKind, Heap, HeapBlock};

/// A failed heap cell access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HeapAccessError {
    /// The address lies outside `[0, capacity)`.
    #[error("heap address {address} is out of range")]
    OutOfRange {
        /// The requested address.
        address: i64,
    },
    /// The address lies inside a free block.
    #[error("heap address {address} is not allocated")]
    Unallocated {
        /// The requested address.
        address: i64,
    },
}

impl From<HeapAccessError> for ErrorKind {
    fn from(err: HeapAccessError) -> Self {
        match err {
            HeapAccessError::OutOfRange { address } => ErrorKind::HeapOutOfRange { address },
            HeapAccessError::Unallocated { address } => ErrorKind::HeapUnallocated { address },
        }
    }
}

/// The block a [`free`] call would release: its start address and size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreedBlock {
    /// Start address of the freed block.
    pub index: usize,
    /// Number of cells in the freed block (before coalescing).
    pub size: usize,
}

/// Allocates `count` contiguous cells, first-fit.
///
/// Returns the start address of the allocated block, or `None` when no free
/// block is large enough. A larger block is split in place: the allocated
/// part keeps the block's start address and the zero-filled remainder stays
/// free right behind it.
pub fn allocate(heap: &mut Heap, count: usize) -> Option<usize> {
    let position = heap
        .blocks
        .iter()
        .position(|block| block.free && block.size >= count)?;

    let block = &mut heap.blocks[position];
    let address = block.index;

    if block.size == count {
        block.free = false;
        block.values.fill(0);
    } else {
        let remainder = HeapBlock {
            index: block.index + count,
            size: block.size - count,
            free: true,
            values: block.values.split_off(count),
        };
        block.size = count;
        block.free = false;
        block.values.fill(0);
        heap.blocks.insert(position + 1, remainder);
    }

    Some(address)
}

/// Frees the allocated block starting exactly at `address`.
///
/// Coalesces with the preceding and following blocks when they are free,
/// producing at most one merged free block. Freeing into the middle of a
/// block is an error, not a partial free.
///
/// # Errors
///
/// Returns the offending address when no allocated block starts there; the
/// caller reports this as a warning and keeps executing.
pub fn free(heap: &mut Heap, address: i64) -> Result<FreedBlock, i64> {
    let position = free_position(heap, address).ok_or(address)?;

    let freed = FreedBlock {
        index: heap.blocks[position].index,
        size: heap.blocks[position].size,
    };
    heap.blocks[position].free = true;

    // Coalesce [first, last] into one free block.
    let first = if position > 0 && heap.blocks[position - 1].free {
        position - 1
    } else {
        position
    };
    let last = if position + 1 < heap.blocks.len() && heap.blocks[position + 1].free {
        position + 1
    } else {
        position
    };

    if first != last {
        let merged_values: Vec<i64> = heap.blocks[first..=last]
            .iter()
            .flat_map(|block| block.values.iter().copied())
            .collect();
        let merged = HeapBlock {
            index: heap.blocks[first].index,
            size: merged_values.len(),
            free: true,
            values: merged_values,
        };
        heap.blocks.splice(first..=last, [merged]);
    }

    Ok(freed)
}

/// Reads the value at `address`.
///
/// # Errors
///
/// [`HeapAccessError::OutOfRange`] when no block contains the address,
/// [`HeapAccessError::Unallocated`] when the owning block is free.
pub fn read_cell(heap: &Heap, address: i64) -> Result<i64, HeapAccessError> {
    let (block, offset) = owning_block(heap, address)?;
    Ok(block.values[offset])
}

/// Writes `value` at `address`.
///
/// # Errors
///
/// Same conditions as [`read_cell`].
pub fn write_cell(heap: &mut Heap, address: i64, value: i64) -> Result<(), HeapAccessError> {
    let cell = to_address(address).ok_or(HeapAccessError::OutOfRange { address })?;
    let block = heap
        .blocks
        .iter_mut()
        .find(|block| block.contains(cell))
        .ok_or(HeapAccessError::OutOfRange { address })?;
    if block.free {
        return Err(HeapAccessError::Unallocated { address });
    }
    block.values[cell - block.index] = value;
    Ok(())
}

/// Pure probe: the address [`allocate`] would return for `count` cells.
#[must_use]
pub fn first_fit(heap: &Heap, count: usize) -> Option<usize> {
    heap.blocks
        .iter()
        .find(|block| block.free && block.size >= count)
        .map(|block| block.index)
}

/// Pure probe: the block [`free`] would release for `address`, if any.
#[must_use]
pub fn free_target(heap: &Heap, address: i64) -> Option<FreedBlock> {
    free_position(heap, address).map(|position| FreedBlock {
        index: heap.blocks[position].index,
        size: heap.blocks[position].size,
    })
}

/// Pure probe: whether [`write_cell`] at `address` would succeed.
///
/// # Errors
///
/// Same conditions as [`read_cell`].
pub fn write_status(heap: &Heap, address: i64) -> Result<(), HeapAccessError> {
    owning_block(heap, address).map(|_| ())
}

fn to_address(address: i64) -> Option<usize> {
    usize::try_from(address).ok()
}

fn free_position(heap: &Heap, address: i64) -> Option<usize> {
    let address = to_address(address)?;
    heap.blocks
        .iter()
        .position(|block| block.index == address && !block.free)
}

fn owning_block(heap: &Heap, address: i64) -> Result<(&HeapBlock, usize), HeapAccessError> {
    let cell = to_address(address).ok_or(HeapAccessError::OutOfRange { address })?;
    let block = heap
        .blocks
        .iter()
        .find(|block| block.contains(cell))
        .ok_or(HeapAccessError::OutOfRange { address })?;
    if block.free {
        return Err(HeapAccessError::Unallocated { address });
    }
    Ok((block, cell - block.index))
}
