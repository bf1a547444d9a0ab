//! Group-shared working memory.
//!
//! Both wrappers hand out plain `get`/`set` access to memory that several
//! lane threads of one group touch concurrently. Safety rests on the
//! barrier protocol, not on the types: between two consecutive barriers,
//! each slot has at most one writing lane, and a slot written in one
//! barrier interval is only read by other lanes after the next barrier.
//! Every kernel in this crate is written against that protocol, which is
//! why neither wrapper is exported.

use std::cell::Cell;

/// Fixed-size scratch buffer private to one work-group.
///
/// Models the on-chip shared memory a group-local kernel pass works in.
/// One buffer is allocated per group per dispatch and dropped with the
/// group's scope.
pub(crate) struct Scratch<T> {
    slots: Box<[Cell<T>]>,
}

impl<T: Copy> Scratch<T> {
    /// Allocate `len` slots, all holding `value`.
    pub(crate) fn fill(len: usize, value: T) -> Self {
        Self {
            slots: vec![Cell::new(value); len].into_boxed_slice(),
        }
    }

    pub(crate) fn get(&self, index: usize) -> T {
        self.slots[index].get()
    }

    pub(crate) fn set(&self, index: usize, value: T) {
        self.slots[index].set(value);
    }
}

// Lanes of one group share `&Scratch` across their threads. The barrier
// protocol in the module docs serializes all conflicting access.
unsafe impl<T: Send> Sync for Scratch<T> {}

/// Shared view over a host-owned output buffer.
///
/// Kernels write results through this view while the host retains the
/// allocation. Output regions are write-partitioned between lanes, so two
/// lanes never store to the same index within a dispatch.
pub(crate) struct SharedSlice<'a, T> {
    slots: &'a [Cell<T>],
}

impl<'a, T: Copy> SharedSlice<'a, T> {
    pub(crate) fn new(data: &'a mut [T]) -> Self {
        Self {
            slots: Cell::from_mut(data).as_slice_of_cells(),
        }
    }

    pub(crate) fn get(&self, index: usize) -> T {
        self.slots[index].get()
    }

    pub(crate) fn set(&self, index: usize, value: T) {
        self.slots[index].set(value);
    }
}

// Write partitioning between lanes makes concurrent `&SharedSlice` access
// race-free; reads of a slot happen on the lane that wrote it or after the
// dispatch returns.
unsafe impl<T: Send> Sync for SharedSlice<'_, T> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scratch_fill_and_access() {
        let scratch = Scratch::fill(4, 7u32);
        assert_eq!(scratch.get(3), 7);
        scratch.set(2, 42);
        assert_eq!(scratch.get(2), 42);
        assert_eq!(scratch.get(1), 7);
    }

    #[test]
    fn test_shared_slice_writes_through() {
        let mut data = vec![0u64; 3];
        {
            let view = SharedSlice::new(&mut data);
            view.set(0, 10);
            view.set(2, 30);
            assert_eq!(view.get(0), 10);
        }
        assert_eq!(data, vec![10, 0, 30]);
    }
}
