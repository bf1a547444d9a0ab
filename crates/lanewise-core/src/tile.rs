//! Serial tile assignment for oversized inputs.
//!
//! When a sequence is longer than the lane budget, each lane folds a
//! consecutive block of elements serially before any group-level pass
//! runs. The assignment below splits `n` elements over `r` lanes so that
//! every element belongs to exactly one lane, blocks are contiguous and
//! in lane order, and block lengths differ by at most one with the longer
//! blocks on the lowest lane ids.

use std::ops::Range;

/// Contiguous block of element indices owned by one lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    /// First element index of the block.
    pub start: usize,
    /// Number of elements in the block. Zero when the lane has no work.
    pub len: usize,
}

impl Tile {
    /// Block of the lane `global_id` out of `global_range` lanes covering
    /// `n` elements. The first `n % global_range` lanes receive one extra
    /// element.
    #[must_use]
    pub fn consecutive(n: usize, global_id: usize, global_range: usize) -> Self {
        let base = n / global_range;
        let rem = n % global_range;
        if global_id < rem {
            Tile {
                start: global_id * (base + 1),
                len: base + 1,
            }
        } else {
            Tile {
                start: rem * (base + 1) + (global_id - rem) * base,
                len: base,
            }
        }
    }

    /// Element indices of this block.
    #[must_use]
    pub fn indices(&self) -> Range<usize> {
        self.start..self.start + self.len
    }
}
