//! Error types for device configuration and kernel dispatch.

use thiserror::Error;

/// Errors surfaced by the device layer.
///
/// Kernel code itself has no error channel: a lane that panics breaks its
/// group barrier and the whole dispatch reports [`DeviceError::DispatchFailed`]
/// with the panic payload. Violated data preconditions (unsorted inputs to
/// the set operations, undersized outputs) either produce incorrect results
/// or surface the same way; they are not individually detected.
#[derive(Error, Debug)]
pub enum DeviceError {
    /// Group size must be a nonzero power of two so the tree sweeps pair
    /// lanes cleanly.
    #[error("invalid group size {0}: must be a nonzero power of two")]
    InvalidGroupSize(usize),

    /// The lane budget must admit at least one full group.
    #[error("lane budget {budget} is smaller than group size {group_size}")]
    BudgetTooSmall { budget: usize, group_size: usize },

    /// Configuration could not be read or parsed.
    #[error("failed to load device config: {0}")]
    ConfigLoad(String),

    /// A lane panicked during kernel execution. Sibling lanes were released
    /// from the barrier and the dispatch result was discarded.
    #[error("dispatch failed: {0}")]
    DispatchFailed(String),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DeviceError>;
