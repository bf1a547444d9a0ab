//! Lanewise: work-group data-parallel primitives
//!
//! This crate implements the kernel layer of a data-parallel algorithms
//! library on a two-level execution hierarchy: lanes grouped into
//! work-groups, with groups running independently and lanes within a group
//! synchronizing through a barrier. The same decomposition used by GPU
//! work-group kernels is executed here on CPU threads, which keeps the
//! barrier discipline and memory protocol honest instead of simulated.
//!
//! Provided primitives:
//! - Reduction and transform-reduction over a slice
//! - Inclusive and exclusive prefix scans with cross-group carry
//!   propagation, plus transform variants
//! - Stable predicate compaction (`copy_if`) and stable two-way
//!   `partition`
//! - Sorted-sequence multiset operations: `includes`, `set_difference`,
//!   `set_intersection` (duplicate-count semantics)
//! - Search kernels: `any_of`, `find`, `find_if`, `search`, `search_n`,
//!   `find_first_of`
//! - Elementwise kernels: `for_each`, `transform`, `zip_with`,
//!   `adjacent_difference`, `reverse`, `reverse_copy`, `rotate_copy`
//!
//! # Execution model
//!
//! A [`Device`] owns the launch geometry: group size, total lane budget,
//! and whether group-collective shortcuts are enabled. Each dispatched
//! group gets a private scratch buffer and a real barrier; lanes are
//! scoped threads, and independent groups run on a thread pool. Kernels
//! observe their position through the [`WorkItem`] capability and never
//! consult global state directly, so the decomposition logic is identical
//! whether one group or many are in flight.
//!
//! # Example
//!
//! ```
//! use lanewise_core::{Device, DeviceConfig};
//!
//! let device = Device::new(DeviceConfig::default()).expect("config is valid");
//! let data: Vec<u64> = (1..=100).collect();
//!
//! let total = lanewise_core::reduce(&device, &data, |a: u64, b: u64| a + b)
//!     .expect("dispatch")
//!     .expect("input is nonempty");
//! assert_eq!(total, 5050);
//!
//! let mut prefix = vec![0u64; data.len()];
//! lanewise_core::inclusive_scan(&device, &data, &mut prefix, lanewise_core::Plus, None)
//!     .expect("dispatch");
//! assert_eq!(prefix[99], 5050);
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod combine;
pub mod config;
pub mod device;
pub mod elementwise;
pub mod error;
pub mod mask;
pub mod matchers;
pub mod reduce;
pub mod reference;
pub mod scan;
pub mod setops;
pub mod tile;
pub mod workitem;

mod local_ops;
mod memory;

pub use combine::{CombineOp, KernelValue, Max, Min, Plus, Times};
pub use config::DeviceConfig;
pub use device::{Device, Lane};
pub use elementwise::{
    adjacent_difference, for_each, reverse, reverse_copy, rotate_copy, transform, zip_with,
};
pub use error::{DeviceError, Result};
pub use mask::{copy_if, partition};
pub use matchers::{any_of, find, find_first_of, find_if, search, search_n};
pub use reduce::{reduce, transform_reduce};
pub use scan::{exclusive_scan, inclusive_scan, transform_exclusive_scan, transform_inclusive_scan};
pub use setops::{includes, set_difference, set_intersection};
pub use tile::Tile;
pub use workitem::WorkItem;
