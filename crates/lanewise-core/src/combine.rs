//! Combining operations for the reduce and scan kernels.
//!
//! Kernels take operations by value and move elements by copy, so any
//! `Fn(T, T) -> T` closure works directly. The named operations below
//! additionally expose their identity element, which lets a device with
//! collective passes enabled pick the uniform group-wide variant of a
//! kernel; closures fall back to the guarded tree variant.

use num_traits::{Bounded, One, Zero};

/// Element type that kernels move between lanes.
pub trait KernelValue: Copy + Send + Sync + 'static {}

impl<T: Copy + Send + Sync + 'static> KernelValue for T {}

/// Associative binary combination.
///
/// Kernels reassociate freely across lanes, groups, and serial tiles, but
/// always combine in sequence order. Associativity is required for correct
/// results; commutativity is not.
pub trait CombineOp<T>: Send + Sync {
    fn combine(&self, a: T, b: T) -> T;

    /// Identity element of the operation, when one is known.
    ///
    /// Kernels that know the identity may fill slack scratch slots with it
    /// and drop per-lane range guards from the group-wide passes. Returning
    /// `None` keeps every pass guarded.
    fn identity(&self) -> Option<T> {
        None
    }
}

impl<T, F> CombineOp<T> for F
where
    F: Fn(T, T) -> T + Send + Sync,
{
    fn combine(&self, a: T, b: T) -> T {
        self(a, b)
    }
}

/// Addition, identity zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct Plus;

impl<T> CombineOp<T> for Plus
where
    T: Zero + Copy + Send + Sync,
{
    fn combine(&self, a: T, b: T) -> T {
        a + b
    }

    fn identity(&self) -> Option<T> {
        Some(T::zero())
    }
}

/// Multiplication, identity one.
#[derive(Debug, Clone, Copy, Default)]
pub struct Times;

impl<T> CombineOp<T> for Times
where
    T: One + Copy + Send + Sync,
{
    fn combine(&self, a: T, b: T) -> T {
        a * b
    }

    fn identity(&self) -> Option<T> {
        Some(T::one())
    }
}

/// Minimum of totally ordered values, identity `T::max_value()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Min;

impl<T> CombineOp<T> for Min
where
    T: Ord + Bounded + Copy + Send + Sync,
{
    fn combine(&self, a: T, b: T) -> T {
        a.min(b)
    }

    fn identity(&self) -> Option<T> {
        Some(T::max_value())
    }
}

/// Maximum of totally ordered values, identity `T::min_value()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Max;

impl<T> CombineOp<T> for Max
where
    T: Ord + Bounded + Copy + Send + Sync,
{
    fn combine(&self, a: T, b: T) -> T {
        a.max(b)
    }

    fn identity(&self) -> Option<T> {
        Some(T::min_value())
    }
}
