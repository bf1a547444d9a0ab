//! Multiset operations over sorted sequences.
//!
//! All three operations decide membership per element with binary
//! searches instead of a serial merge walk, which is what makes them
//! data-parallel: each lane resolves its elements independently.
//! Duplicates follow multiset counting. For an element appearing
//! `count_a` times in `a` and `count_b` times in `b`, the difference
//! keeps the final `count_a - count_b` occurrences and the intersection
//! keeps the first `min(count_a, count_b)`; an occurrence knows its fate
//! from its one-based position within its run of equals.
//!
//! Inputs must be sorted by `less`, a strict-weak-order comparator.
//! Unsorted inputs produce incorrect results, not errors.

use crate::combine::KernelValue;
use crate::device::Device;
use crate::error::Result;
use crate::mask::copy_if_indexed;
use crate::matchers::parallel_or;

/// Does sorted `a` contain sorted `b` as a multiset?
///
/// Every element of `b` must appear in `a` at least as many times as it
/// appears in `b`. Empty `b` is contained in anything.
pub fn includes<T, C>(device: &Device, a: &[T], b: &[T], less: C) -> Result<bool>
where
    T: KernelValue,
    C: Fn(T, T) -> bool + Send + Sync,
{
    if b.is_empty() {
        return Ok(true);
    }
    if a.is_empty() {
        return Ok(false);
    }
    let violated = parallel_or(device, b.len(), |idx| violates_inclusion(a, b, idx, &less))?;
    Ok(!violated)
}

/// Elements of sorted `a` not matched by sorted `b`, written to the front
/// of `output` in order. Returns the result length.
pub fn set_difference<T, C>(
    device: &Device,
    a: &[T],
    b: &[T],
    output: &mut [T],
    less: C,
) -> Result<usize>
where
    T: KernelValue,
    C: Fn(T, T) -> bool + Send + Sync,
{
    copy_if_indexed(device, a, output, |idx| keeps_for_difference(a, b, idx, &less))
}

/// Elements of sorted `a` matched by sorted `b`, written to the front of
/// `output` in order. Returns the result length.
pub fn set_intersection<T, C>(
    device: &Device,
    a: &[T],
    b: &[T],
    output: &mut [T],
    less: C,
) -> Result<usize>
where
    T: KernelValue,
    C: Fn(T, T) -> bool + Send + Sync,
{
    copy_if_indexed(device, a, output, |idx| keeps_for_intersection(a, b, idx, &less))
}

/// Does `b[idx]` break the containment of `b` in `a`?
fn violates_inclusion<T, C>(a: &[T], b: &[T], idx: usize, less: &C) -> bool
where
    T: KernelValue,
    C: Fn(T, T) -> bool,
{
    let (na, nb) = (a.len(), b.len());
    let value = b[idx];
    // Endpoint shortcuts: b reaching below or above all of a.
    if (idx == 0 && less(value, a[0])) || (idx == nb - 1 && less(a[na - 1], value)) {
        return true;
    }
    let pos = lower_bound(a, 0, na, value, less);
    if pos == na || less(value, a[pos]) {
        return true;
    }
    let count_a = upper_bound(a, pos, na, value, less) - pos;
    let count_b = upper_bound(b, idx, nb, value, less) - lower_bound(b, 0, idx, value, less);
    count_b > count_a
}

/// Does the difference keep `a[idx]`?
fn keeps_for_difference<T, C>(a: &[T], b: &[T], idx: usize, less: &C) -> bool
where
    T: KernelValue,
    C: Fn(T, T) -> bool,
{
    let value = a[idx];
    let pos = lower_bound(b, 0, b.len(), value, less);
    if pos == b.len() || less(value, b[pos]) {
        return true;
    }
    // One-based position of this occurrence within its run in a; the
    // first count_b occurrences are the matched ones.
    let occurrence = idx - lower_bound(a, 0, idx, value, less) + 1;
    let count_b = upper_bound(b, pos, b.len(), value, less) - pos;
    occurrence > count_b
}

/// Does the intersection keep `a[idx]`?
fn keeps_for_intersection<T, C>(a: &[T], b: &[T], idx: usize, less: &C) -> bool
where
    T: KernelValue,
    C: Fn(T, T) -> bool,
{
    let value = a[idx];
    let pos = lower_bound(b, 0, b.len(), value, less);
    if pos == b.len() || less(value, b[pos]) {
        return false;
    }
    let occurrence = idx - lower_bound(a, 0, idx, value, less) + 1;
    let count_b = upper_bound(b, pos, b.len(), value, less) - pos;
    occurrence <= count_b
}

/// First position in `data[lo..hi]` not ordered before `value`.
pub(crate) fn lower_bound<T, C>(data: &[T], lo: usize, hi: usize, value: T, less: &C) -> usize
where
    T: KernelValue,
    C: Fn(T, T) -> bool,
{
    lo + data[lo..hi].partition_point(|&probe| less(probe, value))
}

/// First position in `data[lo..hi]` ordered after `value`.
pub(crate) fn upper_bound<T, C>(data: &[T], lo: usize, hi: usize, value: T, less: &C) -> usize
where
    T: KernelValue,
    C: Fn(T, T) -> bool,
{
    lo + data[lo..hi].partition_point(|&probe| !less(value, probe))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DeviceConfig;
    use crate::reference;

    fn device(group_size: usize, lane_budget: usize) -> Device {
        Device::new(DeviceConfig {
            group_size,
            lane_budget,
            collective_ops: true,
        })
        .unwrap()
    }

    fn ascending(x: u64, y: u64) -> bool {
        x < y
    }

    const A: [u64; 9] = [0, 0, 1, 1, 2, 6, 6, 9, 9];
    const B: [u64; 6] = [0, 1, 1, 6, 6, 9];

    #[test]
    fn test_bounds() {
        let data = [1u64, 3, 3, 3, 7];
        assert_eq!(lower_bound(&data, 0, 5, 3, &ascending), 1);
        assert_eq!(upper_bound(&data, 0, 5, 3, &ascending), 4);
        assert_eq!(lower_bound(&data, 0, 5, 0, &ascending), 0);
        assert_eq!(upper_bound(&data, 0, 5, 9, &ascending), 5);
        assert_eq!(lower_bound(&data, 2, 4, 3, &ascending), 2);
    }

    #[test]
    fn test_includes_duplicate_counting() {
        let dev = device(4, 8);
        assert!(includes(&dev, &A, &B, ascending).unwrap());
        // A has only two 6s among nine elements; B asks for nothing more,
        // but the reverse direction lacks the 2 and the duplicate 0 and 9.
        assert!(!includes(&dev, &B, &A, ascending).unwrap());
        assert!(includes(&dev, &A, &A, ascending).unwrap());
    }

    #[test]
    fn test_includes_needs_enough_duplicates() {
        let dev = device(4, 8);
        assert!(includes(&dev, &[2u64, 2, 2], &[2, 2], ascending).unwrap());
        assert!(!includes(&dev, &[2u64, 2], &[2, 2, 2], ascending).unwrap());
    }

    #[test]
    fn test_includes_empty_sides() {
        let dev = device(4, 8);
        let empty: [u64; 0] = [];
        assert!(includes(&dev, &A, &empty, ascending).unwrap());
        assert!(includes(&dev, &empty, &empty, ascending).unwrap());
        assert!(!includes(&dev, &empty, &B, ascending).unwrap());
    }

    #[test]
    fn test_difference_keeps_surplus_occurrences() {
        let dev = device(4, 8);
        let mut output = vec![0u64; A.len()];
        let k = set_difference(&dev, &A, &B, &mut output, ascending).unwrap();
        assert_eq!(&output[..k], &[0, 2, 9]);
    }

    #[test]
    fn test_intersection_keeps_matched_occurrences() {
        let dev = device(4, 8);
        let mut output = vec![0u64; A.len()];
        let k = set_intersection(&dev, &A, &B, &mut output, ascending).unwrap();
        assert_eq!(&output[..k], &B);

        let k = set_intersection(&dev, &B, &A, &mut output[..B.len()], ascending).unwrap();
        assert_eq!(&output[..k], &B);
    }

    #[test]
    fn test_difference_of_contained_subset_is_empty() {
        let dev = device(4, 8);
        let mut output = vec![0u64; B.len()];
        let k = set_difference(&dev, &B, &A, &mut output, ascending).unwrap();
        assert_eq!(k, 0);
    }

    #[test]
    fn test_matches_reference_on_clustered_values() {
        let dev = device(4, 8);
        // Duplicate-heavy sorted sequences exercise the run arithmetic.
        let mut a: Vec<u64> = (0..61).map(|i| (i * 13) % 7).collect();
        let mut b: Vec<u64> = (0..29).map(|i| (i * 5) % 7).collect();
        a.sort_unstable();
        b.sort_unstable();

        let mut output = vec![0u64; a.len()];
        let k = set_difference(&dev, &a, &b, &mut output, ascending).unwrap();
        assert_eq!(&output[..k], reference::set_difference(&a, &b, &ascending).as_slice());

        let k = set_intersection(&dev, &a, &b, &mut output, ascending).unwrap();
        assert_eq!(
            &output[..k],
            reference::set_intersection(&a, &b, &ascending).as_slice()
        );

        assert_eq!(
            includes(&dev, &a, &b, ascending).unwrap(),
            reference::multiset_includes(&a, &b, &ascending)
        );
    }

    #[test]
    fn test_custom_comparator_descending() {
        let dev = device(4, 8);
        let descending = |x: u64, y: u64| x > y;
        let a = [9u64, 6, 6, 2, 1, 0];
        let b = [6u64, 2, 0];
        let mut output = vec![0u64; a.len()];
        let k = set_difference(&dev, &a, &b, &mut output, descending).unwrap();
        assert_eq!(&output[..k], &[9, 6, 1]);
        assert!(includes(&dev, &a, &b, descending).unwrap());
    }
}
