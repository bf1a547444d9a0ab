//! Search kernels.
//!
//! Two drivers cover every entry point. `parallel_or` answers "does any
//! candidate match" and stops as soon as one lane finds a hit.
//! `parallel_find_first` races lanes toward the lowest matching index:
//! lanes publish hits through a shared minimum and skip candidates that
//! can no longer win. Both scan candidates through consecutive per-lane
//! tiles, so a candidate window may extend past its tile into a
//! neighbor's elements; windows read the input directly and only the
//! candidate's start index is partitioned.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::combine::KernelValue;
use crate::device::Device;
use crate::error::Result;

/// Does any element satisfy `pred`?
pub fn any_of<T, P>(device: &Device, input: &[T], pred: P) -> Result<bool>
where
    T: KernelValue,
    P: Fn(T) -> bool + Send + Sync,
{
    parallel_or(device, input.len(), |idx| pred(input[idx]))
}

/// Index of the first element satisfying `pred`.
pub fn find_if<T, P>(device: &Device, input: &[T], pred: P) -> Result<Option<usize>>
where
    T: KernelValue,
    P: Fn(T) -> bool + Send + Sync,
{
    parallel_find_first(device, input.len(), |idx| pred(input[idx]))
}

/// Index of the first element equal to `value`.
pub fn find<T>(device: &Device, input: &[T], value: T) -> Result<Option<usize>>
where
    T: KernelValue + PartialEq,
{
    find_if(device, input, move |element| element == value)
}

/// Start of the first occurrence of `needle` in `haystack`, elements
/// matched by `eq`. An empty needle matches at the front.
pub fn search<T, E>(device: &Device, haystack: &[T], needle: &[T], eq: E) -> Result<Option<usize>>
where
    T: KernelValue,
    E: Fn(T, T) -> bool + Send + Sync,
{
    if needle.is_empty() {
        return Ok(Some(0));
    }
    if needle.len() > haystack.len() {
        return Ok(None);
    }
    parallel_find_first(device, haystack.len() - needle.len() + 1, |start| {
        needle
            .iter()
            .enumerate()
            .all(|(offset, &pattern)| eq(haystack[start + offset], pattern))
    })
}

/// Start of the first run of `count` consecutive elements matching
/// `value` under `eq`.
pub fn search_n<T, E>(
    device: &Device,
    input: &[T],
    count: usize,
    value: T,
    eq: E,
) -> Result<Option<usize>>
where
    T: KernelValue,
    E: Fn(T, T) -> bool + Send + Sync,
{
    if count == 0 {
        return Ok(Some(0));
    }
    if count > input.len() {
        return Ok(None);
    }
    parallel_find_first(device, input.len() - count + 1, |start| {
        (start..start + count).all(|idx| eq(input[idx], value))
    })
}

/// Index of the first element matching any candidate under `eq`.
pub fn find_first_of<T, E>(
    device: &Device,
    input: &[T],
    candidates: &[T],
    eq: E,
) -> Result<Option<usize>>
where
    T: KernelValue,
    E: Fn(T, T) -> bool + Send + Sync,
{
    if candidates.is_empty() {
        return Ok(None);
    }
    parallel_find_first(device, input.len(), |idx| {
        candidates.iter().any(|&candidate| eq(input[idx], candidate))
    })
}

/// Whether any candidate index in `0..count` satisfies `pred`. Lanes stop
/// probing once a hit is published anywhere.
pub(crate) fn parallel_or<P>(device: &Device, count: usize, pred: P) -> Result<bool>
where
    P: Fn(usize) -> bool + Sync,
{
    if count == 0 {
        return Ok(false);
    }
    let found = AtomicBool::new(false);
    device.dispatch(
        device.flat_groups(count),
        |_| (),
        |item, _: &()| {
            for idx in item.tile(count).indices() {
                if found.load(Ordering::Relaxed) {
                    return;
                }
                if pred(idx) {
                    found.store(true, Ordering::Relaxed);
                    return;
                }
            }
        },
    )?;
    Ok(found.into_inner())
}

/// Lowest candidate index in `0..count` satisfying `pred`.
///
/// Tiles are consecutive, so a lane's own hits are ordered and it can
/// stop at its first one; the shared minimum settles the race between
/// lanes. Candidates at or past the current minimum are skipped without
/// probing.
pub(crate) fn parallel_find_first<P>(device: &Device, count: usize, pred: P) -> Result<Option<usize>>
where
    P: Fn(usize) -> bool + Sync,
{
    if count == 0 {
        return Ok(None);
    }
    let best = AtomicUsize::new(usize::MAX);
    device.dispatch(
        device.flat_groups(count),
        |_| (),
        |item, _: &()| {
            for idx in item.tile(count).indices() {
                if idx >= best.load(Ordering::Relaxed) {
                    return;
                }
                if pred(idx) {
                    best.fetch_min(idx, Ordering::Relaxed);
                    return;
                }
            }
        },
    )?;
    let winner = best.into_inner();
    Ok((winner != usize::MAX).then_some(winner))
}
