//! Stable predicate compaction.
//!
//! Both operations run in two rounds. The rank round scans per-element
//! flags into group-local inclusive ranks (the count of flagged elements
//! at or before each position within its group's block) and host-scans
//! the per-group flag totals. The scatter round recomputes nothing: a
//! lane decides "is my element flagged" purely from the rank stream,
//! comparing against the immediately preceding element's rank, with the
//! first position of each block handled by its block offset alone. Adding
//! the preceding groups' total turns a local rank into the final output
//! position, so every surviving element is written exactly once and
//! relative order is preserved.

use crate::combine::KernelValue;
use crate::device::Device;
use crate::error::Result;
use crate::local_ops;
use crate::memory::SharedSlice;
use crate::scan::{host_inclusive_scan, ScanPass};
use crate::Plus;

/// Copy elements satisfying `pred` into the front of `output`, preserving
/// their input order. Returns how many were copied.
pub fn copy_if<T, P>(device: &Device, input: &[T], output: &mut [T], pred: P) -> Result<usize>
where
    T: KernelValue,
    P: Fn(T) -> bool + Send + Sync,
{
    copy_if_indexed(device, input, output, |idx| pred(input[idx]))
}

/// Stable two-way partition of `input` into `output`.
///
/// Elements satisfying `pred` land in `output[..k]` and the rest in
/// `output[k..n]`, both sides in input order. Returns `k`.
pub fn partition<T, P>(device: &Device, input: &[T], output: &mut [T], pred: P) -> Result<usize>
where
    T: KernelValue,
    P: Fn(T) -> bool + Send + Sync,
{
    let n = input.len();
    if n == 0 {
        return Ok(0);
    }
    let map = rank_flags(device, n, |idx| pred(input[idx]))?;
    let k = map.flagged_total();
    let ranks = map.ranks.as_slice();
    let totals = map.group_totals.as_slice();
    let spg = map.size_per_group;

    let out_view = SharedSlice::new(output);
    let out_ref = &out_view;
    device.dispatch(
        device.flat_groups(n),
        |_| (),
        |item, _: &()| {
            for idx in item.tile(n).indices() {
                let rank = ranks[idx];
                let earlier = if idx >= spg { totals[idx / spg - 1] } else { 0 };
                let flagged = rank != 0 && (idx % spg == 0 || rank != ranks[idx - 1]);
                if flagged {
                    out_ref.set(rank - 1 + earlier, input[idx]);
                } else {
                    out_ref.set(k + (idx - rank - earlier), input[idx]);
                }
            }
        },
    )?;
    Ok(k)
}

/// Compaction driven by a positional flag instead of a value predicate.
/// The set operations use this to flag elements by binary searches over a
/// second sequence.
pub(crate) fn copy_if_indexed<T, F>(
    device: &Device,
    input: &[T],
    output: &mut [T],
    flag: F,
) -> Result<usize>
where
    T: KernelValue,
    F: Fn(usize) -> bool + Sync,
{
    let n = input.len();
    if n == 0 {
        return Ok(0);
    }
    let map = rank_flags(device, n, flag)?;
    let k = map.flagged_total();
    if k == 0 {
        return Ok(0);
    }
    let ranks = map.ranks.as_slice();
    let totals = map.group_totals.as_slice();
    let spg = map.size_per_group;

    let out_view = SharedSlice::new(output);
    let out_ref = &out_view;
    device.dispatch(
        device.flat_groups(n),
        |_| (),
        |item, _: &()| {
            for idx in item.tile(n).indices() {
                let rank = ranks[idx];
                if rank != 0 {
                    let mut out_pos = rank - 1;
                    if idx >= spg {
                        out_pos += totals[idx / spg - 1];
                    }
                    if idx % spg == 0 || rank != ranks[idx - 1] {
                        out_ref.set(out_pos, input[idx]);
                    }
                }
            }
        },
    )?;
    Ok(k)
}

/// Group-local inclusive ranks plus scanned per-group totals.
struct RankMap {
    ranks: Vec<usize>,
    group_totals: Vec<usize>,
    size_per_group: usize,
}

impl RankMap {
    fn flagged_total(&self) -> usize {
        self.group_totals.last().copied().unwrap_or(0)
    }
}

fn rank_flags<F>(device: &Device, n: usize, flag: F) -> Result<RankMap>
where
    F: Fn(usize) -> bool + Sync,
{
    let launch = device.scan_launch(n);
    let algo = local_ops::select(device.collective_ops(), &Plus);
    let seed = algo.scratch_seed(|| usize::from(flag(0)));
    let mut ranks = vec![0usize; n];
    let mut totals = vec![seed; launch.n_groups];
    {
        let ranks_view = SharedSlice::new(&mut ranks);
        let ranks_ref = &ranks_view;
        let pass = ScanPass {
            launch,
            n,
            load: |idx| usize::from(flag(idx)),
            store: |pos, value| ranks_ref.set(pos, value),
            op: &Plus,
            algo: &algo,
            seed,
            exclusive: false,
            init: None,
        };
        pass.run(device, &mut totals)?;
    }
    host_inclusive_scan(&mut totals, &Plus);
    Ok(RankMap {
        ranks,
        group_totals: totals,
        size_per_group: launch.size_per_group,
    })
}
