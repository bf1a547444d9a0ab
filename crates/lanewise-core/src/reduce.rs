//! Reduction kernels.
//!
//! Each lane folds a consecutive tile of the input serially, the group
//! combines lane results in scratch, and the host folds the per-group
//! aggregates in group order. Tiles, lanes, and groups all preserve
//! sequence order, so any associative operation reduces correctly whether
//! or not it commutes.

use crate::combine::{CombineOp, KernelValue};
use crate::device::Device;
use crate::error::Result;
use crate::local_ops;
use crate::memory::{Scratch, SharedSlice};
use crate::workitem::WorkItem;

/// Combine all elements of `input` under `op`. Returns `None` for an
/// empty input.
pub fn reduce<T, Op>(device: &Device, input: &[T], op: Op) -> Result<Option<T>>
where
    T: KernelValue,
    Op: CombineOp<T>,
{
    transform_reduce(device, input, |value| value, op)
}

/// Combine `transform(input[i])` values under `op`. Returns `None` for an
/// empty input.
pub fn transform_reduce<T, U, F, Op>(
    device: &Device,
    input: &[T],
    transform: F,
    op: Op,
) -> Result<Option<U>>
where
    T: KernelValue,
    U: KernelValue,
    F: Fn(T) -> U + Send + Sync,
    Op: CombineOp<U>,
{
    let n = input.len();
    if n == 0 {
        return Ok(None);
    }
    let n_groups = device.flat_groups(n);
    let group_size = device.group_size();
    let algo = local_ops::select(device.collective_ops(), &op);
    let seed = algo.scratch_seed(|| transform(input[0]));
    let mut partials = vec![seed; n_groups];

    {
        let partials_view = SharedSlice::new(&mut partials);
        let partials_ref = &partials_view;
        let op_ref = &op;
        let transform_ref = &transform;
        let algo_ref = &algo;
        device.dispatch(
            n_groups,
            |_| Scratch::fill(group_size, seed),
            |item, scratch| {
                let tile = item.tile(n);
                if tile.len > 0 {
                    let mut acc = transform_ref(input[tile.start]);
                    for idx in tile.start + 1..tile.start + tile.len {
                        acc = op_ref.combine(acc, transform_ref(input[idx]));
                    }
                    scratch.set(item.local_id(), acc);
                }
                let live = n.min(item.global_range());
                let valid = live.saturating_sub(item.group_id() * group_size).min(group_size);
                let total = local_ops::local_reduce(item, scratch, valid, op_ref, algo_ref);
                if item.local_id() == 0 {
                    partials_ref.set(item.group_id(), total);
                }
            },
        )?;
    }

    Ok(partials.into_iter().reduce(|a, b| op.combine(a, b)))
}
