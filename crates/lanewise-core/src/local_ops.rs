//! Group-local reduce and scan passes over scratch.
//!
//! Every pass comes in two variants. The guarded tree variant works for
//! any associative operation: lanes pair up in a log-depth sweep and every
//! access is range-checked against the number of live slots, so slack
//! slots at the end of a partial window are never combined. The collective
//! variant is available when the operation carries an identity element and
//! the device allows it: slack slots are filled with the identity first,
//! after which the pass runs unguarded over the whole group.
//!
//! The variant is selected once per dispatch, never per element. Both
//! variants issue the same group-uniform barrier sequence, so a kernel can
//! call through [`GroupAlgo`] without caring which one runs.

use crate::combine::{CombineOp, KernelValue};
use crate::memory::Scratch;
use crate::workitem::WorkItem;

/// Group-pass variant chosen for one dispatch.
pub(crate) enum GroupAlgo<T> {
    /// Range-guarded tree passes.
    Guarded,
    /// Identity-filled collective passes.
    Collective { identity: T },
}

impl<T: Copy> GroupAlgo<T> {
    /// Initial value for scratch slots. The collective variant needs the
    /// identity in every slack slot; the guarded variant never reads
    /// unwritten slots, so any value works.
    pub(crate) fn scratch_seed(&self, fallback: impl FnOnce() -> T) -> T {
        match self {
            GroupAlgo::Collective { identity } => *identity,
            GroupAlgo::Guarded => fallback(),
        }
    }
}

/// Pick the pass variant for an operation on a device.
pub(crate) fn select<T, Op>(collective_enabled: bool, op: &Op) -> GroupAlgo<T>
where
    T: KernelValue,
    Op: CombineOp<T>,
{
    if collective_enabled {
        if let Some(identity) = op.identity() {
            return GroupAlgo::Collective { identity };
        }
    }
    GroupAlgo::Guarded
}

/// Combine the first `valid` scratch slots into slot 0.
///
/// The result is meaningful on lane 0 only. Requires `valid >= 1` and a
/// power-of-two group size.
pub(crate) fn local_reduce<T, Op, W>(
    item: &W,
    scratch: &Scratch<T>,
    valid: usize,
    op: &Op,
    algo: &GroupAlgo<T>,
) -> T
where
    T: KernelValue,
    Op: CombineOp<T>,
    W: WorkItem,
{
    match algo {
        GroupAlgo::Guarded => tree_reduce(item, scratch, valid, op),
        GroupAlgo::Collective { identity } => collective_reduce(item, scratch, valid, op, *identity),
    }
}

fn tree_reduce<T, Op, W>(item: &W, scratch: &Scratch<T>, valid: usize, op: &Op) -> T
where
    T: KernelValue,
    Op: CombineOp<T>,
    W: WorkItem,
{
    let local = item.local_id();
    let group_size = item.local_range();
    let mut k = 1;
    while k < group_size {
        item.barrier();
        if local % (2 * k) == 0 && local + k < valid {
            scratch.set(local, op.combine(scratch.get(local), scratch.get(local + k)));
        }
        k *= 2;
    }
    scratch.get(local)
}

fn collective_reduce<T, Op, W>(
    item: &W,
    scratch: &Scratch<T>,
    valid: usize,
    op: &Op,
    identity: T,
) -> T
where
    T: KernelValue,
    Op: CombineOp<T>,
    W: WorkItem,
{
    let local = item.local_id();
    let group_size = item.local_range();
    if local >= valid {
        scratch.set(local, identity);
    }
    item.barrier();
    if local == 0 {
        let mut acc = scratch.get(0);
        for slot in 1..group_size {
            acc = op.combine(acc, scratch.get(slot));
        }
        scratch.set(0, acc);
    }
    item.barrier();
    scratch.get(0)
}

/// Inclusive scan of the first `valid` scratch slots, in place.
///
/// Slots at `valid..` keep unspecified contents under the guarded variant
/// and the identity-extended scan under the collective one; callers may
/// only rely on the boundary slot `group_size - 1` when the window was
/// full. Requires `valid >= 1` and a power-of-two group size.
pub(crate) fn local_scan<T, Op, W>(
    item: &W,
    scratch: &Scratch<T>,
    valid: usize,
    op: &Op,
    algo: &GroupAlgo<T>,
) where
    T: KernelValue,
    Op: CombineOp<T>,
    W: WorkItem,
{
    match algo {
        GroupAlgo::Guarded => tree_scan(item, scratch, valid, op),
        GroupAlgo::Collective { identity } => collective_scan(item, scratch, valid, op, *identity),
    }
}

fn tree_scan<T, Op, W>(item: &W, scratch: &Scratch<T>, valid: usize, op: &Op)
where
    T: KernelValue,
    Op: CombineOp<T>,
    W: WorkItem,
{
    let local = item.local_id();
    let group_size = item.local_range();

    // Up-sweep: each step folds the left subtree total into the right
    // subtree boundary, keeping earlier partials intact for the
    // down-sweep.
    let mut k = 1;
    while k < group_size {
        item.barrier();
        if local % (2 * k) == 0 && local + k < valid {
            let boundary = local + 2 * k - 1;
            scratch.set(boundary, op.combine(scratch.get(local + k - 1), scratch.get(boundary)));
        }
        k *= 2;
    }
    item.barrier();

    // Down-sweep: lanes in the right half of each span pull the left
    // half's total. No barriers are needed because reads target slots the
    // up-sweep finalized.
    let mut partial = scratch.get(local);
    let mut k = 2;
    while k < group_size {
        let width = 2 * k;
        if local < valid && local % width >= k && local % width < width - 1 {
            let left_root = local - local % k - 1;
            partial = op.combine(scratch.get(left_root), partial);
        }
        k *= 2;
    }
    item.barrier();
    scratch.set(local, partial);
    item.barrier();
}

fn collective_scan<T, Op, W>(item: &W, scratch: &Scratch<T>, valid: usize, op: &Op, identity: T)
where
    T: KernelValue,
    Op: CombineOp<T>,
    W: WorkItem,
{
    let local = item.local_id();
    let group_size = item.local_range();
    if local >= valid {
        scratch.set(local, identity);
    }
    item.barrier();
    if local == 0 {
        let mut acc = scratch.get(0);
        for slot in 1..group_size {
            acc = op.combine(acc, scratch.get(slot));
            scratch.set(slot, acc);
        }
    }
    item.barrier();
}
