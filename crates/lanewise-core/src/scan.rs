//! Prefix scans.
//!
//! A scan runs in up to three phases. Phase one dispatches groups over
//! blocked windows: each group walks `iters` windows of `group_size`
//! elements, scanning every window in scratch and chaining window totals
//! through a carry so the group leaves behind the local prefix of its
//! whole block, plus one aggregate per group. When more than one group
//! ran, phase two scans the per-group aggregates on the host (the buffer
//! holds at most one value per live group), and phase three folds each
//! group's carry into every output position the group owns.
//!
//! Output positions are write-partitioned between lanes in every phase. An
//! exclusive scan stores the same prefixes shifted one position right,
//! with the initial value at position zero, so both flavors share the
//! phase-one kernel.

use crate::combine::{CombineOp, KernelValue};
use crate::device::{Device, Lane, Launch};
use crate::error::Result;
use crate::local_ops::{self, GroupAlgo};
use crate::memory::{Scratch, SharedSlice};
use crate::workitem::WorkItem;

/// Inclusive scan of `input` into `output` under `op`.
///
/// `output[i]` holds the combination of `input[0..=i]` in sequence order.
/// When `init` is supplied it is combined in front of the first element.
pub fn inclusive_scan<T, Op>(
    device: &Device,
    input: &[T],
    output: &mut [T],
    op: Op,
    init: Option<T>,
) -> Result<()>
where
    T: KernelValue,
    Op: CombineOp<T>,
{
    transform_inclusive_scan(device, input, output, |value| value, op, init)
}

/// Exclusive scan of `input` into `output` under `op`.
///
/// `output[0]` is `init` and `output[i]` combines `init` with
/// `input[0..i]`. The last input element influences no output position.
pub fn exclusive_scan<T, Op>(
    device: &Device,
    input: &[T],
    output: &mut [T],
    init: T,
    op: Op,
) -> Result<()>
where
    T: KernelValue,
    Op: CombineOp<T>,
{
    transform_exclusive_scan(device, input, output, init, |value| value, op)
}

/// Inclusive scan over `transform(input[i])` values.
pub fn transform_inclusive_scan<T, U, F, Op>(
    device: &Device,
    input: &[T],
    output: &mut [U],
    transform: F,
    op: Op,
    init: Option<U>,
) -> Result<()>
where
    T: KernelValue,
    U: KernelValue,
    F: Fn(T) -> U + Send + Sync,
    Op: CombineOp<U>,
{
    scan_into(device, input, output, &transform, &op, init, false)
}

/// Exclusive scan over `transform(input[i])` values.
pub fn transform_exclusive_scan<T, U, F, Op>(
    device: &Device,
    input: &[T],
    output: &mut [U],
    init: U,
    transform: F,
    op: Op,
) -> Result<()>
where
    T: KernelValue,
    U: KernelValue,
    F: Fn(T) -> U + Send + Sync,
    Op: CombineOp<U>,
{
    scan_into(device, input, output, &transform, &op, Some(init), true)
}

fn scan_into<T, U, F, Op>(
    device: &Device,
    input: &[T],
    output: &mut [U],
    transform: &F,
    op: &Op,
    init: Option<U>,
    exclusive: bool,
) -> Result<()>
where
    T: KernelValue,
    U: KernelValue,
    F: Fn(T) -> U + Send + Sync,
    Op: CombineOp<U>,
{
    let n = input.len();
    if n == 0 {
        return Ok(());
    }
    let launch = device.scan_launch(n);
    let algo = local_ops::select(device.collective_ops(), op);
    let seed = algo.scratch_seed(|| transform(input[0]));
    let mut totals = vec![seed; launch.n_groups];

    let view = SharedSlice::new(output);
    let view_ref = &view;
    let pass = ScanPass {
        launch,
        n,
        load: |idx| transform(input[idx]),
        store: |pos, value| view_ref.set(pos, value),
        op,
        algo: &algo,
        seed,
        exclusive,
        init,
    };
    pass.run(device, &mut totals)?;

    if launch.n_groups > 1 {
        host_inclusive_scan(&mut totals, op);
        let shift = usize::from(exclusive);
        carry_pass(device, n, shift, launch.size_per_group, &totals, |pos, carry| {
            view_ref.set(pos, op.combine(carry, view_ref.get(pos)));
        })?;
    }
    Ok(())
}

/// Phase-one blocked scan kernel.
///
/// Writes the group-local prefix of every element (shifted for exclusive
/// scans) through `store` and one aggregate per group into `totals`.
/// `totals` must hold exactly `launch.n_groups` slots.
pub(crate) struct ScanPass<'a, T, Op, L, S> {
    pub launch: Launch,
    pub n: usize,
    pub load: L,
    pub store: S,
    pub op: &'a Op,
    pub algo: &'a GroupAlgo<T>,
    pub seed: T,
    pub exclusive: bool,
    pub init: Option<T>,
}

impl<T, Op, L, S> ScanPass<'_, T, Op, L, S>
where
    T: KernelValue,
    Op: CombineOp<T>,
    L: Fn(usize) -> T + Sync,
    S: Fn(usize, T) + Sync,
{
    pub(crate) fn run(&self, device: &Device, totals: &mut [T]) -> Result<()> {
        let group_size = device.group_size();
        let totals_view = SharedSlice::new(totals);
        let totals_ref = &totals_view;
        let seed = self.seed;
        device.dispatch(
            self.launch.n_groups,
            |_| Scratch::fill(group_size, seed),
            |item, scratch| self.group_body(item, scratch, totals_ref),
        )
    }

    fn group_body(&self, item: &Lane<'_>, scratch: &Scratch<T>, totals: &SharedSlice<'_, T>) {
        let local = item.local_id();
        let group = item.group_id();
        let group_size = item.local_range();
        let n = self.n;
        let shift = usize::from(self.exclusive);

        if self.exclusive && item.global_id() == 0 {
            if let Some(value) = self.init {
                (self.store)(0, value);
            }
        }

        // Lane's element index inside the current window. The loop
        // condition checks the window start, which is lane-uniform, so
        // every lane of the group takes the same number of passes.
        let mut window_lane = local + self.launch.size_per_group * group;
        let mut carry = self.seed;
        let mut pass = 0;
        while pass < self.launch.iters && window_lane - local < n {
            if window_lane < n {
                scratch.set(local, (self.load)(window_lane));
            }
            if local == 0 && pass > 0 {
                scratch.set(0, self.op.combine(carry, scratch.get(0)));
            } else if pass == 0 && item.global_id() == 0 {
                if let Some(value) = self.init {
                    scratch.set(0, self.op.combine(value, scratch.get(0)));
                }
            }

            let window_start = window_lane - local;
            let valid = (n - window_start).min(group_size);
            local_ops::local_scan(item, scratch, valid, self.op, self.algo);

            // Window total, meaningful whenever another pass follows
            // because only full windows are followed by one.
            carry = scratch.get(group_size - 1);
            item.barrier();

            if window_lane + shift < n {
                (self.store)(window_lane + shift, scratch.get(local));
            }
            window_lane += group_size;
            pass += 1;
        }

        // Exactly one lane per group holds the block total: the last lane
        // of a full final window, or the lane that scanned element n - 1
        // of a partial one.
        let last = window_lane - group_size;
        if (local == group_size - 1 && last < n) || last == n - 1 {
            totals.set(group, scratch.get(local));
        }
    }
}

/// Inclusive scan of the per-group aggregates, on the host. The buffer
/// never exceeds the group cap, so serial is the right tool.
pub(crate) fn host_inclusive_scan<T, Op>(values: &mut [T], op: &Op)
where
    T: KernelValue,
    Op: CombineOp<T>,
{
    if values.len() < 2 {
        return;
    }
    let mut acc = values[0];
    for slot in values.iter_mut().skip(1) {
        acc = op.combine(acc, *slot);
        *slot = acc;
    }
}

/// Phase-three kernel: fold each group's carry into the positions it owns.
///
/// Position `p` was produced in phase one by group
/// `(p - shift) / size_per_group`. The first group has no carry, and the
/// initial-value slot of an exclusive scan belongs to no group.
fn carry_pass<T, A>(
    device: &Device,
    n: usize,
    shift: usize,
    size_per_group: usize,
    totals: &[T],
    apply: A,
) -> Result<()>
where
    T: KernelValue,
    A: Fn(usize, T) + Sync,
{
    let n_groups = device.flat_groups(n);
    device.dispatch(
        n_groups,
        |_| (),
        |item, _: &()| {
            for pos in item.tile(n).indices() {
                if pos < shift {
                    continue;
                }
                let owner = (pos - shift) / size_per_group;
                if owner >= 1 {
                    apply(pos, totals[owner - 1]);
                }
            }
        },
    )
}
