//! Elementwise kernels.
//!
//! Independent per-position walks with no group cooperation: lanes own
//! consecutive tiles of positions and never synchronize. The in-place
//! kernels (`for_each`, `reverse`) partition writes so each slot has
//! exactly one owner.

use crate::combine::KernelValue;
use crate::device::Device;
use crate::error::Result;
use crate::memory::SharedSlice;

/// Replace every element with `f(element)`, in place.
pub fn for_each<T, F>(device: &Device, data: &mut [T], f: F) -> Result<()>
where
    T: KernelValue,
    F: Fn(T) -> T + Send + Sync,
{
    let n = data.len();
    if n == 0 {
        return Ok(());
    }
    let view = SharedSlice::new(data);
    let view_ref = &view;
    device.dispatch(
        device.flat_groups(n),
        |_| (),
        |item, _: &()| {
            for idx in item.tile(n).indices() {
                view_ref.set(idx, f(view_ref.get(idx)));
            }
        },
    )
}

/// Write `f(input[i])` to `output[i]`.
pub fn transform<T, U, F>(device: &Device, input: &[T], output: &mut [U], f: F) -> Result<()>
where
    T: KernelValue,
    U: KernelValue,
    F: Fn(T) -> U + Send + Sync,
{
    let n = input.len();
    if n == 0 {
        return Ok(());
    }
    let view = SharedSlice::new(output);
    let view_ref = &view;
    device.dispatch(
        device.flat_groups(n),
        |_| (),
        |item, _: &()| {
            for idx in item.tile(n).indices() {
                view_ref.set(idx, f(input[idx]));
            }
        },
    )
}

/// Write `f(a[i], b[i])` to `output[i]`, over the shorter of the inputs.
pub fn zip_with<A, B, U, F>(
    device: &Device,
    a: &[A],
    b: &[B],
    output: &mut [U],
    f: F,
) -> Result<()>
where
    A: KernelValue,
    B: KernelValue,
    U: KernelValue,
    F: Fn(A, B) -> U + Send + Sync,
{
    let n = a.len().min(b.len());
    if n == 0 {
        return Ok(());
    }
    let view = SharedSlice::new(output);
    let view_ref = &view;
    device.dispatch(
        device.flat_groups(n),
        |_| (),
        |item, _: &()| {
            for idx in item.tile(n).indices() {
                view_ref.set(idx, f(a[idx], b[idx]));
            }
        },
    )
}

/// Difference-style walk: `output[0] = input[0]` and
/// `output[i] = op(input[i], input[i - 1])` for the rest. `op` receives
/// the current element first, so subtraction yields forward differences.
pub fn adjacent_difference<T, Op>(
    device: &Device,
    input: &[T],
    output: &mut [T],
    op: Op,
) -> Result<()>
where
    T: KernelValue,
    Op: Fn(T, T) -> T + Send + Sync,
{
    let n = input.len();
    if n == 0 {
        return Ok(());
    }
    let view = SharedSlice::new(output);
    let view_ref = &view;
    device.dispatch(
        device.flat_groups(n),
        |_| (),
        |item, _: &()| {
            for idx in item.tile(n).indices() {
                if idx == 0 {
                    view_ref.set(0, input[0]);
                } else {
                    view_ref.set(idx, op(input[idx], input[idx - 1]));
                }
            }
        },
    )
}

/// Reverse `data` in place. Lanes own swap pairs from the front half.
pub fn reverse<T>(device: &Device, data: &mut [T]) -> Result<()>
where
    T: KernelValue,
{
    let n = data.len();
    let pairs = n / 2;
    if pairs == 0 {
        return Ok(());
    }
    let view = SharedSlice::new(data);
    let view_ref = &view;
    device.dispatch(
        device.flat_groups(pairs),
        |_| (),
        |item, _: &()| {
            for idx in item.tile(pairs).indices() {
                let mirror = n - idx - 1;
                let front = view_ref.get(idx);
                view_ref.set(idx, view_ref.get(mirror));
                view_ref.set(mirror, front);
            }
        },
    )
}

/// Write `input` reversed into `output`.
pub fn reverse_copy<T>(device: &Device, input: &[T], output: &mut [T]) -> Result<()>
where
    T: KernelValue,
{
    let n = input.len();
    if n == 0 {
        return Ok(());
    }
    transform_indexed(device, n, output, |idx| input[n - idx - 1])
}

/// Write `input` rotated left by `pivot` positions into `output`, so the
/// element at `pivot` lands first. Any `pivot` is taken modulo the
/// length.
pub fn rotate_copy<T>(device: &Device, input: &[T], pivot: usize, output: &mut [T]) -> Result<()>
where
    T: KernelValue,
{
    let n = input.len();
    if n == 0 {
        return Ok(());
    }
    let pivot = pivot % n;
    transform_indexed(device, n, output, |idx| input[(pivot + idx) % n])
}

fn transform_indexed<T, F>(device: &Device, n: usize, output: &mut [T], f: F) -> Result<()>
where
    T: KernelValue,
    F: Fn(usize) -> T + Sync,
{
    let view = SharedSlice::new(output);
    let view_ref = &view;
    device.dispatch(
        device.flat_groups(n),
        |_| (),
        |item, _: &()| {
            for idx in item.tile(n).indices() {
                view_ref.set(idx, f(idx));
            }
        },
    )
}
