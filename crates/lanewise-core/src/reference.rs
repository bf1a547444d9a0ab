//! Sequential counterparts of the parallel kernels.
//!
//! Plain single-pass implementations with the obvious left-to-right
//! semantics. Tests and the command-line driver check kernel output
//! against these; nothing here dispatches.

use crate::combine::CombineOp;

/// Left fold of `input` under `op`. `None` for an empty input.
pub fn fold<T, Op>(input: &[T], op: &Op) -> Option<T>
where
    T: Copy,
    Op: CombineOp<T>,
{
    input.iter().copied().reduce(|a, b| op.combine(a, b))
}

/// Inclusive left-to-right scan, with `init` combined in front when
/// supplied.
pub fn inclusive_scan<T, Op>(input: &[T], init: Option<T>, op: &Op) -> Vec<T>
where
    T: Copy,
    Op: CombineOp<T>,
{
    let mut out = Vec::with_capacity(input.len());
    let mut acc = init;
    for &value in input {
        let next = match acc {
            Some(prev) => op.combine(prev, value),
            None => value,
        };
        acc = Some(next);
        out.push(next);
    }
    out
}

/// Exclusive left-to-right scan starting from `init`.
pub fn exclusive_scan<T, Op>(input: &[T], init: T, op: &Op) -> Vec<T>
where
    T: Copy,
    Op: CombineOp<T>,
{
    let mut out = Vec::with_capacity(input.len());
    let mut acc = init;
    for &value in input {
        out.push(acc);
        acc = op.combine(acc, value);
    }
    out
}

/// Elements satisfying `pred`, in input order.
pub fn stable_filter<T, P>(input: &[T], pred: P) -> Vec<T>
where
    T: Clone,
    P: Fn(&T) -> bool,
{
    input.iter().filter(|value| pred(value)).cloned().collect()
}

/// Two-way stable partition: satisfying elements first, then the rest,
/// both in input order. Returns the combined layout and the split point.
pub fn stable_partition<T, P>(input: &[T], pred: P) -> (Vec<T>, usize)
where
    T: Clone,
    P: Fn(&T) -> bool,
{
    let mut trues: Vec<T> = Vec::new();
    let mut falses: Vec<T> = Vec::new();
    for value in input {
        if pred(value) {
            trues.push(value.clone());
        } else {
            falses.push(value.clone());
        }
    }
    let split = trues.len();
    trues.extend(falses);
    (trues, split)
}

/// Multiset containment of sorted `b` in sorted `a` by a consuming merge
/// walk.
pub fn multiset_includes<T, C>(a: &[T], b: &[T], less: &C) -> bool
where
    T: Copy,
    C: Fn(T, T) -> bool,
{
    let mut i = 0;
    for &needle in b {
        while i < a.len() && less(a[i], needle) {
            i += 1;
        }
        if i == a.len() || less(needle, a[i]) {
            return false;
        }
        i += 1;
    }
    true
}

/// Multiset difference of sorted sequences by a merge walk.
pub fn set_difference<T, C>(a: &[T], b: &[T], less: &C) -> Vec<T>
where
    T: Copy,
    C: Fn(T, T) -> bool,
{
    let mut out = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        if less(a[i], b[j]) {
            out.push(a[i]);
            i += 1;
        } else if less(b[j], a[i]) {
            j += 1;
        } else {
            i += 1;
            j += 1;
        }
    }
    out.extend_from_slice(&a[i..]);
    out
}

/// Multiset intersection of sorted sequences by a merge walk.
pub fn set_intersection<T, C>(a: &[T], b: &[T], less: &C) -> Vec<T>
where
    T: Copy,
    C: Fn(T, T) -> bool,
{
    let mut out = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        if less(a[i], b[j]) {
            i += 1;
        } else if less(b[j], a[i]) {
            j += 1;
        } else {
            out.push(a[i]);
            i += 1;
            j += 1;
        }
    }
    out
}

/// Difference-style adjacent walk matching
/// [`crate::elementwise::adjacent_difference`].
pub fn adjacent_difference<T, Op>(input: &[T], op: &Op) -> Vec<T>
where
    T: Copy,
    Op: Fn(T, T) -> T,
{
    let mut out = Vec::with_capacity(input.len());
    for (idx, &value) in input.iter().enumerate() {
        if idx == 0 {
            out.push(value);
        } else {
            out.push(op(value, input[idx - 1]));
        }
    }
    out
}
