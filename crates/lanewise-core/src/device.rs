//! Work-group execution device.
//!
//! The device realizes the two-level launch model on CPU threads. Each
//! group of a dispatch runs as `group_size` scoped threads sharing one
//! [`GroupBarrier`]; independent groups are distributed over the rayon
//! pool. Lanes observe their position only through [`WorkItem`], so kernel
//! code is identical under any geometry.
//!
//! A panic in any lane breaks the group barrier, which releases every
//! sibling lane immediately instead of deadlocking it, and the dispatch
//! reports a single opaque failure. Partial output from a failed dispatch
//! is unspecified.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Condvar, Mutex, PoisonError};

use rayon::prelude::*;

use crate::config::DeviceConfig;
use crate::error::{DeviceError, Result};
use crate::tile::Tile;
use crate::workitem::WorkItem;

/// Executes kernels over lanes grouped into work-groups.
#[derive(Debug, Clone)]
pub struct Device {
    config: DeviceConfig,
}

/// Geometry of one dispatch: `n_groups` groups of `group_size` lanes, each
/// group walking `iters` windows of `group_size` elements.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Launch {
    pub n_groups: usize,
    pub iters: usize,
    pub size_per_group: usize,
}

impl Device {
    /// Build a device with the given geometry.
    pub fn new(config: DeviceConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Build a device with geometry detected from the host.
    #[must_use]
    pub fn detect() -> Self {
        Self {
            config: DeviceConfig::detect(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    #[must_use]
    pub fn group_size(&self) -> usize {
        self.config.group_size
    }

    #[must_use]
    pub fn collective_ops(&self) -> bool {
        self.config.collective_ops
    }

    fn max_groups(&self) -> usize {
        (self.config.lane_budget / self.config.group_size).max(1)
    }

    /// Geometry for kernels that walk blocked windows with a group-level
    /// pass per window. Requires `n > 0`. Every dispatched group starts at
    /// least one window below `n`.
    pub(crate) fn scan_launch(&self, n: usize) -> Launch {
        let group_size = self.config.group_size;
        let n_groups = n.div_ceil(group_size).min(self.max_groups());
        let iters = n.div_ceil(n_groups * group_size);
        let size_per_group = group_size * iters;
        Launch {
            n_groups: n.div_ceil(size_per_group),
            iters,
            size_per_group,
        }
    }

    /// Group count for kernels that fold consecutive per-lane tiles over
    /// `n_items` elements. Requires `n_items > 0`.
    pub(crate) fn flat_groups(&self, n_items: usize) -> usize {
        n_items.div_ceil(self.config.group_size).min(self.max_groups())
    }

    /// Run `kernel` on every lane of `n_groups` groups.
    ///
    /// `group_state` builds the state shared by the lanes of one group,
    /// once per group, before its lanes start. Returns after every lane of
    /// every group has finished or the dispatch has failed.
    pub(crate) fn dispatch<S, G, K>(&self, n_groups: usize, group_state: G, kernel: K) -> Result<()>
    where
        S: Sync,
        G: Fn(usize) -> S + Sync,
        K: Fn(&Lane<'_>, &S) + Sync,
    {
        if n_groups == 0 {
            return Ok(());
        }
        let group_size = self.config.group_size;
        tracing::debug!(n_groups, group_size, "dispatching kernel grid");
        (0..n_groups)
            .into_par_iter()
            .try_for_each(|group_id| run_group(group_id, n_groups, group_size, &group_state, &kernel))
    }
}

fn run_group<S, G, K>(
    group_id: usize,
    group_range: usize,
    group_size: usize,
    group_state: &G,
    kernel: &K,
) -> Result<()>
where
    S: Sync,
    G: Fn(usize) -> S + Sync,
    K: Fn(&Lane<'_>, &S) + Sync,
{
    let shared = group_state(group_id);
    let barrier = GroupBarrier::new(group_size);
    let mut failure: Option<String> = None;

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..group_size)
            .map(|local_id| {
                let lane = Lane {
                    local_id,
                    group_id,
                    local_range: group_size,
                    group_range,
                    barrier: &barrier,
                };
                let shared = &shared;
                scope.spawn(move || -> std::result::Result<(), String> {
                    match catch_unwind(AssertUnwindSafe(|| kernel(&lane, shared))) {
                        Ok(()) => Ok(()),
                        Err(payload) => {
                            // Release sibling lanes parked on the barrier.
                            lane.barrier.break_all();
                            Err(panic_text(&*payload))
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            match handle.join() {
                Ok(Ok(())) => {}
                Ok(Err(message)) => {
                    failure.get_or_insert(message);
                }
                Err(_) => {
                    failure.get_or_insert_with(|| "lane thread panicked".to_string());
                }
            }
        }
    });

    match failure {
        Some(message) => Err(DeviceError::DispatchFailed(message)),
        None => Ok(()),
    }
}

fn panic_text(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "kernel panicked".to_string()
    }
}

/// One executing lane of a dispatch.
pub struct Lane<'a> {
    local_id: usize,
    group_id: usize,
    local_range: usize,
    group_range: usize,
    barrier: &'a GroupBarrier,
}

impl WorkItem for Lane<'_> {
    fn local_id(&self) -> usize {
        self.local_id
    }

    fn group_id(&self) -> usize {
        self.group_id
    }

    fn local_range(&self) -> usize {
        self.local_range
    }

    fn group_range(&self) -> usize {
        self.group_range
    }

    fn barrier(&self) {
        self.barrier.wait();
    }
}

impl Lane<'_> {
    /// Consecutive tile of `n` elements owned by this lane.
    pub(crate) fn tile(&self, n: usize) -> Tile {
        Tile::consecutive(n, self.global_id(), self.global_range())
    }
}

/// Barrier shared by the lanes of one group.
///
/// Unlike `std::sync::Barrier`, this one can be broken: once any lane
/// fails, `break_all` releases current and future waiters immediately so
/// the group can unwind instead of hanging on a rendezvous that will never
/// complete.
struct GroupBarrier {
    lanes: usize,
    state: Mutex<BarrierState>,
    condvar: Condvar,
}

struct BarrierState {
    arrived: usize,
    generation: u64,
    broken: bool,
}

impl GroupBarrier {
    fn new(lanes: usize) -> Self {
        Self {
            lanes,
            state: Mutex::new(BarrierState {
                arrived: 0,
                generation: 0,
                broken: false,
            }),
            condvar: Condvar::new(),
        }
    }

    fn wait(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.broken {
            return;
        }
        state.arrived += 1;
        if state.arrived == self.lanes {
            state.arrived = 0;
            state.generation = state.generation.wrapping_add(1);
            self.condvar.notify_all();
            return;
        }
        let generation = state.generation;
        while state.generation == generation && !state.broken {
            state = self
                .condvar
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    fn break_all(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.broken = true;
        self.condvar.notify_all();
    }
}
