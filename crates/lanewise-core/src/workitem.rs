//! Lane identity and synchronization capability.
//!
//! Kernels never consult the device or any global state to learn where
//! they run. Everything a kernel may observe about its position, and the
//! only synchronization primitive it may use, comes through this trait.
//! Keeping kernels generic over [`WorkItem`] pins the decomposition logic
//! to the injected geometry and keeps it testable with a fake item.

/// Position of one lane within a dispatch, plus its group barrier.
pub trait WorkItem {
    /// Index of this lane within its group, in `0..local_range()`.
    fn local_id(&self) -> usize;

    /// Index of this lane's group, in `0..group_range()`.
    fn group_id(&self) -> usize;

    /// Number of lanes per group.
    fn local_range(&self) -> usize;

    /// Number of groups in the dispatch.
    fn group_range(&self) -> usize;

    /// Index of this lane across the whole dispatch.
    fn global_id(&self) -> usize {
        self.group_id() * self.local_range() + self.local_id()
    }

    /// Total number of lanes in the dispatch.
    fn global_range(&self) -> usize {
        self.local_range() * self.group_range()
    }

    /// Rendezvous with every lane of the group.
    ///
    /// All writes to group scratch made before the barrier are visible to
    /// every lane of the group after it. Kernels must keep barrier calls
    /// group-uniform: range checks guard loads and stores, never a barrier.
    fn barrier(&self);
}
