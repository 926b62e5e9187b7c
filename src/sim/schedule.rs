//! Delayed ball spawns
//!
//! Staggered batch throws are modelled as timers on the simulation clock.
//! Each timer fires exactly once unless cancelled first.

use serde::{Deserialize, Serialize};

use super::path::Path;

/// Cancellation handle of a scheduled spawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SpawnHandle(u64);

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PendingSpawn {
    handle: SpawnHandle,
    /// Simulation clock (ms) at which the spawn fires
    due_ms: f64,
    path: Path,
}

/// Pending spawn timers
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpawnQueue {
    pending: Vec<PendingSpawn>,
    next_handle: u64,
}

impl SpawnQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a spawn of `path` at clock time `due_ms`
    pub fn schedule(&mut self, path: Path, due_ms: f64) -> SpawnHandle {
        let handle = SpawnHandle(self.next_handle);
        self.next_handle += 1;
        self.pending.push(PendingSpawn { handle, due_ms, path });
        handle
    }

    /// Cancel a pending spawn; false when it already fired or never existed
    pub fn cancel(&mut self, handle: SpawnHandle) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.handle != handle);
        self.pending.len() != before
    }

    /// Remove and return every spawn due at `now_ms`, earliest first
    pub fn take_due(&mut self, now_ms: f64) -> Vec<(SpawnHandle, Path)> {
        let (mut due, pending): (Vec<_>, Vec<_>) =
            self.pending.drain(..).partition(|p| p.due_ms <= now_ms);
        self.pending = pending;
        due.sort_by(|a, b| a.due_ms.total_cmp(&b.due_ms).then(a.handle.cmp(&b.handle)));
        due.into_iter().map(|p| (p.handle, p.path)).collect()
    }

    /// Drop every pending spawn, returning how many were cancelled
    pub fn clear(&mut self) -> usize {
        let count = self.pending.len();
        self.pending.clear();
        count
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn contains(&self, handle: SpawnHandle) -> bool {
        self.pending.iter().any(|p| p.handle == handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawns_fire_once_in_order() {
        let mut queue = SpawnQueue::new();
        let late = queue.schedule(Path::default(), 300.0);
        let early = queue.schedule(Path::default(), 100.0);
        let same = queue.schedule(Path::default(), 100.0);

        assert!(queue.take_due(50.0).is_empty());
        let fired: Vec<SpawnHandle> = queue.take_due(150.0).into_iter().map(|(h, _)| h).collect();
        assert_eq!(fired, vec![early, same]);
        assert!(queue.take_due(150.0).is_empty());

        let fired: Vec<SpawnHandle> = queue.take_due(1000.0).into_iter().map(|(h, _)| h).collect();
        assert_eq!(fired, vec![late]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_cancel() {
        let mut queue = SpawnQueue::new();
        let a = queue.schedule(Path::default(), 10.0);
        let b = queue.schedule(Path::default(), 20.0);
        assert!(queue.cancel(a));
        assert!(!queue.cancel(a));
        assert!(!queue.contains(a));
        assert_eq!(queue.len(), 1);

        let fired = queue.take_due(100.0);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].0, b);
        // Fired timers cannot be cancelled
        assert!(!queue.cancel(b));
    }

    #[test]
    fn test_clear() {
        let mut queue = SpawnQueue::new();
        queue.schedule(Path::default(), 10.0);
        queue.schedule(Path::default(), 20.0);
        assert_eq!(queue.clear(), 2);
        assert!(queue.take_due(f64::MAX).is_empty());
        // Handles stay unique after a clear
        let next = queue.schedule(Path::default(), 0.0);
        assert_eq!(next, SpawnHandle(2));
    }
}
