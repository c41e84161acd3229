// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Per-worker transmit queue assignment.
//!
//! Unlike the FIB, next-hop, and interface tables, this map is consulted
//! only at worker init, never from the per-packet hot path, so a plain
//! mutex carries it; there is no RCU discipline to uphold here and no
//! readers to keep lock-free.

use ports::{PortId, TxQueueIndex};
use std::collections::HashMap;
use std::sync::Mutex;

/// Identifies a worker thread for the purpose of TX queue assignment.
#[repr(transparent)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkerId(pub u32);

/// The `(worker, port) -> queue` map a worker reads once, at init, to learn
/// which queue of each port it owns.
///
/// Installed before worker start; updatable before a reconfiguration. A
/// worker already running keeps using the assignment it read at its last
/// init until it restarts.
#[derive(Default)]
pub struct TxqAssignments(Mutex<HashMap<(WorkerId, PortId), TxQueueIndex>>);

impl TxqAssignments {
    /// An empty assignment table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign `queue` of `port` to `worker`, replacing any prior assignment
    /// of that `(worker, port)` pair.
    #[allow(clippy::missing_panics_doc)] // poisoned mutex is a bug, not a reachable error
    pub fn assign(&self, worker: WorkerId, port: PortId, queue: TxQueueIndex) {
        let mut map = self.0.lock().unwrap_or_else(|e| e.into_inner());
        map.insert((worker, port), queue);
    }

    /// Remove a worker's assignment for `port`, if any.
    pub fn unassign(&self, worker: WorkerId, port: PortId) {
        let mut map = self.0.lock().unwrap_or_else(|e| e.into_inner());
        map.remove(&(worker, port));
    }

    /// Every `(port, queue)` pair currently assigned to `worker`.
    #[must_use]
    pub fn for_worker(&self, worker: WorkerId) -> Vec<(PortId, TxQueueIndex)> {
        let map = self.0.lock().unwrap_or_else(|e| e.into_inner());
        map.iter()
            .filter(|((w, _), _)| *w == worker)
            .map(|((_, port), queue)| (*port, *queue))
            .collect()
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn assignment_is_visible_and_scoped_to_its_worker() {
        let table = TxqAssignments::new();
        table.assign(WorkerId(0), PortId(1), TxQueueIndex(3));
        table.assign(WorkerId(1), PortId(1), TxQueueIndex(4));

        let worker0 = table.for_worker(WorkerId(0));
        assert_eq!(worker0, vec![(PortId(1), TxQueueIndex(3))]);
        let worker1 = table.for_worker(WorkerId(1));
        assert_eq!(worker1, vec![(PortId(1), TxQueueIndex(4))]);
    }

    #[test]
    fn unassign_removes_only_that_pair() {
        let table = TxqAssignments::new();
        table.assign(WorkerId(0), PortId(1), TxQueueIndex(3));
        table.assign(WorkerId(0), PortId(2), TxQueueIndex(5));
        table.unassign(WorkerId(0), PortId(1));
        assert_eq!(table.for_worker(WorkerId(0)), vec![(PortId(2), TxQueueIndex(5))]);
    }
}
