// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The single point through which the control plane mutates forwarding
//! state.
//!
//! [`ControlBridge`] owns the writer half of the FIB, the next-hop table,
//! and the interface table, plus the per-worker TX queue assignment map.
//! Every mutation to the RCU-protected tables goes through one `Mutex`, so
//! concurrent control requests serialize cleanly even though each
//! individual table is itself safe for many concurrent readers; this
//! crate never hands out a second writer.

use std::sync::Mutex;

use ipnet::Ipv4Net;
use left_right::ReadHandleFactory;
use left_right_tlcache::ReadHandleProvider;

use crate::fib::{Fib, FibEntry, FibReader, FibWriter};
use crate::interface::{Interface, InterfaceReader, InterfaceTable, InterfaceWriter};
use crate::nexthop::{NextHop, NextHopId, NextHopReader, NextHopTable, NextHopWriter};
use crate::txq::{TxqAssignments, WorkerId};
use net::interface::AdminState;
use net::packet::InterfaceId;
use ports::{PortId, TxQueueIndex};

struct Tables {
    fib: FibWriter,
    next_hops: NextHopWriter,
    interfaces: InterfaceWriter,
}

/// Owns every writer half of the forwarding state and mediates every
/// control-plane mutation to it.
pub struct ControlBridge {
    tables: Mutex<Tables>,
    fib_factory: ReadHandleFactory<Fib>,
    next_hop_factory: ReadHandleFactory<NextHopTable>,
    interface_factory: ReadHandleFactory<InterfaceTable>,
    fib_reader: FibReader,
    next_hop_reader: NextHopReader,
    interface_reader: InterfaceReader,
    txq: TxqAssignments,
}

impl ControlBridge {
    /// Build a bridge with empty FIB, next-hop, and interface tables.
    #[must_use]
    pub fn new() -> Self {
        let (fib, fib_reader) = FibWriter::new();
        let (next_hops, next_hop_reader) = NextHopWriter::new();
        let (interfaces, interface_reader) = InterfaceWriter::new();
        let fib_factory = fib.factory();
        let next_hop_factory = next_hops.factory();
        let interface_factory = interfaces.factory();
        Self {
            tables: Mutex::new(Tables {
                fib,
                next_hops,
                interfaces,
            }),
            fib_factory,
            next_hop_factory,
            interface_factory,
            fib_reader,
            next_hop_reader,
            interface_reader,
            txq: TxqAssignments::new(),
        }
    }

    /// A reader over the FIB, cheap to clone and safe to hand to any
    /// number of forwarding workers.
    #[must_use]
    pub fn fib_reader(&self) -> FibReader {
        self.fib_reader.clone()
    }

    /// A reader over the next-hop table.
    #[must_use]
    pub fn next_hop_reader(&self) -> NextHopReader {
        self.next_hop_reader.clone()
    }

    /// A reader over the interface table.
    #[must_use]
    pub fn interface_reader(&self) -> InterfaceReader {
        self.interface_reader.clone()
    }

    /// A factory for minting next-hop table readers.
    #[must_use]
    pub fn next_hop_factory(&self) -> &ReadHandleFactory<NextHopTable> {
        &self.next_hop_factory
    }

    /// A factory for minting interface table readers.
    #[must_use]
    pub fn interface_factory(&self) -> &ReadHandleFactory<InterfaceTable> {
        &self.interface_factory
    }

    /// Install or replace a route.
    #[allow(clippy::missing_panics_doc)] // poisoned mutex is a bug, not a reachable error
    pub fn set_route(&self, prefix: Ipv4Net, next_hop: NextHopId) {
        let mut tables = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        tables.fib.insert(prefix, FibEntry { next_hop });
    }

    /// Withdraw a route.
    pub fn remove_route(&self, prefix: Ipv4Net) {
        let mut tables = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        tables.fib.remove(prefix);
    }

    /// Install or replace a next hop.
    pub fn set_next_hop(&self, id: NextHopId, next_hop: NextHop) {
        let mut tables = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        tables.next_hops.set(id, next_hop);
    }

    /// Remove a next hop.
    pub fn remove_next_hop(&self, id: NextHopId) {
        let mut tables = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        tables.next_hops.remove(id);
    }

    /// Install or replace an interface.
    pub fn set_interface(&self, id: InterfaceId, interface: Interface) {
        let mut tables = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        tables.interfaces.set(id, interface);
    }

    /// Remove an interface.
    pub fn remove_interface(&self, id: InterfaceId) {
        let mut tables = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        tables.interfaces.remove(id);
    }

    /// Flip an interface's administrative state.
    pub fn set_interface_admin_state(&self, id: InterfaceId, state: AdminState) {
        let mut tables = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        tables.interfaces.set_admin_state(id, state);
    }

    /// Assign `queue` of `port` to `worker`.
    pub fn assign_txq(&self, worker: WorkerId, port: PortId, queue: TxQueueIndex) {
        self.txq.assign(worker, port, queue);
    }

    /// Remove `worker`'s assignment for `port`, if any.
    pub fn unassign_txq(&self, worker: WorkerId, port: PortId) {
        self.txq.unassign(worker, port);
    }

    /// Every `(port, queue)` pair currently assigned to `worker`.
    #[must_use]
    pub fn txq_assignment(&self, worker: WorkerId) -> Vec<(PortId, TxQueueIndex)> {
        self.txq.for_worker(worker)
    }
}

impl Default for ControlBridge {
    fn default() -> Self {
        Self::new()
    }
}

/// There is exactly one FIB (no VRFs), so a `left-right-tlcache`
/// thread-local cache keyed off this bridge only ever needs one key.
impl ReadHandleProvider for ControlBridge {
    type Data = Fib;
    type Key = ();

    fn get_factory(&self, (): &()) -> Option<&ReadHandleFactory<Fib>> {
        Some(&self.fib_factory)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#[cfg(test)]
mod test {
    use super::*;
    use left_right_tlcache::{ReadHandleCache, make_thread_local_readhandle_cache};
    use std::net::Ipv4Addr;

    make_thread_local_readhandle_cache!(TEST_FIB_CACHE, (), Fib);

    #[test]
    fn set_route_is_visible_through_tlcache() {
        let bridge = ControlBridge::new();
        bridge.set_next_hop(NextHopId(1), NextHop::drop());
        bridge.set_route("10.0.0.0/8".parse().unwrap(), NextHopId(1));

        let reader =
            left_right_tlcache::ReadHandleCache::get_reader(&TEST_FIB_CACHE, (), &bridge).unwrap();
        let guard = reader.enter().unwrap();
        assert_eq!(
            guard.lookup(Ipv4Addr::new(10, 1, 2, 3)).unwrap().next_hop,
            NextHopId(1)
        );
    }
}
