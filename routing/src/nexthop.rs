// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The next-hop table: a small, dense, RCU-protected `id -> NextHop` map.
//!
//! Routes in the [`crate::fib`] don't carry a gateway address or an egress
//! interface directly; they carry a [`NextHopId`], so that many prefixes
//! sharing one next hop share one record, and a next hop can be updated
//! (a gateway's resolved MAC changes, an interface flaps) without walking
//! every route that points at it.

use left_right::{Absorb, ReadGuard, ReadHandle, ReadHandleFactory, WriteHandle};
use net::eth::mac::Mac;
use net::packet::InterfaceId;
use std::collections::HashMap;
use std::net::Ipv4Addr;

/// What a next hop does with a packet once resolved.
#[derive(Debug, Default, Copy, Clone, Hash, Eq, PartialEq, PartialOrd, Ord)]
pub enum FwAction {
    /// Forward the packet out the resolved interface.
    #[default]
    Forward,
    /// Drop the packet; used for null routes and administratively
    /// blackholed prefixes.
    Drop,
}

/// Identifies a [`NextHop`] in the [`NextHopTable`].
#[repr(transparent)]
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq, PartialOrd, Ord)]
pub struct NextHopId(pub u32);

impl net::scratch::ScratchValue for NextHopId {
    fn to_slot(self) -> u64 {
        u64::from(self.0)
    }
    fn from_slot(slot: u64) -> Self {
        #[allow(clippy::cast_possible_truncation)]
        Self(slot as u32)
    }
}

/// Parameters for a tunnel-encapsulated next hop (IP-in-IP).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Tunnel {
    /// Local tunnel endpoint address, used as the outer source.
    pub local: Ipv4Addr,
    /// Remote tunnel endpoint address, used as the outer destination.
    pub remote: Ipv4Addr,
}

/// A resolved next hop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextHop {
    /// What to do with a packet that resolves to this next hop.
    pub action: FwAction,
    /// The gateway address to resolve an egress link-layer address for, if
    /// any (absent for directly connected or tunnel next hops).
    pub gateway: Option<Ipv4Addr>,
    /// The interface to emit the packet from.
    pub egress_interface: Option<InterfaceId>,
    /// Tunnel encapsulation parameters, if this next hop routes onto an
    /// IP-in-IP tunnel interface.
    pub tunnel: Option<Tunnel>,
    /// The resolved destination link-layer address to stamp onto the
    /// outgoing frame -- the gateway's MAC for an onlink next hop, or the
    /// remote tunnel endpoint's MAC for a tunnel one.
    pub mac: Mac,
}

impl NextHop {
    /// A next hop that unconditionally drops.
    #[must_use]
    pub fn drop() -> Self {
        Self {
            action: FwAction::Drop,
            gateway: None,
            egress_interface: None,
            tunnel: None,
            mac: Mac::ZERO,
        }
    }
}

/// The next-hop table proper.
///
/// Cheap to clone: `sync_with` needs a full copy to bring the stale left-
/// right replica up to date, and this table is expected to hold at most a
/// few thousand entries.
#[derive(Debug, Default, Clone)]
pub struct NextHopTable(HashMap<NextHopId, NextHop>);

impl NextHopTable {
    /// Look up a next hop by id.
    #[must_use]
    pub fn get(&self, id: NextHopId) -> Option<&NextHop> {
        self.0.get(&id)
    }
}

enum NextHopChange {
    Set(NextHopId, NextHop),
    Remove(NextHopId),
}

impl Absorb<NextHopChange> for NextHopTable {
    fn absorb_first(&mut self, change: &mut NextHopChange, _other: &Self) {
        match change {
            NextHopChange::Set(id, nh) => {
                self.0.insert(*id, nh.clone());
            }
            NextHopChange::Remove(id) => {
                self.0.remove(id);
            }
        }
    }

    fn drop_first(self: Box<Self>) {}

    fn sync_with(&mut self, first: &Self) {
        self.clone_from(first);
    }
}

/// The single writer half of the next-hop table.
///
/// Owned exclusively by [`crate::control::ControlBridge`]; every mutation
/// is append-then-publish, so readers never observe a torn update.
pub struct NextHopWriter(WriteHandle<NextHopTable, NextHopChange>);

impl NextHopWriter {
    /// Create an empty next-hop table and its writer/reader pair.
    #[must_use]
    pub fn new() -> (Self, NextHopReader) {
        let (w, r) = left_right::new_from_empty::<NextHopTable, NextHopChange>(
            NextHopTable::default(),
        );
        (Self(w), NextHopReader(r))
    }

    /// Mint another reader over this table.
    #[must_use]
    pub fn as_reader(&self) -> NextHopReader {
        NextHopReader(self.0.clone())
    }

    /// A factory for minting readers without holding a direct reference to
    /// this writer; used by [`crate::control::ControlBridge`] to back a
    /// `left-right-tlcache` provider.
    #[must_use]
    pub fn factory(&self) -> ReadHandleFactory<NextHopTable> {
        self.0.factory()
    }

    /// Insert or update a next hop.
    pub fn set(&mut self, id: NextHopId, next_hop: NextHop) {
        self.0.append(NextHopChange::Set(id, next_hop));
        self.0.publish();
    }

    /// Remove a next hop. Routes still pointing at a removed id resolve to
    /// nothing, which `ipv4_lookup` treats as [`crate::fib`]'s no-route
    /// case.
    pub fn remove(&mut self, id: NextHopId) {
        self.0.append(NextHopChange::Remove(id));
        self.0.publish();
    }
}

/// A cheap-to-clone handle for lock-free reads of the next-hop table.
#[derive(Clone)]
pub struct NextHopReader(ReadHandle<NextHopTable>);

impl NextHopReader {
    /// Enter a read section. The returned guard borrows whichever replica
    /// is not currently being written; holding it across a packet burst
    /// and dropping it at the burst boundary is the expected usage.
    #[must_use]
    pub fn enter(&self) -> Option<ReadGuard<'_, NextHopTable>> {
        self.0.enter()
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn set_then_read_back() {
        let (mut writer, reader) = NextHopWriter::new();
        let id = NextHopId(1);
        writer.set(
            id,
            NextHop {
                action: FwAction::Forward,
                gateway: Some(Ipv4Addr::new(10, 0, 0, 1)),
                egress_interface: Some(InterfaceId::new(3)),
                tunnel: None,
                mac: Mac([0x02, 0, 0, 0, 0, 9]),
            },
        );
        let guard = reader.enter().unwrap();
        assert_eq!(guard.get(id).unwrap().gateway, Some(Ipv4Addr::new(10, 0, 0, 1)));
    }

    #[test]
    fn removed_id_reads_back_none() {
        let (mut writer, reader) = NextHopWriter::new();
        let id = NextHopId(1);
        writer.set(id, NextHop::drop());
        writer.remove(id);
        let guard = reader.enter().unwrap();
        assert!(guard.get(id).is_none());
    }
}
