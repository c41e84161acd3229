// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The interface table: an RCU-protected `id -> Interface` map describing
//! the ports and tunnels the graph can emit packets on.

use left_right::{Absorb, ReadGuard, ReadHandle, ReadHandleFactory, WriteHandle};
use net::eth::mac::Mac;
use net::interface::AdminState;
use net::packet::InterfaceId;
use std::collections::HashMap;
use std::net::Ipv4Addr;

/// What kind of egress an interface represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterfaceKind {
    /// A physical (or software-ported) link, identified by the
    /// `ports`-crate port/queue pair a worker should transmit onto.
    Physical {
        /// The port to transmit on.
        port: u16,
        /// The transmit queue, within that port, assigned to this worker.
        queue: u16,
    },
    /// An IP-in-IP tunnel interface; packets routed here get an outer
    /// IPv4 header prepended. A tunnel has no port/queue of its own: the
    /// outer destination is resolved through the FIB like any other
    /// address, and whatever interface that resolves to supplies the port.
    IpIp {
        /// Tunnel local (outer source) address.
        local: Ipv4Addr,
    },
}

/// An interface record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interface {
    /// Administrative name, for diagnostics and the control protocol.
    pub name: String,
    /// Administrative state; an admin-down interface is never a valid
    /// egress regardless of what the FIB resolves.
    pub admin_state: AdminState,
    /// The interface's own IPv4 address, if it has one.
    pub address: Option<Ipv4Addr>,
    /// The interface's own link-layer address, stamped as the source MAC
    /// on every frame this interface emits.
    pub mac: Mac,
    /// What kind of egress this interface is and the queue it maps to.
    pub kind: InterfaceKind,
}

/// The interface table proper.
#[derive(Debug, Default, Clone)]
pub struct InterfaceTable(HashMap<InterfaceId, Interface>);

impl InterfaceTable {
    /// Look up an interface by id.
    #[must_use]
    pub fn get(&self, id: InterfaceId) -> Option<&Interface> {
        self.0.get(&id)
    }
}

enum InterfaceChange {
    Set(InterfaceId, Interface),
    Remove(InterfaceId),
    SetAdminState(InterfaceId, AdminState),
}

impl Absorb<InterfaceChange> for InterfaceTable {
    fn absorb_first(&mut self, change: &mut InterfaceChange, _other: &Self) {
        match change {
            InterfaceChange::Set(id, iface) => {
                self.0.insert(*id, iface.clone());
            }
            InterfaceChange::Remove(id) => {
                self.0.remove(id);
            }
            InterfaceChange::SetAdminState(id, state) => {
                if let Some(iface) = self.0.get_mut(id) {
                    iface.admin_state = *state;
                }
            }
        }
    }

    fn drop_first(self: Box<Self>) {}

    fn sync_with(&mut self, first: &Self) {
        self.clone_from(first);
    }
}

/// The single writer half of the interface table.
pub struct InterfaceWriter(WriteHandle<InterfaceTable, InterfaceChange>);

impl InterfaceWriter {
    /// Create an empty interface table and its writer/reader pair.
    #[must_use]
    pub fn new() -> (Self, InterfaceReader) {
        let (w, r) = left_right::new_from_empty::<InterfaceTable, InterfaceChange>(
            InterfaceTable::default(),
        );
        (Self(w), InterfaceReader(r))
    }

    /// Mint another reader over this table.
    #[must_use]
    pub fn as_reader(&self) -> InterfaceReader {
        InterfaceReader(self.0.clone())
    }

    /// A factory for minting readers without a direct reference to this
    /// writer.
    #[must_use]
    pub fn factory(&self) -> ReadHandleFactory<InterfaceTable> {
        self.0.factory()
    }

    /// Insert or replace an interface record.
    pub fn set(&mut self, id: InterfaceId, iface: Interface) {
        self.0.append(InterfaceChange::Set(id, iface));
        self.0.publish();
    }

    /// Remove an interface record.
    pub fn remove(&mut self, id: InterfaceId) {
        self.0.append(InterfaceChange::Remove(id));
        self.0.publish();
    }

    /// Flip an interface's administrative state.
    pub fn set_admin_state(&mut self, id: InterfaceId, state: AdminState) {
        self.0.append(InterfaceChange::SetAdminState(id, state));
        self.0.publish();
    }
}

/// A cheap-to-clone handle for lock-free reads of the interface table.
#[derive(Clone)]
pub struct InterfaceReader(ReadHandle<InterfaceTable>);

impl InterfaceReader {
    /// Enter a read section.
    #[must_use]
    pub fn enter(&self) -> Option<ReadGuard<'_, InterfaceTable>> {
        self.0.enter()
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#[cfg(test)]
mod test {
    use super::*;

    fn physical(name: &str) -> Interface {
        Interface {
            name: name.to_owned(),
            admin_state: AdminState::Up,
            address: Some(Ipv4Addr::new(10, 0, 0, 1)),
            mac: Mac([0x02, 0, 0, 0, 0, 1]),
            kind: InterfaceKind::Physical { port: 0, queue: 0 },
        }
    }

    #[test]
    fn set_then_read_back() {
        let (mut writer, reader) = InterfaceWriter::new();
        let id = InterfaceId::new(1);
        writer.set(id, physical("eth0"));
        let guard = reader.enter().unwrap();
        assert_eq!(guard.get(id).unwrap().name, "eth0");
    }

    #[test]
    fn admin_down_is_visible_to_readers() {
        let (mut writer, reader) = InterfaceWriter::new();
        let id = InterfaceId::new(1);
        writer.set(id, physical("eth0"));
        writer.set_admin_state(id, AdminState::Down);
        let guard = reader.enter().unwrap();
        assert_eq!(guard.get(id).unwrap().admin_state, AdminState::Down);
    }
}
