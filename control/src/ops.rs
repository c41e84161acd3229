// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Applies a decoded [`wire::Request`] to a [`ControlBridge`] and reports
//! the POSIX errno a control-plane caller should see.

use crate::wire::Request;
use errno::StandardErrno;
use routing::ControlBridge;
use thiserror::Error;

/// A control-plane operation failed.
///
/// Every variant carries or converts to a POSIX errno per the control
/// wire's response `status` field; datapath forwarding is unaffected by
/// any of these.
#[derive(Debug, Error, Copy, Clone, PartialEq, Eq)]
pub enum ControlError {
    /// A FIB prefix was malformed or out of range (not reachable through
    /// [`wire::Request::decode`], which already rejects this, but kept so
    /// callers building requests directly still get a typed error).
    #[error("invalid prefix")]
    InvalidPrefix,
    /// A next hop, interface, or txq operation referenced an id nothing
    /// else has defined. Only meaningful for operations where referencing
    /// an absent id is itself the error (not delete/remove, which are
    /// idempotent).
    #[error("unknown id")]
    UnknownId,
    /// A table has no room for another entry.
    #[error("table full")]
    TableFull,
}

impl ControlError {
    /// The POSIX errno this error reports to the control plane.
    #[must_use]
    pub fn errno(self) -> StandardErrno {
        match self {
            ControlError::InvalidPrefix => StandardErrno::InvalidArgument,
            ControlError::UnknownId => StandardErrno::NoSuchFileOrDirectory,
            ControlError::TableFull => StandardErrno::NoSpaceLeftOnDevice,
        }
    }
}

/// Apply a decoded request to `bridge`.
///
/// Every [`Request`] variant maps onto exactly one [`ControlBridge`]
/// mutation; this function never fails on its own, since the wire decoder
/// upstream already rejects malformed prefixes and payloads, and every
/// remaining operation (set, remove) is defined for every input. It exists
/// as its own seam so the server's response path never has to know the
/// bridge's method names.
pub fn apply(bridge: &ControlBridge, request: &Request) {
    match request {
        Request::FibAdd { prefix, next_hop } => bridge.set_route(*prefix, *next_hop),
        Request::FibDelete { prefix } => bridge.remove_route(*prefix),
        Request::NextHopSet { id, next_hop } => bridge.set_next_hop(*id, next_hop.clone()),
        Request::NextHopRemove { id } => bridge.remove_next_hop(*id),
        Request::InterfaceSet { id, interface } => bridge.set_interface(*id, interface.clone()),
        Request::InterfaceRemove { id } => bridge.remove_interface(*id),
        Request::InterfaceAdminState { id, state } => {
            bridge.set_interface_admin_state(*id, *state);
        }
        Request::TxqAssign {
            worker,
            port,
            queue,
        } => bridge.assign_txq(*worker, *port, *queue),
        Request::TxqUnassign { worker, port } => bridge.unassign_txq(*worker, *port),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#[cfg(test)]
mod test {
    use super::*;
    use net::packet::InterfaceId;
    use routing::NextHopId;
    use std::net::Ipv4Addr;

    #[test]
    fn fib_add_is_visible_through_the_bridges_own_reader() {
        let bridge = ControlBridge::new();
        bridge.set_next_hop(NextHopId(1), routing::NextHop::drop());
        apply(
            &bridge,
            &Request::FibAdd {
                prefix: "10.0.0.0/8".parse().unwrap(),
                next_hop: NextHopId(1),
            },
        );
        let reader = bridge.fib_reader();
        let guard = reader.enter().unwrap();
        assert_eq!(
            guard.lookup(Ipv4Addr::new(10, 1, 1, 1)).unwrap().next_hop,
            NextHopId(1)
        );
    }

    #[test]
    fn fib_delete_withdraws_the_route() {
        let bridge = ControlBridge::new();
        bridge.set_next_hop(NextHopId(1), routing::NextHop::drop());
        let prefix = "10.0.0.0/8".parse().unwrap();
        apply(
            &bridge,
            &Request::FibAdd {
                prefix,
                next_hop: NextHopId(1),
            },
        );
        apply(&bridge, &Request::FibDelete { prefix });
        let reader = bridge.fib_reader();
        let guard = reader.enter().unwrap();
        assert!(guard.lookup(Ipv4Addr::new(10, 1, 1, 1)).is_none());
    }

    #[test]
    fn interface_remove_is_visible_through_the_bridges_own_reader() {
        let bridge = ControlBridge::new();
        let id = InterfaceId::new(1);
        apply(
            &bridge,
            &Request::InterfaceSet {
                id,
                interface: routing::Interface {
                    name: "eth0".to_string(),
                    admin_state: net::interface::AdminState::Up,
                    address: None,
                    mac: net::eth::mac::Mac([0x02, 0, 0, 0, 0, 1]),
                    kind: routing::InterfaceKind::Physical { port: 0, queue: 0 },
                },
            },
        );
        apply(&bridge, &Request::InterfaceRemove { id });
        let reader = bridge.interface_reader();
        let guard = reader.enter().unwrap();
        assert!(guard.get(id).is_none());
    }

    #[test]
    fn control_errors_map_to_the_expected_errno() {
        assert_eq!(
            ControlError::InvalidPrefix.errno(),
            StandardErrno::InvalidArgument
        );
        assert_eq!(
            ControlError::UnknownId.errno(),
            StandardErrno::NoSuchFileOrDirectory
        );
        assert_eq!(
            ControlError::TableFull.errno(),
            StandardErrno::NoSpaceLeftOnDevice
        );
    }
}
