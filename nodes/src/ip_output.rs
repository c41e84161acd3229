// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Egress dispatch: resolve the outgoing interface `ipv4_rewrite` chose and
//! decide whether the packet goes straight to `tx` or needs `ipip_output`
//! to wrap it in a tunnel header first.

use graph::init_data;
use graph::{Node, Pkt};
use linkme::distributed_slice;
use net::interface::AdminState;
use net::packet::DoneReason;
use routing::{InterfaceKind, InterfaceReader, NextHopReader};

use crate::fields;

struct IpOutput {
    interfaces: InterfaceReader,
    next_hops: NextHopReader,
}

impl Node for IpOutput {
    fn name(&self) -> &'static str {
        "ip_output"
    }

    fn process(&self, packet: &mut Pkt) -> Option<&'static str> {
        let Some(oif) = packet.get_meta().oif else {
            packet.done(DoneReason::InternalFailure);
            return Some("drop");
        };
        let Some(guard) = self.interfaces.enter() else {
            packet.done(DoneReason::InternalFailure);
            return Some("drop");
        };
        let Some(iface) = guard.get(oif) else {
            packet.done(DoneReason::InterfaceUnknown);
            return Some("drop");
        };
        if iface.admin_state == AdminState::Down {
            packet.done(DoneReason::InterfaceDown);
            return Some("drop");
        }

        match iface.kind {
            InterfaceKind::Physical { port, queue } => {
                packet.get_meta_mut().scratch.set(fields::egress_port(), port);
                packet
                    .get_meta_mut()
                    .scratch
                    .set(fields::egress_queue(), queue);
                Some("tx")
            }
            InterfaceKind::IpIp { local } => {
                drop(guard);
                let next_hop_id = packet.get_meta().scratch.get(fields::next_hop());
                let Some(nh_guard) = self.next_hops.enter() else {
                    packet.done(DoneReason::InternalFailure);
                    return Some("drop");
                };
                let Some(next_hop) = nh_guard.get(next_hop_id) else {
                    packet.done(DoneReason::InternalFailure);
                    return Some("drop");
                };
                let Some(tunnel) = next_hop.tunnel else {
                    packet.done(DoneReason::TunnelMismatch);
                    return Some("drop");
                };

                let meta = packet.get_meta_mut();
                meta.scratch.set(fields::tunnel_local(), local);
                meta.scratch.set(fields::tunnel_remote(), tunnel.remote);
                Some("ipip_output")
            }
        }
    }
}

#[distributed_slice(graph::NODE_REGISTRY)]
static TEMPLATE: graph::NodeTemplate = graph::NodeTemplate {
    name: "ip_output",
    edges: &["tx", "ipip_output", "drop"],
    constructor: || {
        let interfaces: &'static InterfaceReader = init_data::get("ip_output")
            .unwrap_or_else(|e| unreachable!("ip_output init data (interfaces): {e}"));
        let next_hops: &'static NextHopReader = init_data::get("ip_output_next_hops")
            .unwrap_or_else(|e| unreachable!("ip_output init data (next hops): {e}"));
        Box::new(IpOutput {
            interfaces: interfaces.clone(),
            next_hops: next_hops.clone(),
        })
    },
    register_callback: None,
};

#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#[cfg(test)]
mod test {
    use super::*;
    use net::buffer::TestBuffer;
    use net::eth::Eth;
    use net::eth::ethtype::EthType;
    use net::eth::mac::{DestinationMac, Mac, SourceMac};
    use net::headers::Headers;
    use net::packet::{InterfaceId, Packet};
    use net::parse::DeParse;
    use routing::{FwAction, Interface, InterfaceWriter, NextHop, NextHopId, NextHopWriter, Tunnel};
    use std::net::Ipv4Addr;

    fn test_packet(oif: InterfaceId, next_hop: NextHopId) -> Pkt {
        let eth = Eth::new(
            SourceMac::new(Mac([0x02, 0, 0, 0, 0, 1])).unwrap(),
            DestinationMac::new(Mac([0x02, 0, 0, 0, 0, 2])).unwrap(),
            EthType::ARP,
        );
        let headers = Headers::new(eth);
        let mut buf = TestBuffer::new();
        headers.deparse(buf.as_mut()).unwrap();
        let mut packet = Packet::new(buf).unwrap();
        packet.get_meta_mut().oif = Some(oif);
        packet
            .get_meta_mut()
            .scratch
            .set(fields::next_hop(), next_hop);
        packet
    }

    #[test]
    fn physical_interface_goes_straight_to_tx() {
        let (mut ifaces, iface_reader) = InterfaceWriter::new();
        let id = InterfaceId::new(1);
        ifaces.set(
            id,
            Interface {
                name: "eth0".to_owned(),
                admin_state: AdminState::Up,
                address: None,
                mac: Mac([0x02, 0, 0, 0, 0, 1]),
                kind: InterfaceKind::Physical { port: 0, queue: 1 },
            },
        );
        let (_nh, nh_reader) = NextHopWriter::new();
        let node = IpOutput {
            interfaces: iface_reader,
            next_hops: nh_reader,
        };
        let mut packet = test_packet(id, NextHopId(1));
        assert_eq!(node.process(&mut packet), Some("tx"));
        assert_eq!(packet.get_meta().scratch.get(fields::egress_port()), 0);
        assert_eq!(packet.get_meta().scratch.get(fields::egress_queue()), 1);
        packet.done(DoneReason::Delivered);
    }

    #[test]
    fn admin_down_interface_is_dropped() {
        let (mut ifaces, iface_reader) = InterfaceWriter::new();
        let id = InterfaceId::new(1);
        ifaces.set(
            id,
            Interface {
                name: "eth0".to_owned(),
                admin_state: AdminState::Down,
                address: None,
                mac: Mac([0x02, 0, 0, 0, 0, 1]),
                kind: InterfaceKind::Physical { port: 0, queue: 0 },
            },
        );
        let (_nh, nh_reader) = NextHopWriter::new();
        let node = IpOutput {
            interfaces: iface_reader,
            next_hops: nh_reader,
        };
        let mut packet = test_packet(id, NextHopId(1));
        assert_eq!(node.process(&mut packet), Some("drop"));
        assert_eq!(packet.get_done(), Some(DoneReason::InterfaceDown));
    }

    #[test]
    fn tunnel_interface_without_tunnel_next_hop_is_mismatch() {
        let (mut ifaces, iface_reader) = InterfaceWriter::new();
        let id = InterfaceId::new(2);
        ifaces.set(
            id,
            Interface {
                name: "ipip0".to_owned(),
                admin_state: AdminState::Up,
                address: None,
                mac: Mac([0x02, 0, 0, 0, 0, 2]),
                kind: InterfaceKind::IpIp {
                    local: Ipv4Addr::new(192, 0, 2, 1),
                },
            },
        );
        let (mut nh, nh_reader) = NextHopWriter::new();
        nh.set(
            NextHopId(1),
            NextHop {
                action: FwAction::Forward,
                gateway: None,
                egress_interface: Some(id),
                tunnel: None,
                mac: Mac::ZERO,
            },
        );
        let node = IpOutput {
            interfaces: iface_reader,
            next_hops: nh_reader,
        };
        let mut packet = test_packet(id, NextHopId(1));
        assert_eq!(node.process(&mut packet), Some("drop"));
        assert_eq!(packet.get_done(), Some(DoneReason::TunnelMismatch));
    }

    #[test]
    fn tunnel_interface_with_tunnel_next_hop_goes_to_ipip_output() {
        let (mut ifaces, iface_reader) = InterfaceWriter::new();
        let id = InterfaceId::new(2);
        ifaces.set(
            id,
            Interface {
                name: "ipip0".to_owned(),
                admin_state: AdminState::Up,
                address: None,
                mac: Mac([0x02, 0, 0, 0, 0, 2]),
                kind: InterfaceKind::IpIp {
                    local: Ipv4Addr::new(192, 0, 2, 1),
                },
            },
        );
        let (mut nh, nh_reader) = NextHopWriter::new();
        nh.set(
            NextHopId(1),
            NextHop {
                action: FwAction::Forward,
                gateway: None,
                egress_interface: Some(id),
                tunnel: Some(Tunnel {
                    local: Ipv4Addr::new(192, 0, 2, 1),
                    remote: Ipv4Addr::new(192, 0, 2, 2),
                }),
                mac: Mac::ZERO,
            },
        );
        let node = IpOutput {
            interfaces: iface_reader,
            next_hops: nh_reader,
        };
        let mut packet = test_packet(id, NextHopId(1));
        assert_eq!(node.process(&mut packet), Some("ipip_output"));
        assert_eq!(
            packet.get_meta().scratch.get(fields::tunnel_remote()),
            Ipv4Addr::new(192, 0, 2, 2)
        );
        packet.done(DoneReason::Delivered);
    }
}
