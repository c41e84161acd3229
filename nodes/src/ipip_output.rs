// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! IP-in-IP encapsulation: wrap the existing IPv4 header in an outer one
//! addressed to the tunnel remote, then loop back through the routing
//! pipeline instead of transmitting directly.
//!
//! The outer destination is a regular IPv4 address, routed through the
//! same FIB and next-hop tables every other packet uses -- this node never
//! grows its own routing table, it just resolves one more time and hands
//! off to `ip_output` again.

use graph::init_data;
use graph::{Node, Pkt};
use linkme::distributed_slice;
use net::headers::{Net, TryHeaders, TryHeadersMut};
use net::ipv4::{IpNumber, Ipv4, UnicastIpv4Addr};
use net::packet::DoneReason;
use routing::{FibReader, InterfaceReader, NextHopReader};

use crate::fields;

struct IpipOutput {
    fib: FibReader,
    next_hops: NextHopReader,
    interfaces: InterfaceReader,
}

impl Node for IpipOutput {
    fn name(&self) -> &'static str {
        "ipip_output"
    }

    fn process(&self, packet: &mut Pkt) -> Option<&'static str> {
        let Some(Net::Ipv4(inner)) = packet.headers().net.clone() else {
            packet.done(DoneReason::InternalFailure);
            return Some("drop");
        };

        let meta = packet.get_meta();
        let local = meta.scratch.get(fields::tunnel_local());
        let remote = meta.scratch.get(fields::tunnel_remote());

        let Ok(local) = UnicastIpv4Addr::new(local) else {
            packet.done(DoneReason::TunnelMismatch);
            return Some("drop");
        };

        let mut outer = Ipv4::default();
        outer.set_source(local);
        outer.set_destination(remote);
        outer.set_next_header(IpNumber::IPv4);
        outer.set_ttl(64);
        if outer.set_payload_len(inner.total_len()).is_err() {
            packet.done(DoneReason::InternalFailure);
            return Some("drop");
        }
        packet.headers_mut().encap = Some(outer);

        // The outer destination is not routed yet -- re-resolve it through
        // the FIB exactly as `ipv4_lookup` would for any other packet.
        let Some(guard) = self.fib.enter() else {
            packet.done(DoneReason::InternalFailure);
            return Some("drop");
        };
        let Some(entry) = guard.lookup(remote) else {
            packet.done(DoneReason::NoRoute);
            return Some("drop");
        };
        drop(guard);

        match crate::l2::resolve_and_rewrite(packet, &self.next_hops, &self.interfaces, entry.next_hop)
        {
            Ok(egress) => {
                packet.get_meta_mut().oif = Some(egress);
                Some("ip_output")
            }
            Err(reason) => {
                packet.done(reason);
                Some("drop")
            }
        }
    }
}

#[distributed_slice(graph::NODE_REGISTRY)]
static TEMPLATE: graph::NodeTemplate = graph::NodeTemplate {
    name: "ipip_output",
    edges: &["ip_output", "drop"],
    constructor: || {
        let fib: &'static FibReader = init_data::get("ipv4_lookup")
            .unwrap_or_else(|e| unreachable!("ipip_output init data (fib): {e}"));
        let next_hops: &'static NextHopReader = init_data::get("ip_output_next_hops")
            .unwrap_or_else(|e| unreachable!("ipip_output init data (next hops): {e}"));
        let interfaces: &'static InterfaceReader = init_data::get("ip_output")
            .unwrap_or_else(|e| unreachable!("ipip_output init data (interfaces): {e}"));
        Box::new(IpipOutput {
            fib: fib.clone(),
            next_hops: next_hops.clone(),
            interfaces: interfaces.clone(),
        })
    },
    register_callback: Some(register),
};

/// Attaches this node as a child of `ip_output`'s tunnel dispatch, on top
/// of the static edge already declared above.
fn register() {
    graph::attach_parent("ip_output", "ipip_output");
}

#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#[cfg(test)]
mod test {
    use super::*;
    use net::buffer::TestBuffer;
    use net::eth::Eth;
    use net::eth::ethtype::EthType;
    use net::eth::mac::{DestinationMac, Mac, SourceMac};
    use net::headers::Headers;
    use net::interface::AdminState;
    use net::packet::{InterfaceId, Packet};
    use net::parse::DeParse;
    use routing::{FibEntry, FibWriter, FwAction, Interface, InterfaceKind, InterfaceWriter, NextHop, NextHopId, NextHopWriter};
    use std::net::Ipv4Addr;

    fn test_packet(local: Ipv4Addr, remote: Ipv4Addr) -> Pkt {
        let eth = Eth::new(
            SourceMac::new(Mac([0x02, 0, 0, 0, 0, 1])).unwrap(),
            DestinationMac::new(Mac([0x02, 0, 0, 0, 0, 2])).unwrap(),
            EthType::ARP,
        );
        let headers = Headers::new(eth);
        let mut buf = TestBuffer::new();
        headers.deparse(buf.as_mut()).unwrap();
        let mut packet = Packet::new(buf).unwrap();

        let mut ip = Ipv4::default();
        ip.set_source(UnicastIpv4Addr::new(Ipv4Addr::new(192, 0, 2, 9)).unwrap());
        ip.set_destination(Ipv4Addr::new(198, 51, 100, 1));
        packet.headers_mut().net = Some(Net::Ipv4(ip));

        let meta = packet.get_meta_mut();
        meta.scratch.set(fields::tunnel_local(), local);
        meta.scratch.set(fields::tunnel_remote(), remote);
        packet
    }

    #[test]
    fn non_unicast_local_address_is_a_tunnel_mismatch() {
        let (_fw, fib) = FibWriter::new();
        let (_nw, next_hops) = NextHopWriter::new();
        let (_iw, interfaces) = InterfaceWriter::new();
        let node = IpipOutput {
            fib,
            next_hops,
            interfaces,
        };
        let mut packet = test_packet(Ipv4Addr::new(224, 0, 0, 1), Ipv4Addr::new(10, 0, 0, 2));
        assert_eq!(node.process(&mut packet), Some("drop"));
        assert_eq!(packet.get_done(), Some(DoneReason::TunnelMismatch));
    }

    #[test]
    fn outer_destination_without_a_route_is_dropped() {
        let (_fw, fib) = FibWriter::new();
        let (_nw, next_hops) = NextHopWriter::new();
        let (_iw, interfaces) = InterfaceWriter::new();
        let node = IpipOutput {
            fib,
            next_hops,
            interfaces,
        };
        let local = Ipv4Addr::new(192, 0, 2, 1);
        let remote = Ipv4Addr::new(192, 0, 2, 2);
        let mut packet = test_packet(local, remote);
        assert_eq!(node.process(&mut packet), Some("drop"));
        assert_eq!(packet.get_done(), Some(DoneReason::NoRoute));
    }

    #[test]
    fn re_resolved_outer_destination_loops_back_to_ip_output() {
        let local = Ipv4Addr::new(192, 0, 2, 1);
        let remote = Ipv4Addr::new(192, 0, 2, 2);

        let (mut fw, fib) = FibWriter::new();
        fw.insert(
            "192.0.2.2/32".parse().unwrap(),
            FibEntry {
                next_hop: NextHopId(9),
            },
        );

        let egress = InterfaceId::new(7);
        let (mut nw, next_hops) = NextHopWriter::new();
        nw.set(
            NextHopId(9),
            NextHop {
                action: FwAction::Forward,
                gateway: Some(remote),
                egress_interface: Some(egress),
                tunnel: None,
                mac: Mac([0x02, 0, 0, 0, 0, 0xAA]),
            },
        );

        let (mut iw, interfaces) = InterfaceWriter::new();
        iw.set(
            egress,
            Interface {
                name: "eth1".to_owned(),
                admin_state: AdminState::Up,
                address: None,
                mac: Mac([0x02, 0, 0, 0, 0, 0xBB]),
                kind: InterfaceKind::Physical { port: 1, queue: 0 },
            },
        );

        let node = IpipOutput {
            fib,
            next_hops,
            interfaces,
        };
        let mut packet = test_packet(local, remote);
        assert_eq!(node.process(&mut packet), Some("ip_output"));
        assert_eq!(packet.get_meta().oif, Some(egress));

        let encap = packet.headers().encap.as_ref().unwrap();
        assert_eq!(encap.source().inner(), local);
        assert_eq!(encap.destination(), remote);
        assert_eq!(encap.protocol(), IpNumber::IPv4);

        let eth = packet.headers().eth.as_ref().unwrap();
        assert_eq!(eth.destination().inner(), Mac([0x02, 0, 0, 0, 0, 0xAA]));
        assert_eq!(eth.source().inner(), Mac([0x02, 0, 0, 0, 0, 0xBB]));
        packet.done(DoneReason::Delivered);
    }
}
