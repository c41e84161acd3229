// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! TTL decrement and next-hop resolution.

use graph::init_data;
use graph::{Node, Pkt};
use linkme::distributed_slice;
use net::headers::{Net, TryHeadersMut};
use net::packet::DoneReason;
use routing::{InterfaceReader, NextHopReader};

/// Decrements TTL, resolves the [`routing::NextHopId`] `ipv4_lookup` left
/// in scratch against the next-hop table, rewrites the Ethernet header
/// with the next hop's MAC and the egress interface's own MAC, and either
/// drops the packet (a null route, a hop limit exceeded) or stashes the
/// resolved egress interface in [`net::packet::PacketMeta::oif`] for
/// `ip_output`.
struct Ipv4Rewrite {
    next_hops: NextHopReader,
    interfaces: InterfaceReader,
}

impl Node for Ipv4Rewrite {
    fn name(&self) -> &'static str {
        "ipv4_rewrite"
    }

    fn process(&self, packet: &mut Pkt) -> Option<&'static str> {
        let Some(Net::Ipv4(ip)) = &mut packet.headers_mut().net else {
            packet.done(DoneReason::InternalFailure);
            return Some("drop");
        };
        if ip.decrement_ttl().is_err() {
            packet.done(DoneReason::HopLimitExceeded);
            return Some("drop");
        }

        let next_hop_id = packet.get_meta().scratch.get(crate::fields::next_hop());
        match crate::l2::resolve_and_rewrite(packet, &self.next_hops, &self.interfaces, next_hop_id)
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
    name: "ipv4_rewrite",
    edges: &["ip_output", "drop"],
    constructor: || {
        let next_hops: &'static NextHopReader = init_data::get("ipv4_rewrite")
            .unwrap_or_else(|e| unreachable!("ipv4_rewrite init data: {e}"));
        let interfaces: &'static InterfaceReader = init_data::get("ipv4_rewrite_interfaces")
            .unwrap_or_else(|e| unreachable!("ipv4_rewrite init data (interfaces): {e}"));
        Box::new(Ipv4Rewrite {
            next_hops: next_hops.clone(),
            interfaces: interfaces.clone(),
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
    use net::headers::{Headers, TryHeaders};
    use net::interface::AdminState;
    use net::ipv4::{Ipv4, UnicastIpv4Addr};
    use net::packet::{InterfaceId, Packet};
    use net::parse::DeParse;
    use routing::{FwAction, Interface, InterfaceKind, InterfaceWriter, NextHop, NextHopId, NextHopWriter};
    use std::net::Ipv4Addr;

    fn packet_with_ttl(ttl: u8, next_hop: NextHopId) -> Pkt {
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
        ip.set_source(UnicastIpv4Addr::new(Ipv4Addr::new(192, 0, 2, 1)).unwrap());
        ip.set_destination(Ipv4Addr::new(10, 0, 0, 1));
        ip.set_ttl(ttl);
        packet.headers_mut().net = Some(Net::Ipv4(ip));
        packet
            .get_meta_mut()
            .scratch
            .set(crate::fields::next_hop(), next_hop);
        packet
    }

    #[test]
    fn expired_ttl_is_dropped() {
        let (_writer, reader) = NextHopWriter::new();
        let (_iw, ireader) = InterfaceWriter::new();
        let node = Ipv4Rewrite {
            next_hops: reader,
            interfaces: ireader,
        };
        let mut packet = packet_with_ttl(1, NextHopId(1));
        assert_eq!(node.process(&mut packet), Some("drop"));
        assert_eq!(packet.get_done(), Some(DoneReason::HopLimitExceeded));
    }

    #[test]
    fn resolved_route_forwards_to_ip_output_with_rewritten_mac() {
        let egress = InterfaceId::new(3);
        let (mut writer, reader) = NextHopWriter::new();
        writer.set(
            NextHopId(1),
            NextHop {
                action: FwAction::Forward,
                gateway: Some(Ipv4Addr::new(10, 0, 0, 254)),
                egress_interface: Some(egress),
                tunnel: None,
                mac: Mac([0x02, 0, 0, 0, 0, 0xAA]),
            },
        );
        let (mut iw, ireader) = InterfaceWriter::new();
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
        let node = Ipv4Rewrite {
            next_hops: reader,
            interfaces: ireader,
        };
        let mut packet = packet_with_ttl(64, NextHopId(1));
        assert_eq!(node.process(&mut packet), Some("ip_output"));
        assert_eq!(packet.get_meta().oif, Some(egress));
        let eth = packet.headers().eth.as_ref().unwrap();
        assert_eq!(eth.destination().inner(), Mac([0x02, 0, 0, 0, 0, 0xAA]));
        assert_eq!(eth.source().inner(), Mac([0x02, 0, 0, 0, 0, 0xBB]));
        packet.done(DoneReason::Delivered);
    }

    #[test]
    fn null_route_is_dropped() {
        let (mut writer, reader) = NextHopWriter::new();
        writer.set(NextHopId(1), NextHop::drop());
        let (_iw, ireader) = InterfaceWriter::new();
        let node = Ipv4Rewrite {
            next_hops: reader,
            interfaces: ireader,
        };
        let mut packet = packet_with_ttl(64, NextHopId(1));
        assert_eq!(node.process(&mut packet), Some("drop"));
        assert_eq!(packet.get_done(), Some(DoneReason::RouteDrop));
    }
}
