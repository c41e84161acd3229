// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Longest-prefix-match FIB lookup.

use graph::init_data;
use graph::{Node, Pkt};
use linkme::distributed_slice;
use net::eth::ethtype::EthType;
use net::headers::TryIp;
use net::packet::DoneReason;
use routing::FibReader;

use crate::fields;

/// Resolves a packet's destination address against the FIB and stashes the
/// winning [`routing::NextHopId`] in scratch for `ipv4_rewrite`.
struct Ipv4Lookup {
    fib: FibReader,
}

impl Node for Ipv4Lookup {
    fn name(&self) -> &'static str {
        "ipv4_lookup"
    }

    fn process(&self, packet: &mut Pkt) -> Option<&'static str> {
        let Some(net) = packet.try_ip() else {
            packet.done(DoneReason::InternalFailure);
            return Some("drop");
        };
        let destination = net.destination();

        let Some(guard) = self.fib.enter() else {
            packet.done(DoneReason::InternalFailure);
            return Some("drop");
        };
        let Some(entry) = guard.lookup(destination) else {
            packet.done(DoneReason::NoRoute);
            return Some("drop");
        };

        packet.get_meta_mut().scratch.set(fields::next_hop(), entry.next_hop);
        Some("ipv4_rewrite")
    }
}

#[distributed_slice(graph::NODE_REGISTRY)]
static TEMPLATE: graph::NodeTemplate = graph::NodeTemplate {
    name: "ipv4_lookup",
    edges: &["ipv4_rewrite", "drop"],
    constructor: || {
        let fib: &'static FibReader = init_data::get("ipv4_lookup")
            .unwrap_or_else(|e| unreachable!("ipv4_lookup init data: {e}"));
        Box::new(Ipv4Lookup { fib: fib.clone() })
    },
    register_callback: Some(register),
};

/// Attaches this node as `classify`'s handler for IPv4 frames.
fn register() {
    graph::attach_parent("classify", "ipv4_lookup");
    graph::classify_add_proto(EthType::IPV4.raw(), "ipv4_lookup");
}

#[cfg(test)]
mod test {
    use super::*;
    use net::buffer::TestBuffer;
    use net::eth::Eth;
    use net::eth::ethtype::EthType;
    use net::eth::mac::{DestinationMac, Mac, SourceMac};
    use net::headers::{Headers, Net, TryHeadersMut};
    use net::ipv4::{Ipv4, UnicastIpv4Addr};
    use net::packet::Packet;
    use net::parse::DeParse;
    use routing::NextHopId;
    use routing::{FibEntry, FibWriter};
    use std::net::Ipv4Addr;

    #[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    fn ipv4_packet(dest: Ipv4Addr) -> Pkt {
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
        ip.set_destination(dest);
        packet.headers_mut().net = Some(Net::Ipv4(ip));
        packet
    }

    #[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    #[test]
    fn routed_packet_carries_resolved_next_hop() {
        let (mut writer, reader) = FibWriter::new();
        writer.insert(
            "10.0.0.0/8".parse().unwrap(),
            FibEntry {
                next_hop: NextHopId(7),
            },
        );
        let node = Ipv4Lookup { fib: reader };
        let mut packet = ipv4_packet(Ipv4Addr::new(10, 1, 2, 3));
        assert_eq!(node.process(&mut packet), Some("ipv4_rewrite"));
        assert_eq!(
            packet.get_meta().scratch.get(fields::next_hop()),
            NextHopId(7)
        );
        packet.done(DoneReason::Delivered);
    }

    #[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    #[test]
    fn unrouted_packet_is_dropped_with_no_route() {
        let (_writer, reader) = FibWriter::new();
        let node = Ipv4Lookup { fib: reader };
        let mut packet = ipv4_packet(Ipv4Addr::new(10, 1, 2, 3));
        assert_eq!(node.process(&mut packet), Some("drop"));
        assert_eq!(packet.get_done(), Some(DoneReason::NoRoute));
    }
}
