// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The graph's entry node: dispatch a frame to the node registered for its
//! ethertype.
//!
//! `classify` carries no fixed notion of what an IPv4 packet is or where it
//! goes next; every ptype it knows about was handed to it by some other
//! node's `register_callback` calling [`graph::classify_add_proto`] before
//! `classify`'s own constructor ran.

use graph::{Node, Pkt};
use linkme::distributed_slice;
use net::headers::TryEth;
use net::packet::DoneReason;

/// Routes a frame to the edge registered for its ethertype, or to `drop`
/// if nothing claimed it.
///
/// A frame that failed to parse as Ethernet never makes it this far --
/// [`net::packet::Packet::new`] rejects it before a `Packet` exists to put
/// in the graph at all -- so the only real decision `classify` makes is
/// the ethertype lookup below.
struct Classify {
    protos: Vec<(u16, &'static str)>,
}

impl Node for Classify {
    fn name(&self) -> &'static str {
        "classify"
    }

    fn process(&self, packet: &mut Pkt) -> Option<&'static str> {
        let Some(ether_type) = packet.try_eth().map(|eth| eth.ether_type().raw()) else {
            packet.done(DoneReason::NotEthernet);
            return Some("drop");
        };
        match self
            .protos
            .iter()
            .find(|(ptype, _)| *ptype == ether_type)
            .map(|(_, edge)| *edge)
        {
            Some(edge) => Some(edge),
            None => {
                packet.done(DoneReason::UnknownEtherType);
                Some("drop")
            }
        }
    }
}

#[distributed_slice(graph::NODE_REGISTRY)]
static TEMPLATE: graph::NodeTemplate = graph::NodeTemplate {
    name: "classify",
    edges: &["ipv4_lookup", "drop"],
    constructor: || {
        Box::new(Classify {
            protos: graph::classify_protos(),
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
    use net::packet::Packet;
    use net::parse::DeParse;

    fn frame(ether_type: EthType) -> Pkt {
        let eth = Eth::new(
            SourceMac::new(Mac([0x02, 0, 0, 0, 0, 1])).unwrap(),
            DestinationMac::new(Mac([0x02, 0, 0, 0, 0, 2])).unwrap(),
            ether_type,
        );
        let headers = Headers::new(eth);
        let mut buf = TestBuffer::new();
        headers.deparse(buf.as_mut()).unwrap();
        Packet::new(buf).unwrap()
    }

    #[test]
    fn unregistered_ptype_goes_to_drop() {
        let node = Classify { protos: vec![] };
        let mut packet = frame(EthType::ARP);
        let next = node.process(&mut packet);
        assert_eq!(next, Some("drop"));
        assert_eq!(packet.get_done(), Some(DoneReason::UnknownEtherType));
    }

    #[test]
    fn registered_ptype_routes_to_its_edge() {
        let node = Classify {
            protos: vec![(EthType::IPV4.raw(), "ipv4_lookup")],
        };
        let mut packet = frame(EthType::IPV4);
        assert_eq!(node.process(&mut packet), Some("ipv4_lookup"));
        assert_eq!(packet.get_done(), None);
    }
}
