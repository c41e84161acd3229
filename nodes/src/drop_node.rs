// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The graph's universal sink for packets that didn't make it to `tx`.

use graph::{Node, Pkt};
use linkme::distributed_slice;
use net::packet::DoneReason;

/// Every other node that gives up on a packet routes it here instead of
/// calling [`Packet::done`][net::packet::Packet::done] and returning `None`
/// directly, so the graph stays a DAG with exactly two leaves (`tx` and
/// this node) instead of an implicit exit at every node.
struct DropNode;

impl Node for DropNode {
    fn name(&self) -> &'static str {
        "drop"
    }

    fn process(&self, packet: &mut Pkt) -> Option<&'static str> {
        // `Packet::done` is a no-op once a reason is already set, so this
        // only fires for a node that routed here without first recording
        // why -- a bug upstream, not a reachable steady-state outcome.
        packet.done(DoneReason::InternalFailure);
        None
    }
}

#[distributed_slice(graph::NODE_REGISTRY)]
static TEMPLATE: graph::NodeTemplate = graph::NodeTemplate {
    name: "drop",
    edges: &[],
    constructor: || Box::new(DropNode),
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

    fn test_packet() -> Pkt {
        let eth = Eth::new(
            SourceMac::new(Mac([0x02, 0, 0, 0, 0, 1])).unwrap(),
            DestinationMac::new(Mac([0x02, 0, 0, 0, 0, 2])).unwrap(),
            EthType::ARP,
        );
        let headers = Headers::new(eth);
        let mut buf = TestBuffer::new();
        headers.deparse(buf.as_mut()).unwrap();
        Packet::new(buf).unwrap()
    }

    #[test]
    fn preserves_an_already_set_reason() {
        let mut packet = test_packet();
        packet.done(DoneReason::NoRoute);
        assert_eq!(DropNode.process(&mut packet), None);
        assert_eq!(packet.get_done(), Some(DoneReason::NoRoute));
    }

    #[test]
    fn defaults_to_internal_failure() {
        let mut packet = test_packet();
        assert_eq!(DropNode.process(&mut packet), None);
        assert_eq!(packet.get_done(), Some(DoneReason::InternalFailure));
    }
}
