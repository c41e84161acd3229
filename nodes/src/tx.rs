// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The graph's only other leaf besides `drop`: mark a packet delivered.
//!
//! A node only ever gets `&mut Pkt`, never ownership, so `tx` cannot call
//! [`ports::TxQueue::transmit`] itself. It stamps the port/queue `ip_output`
//! resolved -- already sitting in scratch -- and leaves the packet as a
//! `Delivered` survivor for the worker loop driving
//! [`graph::worker::WorkerGraph::run_burst`] to hand off to the right queue.

use graph::{Node, Pkt};
use linkme::distributed_slice;
use net::packet::DoneReason;

struct Tx;

impl Node for Tx {
    fn name(&self) -> &'static str {
        "tx"
    }

    fn process(&self, packet: &mut Pkt) -> Option<&'static str> {
        packet.done(DoneReason::Delivered);
        None
    }
}

#[distributed_slice(graph::NODE_REGISTRY)]
static TEMPLATE: graph::NodeTemplate = graph::NodeTemplate {
    name: "tx",
    edges: &[],
    constructor: || Box::new(Tx),
    register_callback: None,
};

#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#[cfg(test)]
mod test {
    use super::*;
    use crate::fields;
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
    fn marks_packet_delivered_and_terminates() {
        let mut packet = test_packet();
        packet.get_meta_mut().scratch.set(fields::egress_port(), 4);
        assert_eq!(Tx.process(&mut packet), None);
        assert_eq!(packet.get_done(), Some(DoneReason::Delivered));
        assert_eq!(packet.get_meta().scratch.get(fields::egress_port()), 4);
    }
}
