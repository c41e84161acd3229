// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]
#![allow(clippy::double_must_use)]

pub use crate::buffer::TestBuffer;
use crate::eth::Eth;
use crate::eth::ethtype::EthType;
use crate::eth::mac::{DestinationMac, Mac, SourceMac};
use crate::headers::{Headers, Net};
use crate::ipv4::Ipv4;
use crate::ipv4::addr::UnicastIpv4Addr;
use crate::packet::{InvalidPacket, Packet};
use crate::parse::DeParse;
use std::net::Ipv4Addr;
use std::str::FromStr;

#[must_use]
/// Builds a test packet with the given TTL value.
///
/// The packet is an IPv4 packet with a source and destination IP address of 1.2.3.4.
/// The Ethernet source and destination MAC addresses are 0x02:00:00:00:00:01 and 0x02:00:00:00:00:02
/// respectively.
pub fn build_test_ipv4_packet(ttl: u8) -> Result<Packet<TestBuffer>, InvalidPacket<TestBuffer>> {
    let mut ipv4 = Ipv4::default();
    ipv4.set_source(UnicastIpv4Addr::new(Ipv4Addr::new(1, 2, 3, 4)).unwrap());
    ipv4.set_destination(Ipv4Addr::new(1, 2, 3, 4));
    ipv4.set_ttl(ttl);

    let mut headers = Headers::new(Eth::new(
        SourceMac::new(Mac([0x2, 0, 0, 0, 0, 1])).unwrap(),
        DestinationMac::new(Mac([0x2, 0, 0, 0, 0, 2])).unwrap(),
        EthType::IPV4,
    ));
    headers.net = Some(Net::Ipv4(ipv4));

    let mut buffer: TestBuffer = TestBuffer::new();
    headers.deparse(buffer.as_mut()).unwrap();

    Packet::new(buffer)
}

#[must_use]
/// Build an Ipv4 address from a &str
pub fn addr_v4(a: &str) -> Ipv4Addr {
    Ipv4Addr::from_str(a).expect("Bad IPv4 address")
}

#[must_use]
/// Builds an IPv4/Eth frame between two addresses, with a fixed pair of MACs.
pub fn build_test_ipv4_frame(
    src_mac: Mac,
    dst_mac: Mac,
    src_ip: &str,
    dst_ip: &str,
) -> Packet<TestBuffer> {
    let mut ipv4 = Ipv4::default();
    ipv4.set_source(UnicastIpv4Addr::new(addr_v4(src_ip)).expect("Bad unicast IPv4"));
    ipv4.set_destination(addr_v4(dst_ip));
    ipv4.set_ttl(255);

    let mut headers = Headers::new(Eth::new(
        SourceMac::new(src_mac).unwrap(),
        DestinationMac::new(dst_mac).unwrap(),
        EthType::IPV4,
    ));
    headers.net = Some(Net::Ipv4(ipv4));

    let mut buffer: TestBuffer = TestBuffer::new();
    headers.deparse(buffer.as_mut()).unwrap();

    Packet::new(buffer).unwrap()
}

#[must_use]
pub fn build_test_ipv4_packet_between(src_ip: &str, dst_ip: &str) -> Packet<TestBuffer> {
    build_test_ipv4_frame(
        Mac([0x2, 0, 0, 0, 0, 1]),
        Mac([0x2, 0, 0, 0, 0, 2]),
        src_ip,
        dst_ip,
    )
}
