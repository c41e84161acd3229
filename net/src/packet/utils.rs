// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Packet higher-level methods to allow for code reuse

use std::net::Ipv4Addr;

use crate::eth::Eth;
use crate::eth::ethtype::EthType;
use crate::eth::mac::Mac;
use crate::headers::Net::Ipv4;
use crate::headers::{TryEth, TryIp};
use crate::packet::Packet;
use crate::packet::PacketBufferMut;
use etherparse::IpNumber;

impl<Buf: PacketBufferMut> Packet<Buf> {
    /// Get the destination mac address of a [`Packet`]
    /// Returns None if the packet does not have an Ethernet header
    pub fn eth_destination(&self) -> Option<Mac> {
        self.try_eth().map(|eth| eth.destination().inner())
    }

    /// Get the source mac address of a [`Packet`]
    /// Returns None if the packet does not have an Ethernet header
    pub fn eth_source(&self) -> Option<Mac> {
        self.try_eth().map(|eth| eth.source().inner())
    }

    /// Get the ether type of an [`Packet`]
    /// Returns None if the packet does not have an Ethernet header
    pub fn eth_type(&self) -> Option<EthType> {
        self.try_eth().map(Eth::ether_type)
    }

    /// Get the source ip address of an IPv4 [`Packet`]
    /// Returns None if the packet does not have an IPv4 header
    pub fn ip_source(&self) -> Option<Ipv4Addr> {
        self.try_ip().map(|net| match net {
            Ipv4(ipv4) => ipv4.source().inner(),
        })
    }

    /// Get the destination ip address of an IPv4 [`Packet`]
    /// Returns None if the packet does not have an IPv4 header
    pub fn ip_destination(&self) -> Option<Ipv4Addr> {
        self.try_ip().map(|net| match net {
            Ipv4(ipv4) => ipv4.destination(),
        })
    }

    /// Get the IP protocol of an IPv4 [`Packet`]
    /// Returns None if the packet does not have an IPv4 header
    pub fn ip_proto(&self) -> Option<IpNumber> {
        self.try_ip().map(|net| match net {
            Ipv4(ipv4) => ipv4.protocol(),
        })
    }
}
