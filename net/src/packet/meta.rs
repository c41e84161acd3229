// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

#![allow(missing_docs)] // TODO

use crate::scratch::Scratch;
use bitflags::bitflags;
use std::collections::HashMap;
use tracing::error;

/// Identifies an interface by its small, dense, worker-shared index.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash)]
pub struct InterfaceId(u32);
#[allow(unused)]
impl InterfaceId {
    #[must_use]
    pub fn new(val: u32) -> Self {
        Self(val)
    }
    #[must_use]
    pub fn get_id(&self) -> u32 {
        self.0
    }
}

impl crate::scratch::ScratchValue for InterfaceId {
    fn to_slot(self) -> u64 {
        u64::from(self.0)
    }
    fn from_slot(slot: u64) -> Self {
        #[allow(clippy::cast_possible_truncation)]
        Self(slot as u32)
    }
}

/// Every reason a node can hand a packet a terminal disposition.
///
/// Trimmed to the dispositions the IPv4 forwarding graph can actually
/// produce; a gateway that grew NAT, firewalling, or overlay encapsulation
/// would grow this enum back out.
#[allow(unused)]
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub enum DoneReason {
    /// Catch-all for internal issues (a panic caught at a worker boundary,
    /// an invariant violated by a misbehaving node).
    InternalFailure,
    /// The frame did not parse as Ethernet.
    NotEthernet,
    /// The frame's ethertype is not one `classify` has a registered proto
    /// for.
    UnknownEtherType,
    /// The frame parsed as Ethernet but not as IPv4.
    NotIpv4,
    /// No FIB entry covers the packet's destination.
    NoRoute,
    /// The resolved next hop has `FwAction::Drop`.
    RouteDrop,
    /// TTL reached zero before the packet could be forwarded.
    HopLimitExceeded,
    /// The packet is destined for an `IpIp` interface but no tunnel
    /// configuration could be resolved for it.
    TunnelMismatch,
    /// The resolved transmit queue had no room for this packet.
    QueueFull,
    /// The resolved egress interface is administratively or operationally
    /// down.
    InterfaceDown,
    /// The resolved egress interface could not be found.
    InterfaceUnknown,
    /// The packet buffer was handed off for transmission.
    Delivered,
}

bitflags! {
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
    struct MetaFlags: u16 {
        const INITIALIZED = 0b0000_0001; /* initialized */
        const KEEP        = 0b0000_0010; /* Keep the Packet even if it should be dropped (test only) */
    }
}

#[allow(unused)]
#[derive(Debug, Default, Clone)]
pub struct PacketMeta {
    flags: MetaFlags,
    /// Incoming interface, set by the first node to touch the packet.
    pub iif: InterfaceId,
    /// Outgoing interface, set once a node has chosen one.
    pub oif: Option<InterfaceId>,
    /// Terminal disposition, if one has been assigned yet.
    pub done: Option<DoneReason>,
    /// Scratch storage for node-private fields; see [`crate::scratch`].
    pub scratch: Scratch,
}

impl PacketMeta {
    #[must_use]
    pub(crate) fn new(keep: bool) -> Self {
        let mut flags = MetaFlags::INITIALIZED;
        if keep {
            flags |= MetaFlags::KEEP;
        }
        Self {
            flags,
            ..Self::default()
        }
    }
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.flags.contains(MetaFlags::INITIALIZED)
    }
    #[must_use]
    pub fn keep(&self) -> bool {
        self.flags.contains(MetaFlags::KEEP)
    }
    pub fn set_keep(&mut self, value: bool) {
        if value {
            self.flags.insert(MetaFlags::KEEP);
        } else {
            self.flags.remove(MetaFlags::KEEP);
        }
    }
}
impl Drop for PacketMeta {
    fn drop(&mut self) {
        if self.done.is_none() && self.is_initialized() {
            error!("Attempted to drop packet with unspecified verdict!");
        }
    }
}

/// Per-node, per-reason drop/disposition counters.
#[derive(Default, Debug)]
#[allow(unused)]
pub struct PacketDropStats {
    pub name: String,
    reasons: HashMap<DoneReason, u64>,
}

impl PacketDropStats {
    #[allow(dead_code)]
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            reasons: HashMap::default(),
        }
    }
    #[allow(dead_code)]
    pub fn incr(&mut self, reason: DoneReason, value: u64) {
        self.reasons
            .entry(reason)
            .and_modify(|counter| *counter += value)
            .or_insert(value);
    }
    #[allow(dead_code)]
    #[must_use]
    pub fn get_stat(&self, reason: DoneReason) -> Option<u64> {
        self.reasons.get(&reason).copied()
    }
    #[allow(dead_code)]
    #[must_use]
    pub fn get_stats(&self) -> &HashMap<DoneReason, u64> {
        &self.reasons
    }
}

#[cfg(test)]
pub mod test {
    use super::DoneReason;
    use super::PacketDropStats;

    #[test]
    fn test_packet_drop_stats() {
        let mut stats = PacketDropStats::new("Stats:ipv4_lookup");
        stats.incr(DoneReason::NoRoute, 10);
        stats.incr(DoneReason::NoRoute, 1);
        stats.incr(DoneReason::HopLimitExceeded, 9);
        stats.incr(DoneReason::QueueFull, 13);

        assert_eq!(stats.get_stat(DoneReason::NoRoute), Some(11));
        assert_eq!(stats.get_stat(DoneReason::QueueFull), Some(13));
        assert_eq!(stats.get_stat(DoneReason::TunnelMismatch), None);

        let read = stats.get_stats();
        assert_eq!(read.get(&DoneReason::NoRoute), Some(11).as_ref());
    }
}
