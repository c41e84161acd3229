// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Shared next-hop resolution and Ethernet rewrite, used by both
//! `ipv4_rewrite` (the inner packet) and `ipip_output` (the re-resolved
//! outer packet after encapsulation).

use net::eth::mac::{DestinationMac, SourceMac};
use net::headers::TryHeadersMut;
use net::packet::{DoneReason, InterfaceId};
use routing::{FwAction, InterfaceReader, NextHopId, NextHopReader};

use crate::fields;

/// Resolve `next_hop_id` against `next_hops`, rewrite the packet's Ethernet
/// header with the next hop's MAC and the resolved egress interface's own
/// MAC, and stash the next hop in scratch for any later stage that still
/// needs it.
///
/// Returns the resolved egress interface on success, or the [`DoneReason`]
/// the caller should mark the packet with and route to `drop`.
pub(crate) fn resolve_and_rewrite(
    packet: &mut graph::Pkt,
    next_hops: &NextHopReader,
    interfaces: &InterfaceReader,
    next_hop_id: NextHopId,
) -> Result<InterfaceId, DoneReason> {
    let Some(guard) = next_hops.enter() else {
        return Err(DoneReason::InternalFailure);
    };
    let Some(next_hop) = guard.get(next_hop_id) else {
        return Err(DoneReason::InternalFailure);
    };
    if next_hop.action == FwAction::Drop {
        return Err(DoneReason::RouteDrop);
    }
    let Some(egress) = next_hop.egress_interface else {
        return Err(DoneReason::InternalFailure);
    };
    let next_hop_mac = next_hop.mac;
    drop(guard);

    let Some(guard) = interfaces.enter() else {
        return Err(DoneReason::InternalFailure);
    };
    let Some(iface) = guard.get(egress) else {
        return Err(DoneReason::InterfaceUnknown);
    };
    let iface_mac = iface.mac;
    drop(guard);

    let Some(eth) = packet.headers_mut().eth.as_mut() else {
        return Err(DoneReason::InternalFailure);
    };
    let Ok(destination) = DestinationMac::new(next_hop_mac) else {
        return Err(DoneReason::InternalFailure);
    };
    let Ok(source) = SourceMac::new(iface_mac) else {
        return Err(DoneReason::InternalFailure);
    };
    eth.set_destination(destination);
    eth.set_source(source);

    packet
        .get_meta_mut()
        .scratch
        .set(fields::next_hop(), next_hop_id);
    Ok(egress)
}
