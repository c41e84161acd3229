// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Scratch fields shared between nodes.
//!
//! Every field is registered lazily, the first time any node asks for it,
//! rather than all at once at start-of-day; whichever node runs first pays
//! the one-time registration cost, and a binary that never links a given
//! node never claims that field's slot.

use net::scratch::Field;
use routing::NextHopId;

/// The next hop an `ipv4_lookup` resolved, consumed by `ipv4_rewrite`.
pub fn next_hop() -> Field<NextHopId> {
    static FIELD: std::sync::OnceLock<Field<NextHopId>> = std::sync::OnceLock::new();
    *FIELD.get_or_init(|| Field::register().unwrap_or_else(|_| unreachable!()))
}

/// The egress port an `ip_output` resolved, consumed by `tx`.
pub fn egress_port() -> Field<u16> {
    static FIELD: std::sync::OnceLock<Field<u16>> = std::sync::OnceLock::new();
    *FIELD.get_or_init(|| Field::register().unwrap_or_else(|_| unreachable!()))
}

/// The egress queue, within `egress_port`, consumed by `tx`.
pub fn egress_queue() -> Field<u16> {
    static FIELD: std::sync::OnceLock<Field<u16>> = std::sync::OnceLock::new();
    *FIELD.get_or_init(|| Field::register().unwrap_or_else(|_| unreachable!()))
}

/// The tunnel local (outer source) address, set by `ip_output` and
/// consumed by `ipip_output`.
pub fn tunnel_local() -> Field<std::net::Ipv4Addr> {
    static FIELD: std::sync::OnceLock<Field<std::net::Ipv4Addr>> = std::sync::OnceLock::new();
    *FIELD.get_or_init(|| Field::register().unwrap_or_else(|_| unreachable!()))
}

/// The tunnel remote (outer destination) address, set by `ip_output` and
/// consumed by `ipip_output`.
pub fn tunnel_remote() -> Field<std::net::Ipv4Addr> {
    static FIELD: std::sync::OnceLock<Field<std::net::Ipv4Addr>> = std::sync::OnceLock::new();
    *FIELD.get_or_init(|| Field::register().unwrap_or_else(|_| unreachable!()))
}
