// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The port table a worker loop consults to resolve the `(port, queue)`
//! scratch pair a `tx`-bound [`Delivered`][net::packet::DoneReason::Delivered]
//! packet carries into an actual [`ports::TxQueue`].
//!
//! `tx` itself never touches this table: [`graph::Node::process`] only ever
//! gets `&mut Pkt`, never ownership, so `tx` just stamps the packet
//! delivered and leaves the dispatch to whatever drives
//! [`graph::worker::WorkerGraph::run_burst`].

use ports::{Port, PortId};

/// Every port this process owns, indexed by [`PortId`].
///
/// Installed once, via [`graph::init_data::install`], by whatever binds
/// the graph to real (or software-simulated) ports at start-of-day.
pub struct PortTable(Vec<Port>);

impl PortTable {
    /// Wrap an already-configured set of ports.
    ///
    /// Ports are expected to be indexed densely from 0, matching the
    /// `PortId` each was configured with; a port at the wrong position in
    /// `ports` will simply never be found by [`PortTable::get`].
    #[must_use]
    pub fn new(ports: Vec<Port>) -> Self {
        Self(ports)
    }

    /// Look up a port by id.
    #[must_use]
    pub fn get(&self, id: PortId) -> Option<&Port> {
        self.0.get(id.as_u16() as usize)
    }
}
