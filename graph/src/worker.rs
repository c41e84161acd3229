// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Per-worker burst processing loop.

use crate::builder::Graph;
use crate::node::Pkt;
use std::sync::Arc;
use tracing::trace;

/// The maximum number of edges a single packet may walk before the graph
/// gives up on it.
///
/// A correctly wired graph is a DAG from `classify` down to a `tx` or
/// `drop` node, so this is a generous bound well above the longest real
/// path, not a tuning knob.
pub const MAX_HOPS: usize = 32;

/// A graph shared read-only by every worker, plus the bookkeeping a single
/// worker needs to drive bursts of packets through it.
pub struct WorkerGraph {
    graph: Arc<Graph>,
}

impl WorkerGraph {
    /// Attach a worker to an already-built graph.
    #[must_use]
    pub fn new(graph: Arc<Graph>) -> Self {
        Self { graph }
    }

    /// Run every packet in `burst` through the graph to a terminal
    /// disposition, then quiesce every node once for the whole burst.
    ///
    /// Returns the packets that survived with
    /// [`DoneReason::Delivered`][net::packet::DoneReason::Delivered]. A `tx`
    /// node never owns a transmit queue itself -- [`Node::process`] only
    /// ever gets `&mut Pkt` -- so it stamps the resolved egress port/queue
    /// in scratch and marks the packet delivered instead; the caller is
    /// expected to group these survivors by that stamp and hand each group
    /// to the right queue.
    pub fn run_burst(&self, burst: Vec<Pkt>) -> Vec<Pkt> {
        let n = burst.len();
        let survivors: Vec<Pkt> = burst
            .into_iter()
            .filter_map(|mut packet| {
                self.graph.run_one(&mut packet, MAX_HOPS);
                packet.enforce()
            })
            .collect();
        self.graph.quiesce();
        trace!(burst = n, survivors = survivors.len(), "burst processed");
        survivors
    }
}
