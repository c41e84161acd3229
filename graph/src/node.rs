// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Node trait and the constructor-time node registry.

use linkme::distributed_slice;
use net::packet::Packet;
use ports::PortBuffer;

/// The concrete packet type every node in the forwarding graph processes.
///
/// The graph is not generic over the buffer type: a [`distributed_slice`]
/// needs a concrete element type to register into, and nothing in this
/// crate's scope needs to run against any buffer but [`PortBuffer`].
pub type Pkt = Packet<PortBuffer>;

/// A single stage of the forwarding graph.
///
/// A node is constructed once, at graph-build time, and then shared by
/// every worker; `process` must not assume exclusive access to any state
/// beyond what it privately owns (an `AtomicU64` counter, an RCU read
/// handle, ...).
pub trait Node: Send + Sync {
    /// The node's name, as referenced by other nodes' edge lists and by the
    /// control plane's per-node init-data registry.
    fn name(&self) -> &'static str;

    /// Process one packet, mutating it in place.
    ///
    /// Returns the name of the next node the packet should visit, or
    /// `None` if this node gave the packet a terminal disposition (it
    /// called [`Packet::done`][net::packet::Packet::done] itself, handed
    /// the buffer to a transmit queue, ...).
    fn process(&self, packet: &mut Pkt) -> Option<&'static str>;

    /// Called once per burst, after every packet in the burst has been
    /// processed to completion.
    ///
    /// Nodes that hold a cached RCU read handle (the FIB lookup node, the
    /// next-hop resolution node) use this to drop the handle and let a
    /// pending writer's epoch advance; nodes with no such state can ignore
    /// it.
    fn quiesce(&self) {}
}

/// A registered node: how to build it, and which other nodes it may hand a
/// packet to.
///
/// `edges` is declarative metadata, checked by [`crate::builder`] at graph
/// build time; a node is free to return any name via
/// [`Node::process`][Node::process], but an edge absent from this list
/// will never have been validated to exist, so the convention is to keep
/// the two in sync.
pub struct NodeTemplate {
    /// The node's name. Must be unique across the whole registry.
    pub name: &'static str,
    /// Names of nodes this node may hand a packet to.
    pub edges: &'static [&'static str],
    /// Build a fresh instance of the node.
    pub constructor: fn() -> Box<dyn Node>,
    /// Run once per [`crate::builder::Graph::build_from`], after every
    /// template has been collected and before any node is constructed.
    ///
    /// A node with no dynamic wiring of its own leaves this `None`. A node
    /// that attaches itself to a dispatcher -- `ipv4_lookup` calling
    /// [`crate::attach_parent`] and [`crate::classify_add_proto`] to
    /// register with `classify`, `ipip_output` attaching to `ip_output` --
    /// sets this so the attachment exists before `classify`'s own
    /// constructor runs and snapshots the result.
    pub register_callback: Option<fn()>,
}

/// Every node linked into this binary registers itself here via
/// `#[distributed_slice(NODE_REGISTRY)]`; nothing calls a `register_all()`
/// function, and nothing outside of a node's own module needs to know the
/// node exists for it to be picked up at graph-build time.
#[distributed_slice]
pub static NODE_REGISTRY: [NodeTemplate] = [..];
