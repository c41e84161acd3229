// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Three-phase graph construction: collect every registered node template,
//! run each template's register hook, validate the edges between them
//! (including any attached during the hook phase), then freeze the result
//! into a [`Graph`] that workers can run packets through.

use crate::node::{NODE_REGISTRY, Node, NodeTemplate, Pkt};
use ordermap::OrderMap;
use tracing::debug;

/// Errors that can occur while building a [`Graph`] out of the registered
/// node templates.
///
/// Every variant here is a build-time configuration error: a binary that
/// links in a consistent set of nodes can never hit one of these at
/// runtime.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// Two node templates registered under the same name.
    #[error("duplicate node name: {0}")]
    DuplicateNode(&'static str),
    /// A node's edge list names a node that was never registered.
    #[error("node {from} has an edge to undefined node {to}")]
    UndefinedEdge {
        /// The node whose edge list is at fault.
        from: &'static str,
        /// The undefined target.
        to: &'static str,
    },
    /// The requested entry node was never registered.
    #[error("entry node {0} is not registered")]
    UnknownEntry(&'static str),
}

/// A frozen forwarding graph: every registered node, constructed, indexed
/// by name for O(1) dispatch, with its edges pre-validated.
///
/// Immutable once built and safe to share across workers behind an `Arc`;
/// building it a second time (for a second graph instance, in tests) just
/// re-runs the constructors.
pub struct Graph {
    nodes: Vec<Box<dyn Node>>,
    index: OrderMap<&'static str, usize>,
    entry: usize,
}

impl Graph {
    /// Build a graph from every node in [`NODE_REGISTRY`], entering at
    /// `entry_node`.
    ///
    /// # Errors
    ///
    /// See [`BuildError`].
    pub fn build(entry_node: &'static str) -> Result<Self, BuildError> {
        Self::build_from(NODE_REGISTRY.iter(), entry_node)
    }

    /// Build a graph from an explicit set of templates.
    ///
    /// Exposed mainly so tests can build a graph out of a handful of nodes
    /// without linking in the whole registry.
    ///
    /// # Errors
    ///
    /// See [`BuildError`].
    pub fn build_from<'a>(
        templates: impl IntoIterator<Item = &'a NodeTemplate>,
        entry_node: &'static str,
    ) -> Result<Self, BuildError> {
        // Phase 1: collect every template by name, rejecting collisions.
        let mut by_name: OrderMap<&'static str, &'a NodeTemplate> = OrderMap::new();
        for template in templates {
            if by_name.insert(template.name, template).is_some() {
                return Err(BuildError::DuplicateNode(template.name));
            }
        }

        // Phase 2: run every template's register hook. A dispatcher's
        // children use this to attach themselves before phase 3 checks
        // that every edge -- declared or attached -- actually resolves.
        for template in by_name.values() {
            if let Some(register) = template.register_callback {
                register();
            }
        }

        // Phase 3: validate every declared edge resolves to a registered
        // node, then construct.
        for template in by_name.values() {
            for edge in template.edges {
                if !by_name.contains_key(edge) {
                    return Err(BuildError::UndefinedEdge {
                        from: template.name,
                        to: edge,
                    });
                }
            }
        }
        for (parent, child) in crate::attach::attachments() {
            if by_name.contains_key(parent) && !by_name.contains_key(child) {
                return Err(BuildError::UndefinedEdge {
                    from: parent,
                    to: child,
                });
            }
        }

        let mut index = OrderMap::new();
        let mut nodes: Vec<Box<dyn Node>> = Vec::with_capacity(by_name.len());
        for (pos, (name, template)) in by_name.iter().enumerate() {
            debug!(node = *name, "constructing graph node");
            nodes.push((template.constructor)());
            index.insert(*name, pos);
        }

        let entry = *index
            .get(entry_node)
            .ok_or(BuildError::UnknownEntry(entry_node))?;

        Ok(Self {
            nodes,
            index,
            entry,
        })
    }

    /// Look up a node's index by name.
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// The entry node's index.
    #[must_use]
    pub fn entry(&self) -> usize {
        self.entry
    }

    /// Drive a single packet through the graph starting at the entry node,
    /// stopping once a node gives it a terminal disposition or `max_hops`
    /// edges have been walked.
    ///
    /// `max_hops` guards against a misconfigured pair of nodes that hand
    /// packets back and forth forever; hitting it marks the packet
    /// [`DoneReason::InternalFailure`][net::packet::DoneReason::InternalFailure].
    pub fn run_one(&self, packet: &mut Pkt, max_hops: usize) {
        let mut current = self.entry;
        for _ in 0..max_hops {
            let Some(next_name) = self.nodes[current].process(packet) else {
                return;
            };
            let Some(next) = self.index_of(next_name) else {
                packet.done(net::packet::DoneReason::InternalFailure);
                return;
            };
            current = next;
        }
        packet.done(net::packet::DoneReason::InternalFailure);
    }

    /// Call [`Node::quiesce`] on every node; a worker calls this once per
    /// processed burst.
    pub fn quiesce(&self) {
        for node in &self.nodes {
            node.quiesce();
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#[cfg(test)]
mod test {
    use super::*;
    use net::buffer::TestBuffer;
    use net::eth::Eth;
    use net::eth::mac::{DestinationMac, Mac, SourceMac};
    use net::eth::ethtype::EthType;
    use net::headers::Headers;
    use net::packet::Packet;
    use net::parse::DeParse;

    struct Passthrough;
    impl Node for Passthrough {
        fn name(&self) -> &'static str {
            "a"
        }
        fn process(&self, _packet: &mut Pkt) -> Option<&'static str> {
            Some("b")
        }
    }

    struct Sink;
    impl Node for Sink {
        fn name(&self) -> &'static str {
            "b"
        }
        fn process(&self, packet: &mut Pkt) -> Option<&'static str> {
            packet.done(net::packet::DoneReason::Delivered);
            None
        }
    }

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
    fn build_rejects_duplicate_names() {
        const A: NodeTemplate = NodeTemplate {
            name: "a",
            edges: &[],
            constructor: || Box::new(Passthrough),
            register_callback: None,
        };
        const A2: NodeTemplate = NodeTemplate {
            name: "a",
            edges: &[],
            constructor: || Box::new(Passthrough),
            register_callback: None,
        };
        let err = Graph::build_from([&A, &A2], "a").unwrap_err();
        assert!(matches!(err, BuildError::DuplicateNode("a")));
    }

    #[test]
    fn build_rejects_undefined_edge() {
        const A: NodeTemplate = NodeTemplate {
            name: "a",
            edges: &["missing"],
            constructor: || Box::new(Passthrough),
            register_callback: None,
        };
        let err = Graph::build_from([&A], "a").unwrap_err();
        assert!(matches!(err, BuildError::UndefinedEdge { from: "a", .. }));
    }

    #[test]
    fn walks_edges_to_terminal_disposition() {
        const A: NodeTemplate = NodeTemplate {
            name: "a",
            edges: &["b"],
            constructor: || Box::new(Passthrough),
            register_callback: None,
        };
        const B: NodeTemplate = NodeTemplate {
            name: "b",
            edges: &[],
            constructor: || Box::new(Sink),
            register_callback: None,
        };
        let graph = Graph::build_from([&A, &B], "a").unwrap();
        let mut packet = test_packet();
        graph.run_one(&mut packet, 8);
        assert_eq!(packet.get_done(), Some(net::packet::DoneReason::Delivered));
    }
}
