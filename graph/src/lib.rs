// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

#![deny(
    unsafe_code,
    missing_docs,
    clippy::pedantic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic
)]
#![allow(clippy::module_name_repetitions)]

//! # Forwarding graph
//!
//! A forwarding graph is a set of named [`Node`]s wired together by edges.
//! Each node lives in its own crate module, registers itself with
//! [`NODE_REGISTRY`] at link time via `#[linkme::distributed_slice]`, and
//! declares the names of the nodes it may hand a packet to. No node needs
//! to know about any other node's existence beyond those names.
//!
//! Building a graph happens in three phases, driven by [`Graph::build`]:
//!
//! 1. Every registered [`NodeTemplate`] is collected by name; a duplicate
//!    name is a build-time error.
//! 2. Every template's optional `register_callback` runs once. A
//!    dispatcher's children (`ipv4_lookup` attaching to `classify`,
//!    `ipip_output` attaching to `ip_output`) use this to call
//!    [`attach_parent`] or [`classify_add_proto`] before anything below
//!    depends on the result.
//! 3. Every declared edge -- both statically listed and attached in phase
//!    2 -- is checked against the collected names; an edge to a name
//!    nothing registered is a build-time error. Only once every edge
//!    resolves are the nodes actually constructed.
//!
//! The result is an immutable [`Graph`](builder::Graph) that any number of
//! [`WorkerGraph`]s can share behind an `Arc` to drive bursts of packets
//! from an entry node (normally `classify`) to a terminal disposition.

pub mod attach;
pub mod builder;
pub mod init_data;
pub mod node;
pub mod worker;

pub use attach::{EdgeId, attach_parent, classify_add_proto, classify_protos};
pub use builder::{BuildError, Graph};
pub use node::{NODE_REGISTRY, Node, NodeTemplate, Pkt};
pub use worker::{MAX_HOPS, WorkerGraph};
