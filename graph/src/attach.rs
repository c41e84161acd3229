// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Dynamic edge attachment: the half of the node registry a dispatcher's
//! children populate at registration time rather than at their own
//! compile-time edge declaration.
//!
//! `classify` and `ip_output` know the *shape* of a dispatch (a ptype or a
//! next-hop kind routes somewhere) but not which node handles which case
//! until every crate in the binary has linked in and registered. A child
//! node attaches itself via its [`graph::NodeTemplate::register_callback`],
//! invoked once per [`crate::builder::Graph::build_from`] after every
//! template has been collected and before edges are validated.
//!
//! Both tables below are process-wide and append-only, matching the node
//! registry itself; building a second graph in the same process re-runs
//! every register callback, so attaching the same pair twice is a no-op
//! rather than a duplicate edge.

use std::sync::Mutex;

/// Identifies an edge a register callback attached to a parent dispatcher.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct EdgeId(usize);

impl EdgeId {
    /// Returned in place of a real id when an attachment could not be
    /// recorded. Nothing in this crate produces it today ([`attach_parent`]
    /// is infallible), but callers matching the original C API's
    /// `edge_id|INVALID` contract have a value to compare against.
    pub const INVALID: EdgeId = EdgeId(usize::MAX);
}

struct Attachment {
    parent: &'static str,
    child: &'static str,
}

static ATTACHMENTS: Mutex<Vec<Attachment>> = Mutex::new(Vec::new());
static CLASSIFY_PROTOS: Mutex<Vec<(u16, &'static str)>> = Mutex::new(Vec::new());

/// Attach `child` as a new outgoing edge of `parent`'s dispatcher.
///
/// Idempotent: attaching the same pair a second time returns the id of the
/// first attachment instead of recording a duplicate.
#[allow(clippy::missing_panics_doc)] // a poisoned mutex here is a bug, not a reachable error
#[must_use]
pub fn attach_parent(parent: &'static str, child: &'static str) -> EdgeId {
    let mut attachments = ATTACHMENTS.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    if let Some(pos) = attachments.iter().position(|a| a.parent == parent && a.child == child) {
        return EdgeId(pos);
    }
    attachments.push(Attachment { parent, child });
    EdgeId(attachments.len() - 1)
}

/// Record that `classify` should route packets whose ethertype matches
/// `ptype` to `edge`.
#[allow(clippy::missing_panics_doc)]
pub fn classify_add_proto(ptype: u16, edge: &'static str) {
    let mut protos = CLASSIFY_PROTOS.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    if !protos.iter().any(|(p, e)| *p == ptype && *e == edge) {
        protos.push((ptype, edge));
    }
}

/// Every `(ptype, edge)` pair registered so far, in registration order.
///
/// `classify`'s constructor snapshots this once, after every other
/// template's register callback has already run.
#[must_use]
#[allow(clippy::missing_panics_doc)]
pub fn classify_protos() -> Vec<(u16, &'static str)> {
    CLASSIFY_PROTOS.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clone()
}

/// Every `(parent, child)` pair attached so far, in registration order.
#[must_use]
#[allow(clippy::missing_panics_doc)]
pub(crate) fn attachments() -> Vec<(&'static str, &'static str)> {
    ATTACHMENTS
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .iter()
        .map(|a| (a.parent, a.child))
        .collect()
}

#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn attach_parent_is_idempotent() {
        let first = attach_parent("test::attach_parent_is_idempotent", "child");
        let second = attach_parent("test::attach_parent_is_idempotent", "child");
        assert_eq!(first, second);
    }

    #[test]
    fn classify_add_proto_is_idempotent() {
        let before = classify_protos().len();
        classify_add_proto(0xBEEF, "test::classify_add_proto_is_idempotent");
        classify_add_proto(0xBEEF, "test::classify_add_proto_is_idempotent");
        assert_eq!(classify_protos().len(), before + 1);
    }
}
