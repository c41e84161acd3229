// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Per-node runtime init data.
//!
//! A node's constructor (`fn() -> Box<dyn Node>`) takes no arguments, so it
//! has no way to receive the things only known at process startup: which
//! port a `tx` node should drain into, which [`routing`] reader an
//! `ipv4_lookup` node should hold. Those get installed once, before
//! [`crate::Graph::build`] runs, keyed by node name, and each node looks up
//! its own entry from its constructor.

use std::any::{Any, type_name};
use std::collections::HashMap;
use std::sync::OnceLock;

/// A table of per-node init data, built up before the graph is built and
/// then frozen for the life of the process.
#[derive(Default)]
pub struct InitData(HashMap<&'static str, Box<dyn Any + Send + Sync>>);

impl InitData {
    /// An empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `value` as the init data for the node named `node`.
    ///
    /// Replaces whatever was previously registered for that name.
    pub fn insert<T: Any + Send + Sync>(&mut self, node: &'static str, value: T) {
        self.0.insert(node, Box::new(value));
    }
}

static REGISTRY: OnceLock<InitData> = OnceLock::new();

/// Error installing the process-wide init data table.
#[derive(Debug, thiserror::Error)]
pub enum InstallError {
    /// [`install`] was called more than once.
    #[error("graph init data was already installed")]
    AlreadyInstalled,
}

/// Freeze `data` as the process-wide init data table.
///
/// # Errors
///
/// Returns [`InstallError::AlreadyInstalled`] if called more than once.
pub fn install(data: InitData) -> Result<(), InstallError> {
    REGISTRY.set(data).map_err(|_| InstallError::AlreadyInstalled)
}

/// Error looking up a node's init data.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    /// [`install`] was never called.
    #[error("graph init data was never installed")]
    NotInstalled,
    /// No value was registered under this name.
    #[error("no init data registered for node {0:?}")]
    MissingNode(&'static str),
    /// A value was registered under this name, but as a different type.
    #[error("init data for node {node:?} is not a {expected}")]
    TypeMismatch {
        /// The node whose init data was requested.
        node: &'static str,
        /// The type that was asked for.
        expected: &'static str,
    },
}

/// Look up the init data registered for `node` as a `T`.
///
/// # Errors
///
/// See [`LookupError`].
pub fn get<T: Any + Send + Sync>(node: &'static str) -> Result<&'static T, LookupError> {
    let data = REGISTRY.get().ok_or(LookupError::NotInstalled)?;
    let boxed = data.0.get(node).ok_or(LookupError::MissingNode(node))?;
    boxed.downcast_ref::<T>().ok_or(LookupError::TypeMismatch {
        node,
        expected: type_name::<T>(),
    })
}

#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#[cfg(test)]
mod test {
    use super::*;

    // `REGISTRY` is process-global and `OnceLock` only ever lets one test in
    // this binary call `install`; exercise both outcomes from one test.
    #[test]
    fn install_then_lookup_round_trips() {
        let mut data = InitData::new();
        data.insert("probe", 7u32);
        assert!(install(data).is_ok());

        let mut again = InitData::new();
        again.insert("probe", 7u32);
        assert!(matches!(install(again), Err(InstallError::AlreadyInstalled)));

        let value: &'static u32 = get("probe").unwrap();
        assert_eq!(*value, 7);
        assert!(matches!(
            get::<u32>("missing"),
            Err(LookupError::MissingNode("missing"))
        ));
        assert!(matches!(
            get::<u64>("probe"),
            Err(LookupError::TypeMismatch { node: "probe", .. })
        ));
    }
}
