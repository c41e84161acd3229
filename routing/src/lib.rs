// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! IPv4 forwarding state: a longest-prefix-match FIB, a next-hop table,
//! and an interface table, all RCU-protected so forwarding workers can
//! read them lock-free while the control plane mutates them from a single
//! writer thread.
//!
//! A single default forwarding table is carried (no VRFs); see
//! [`control::ControlBridge`] for the single point through which the
//! control plane applies every mutation.

#![deny(
    unsafe_code,
    missing_docs,
    clippy::pedantic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic
)]
#![allow(clippy::module_name_repetitions)]

pub mod control;
pub mod fib;
pub mod interface;
pub mod nexthop;
pub mod txq;

pub use control::ControlBridge;
pub use fib::{Fib, FibEntry, FibReader, FibWriter};
pub use interface::{Interface, InterfaceKind, InterfaceReader, InterfaceTable, InterfaceWriter};
pub use nexthop::{FwAction, NextHop, NextHopId, NextHopReader, NextHopTable, NextHopWriter, Tunnel};
pub use txq::{TxqAssignments, WorkerId};
