// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The control-plane socket: wire format, request dispatch, and accept
//! loop for mutating forwarding state from outside the dataplane
//! process.
//!
//! A client connects to an `AF_UNIX` stream socket, sends length-framed
//! requests encoded per [`wire`], and gets back one response per
//! request carrying a POSIX errno in its status field. Every accepted
//! request is applied to a [`routing::ControlBridge`] through [`ops`];
//! the datapath itself never talks to this crate directly, only to the
//! reader handles the bridge hands out.

#![deny(
    unsafe_code,
    missing_docs,
    clippy::pedantic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic
)]
#![allow(clippy::module_name_repetitions)]

pub mod ops;
pub mod server;
pub mod wire;

pub use ops::ControlError;
pub use server::{DEFAULT_SOCK_PATH, ServerConfig, ServerError, ServerHandle, start_server};
