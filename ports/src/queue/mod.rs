// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Receive and transmit queues.

pub mod rx;
pub mod tx;
