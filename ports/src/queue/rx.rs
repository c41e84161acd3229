// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Receive queue configuration and management.

use crate::PortBuffer;
use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use net::packet::Packet;
use tracing::trace;

/// A receive queue index.
#[repr(transparent)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RxQueueIndex(pub u16);

impl RxQueueIndex {
    /// The index represented as a `u16`.
    #[must_use]
    pub fn as_u16(&self) -> u16 {
        self.0
    }
}

impl From<u16> for RxQueueIndex {
    fn from(value: u16) -> Self {
        RxQueueIndex(value)
    }
}

/// A receive queue.
///
/// Symmetric with [`crate::queue::tx::TxQueue`]: whatever stands in for a
/// NIC feeds packets into the queue with [`RxQueue::enqueue`], and a worker
/// drains them with [`RxQueue::receive_burst`].
#[derive(Debug)]
pub struct RxQueue {
    index: RxQueueIndex,
    tx: Sender<Packet<PortBuffer>>,
    rx: Receiver<Packet<PortBuffer>>,
}

impl RxQueue {
    /// Build a new, empty receive queue of the given capacity.
    #[must_use]
    pub(crate) fn new(index: RxQueueIndex, capacity: usize) -> Self {
        let (tx, rx) = bounded(capacity.max(1));
        Self { index, tx, rx }
    }

    /// The index of this queue within its port.
    #[must_use]
    pub fn index(&self) -> RxQueueIndex {
        self.index
    }

    /// Feed a packet into the queue, as if it had just arrived on the wire.
    ///
    /// Returns the packet back to the caller if the queue is full.
    pub fn enqueue(&self, packet: Packet<PortBuffer>) -> Option<Packet<PortBuffer>> {
        match self.tx.try_send(packet) {
            Ok(()) => None,
            Err(TrySendError::Full(packet) | TrySendError::Disconnected(packet)) => Some(packet),
        }
    }

    /// Pull up to `max` packets off the queue for a worker to process.
    #[tracing::instrument(level = "trace", skip(self))]
    pub fn receive_burst(&self, max: usize) -> Vec<Packet<PortBuffer>> {
        let received: Vec<_> = self.rx.try_iter().take(max).collect();
        trace!(
            queue = self.index.as_u16(),
            count = received.len(),
            "received burst"
        );
        received
    }
}
