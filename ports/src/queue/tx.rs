// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Transmit queue configuration and management.

use crate::PortBuffer;
use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use errno::ErrorCode;
use net::packet::Packet;
use tracing::trace;

/// A transmit queue index.
///
/// Newtype around `u16` so a queue index can never be confused with a
/// burst count or a descriptor count.
#[repr(transparent)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TxQueueIndex(pub u16);

impl TxQueueIndex {
    /// The index represented as a `u16`.
    #[must_use]
    pub fn as_u16(&self) -> u16 {
        self.0
    }
}

impl From<TxQueueIndex> for u16 {
    fn from(value: TxQueueIndex) -> u16 {
        value.as_u16()
    }
}

impl From<u16> for TxQueueIndex {
    fn from(value: u16) -> TxQueueIndex {
        TxQueueIndex(value)
    }
}

/// Configuration for a transmit queue.
#[derive(Debug, Clone)]
pub struct TxQueueConfig {
    /// The index of the tx queue.
    pub queue_index: TxQueueIndex,
    /// Maximum number of packets the queue may hold before `transmit`
    /// starts reporting [`DoneReason::QueueFull`][net::packet::DoneReason::QueueFull].
    pub capacity: usize,
}

/// Error type for transmit queue configuration failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigFailure {
    /// The requested queue capacity is zero; a zero-depth queue can never
    /// accept a packet.
    #[error("queue capacity must be nonzero")]
    ZeroCapacity,
    /// Catch-all for failures this crate would report with a POSIX errno if
    /// it ever grows a real backing resource to fail to allocate.
    #[error("unexpected error: {0}")]
    Unexpected(ErrorCode),
}

/// The maximum number of packets moved in a single `transmit`/`receive`
/// call; bursting amortizes the per-call overhead of touching the queue.
pub const PKT_BURST_SIZE: usize = 64;

/// A transmit queue.
///
/// Packets handed to [`TxQueue::transmit`] are enqueued on a bounded
/// channel; whatever drains the other end (a real NIC driver, in a
/// non-software build) is outside this crate's concern.
#[derive(Debug)]
pub struct TxQueue {
    index: TxQueueIndex,
    tx: Sender<Packet<PortBuffer>>,
    rx: Receiver<Packet<PortBuffer>>,
}

impl TxQueue {
    /// Build a new, empty transmit queue.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigFailure::ZeroCapacity`] if `config.capacity` is 0.
    pub(crate) fn setup(config: TxQueueConfig) -> Result<Self, ConfigFailure> {
        if config.capacity == 0 {
            return Err(ConfigFailure::ZeroCapacity);
        }
        let (tx, rx) = bounded(config.capacity);
        Ok(Self {
            index: config.queue_index,
            tx,
            rx,
        })
    }

    /// The index of this queue within its port.
    #[must_use]
    pub fn index(&self) -> TxQueueIndex {
        self.index
    }

    /// Enqueue a burst of packets for transmission.
    ///
    /// Packets that do not fit because the queue is full are returned to
    /// the caller so the node that produced them can account for the drop
    /// under [`DoneReason::QueueFull`][net::packet::DoneReason::QueueFull].
    #[tracing::instrument(level = "trace", skip(self, packets))]
    pub fn transmit(
        &self,
        packets: impl IntoIterator<Item = Packet<PortBuffer>>,
    ) -> Vec<Packet<PortBuffer>> {
        let mut rejected = Vec::new();
        for packet in packets {
            match self.tx.try_send(packet) {
                Ok(()) => {
                    trace!(queue = self.index.as_u16(), "enqueued packet for transmit");
                }
                Err(TrySendError::Full(packet)) => rejected.push(packet),
                Err(TrySendError::Disconnected(packet)) => rejected.push(packet),
            }
        }
        rejected
    }

    /// Drain up to [`PKT_BURST_SIZE`] packets that have been enqueued for
    /// transmission.
    ///
    /// This stands in for the hardware actually putting bytes on the wire;
    /// a real NIC binding would replace this method's body, not its
    /// signature.
    pub fn drain_burst(&self) -> Vec<Packet<PortBuffer>> {
        self.rx.try_iter().take(PKT_BURST_SIZE).collect()
    }
}
