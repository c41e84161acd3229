// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Port identity and configuration.

use crate::queue::rx::{RxQueue, RxQueueIndex};
use crate::queue::tx::{ConfigFailure, TxQueue, TxQueueConfig, TxQueueIndex};
use std::fmt;

/// A dense, small index identifying a port.
///
/// Workers address ports by this index rather than by name; name
/// resolution happens once, at configuration time.
#[repr(transparent)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PortId(pub u16);

impl PortId {
    /// The index represented as a `u16`.
    #[must_use]
    pub fn as_u16(&self) -> u16 {
        self.0
    }
}

impl From<u16> for PortId {
    fn from(value: u16) -> Self {
        PortId(value)
    }
}

impl fmt::Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "port{id}", id = self.0)
    }
}

/// Static configuration for a [`Port`]: how many queues it has and how deep
/// each one is.
#[derive(Debug, Clone)]
pub struct PortConfig {
    /// The port's dense index.
    pub id: PortId,
    /// The port's administrative name (interface name in the real world).
    pub name: String,
    /// Number of receive queues to create.
    pub rx_queues: u16,
    /// Number of transmit queues to create.
    pub tx_queues: u16,
    /// Capacity, in packets, of every queue the port owns.
    pub queue_capacity: usize,
}

/// A port: an addressable set of receive and transmit queues.
///
/// This crate has no notion of a NIC driver; a `Port` is just the queues
/// themselves plus the bookkeeping a worker needs to find the right one.
#[derive(Debug)]
pub struct Port {
    id: PortId,
    name: String,
    rx: Vec<RxQueue>,
    tx: Vec<TxQueue>,
}

impl Port {
    /// Build a port and all of its queues from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigFailure`] if any transmit queue's requested capacity
    /// cannot be honored.
    pub fn new(config: PortConfig) -> Result<Self, ConfigFailure> {
        let rx = (0..config.rx_queues)
            .map(|i| RxQueue::new(RxQueueIndex(i), config.queue_capacity))
            .collect();
        let tx = (0..config.tx_queues)
            .map(|i| {
                TxQueue::setup(TxQueueConfig {
                    queue_index: TxQueueIndex(i),
                    capacity: config.queue_capacity,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            id: config.id,
            name: config.name,
            rx,
            tx,
        })
    }

    /// The port's dense index.
    #[must_use]
    pub fn id(&self) -> PortId {
        self.id
    }

    /// The port's administrative name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Borrow one of this port's receive queues.
    #[must_use]
    pub fn rx_queue(&self, index: RxQueueIndex) -> Option<&RxQueue> {
        self.rx.get(index.0 as usize)
    }

    /// Borrow one of this port's transmit queues.
    #[must_use]
    pub fn tx_queue(&self, index: TxQueueIndex) -> Option<&TxQueue> {
        self.tx.get(index.0 as usize)
    }

    /// The number of receive queues this port owns.
    #[must_use]
    pub fn num_rx_queues(&self) -> u16 {
        #[allow(clippy::cast_possible_truncation)] // bounded by PortConfig::rx_queues (u16)
        {
            self.rx.len() as u16
        }
    }

    /// The number of transmit queues this port owns.
    #[must_use]
    pub fn num_tx_queues(&self) -> u16 {
        #[allow(clippy::cast_possible_truncation)] // bounded by PortConfig::tx_queues (u16)
        {
            self.tx.len() as u16
        }
    }
}
