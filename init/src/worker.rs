// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Per-worker thread: pin to a core, drive the graph in bursts, and
//! dispatch `Delivered` survivors to their resolved transmit queue.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use graph::{Pkt, WorkerGraph};
use nodes::fields;
use nodes::ports_table::PortTable;
use ports::{PortId, TxQueueIndex};
use tracing::{trace, warn};

use crate::config::WorkerSpec;

/// An idle worker backs off for this long before polling its receive
/// queues again, so an otherwise-empty process does not spin a core at
/// 100%.
const IDLE_BACKOFF: Duration = Duration::from_millis(1);

/// Pin the calling thread to `core`.
///
/// Logged and otherwise ignored on failure: an unpinned worker still
/// forwards packets correctly, just without the cache-locality guarantee
/// pinning is meant to give it.
fn pin_to_core(core: usize) {
    let mut set = nix::sched::CpuSet::new();
    if let Err(e) = set.set(core) {
        warn!("core {core} is not a valid affinity target: {e}");
        return;
    }
    if let Err(e) = nix::sched::sched_setaffinity(nix::unistd::Pid::from_raw(0), &set) {
        warn!("failed to pin worker to core {core}: {e}");
    }
}

/// Group `packets` by the `(egress_port, egress_queue)` pair `ip_output`
/// stamped on them and hand each group to the matching transmit queue.
///
/// Packets naming a port or queue nothing here owns, or whose queue
/// rejects them as full, are simply dropped: the graph already marked
/// them `Delivered`, and there is no drop edge left to route them to once
/// they leave the graph.
fn transmit(ports: &PortTable, delivered: Vec<Pkt>) {
    let mut by_queue: HashMap<(PortId, TxQueueIndex), Vec<Pkt>> = HashMap::new();
    for packet in delivered {
        let port = PortId(packet.get_meta().scratch.get(fields::egress_port()));
        let queue = TxQueueIndex(packet.get_meta().scratch.get(fields::egress_queue()));
        by_queue.entry((port, queue)).or_default().push(packet);
    }
    for ((port_id, queue_id), packets) in by_queue {
        let Some(port) = ports.get(port_id) else {
            warn!("delivered packet for unowned port {port_id}");
            continue;
        };
        let Some(queue) = port.tx_queue(queue_id) else {
            warn!("delivered packet for unowned queue {} on {port_id}", queue_id.as_u16());
            continue;
        };
        let rejected = queue.transmit(packets);
        if !rejected.is_empty() {
            trace!(dropped = rejected.len(), port = %port_id, "tx queue full");
        }
    }
}

/// Run this worker's burst loop until `stop` is set.
///
/// `ports` holds every port in the process; `spec.rx`/`spec.tx` say which
/// `(port, queue)` pairs this worker is the one polling or draining into.
pub fn run(spec: &WorkerSpec, ports: Arc<PortTable>, graph: Arc<WorkerGraph>, stop: &AtomicBool) {
    pin_to_core(spec.core);
    let rx = spec.rx.clone();

    while !stop.load(Ordering::Relaxed) {
        let mut burst = Vec::new();
        for (port_id, queue_id) in &rx {
            let Some(port) = ports.get(*port_id) else {
                continue;
            };
            let Some(queue) = port.rx_queue((*queue_id).into()) else {
                continue;
            };
            burst.extend(queue.receive_burst(ports::queue::tx::PKT_BURST_SIZE));
        }

        if burst.is_empty() {
            std::thread::sleep(IDLE_BACKOFF);
            continue;
        }

        let delivered = graph.run_burst(burst);
        transmit(&ports, delivered);
    }
}
