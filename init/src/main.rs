// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Process entry point: parse configuration, bring up ports, wire the
//! control bridge into the forwarding graph's init data, build the
//! graph, and run one worker thread per configured core until asked to
//! stop.

mod config;
mod worker;

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use config::{Config, PortSpec, WorkerSpec};
use control::{ServerConfig, start_server};
use graph::init_data::InitData;
use graph::{Graph, WorkerGraph};
use nodes::ports_table::PortTable;
use ports::{Port, PortConfig};
use routing::{ControlBridge, WorkerId};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Command-line arguments.
///
/// A full deployment would read most of this from a configuration file;
/// flags are enough to stand the process up for development and for the
/// integration tests that drive it end to end.
#[derive(Debug, Parser)]
#[command(author, version, about = "IPv4 forwarding dataplane")]
struct Args {
    /// Administrative names of the ports to bring up, one per `PortId`
    /// starting at 0.
    #[arg(long, value_delimiter = ',', default_value = "port0")]
    ports: Vec<String>,

    /// CPU cores to run a worker on, one worker per core. Worker `i` owns
    /// port `i % ports.len()` end to end (both its rx and its tx side).
    #[arg(long, value_delimiter = ',', default_value = "0")]
    cores: Vec<usize>,

    /// Depth, in packets, of every queue.
    #[arg(long, default_value_t = 1024)]
    queue_capacity: usize,

    /// Filesystem path of the control socket.
    #[arg(long, default_value = "/run/grout.sock")]
    control_sock: PathBuf,
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_target(true)
        .with_thread_names(true)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

fn build_config(args: &Args) -> Config {
    let ports = args
        .ports
        .iter()
        .enumerate()
        .map(|(i, name)| PortSpec {
            #[allow(clippy::cast_possible_truncation)] // port lists are never anywhere near u16::MAX long
            id: PortId(i as u16),
            name: name.clone(),
            rx_queues: 1,
            tx_queues: 1,
        })
        .collect::<Vec<_>>();

    let workers = args
        .cores
        .iter()
        .enumerate()
        .map(|(i, &core)| {
            let port = PortId(u16::try_from(i % ports.len().max(1)).unwrap_or(0));
            WorkerSpec {
                core,
                rx: vec![(port, 0)],
                tx: vec![(port, 0)],
            }
        })
        .collect();

    Config {
        ports,
        workers,
        queue_capacity: args.queue_capacity,
        control_sock_path: args.control_sock.clone(),
    }
}

/// Bring up every configured port, densely indexed by [`ports::PortId`].
///
/// `ports` is assumed to already be in id order starting at 0, which is
/// what [`build_config`] produces; [`PortTable::get`] silently returns
/// `None` for anything out of that order.
fn build_ports(ports: &[PortSpec], queue_capacity: usize) -> Result<PortTable, ports::queue::tx::ConfigFailure> {
    let built = ports
        .iter()
        .map(|spec| {
            Port::new(PortConfig {
                id: spec.id,
                name: spec.name.clone(),
                rx_queues: spec.rx_queues,
                tx_queues: spec.tx_queues,
                queue_capacity,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(PortTable::new(built))
}

/// Install an `Up` physical interface for every configured port, so a
/// freshly started process has somewhere for a route to point before the
/// control plane has said anything about interfaces at all.
fn seed_interfaces(bridge: &ControlBridge, ports: &[PortSpec]) {
    for (i, port) in ports.iter().enumerate() {
        let id = net::packet::InterfaceId::new(u32::try_from(i).unwrap_or(u32::MAX));
        bridge.set_interface(
            id,
            routing::Interface {
                name: port.name.clone(),
                admin_state: net::interface::AdminState::Up,
                address: None,
                // Bring-up placeholder: a locally-administered MAC derived from the
                // port id, until the control plane learns the real hardware address.
                mac: net::eth::mac::Mac([0x02, 0, 0, 0, 0, port.id.as_u16() as u8]),
                kind: routing::InterfaceKind::Physical {
                    port: port.id.as_u16(),
                    queue: 0,
                },
            },
        );
    }
}

fn main() {
    init_logging();
    let args = Args::parse();
    let config = build_config(&args);
    if let Err(e) = config.validate() {
        error!("invalid configuration: {e}");
        std::process::exit(1);
    }

    let bridge = Arc::new(ControlBridge::new());
    seed_interfaces(&bridge, &config.ports);
    for worker in &config.workers {
        #[allow(clippy::cast_possible_truncation)] // core counts never approach u32::MAX
        let worker_id = WorkerId(worker.core as u32);
        for (port, queue) in &worker.tx {
            bridge.assign_txq(worker_id, *port, (*queue).into());
        }
    }

    let mut init = InitData::new();
    init.insert("ipv4_lookup", bridge.fib_reader());
    init.insert("ipv4_rewrite", bridge.next_hop_reader());
    init.insert("ipv4_rewrite_interfaces", bridge.interface_reader());
    init.insert("ip_output", bridge.interface_reader());
    init.insert("ip_output_next_hops", bridge.next_hop_reader());
    if let Err(e) = graph::init_data::install(init) {
        error!("{e}");
        std::process::exit(1);
    }

    let graph = match Graph::build("classify") {
        Ok(graph) => Arc::new(WorkerGraph::new(Arc::new(graph))),
        Err(e) => {
            error!("failed to build forwarding graph: {e}");
            std::process::exit(1);
        }
    };

    let ports = match build_ports(&config.ports, config.queue_capacity) {
        Ok(ports) => Arc::new(ports),
        Err(e) => {
            error!("failed to bring up ports: {e}");
            std::process::exit(1);
        }
    };

    let server = match start_server(
        &ServerConfig {
            sock_path: config.control_sock_path.to_string_lossy().into_owned(),
        },
        Arc::clone(&bridge),
    ) {
        Ok(server) => server,
        Err(e) => {
            error!("failed to start control server: {e}");
            std::process::exit(1);
        }
    };

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = Arc::clone(&stop);
        if let Err(e) = ctrlc::set_handler(move || stop.store(true, Ordering::Relaxed)) {
            error!("failed to install SIGINT handler: {e}");
        }
    }

    info!(workers = config.workers.len(), ports = config.ports.len(), "dataplane starting");
    let handles: Vec<_> = config
        .workers
        .iter()
        .cloned()
        .map(|spec| {
            let ports = Arc::clone(&ports);
            let graph = Arc::clone(&graph);
            let stop = Arc::clone(&stop);
            std::thread::Builder::new()
                .name(format!("worker-{}", spec.core))
                .spawn(move || worker::run(&spec, ports, graph, &stop))
                .expect("failed to spawn worker thread")
        })
        .collect();

    while !stop.load(Ordering::Relaxed) {
        std::thread::sleep(std::time::Duration::from_millis(100));
    }

    info!("shutting down");
    for handle in handles {
        let _ = handle.join();
    }
    drop(server);
}
