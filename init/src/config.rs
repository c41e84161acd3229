// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Process configuration: the port list, per-worker core and queue
//! assignment, and the control socket path, assembled once at startup and
//! never re-read afterward.

use ports::PortId;
use std::path::PathBuf;

/// One port to bring up, and how many queues to give it.
#[derive(Debug, Clone)]
pub struct PortSpec {
    /// Dense index this port is addressed by everywhere else in the
    /// process (the interface table, a worker's queue assignment).
    pub id: PortId,
    /// Administrative name, carried into [`ports::PortConfig::name`].
    pub name: String,
    /// Number of receive queues to create.
    pub rx_queues: u16,
    /// Number of transmit queues to create.
    pub tx_queues: u16,
}

/// One worker thread: the core it runs on, and the `(port, queue)` pairs
/// it owns on the receive and transmit sides.
#[derive(Debug, Clone)]
pub struct WorkerSpec {
    /// The core this worker pins itself to.
    pub core: usize,
    /// Receive queues this worker polls, each as `(port, rx queue index)`.
    pub rx: Vec<(PortId, u16)>,
    /// Transmit queues this worker owns, each as `(port, tx queue index)`.
    pub tx: Vec<(PortId, u16)>,
}

/// Full process configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Ports to bring up before any worker starts.
    pub ports: Vec<PortSpec>,
    /// Worker threads to spawn.
    pub workers: Vec<WorkerSpec>,
    /// Depth, in packets, to give every queue this process creates.
    pub queue_capacity: usize,
    /// Filesystem path of the control socket.
    pub control_sock_path: PathBuf,
}

/// Invalid configuration, caught before any worker starts.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A worker's queue assignment names a port nothing configured.
    #[error("worker on core {core} references undefined port {port}")]
    UnknownPort {
        /// The offending worker's core id.
        core: usize,
        /// The port id it referenced.
        port: u16,
    },
    /// No worker was configured at all.
    #[error("configuration defines no workers")]
    NoWorkers,
    /// No port was configured at all.
    #[error("configuration defines no ports")]
    NoPorts,
}

impl Config {
    /// Check every worker's queue assignment against the configured port
    /// list.
    ///
    /// # Errors
    /// See [`ConfigError`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ports.is_empty() {
            return Err(ConfigError::NoPorts);
        }
        if self.workers.is_empty() {
            return Err(ConfigError::NoWorkers);
        }
        for worker in &self.workers {
            for (port, _) in worker.rx.iter().chain(&worker.tx) {
                if !self.ports.iter().any(|p| p.id == *port) {
                    return Err(ConfigError::UnknownPort {
                        core: worker.core,
                        port: port.as_u16(),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn single_port_config() -> Config {
        Config {
            ports: vec![PortSpec {
                id: PortId(0),
                name: "port0".to_string(),
                rx_queues: 1,
                tx_queues: 1,
            }],
            workers: vec![WorkerSpec {
                core: 0,
                rx: vec![(PortId(0), 0)],
                tx: vec![(PortId(0), 0)],
            }],
            queue_capacity: 256,
            control_sock_path: PathBuf::from("/run/grout.sock"),
        }
    }

    #[test]
    fn well_formed_config_validates() {
        assert!(single_port_config().validate().is_ok());
    }

    #[test]
    fn worker_referencing_undefined_port_is_rejected() {
        let mut config = single_port_config();
        config.workers[0].tx.push((PortId(9), 0));
        assert_eq!(
            config.validate(),
            Err(ConfigError::UnknownPort { core: 0, port: 9 })
        );
    }

    #[test]
    fn empty_ports_is_rejected() {
        let mut config = single_port_config();
        config.ports.clear();
        assert_eq!(config.validate(), Err(ConfigError::NoPorts));
    }

    #[test]
    fn empty_workers_is_rejected() {
        let mut config = single_port_config();
        config.workers.clear();
        assert_eq!(config.validate(), Err(ConfigError::NoWorkers));
    }
}
