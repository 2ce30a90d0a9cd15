use std::fmt;

use crate::{config::Configuration, discovery::InstancePool, error::Error};

const LOOPBACK: &str = "127.0.0.1";

/// A (host, port) endpoint handed to a role binary on its command line.
/// Never persisted; recomputed each run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    pub host: String,
    pub port: u16,
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Where a dispatched command runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Local,
    Remote(String),
}

/// A server placement: its listening address plus the host it runs on.
#[derive(Debug, Clone)]
pub struct ServerSlot {
    pub addr: Address,
    pub target: Target,
}

/// Every address and placement the sequencer needs, computed up front so no
/// shared counter is mutated once the dispatch units are running.
///
/// Port layout: directory at the base port, db next, then one port per
/// trustee, then the servers as a contiguous block. Clients listen on
/// nothing; they only get a placement.
#[derive(Debug, Clone)]
pub struct Topology {
    pub directory: Address,
    pub db: Address,
    /// Where the directory, db and trustees run (the root host remotely,
    /// this machine locally).
    pub coordinator: Target,
    pub trustees: Vec<Address>,
    pub servers: Vec<ServerSlot>,
    /// Client placements, indexed by client id.
    pub clients: Vec<Target>,
}

fn next_addr(host: &str, counter: u16) -> (Address, u16) {
    (
        Address {
            host: host.into(),
            port: counter,
        },
        counter + 1,
    )
}

impl Topology {
    /// Assign every address deterministically. `pool` is `None` for a
    /// local-only run.
    pub fn assign(config: &Configuration, pool: Option<&InstancePool>) -> crate::Result<Self> {
        match pool {
            None => Ok(Self::assign_on(config, LOOPBACK, None)),
            Some(pool) => {
                let Some(root) = pool.root.as_deref() else {
                    return Err(Error::Placement(
                        "remote mode requires an instance tagged Root".into(),
                    ));
                };
                if pool.workers.is_empty() && (config.servers > 0 || config.clients > 0) {
                    return Err(Error::Placement(
                        "remote mode requires a non-empty worker pool".into(),
                    ));
                }
                Ok(Self::assign_on(config, root, Some(&pool.workers)))
            }
        }
    }

    /// `workers` is `None` locally; remotely it is non-empty whenever servers
    /// or clients exist (checked by the caller).
    fn assign_on(config: &Configuration, coordinator: &str, workers: Option<&[String]>) -> Self {
        let mut counter = config.base_port;
        let (directory, next) = next_addr(coordinator, counter);
        counter = next;
        let (db, next) = next_addr(coordinator, counter);
        counter = next;

        let mut trustees = Vec::with_capacity(config.trustees);
        for _ in 0..config.trustees {
            let (addr, next) = next_addr(coordinator, counter);
            counter = next;
            trustees.push(addr);
        }

        let mut servers = Vec::with_capacity(config.servers);
        for i in 0..config.servers {
            let host = match workers {
                Some(workers) => &workers[i % workers.len()],
                None => LOOPBACK,
            };
            let (addr, next) = next_addr(host, counter);
            counter = next;
            let target = match workers {
                Some(_) => Target::Remote(host.into()),
                None => Target::Local,
            };
            servers.push(ServerSlot { addr, target });
        }

        let clients = (0..config.clients)
            .map(|i| match workers {
                Some(workers) => Target::Remote(workers[i % workers.len()].clone()),
                None => Target::Local,
            })
            .collect();

        Self {
            directory,
            db,
            coordinator: match workers {
                Some(_) => Target::Remote(coordinator.into()),
                None => Target::Local,
            },
            trustees,
            servers,
            clients,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RawConfig;

    fn config(servers: usize, clients: usize, trustees: usize) -> Configuration {
        RawConfig {
            servers: Some(servers),
            gsize: Some(2),
            groups: Some(1),
            clients: Some(clients),
            trustees: Some(trustees),
            msgs: Some(1),
            msize: Some(128),
            net: Some(0),
            mode: Some(0),
            ..RawConfig::default()
        }
        .resolve()
        .unwrap()
    }

    fn pool(workers: usize) -> InstancePool {
        InstancePool {
            root: Some("10.0.0.100".into()),
            workers: (0..workers).map(|i| format!("10.0.0.{}", i + 1)).collect(),
        }
    }

    #[test]
    fn ports_are_sequential_in_role_order() {
        let config = config(4, 2, 3);
        let topology = Topology::assign(&config, None).unwrap();
        let mut ports = vec![topology.directory.port, topology.db.port];
        ports.extend(topology.trustees.iter().map(|addr| addr.port));
        ports.extend(topology.servers.iter().map(|slot| slot.addr.port));
        let expected: Vec<u16> = (8000..=8000 + 1 + 3 + 4).collect();
        assert_eq!(ports, expected);
    }

    #[test]
    fn local_mode_is_all_loopback() {
        let config = config(2, 2, 1);
        let topology = Topology::assign(&config, None).unwrap();
        assert_eq!(topology.directory.host, "127.0.0.1");
        assert_eq!(topology.db.host, "127.0.0.1");
        assert!(topology.trustees.iter().all(|addr| addr.host == "127.0.0.1"));
        assert!(topology
            .servers
            .iter()
            .all(|slot| slot.addr.host == "127.0.0.1" && slot.target == Target::Local));
        assert!(topology.clients.iter().all(|t| *t == Target::Local));
        assert_eq!(topology.coordinator, Target::Local);
    }

    #[test]
    fn servers_round_robin_over_workers() {
        let config = config(5, 5, 0);
        let topology = Topology::assign(&config, Some(&pool(3))).unwrap();
        let hosts: Vec<&str> = topology
            .servers
            .iter()
            .map(|slot| slot.addr.host.as_str())
            .collect();
        assert_eq!(
            hosts,
            ["10.0.0.1", "10.0.0.2", "10.0.0.3", "10.0.0.1", "10.0.0.2"]
        );
        let placements: Vec<Target> = topology.clients.clone();
        assert_eq!(placements[3], Target::Remote("10.0.0.1".into()));
    }

    #[test]
    fn coordinator_roles_go_to_root() {
        let config = config(1, 1, 2);
        let topology = Topology::assign(&config, Some(&pool(2))).unwrap();
        assert_eq!(topology.directory.host, "10.0.0.100");
        assert_eq!(topology.db.host, "10.0.0.100");
        assert!(topology
            .trustees
            .iter()
            .all(|addr| addr.host == "10.0.0.100"));
        assert_eq!(topology.coordinator, Target::Remote("10.0.0.100".into()));
    }

    #[test]
    fn empty_worker_pool_is_a_placement_error() {
        let config = config(2, 0, 1);
        assert!(matches!(
            Topology::assign(&config, Some(&pool(0))),
            Err(Error::Placement(_))
        ));
    }

    #[test]
    fn missing_root_is_a_placement_error() {
        let config = config(1, 1, 1);
        let pool = InstancePool {
            root: None,
            workers: vec!["10.0.0.1".into()],
        };
        assert!(matches!(
            Topology::assign(&config, Some(&pool)),
            Err(Error::Placement(_))
        ));
    }

    #[test]
    fn no_roles_need_no_workers() {
        let config = config(0, 0, 1);
        let pool = InstancePool {
            root: Some("10.0.0.100".into()),
            workers: Vec::new(),
        };
        assert!(Topology::assign(&config, Some(&pool)).is_ok());
    }
}
