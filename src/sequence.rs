use std::time::Duration;

use tokio::time::sleep;
use tracing::info;

use crate::{
    config::Configuration,
    dispatch::{Dispatch, LaunchHandle},
    topology::Topology,
};

// Fixed settling intervals between phases. These approximate "service is
// listening", they are not readiness checks; a slow host can still violate
// the ordering assumption.
const DIRECTORY_SETTLE: Duration = Duration::from_secs(1);
const TRUSTEE_SETTLE: Duration = Duration::from_secs(1);
const SERVER_SETTLE: Duration = Duration::from_millis(500);

/// Drives the phased launch: directory, db, trustees, servers, clients.
/// Blocks only on the client units, then (local runs only) terminates every
/// unit this run created. Remote units are left running for inspection.
pub struct Sequencer<'a, D> {
    config: &'a Configuration,
    topology: &'a Topology,
    dispatcher: D,
}

impl<'a, D: Dispatch> Sequencer<'a, D> {
    pub fn new(config: &'a Configuration, topology: &'a Topology, dispatcher: D) -> Self {
        Self {
            config,
            topology,
            dispatcher,
        }
    }

    /// Run the whole sequence to completion. Phase N+1 commands are never
    /// submitted before all of phase N's have been; within a phase, the
    /// launched units run concurrently.
    pub async fn run(self) {
        let mut units = Vec::new();

        info!("starting directory");
        units.push(
            self.dispatcher
                .dispatch(&self.topology.coordinator, self.directory_command()),
        );
        sleep(DIRECTORY_SETTLE).await;

        info!("starting db");
        units.push(
            self.dispatcher
                .dispatch(&self.topology.coordinator, self.db_command()),
        );

        info!(count = self.topology.trustees.len(), "starting trustees");
        for id in 0..self.topology.trustees.len() {
            units.push(
                self.dispatcher
                    .dispatch(&self.topology.coordinator, self.trustee_command(id)),
            );
        }
        sleep(TRUSTEE_SETTLE).await;

        info!(count = self.topology.servers.len(), "starting servers");
        for (id, slot) in self.topology.servers.iter().enumerate() {
            units.push(self.dispatcher.dispatch(&slot.target, self.server_command(id)));
        }
        sleep(SERVER_SETTLE).await;

        info!(count = self.topology.clients.len(), "starting clients");
        let mut clients = Vec::new();
        for (id, target) in self.topology.clients.iter().enumerate() {
            clients.push(self.dispatcher.dispatch(target, self.client_command(id)));
        }

        // the only join tied to process completion; directory/db/trustee/
        // server units are never waited on
        info!("waiting for completion");
        for client in clients {
            client.join().await;
        }

        if self.config.is_local() {
            info!("terminating local units");
            for unit in &units {
                unit.stop();
            }
            for unit in units {
                unit.join().await;
            }
        }
    }

    fn binary(&self, role: &str) -> String {
        self.config.bin_dir.join(role).display().to_string()
    }

    fn directory_command(&self) -> String {
        format!(
            "{} --dirAddr {} --perGroup {} --numServers {} --numClients {} --numGroups {} \
             --numTrustees {} --numMsgs {} --msgSize {} --mode {} --net {} --branch {}",
            self.binary("directory"),
            self.topology.directory,
            self.config.group_size,
            self.config.servers,
            self.config.clients,
            self.config.groups,
            self.config.trustees,
            self.config.msgs_per_group,
            self.config.msg_size,
            self.config.mode,
            self.config.net_type,
            self.config.branch,
        )
    }

    fn db_command(&self) -> String {
        format!("{} --dbAddr {}", self.binary("db"), self.topology.db)
    }

    fn trustee_command(&self, id: usize) -> String {
        format!(
            "{} --keyFile {} --dirAddr {} --addr {} --id {}",
            self.binary("trustee"),
            self.config.trustee_keys.display(),
            self.topology.directory,
            self.topology.trustees[id],
            id,
        )
    }

    fn server_command(&self, id: usize) -> String {
        format!(
            "{} --keyFile {} --dirAddr {} --dbAddr {} --addr {} --id {}",
            self.binary("server"),
            self.config.server_keys.display(),
            self.topology.directory,
            self.topology.db,
            self.topology.servers[id].addr,
            id,
        )
    }

    fn client_command(&self, id: usize) -> String {
        format!(
            "{} --dirAddr {} --dbAddr {} --id {}",
            self.binary("client"),
            self.topology.directory,
            self.topology.db,
            id,
        )
    }
}
