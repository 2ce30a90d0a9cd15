use std::path::PathBuf;

use anyhow::Result;
use atom_bench::{InstancePool, RawConfig, Sequencer, ShellDispatcher, Topology};
use clap::Parser;

/// Launches the Atom benchmark topology locally or across an AWS pool.
#[derive(Parser)]
#[command(name = "atom-bench")]
struct Cli {
    /// file containing json of all available EC2 instances
    #[arg(long)]
    inst: Option<PathBuf>,
    /// starting port number for directories and servers
    #[arg(long, default_value_t = 8000)]
    port: u16,
    /// number of physical servers
    #[arg(long)]
    servers: Option<usize>,
    /// size of each group
    #[arg(long)]
    gsize: Option<usize>,
    /// number of groups
    #[arg(long)]
    groups: Option<usize>,
    /// number of clients
    #[arg(long)]
    clients: Option<usize>,
    /// number of trustees
    #[arg(long)]
    trustees: Option<usize>,
    /// number of msgs per group
    #[arg(long)]
    msgs: Option<usize>,
    /// size of the message
    #[arg(long)]
    msize: Option<usize>,
    /// type of network
    #[arg(long = "type")]
    net: Option<u32>,
    /// mode of operation
    #[arg(long)]
    mode: Option<u32>,
    /// branching factor for the padding network (default: number of groups)
    #[arg(long)]
    branch: Option<usize>,
    /// directory holding the five role binaries
    #[arg(long, default_value = "bin")]
    bin_dir: PathBuf,
    /// server key file
    #[arg(long, default_value = "keys/server_keys.json")]
    server_keys: PathBuf,
    /// trustee key file
    #[arg(long, default_value = "keys/trustee_keys.json")]
    trustee_keys: PathBuf,
    /// ssh identity used for remote hosts
    #[arg(long, default_value = "~/.ssh/emerald.pem")]
    identity: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    let config = RawConfig {
        inst: cli.inst,
        port: cli.port,
        servers: cli.servers,
        gsize: cli.gsize,
        groups: cli.groups,
        clients: cli.clients,
        trustees: cli.trustees,
        msgs: cli.msgs,
        msize: cli.msize,
        net: cli.net,
        mode: cli.mode,
        branch: cli.branch,
        bin_dir: cli.bin_dir,
        server_keys: cli.server_keys,
        trustee_keys: cli.trustee_keys,
    }
    .resolve()?;

    let pool = match &config.instances {
        Some(path) => Some(InstancePool::load(path)?),
        None => None,
    };
    let topology = Topology::assign(&config, pool.as_ref())?;
    let dispatcher = ShellDispatcher {
        identity_file: cli.identity,
    };
    Sequencer::new(&config, &topology, dispatcher).run().await;
    Ok(())
}
