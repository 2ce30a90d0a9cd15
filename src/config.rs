use std::path::PathBuf;

use crate::error::Error;

/// Unvalidated invocation parameters.
///
/// The mandatory counts have no default, so they stay `Option` until
/// [`RawConfig::resolve`] checks them. Only port, key files and the bin
/// directory carry defaults.
#[derive(Debug, Clone)]
pub struct RawConfig {
    /// File containing json of all available EC2 instances. Empty or absent
    /// means a purely local run.
    pub inst: Option<PathBuf>,
    /// Starting port number for directory, db, trustees and servers.
    pub port: u16,
    pub servers: Option<usize>,
    pub gsize: Option<usize>,
    pub groups: Option<usize>,
    pub clients: Option<usize>,
    pub trustees: Option<usize>,
    pub msgs: Option<usize>,
    pub msize: Option<usize>,
    pub net: Option<u32>,
    pub mode: Option<u32>,
    /// Branching factor for the padding network; falls back to the group
    /// count when absent.
    pub branch: Option<usize>,
    /// Directory holding the five role binaries.
    pub bin_dir: PathBuf,
    pub server_keys: PathBuf,
    pub trustee_keys: PathBuf,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            inst: None,
            port: 8000,
            servers: None,
            gsize: None,
            groups: None,
            clients: None,
            trustees: None,
            msgs: None,
            msize: None,
            net: None,
            mode: None,
            branch: None,
            bin_dir: "bin".into(),
            server_keys: "keys/server_keys.json".into(),
            trustee_keys: "keys/trustee_keys.json".into(),
        }
    }
}

impl RawConfig {
    /// Validate into an immutable [`Configuration`], naming the first missing
    /// mandatory parameter. No side effects beyond validation.
    pub fn resolve(self) -> crate::Result<Configuration> {
        fn require<T>(value: Option<T>, name: &'static str) -> crate::Result<T> {
            value.ok_or(Error::Configuration(name))
        }
        let groups = require(self.groups, "groups")?;
        Ok(Configuration {
            base_port: self.port,
            servers: require(self.servers, "servers")?,
            group_size: require(self.gsize, "gsize")?,
            groups,
            clients: require(self.clients, "clients")?,
            trustees: require(self.trustees, "trustees")?,
            msgs_per_group: require(self.msgs, "msgs")?,
            msg_size: require(self.msize, "msize")?,
            net_type: require(self.net, "type")?,
            mode: require(self.mode, "mode")?,
            branch: self.branch.unwrap_or(groups),
            instances: self.inst.filter(|path| !path.as_os_str().is_empty()),
            bin_dir: self.bin_dir,
            server_keys: self.server_keys,
            trustee_keys: self.trustee_keys,
        })
    }
}

/// Resolved run configuration. Constructed once at startup, read-only after.
#[derive(Debug, Clone)]
pub struct Configuration {
    pub base_port: u16,
    pub servers: usize,
    pub group_size: usize,
    pub groups: usize,
    pub clients: usize,
    pub trustees: usize,
    pub msgs_per_group: usize,
    pub msg_size: usize,
    pub net_type: u32,
    pub mode: u32,
    pub branch: usize,
    pub instances: Option<PathBuf>,
    pub bin_dir: PathBuf,
    pub server_keys: PathBuf,
    pub trustee_keys: PathBuf,
}

impl Configuration {
    /// True when no instance-description file was given, so every role runs
    /// on this machine and teardown is allowed.
    pub fn is_local(&self) -> bool {
        self.instances.is_none()
    }
}
