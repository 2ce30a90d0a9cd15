//! Deployment orchestrator for the Atom benchmark topology.
//!
//! Brings up one directory, one db, `t` trustees, `s` servers and `c` clients,
//! either on the local machine or across a pool of AWS hosts, waits for the
//! clients to finish their workload, and (locally) tears everything down.

pub mod config;
pub mod discovery;
pub mod dispatch;
pub mod error;
pub mod sequence;
pub mod topology;

pub use crate::{
    config::{Configuration, RawConfig},
    discovery::InstancePool,
    dispatch::{Dispatch, LaunchHandle, ShellDispatcher},
    error::Error,
    sequence::Sequencer,
    topology::{Address, Target, Topology},
};

pub type Result<T, E = Error> = std::result::Result<T, E>;
