use std::{path::PathBuf, process::Stdio};

use tokio::{process::Command, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::topology::Target;

/// One dispatched role process.
///
/// Dropping the handle detaches the unit: the process keeps running and is
/// never waited on. [`LaunchHandle::stop`] requests best-effort termination of
/// the unit this run created (and only that unit).
#[derive(Debug)]
pub struct LaunchHandle {
    task: JoinHandle<()>,
    stop: CancellationToken,
}

impl LaunchHandle {
    pub fn new(task: JoinHandle<()>, stop: CancellationToken) -> Self {
        Self { task, stop }
    }

    pub fn stop(&self) {
        self.stop.cancel()
    }

    /// Wait for the unit to finish (process exit or post-stop reap).
    pub async fn join(self) {
        if let Err(err) = self.task.await {
            warn!(%err, "launch unit panicked")
        }
    }
}

/// Submits a command line for execution against a target. Submission returns
/// immediately; the unit itself blocks for the lifetime of the process.
///
/// No output capture, no exit-code contract: a process that fails to start or
/// dies right away is logged and never escalated.
pub trait Dispatch {
    fn dispatch(&self, target: &Target, command: String) -> LaunchHandle;
}

/// Runs commands as local shell children, or over ssh with a fixed
/// pre-provisioned identity and host-key confirmation disabled.
#[derive(Debug, Clone)]
pub struct ShellDispatcher {
    pub identity_file: PathBuf,
}

impl Dispatch for ShellDispatcher {
    fn dispatch(&self, target: &Target, command: String) -> LaunchHandle {
        let mut cmd = match target {
            Target::Local => {
                let mut cmd = Command::new("sh");
                cmd.arg("-c").arg(&command);
                cmd
            }
            Target::Remote(host) => {
                let mut cmd = Command::new("ssh");
                cmd.arg("-o")
                    .arg("StrictHostKeyChecking=no")
                    .arg("-i")
                    .arg(&self.identity_file)
                    .arg(host)
                    .arg(&command);
                cmd
            }
        };
        cmd.stdin(Stdio::null());
        let stop = CancellationToken::new();
        let task = tokio::spawn(run_unit(cmd, command, stop.clone()));
        LaunchHandle::new(task, stop)
    }
}

async fn run_unit(mut cmd: Command, command: String, stop: CancellationToken) {
    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(err) => {
            warn!(%err, %command, "failed to launch");
            return;
        }
    };
    let stopped = tokio::select! {
        status = child.wait() => {
            match status {
                Ok(status) => debug!(%status, %command, "unit exited"),
                Err(err) => warn!(%err, %command, "wait failed"),
            }
            false
        }
        _ = stop.cancelled() => true,
    };
    if stopped {
        let _ = child.start_kill();
        let _ = child.wait().await;
    }
}
