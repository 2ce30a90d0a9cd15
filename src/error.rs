use std::io;

use thiserror::Error;

/// Fatal orchestration errors. Every variant aborts the run before any role
/// process has been dispatched; there is no partial-topology recovery.
///
/// Launch failures of already-dispatched processes are deliberately absent
/// here: a role binary that fails to start or crashes right away is logged
/// and never escalated.
#[derive(Debug, Error)]
pub enum Error {
    /// A mandatory invocation parameter was not supplied.
    #[error("missing required parameter --{0}")]
    Configuration(&'static str),
    /// The instance-description document is not parseable as a container of
    /// reservations. Malformed individual instance records do not trigger
    /// this; they are skipped.
    #[error("instance description not parseable: {0}")]
    Discovery(String),
    /// Remote placement was requested against an unusable host pool.
    #[error("{0}")]
    Placement(String),
    #[error("reading instance description: {0}")]
    Io(#[from] io::Error),
}
