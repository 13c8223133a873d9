//! Generator error types

use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;
use wiremesh_core::NodeId;

/// Errors raised while rendering or deploying artifacts
#[derive(Debug, Error)]
pub enum GenError {
    #[error("filesystem error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("node {node} declares unknown peer {peer}")]
    UnknownPeer { node: String, peer: NodeId },

    #[error("failed to run {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} exited with {status}")]
    CommandFailed { command: String, status: ExitStatus },
}
