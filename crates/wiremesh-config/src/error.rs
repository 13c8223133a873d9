//! Configuration error types

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or interpreting the mesh configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid mesh configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("no node named \"{0}\" in configuration")]
    NodeNotFound(String),

    #[error("private key file {path} is empty")]
    EmptyKey { path: PathBuf },
}
