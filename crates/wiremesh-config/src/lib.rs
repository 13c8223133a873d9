//! # Wiremesh Config
//!
//! Loads the mesh description from a TOML file and turns it into the
//! owned [`Topology`](wiremesh_core::Topology) the simulator runs on.
//!
//! The file declares the address template, the node list with peer
//! links and key material references, and the deployment knobs used by
//! the generator (systemd file importance, SSH keys, docker subnets).

pub mod error;
pub mod schema;

pub use error::ConfigError;
pub use schema::{
    machine_name, read_private_key, render_address, DockerConfig, MeshConfig, NodeConfig,
    SshConfig, SystemdConfig,
};
