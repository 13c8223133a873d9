//! Filesystem and service-manager side of deployment.
//!
//! Stale generated files are purged by their importance prefix before
//! the new artifacts are written, so removed peers do not leave tunnels
//! behind. System locations live in [`Paths`] and are overridable for
//! tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::info;
use wiremesh_config::{MeshConfig, NodeConfig, SshConfig};
use wiremesh_core::{Node, Topology};

use crate::error::GenError;
use crate::render::{render_netdev, render_network};

/// System locations written by the deployer
#[derive(Debug, Clone)]
pub struct Paths {
    /// Where `.netdev`/`.network` units are written
    pub networkd_dir: PathBuf,
    /// WireGuard private key of the local node
    pub private_key: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Self {
            networkd_dir: PathBuf::from("/etc/systemd/network"),
            private_key: PathBuf::from("/etc/wireguard/privatekey"),
        }
    }
}

fn write_file(path: &Path, contents: &str) -> Result<(), GenError> {
    info!("writing {}", path.display());
    fs::write(path, contents).map_err(|source| GenError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Remove previously generated networkd units.
///
/// Matches the `<importance>-` file name prefix, leaving units of any
/// other importance (or hand-written ones) alone.
pub fn purge_networkd(dir: &Path, importance: u32) -> Result<(), GenError> {
    info!("purging old systemd-networkd config from {}", dir.display());
    let prefix = format!("{importance}-");
    let entries = fs::read_dir(dir).map_err(|source| GenError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    for entry in entries {
        let entry = entry.map_err(|source| GenError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        if entry.file_name().to_string_lossy().starts_with(&prefix) {
            let path = entry.path();
            info!("    removing {}", path.display());
            fs::remove_file(&path).map_err(|source| GenError::Io { path, source })?;
        }
    }
    Ok(())
}

/// Rewrite `authorized_keys` from the configured admin keys plus every
/// node's key, so any mesh member can reach any other over SSH.
pub fn write_ssh_keys(ssh: &SshConfig, nodes: &[NodeConfig]) -> Result<PathBuf, GenError> {
    let dir = ssh.user_home.join(".ssh");
    fs::create_dir_all(&dir).map_err(|source| GenError::Io {
        path: dir.clone(),
        source,
    })?;
    let path = dir.join("authorized_keys");

    let mut contents = String::new();
    for key in &ssh.keys {
        info!("    authorizing user key: {key}");
        contents.push_str(key);
        contents.push('\n');
    }
    for node in nodes {
        info!("    authorizing node key: {}", node.ssh_key);
        contents.push_str(&node.ssh_key);
        contents.push('\n');
    }
    write_file(&path, &contents)?;
    Ok(path)
}

/// Write the `.netdev`/`.network` pair for every declared peer of the
/// local node. Returns the paths written.
pub fn write_networkd(
    dir: &Path,
    mesh: &MeshConfig,
    topology: &Topology,
    local: &Node,
    private_key: &str,
) -> Result<Vec<PathBuf>, GenError> {
    let importance = mesh.systemd.networkd_importance;
    let mut written = Vec::new();

    for peer_id in &local.peers {
        info!("generating config for peer {peer_id}");
        let peer = topology.get(*peer_id).ok_or_else(|| GenError::UnknownPeer {
            node: local.name.clone(),
            peer: *peer_id,
        })?;

        let basename = format!("{importance}-wg{peer_id}");
        let netdev_path = dir.join(format!("{basename}.netdev"));
        write_file(&netdev_path, &render_netdev(local, peer, private_key))?;
        written.push(netdev_path);

        let network_path = dir.join(format!("{basename}.network"));
        write_file(&network_path, &render_network(mesh, local, peer))?;
        written.push(network_path);
    }
    Ok(written)
}

fn run(program: &str, args: &[&str]) -> Result<(), GenError> {
    let command = format!("{program} {}", args.join(" "));
    let status = Command::new(program)
        .args(args)
        .status()
        .map_err(|source| GenError::Spawn {
            command: command.clone(),
            source,
        })?;
    if !status.success() {
        return Err(GenError::CommandFailed { command, status });
    }
    Ok(())
}

/// Pick up the freshly written units: daemon-reload, then restart
/// systemd-networkd.
pub fn reload_services() -> Result<(), GenError> {
    info!("reloading services");
    run("systemctl", &["daemon-reload"])?;
    run("systemctl", &["restart", "systemd-networkd"])
}
