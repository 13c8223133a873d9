//! TOML schema for the mesh description.
//!
//! Key names are kebab-case to match the on-disk format:
//!
//! ```toml
//! address = "10.0.0.{id}"
//!
//! [systemd]
//! networkd-importance = 50
//!
//! [ssh]
//! user-home = "/root"
//! key = ["ssh-ed25519 AAAA... admin"]
//!
//! [docker]
//! address = "172.{id}.{i}.0/24"
//! host = [1, 2]
//!
//! [[node]]
//! id = 1
//! name = "alpha"
//! public-ip = "198.51.100.1"
//! wg-pubkey = "..."
//! ssh-key = "ssh-ed25519 AAAA... root@alpha"
//! peers = [2]
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::info;
use wiremesh_core::{Node, NodeId, Topology};

use crate::error::ConfigError;

/// Substitute the node identity into an address template
///
/// Templates use `{id}` as the placeholder; node addresses are derived
/// as template plus identity and are otherwise opaque to the simulator.
pub fn render_address(template: &str, id: NodeId) -> String {
    template.replace("{id}", &id.to_string())
}

/// Short host name of the local machine (text before the first `.`)
pub fn machine_name() -> Result<String, ConfigError> {
    let path = Path::new("/proc/sys/kernel/hostname");
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(raw.trim().split('.').next().unwrap_or("").to_string())
}

/// Read trimmed private key material from disk
pub fn read_private_key(path: &Path) -> Result<String, ConfigError> {
    info!("reading private key from {}", path.display());
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let key = raw.trim().to_string();
    if key.is_empty() {
        return Err(ConfigError::EmptyKey { path: path.to_path_buf() });
    }
    Ok(key)
}

/// The whole mesh description
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MeshConfig {
    /// Mesh address template, `{id}` substituted per node
    pub address: String,
    pub systemd: SystemdConfig,
    pub ssh: SshConfig,
    /// Optional docker subnet routing for container hosts
    #[serde(default)]
    pub docker: Option<DockerConfig>,
    /// Declared node order is preserved; it drives the simulator's
    /// deterministic visit order.
    #[serde(rename = "node")]
    pub nodes: Vec<NodeConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SystemdConfig {
    /// Numeric prefix of generated networkd file names; also the purge key
    pub networkd_importance: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SshConfig {
    /// Home directory whose `.ssh/authorized_keys` is rewritten
    pub user_home: PathBuf,
    /// Additional (non-node) keys to authorize
    #[serde(rename = "key")]
    pub keys: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DockerConfig {
    /// Subnet template with `{id}` (host) and `{i}` (network index)
    pub address: String,
    /// Node ids that run container workloads
    #[serde(rename = "host")]
    pub hosts: Vec<NodeId>,
}

impl DockerConfig {
    /// Subnet `i` hosted by node `id`
    pub fn subnet(&self, id: NodeId, i: u32) -> String {
        self.address
            .replace("{id}", &id.to_string())
            .replace("{i}", &i.to_string())
    }
}

/// One declared node
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NodeConfig {
    pub id: NodeId,
    pub name: String,
    pub public_ip: String,
    pub wg_pubkey: String,
    pub ssh_key: String,
    pub peers: Vec<NodeId>,
}

impl MeshConfig {
    /// Load and parse the mesh description from disk
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&raw)?)
    }

    /// Mesh address of a node, derived from the template
    pub fn address_for(&self, id: NodeId) -> String {
        render_address(&self.address, id)
    }

    /// Build a fresh topology with empty route stores.
    ///
    /// Called once per simulation run: stores must never be reused
    /// across runs, or the dedup rule would suppress the second run's
    /// first insertions.
    pub fn topology(&self) -> Topology {
        let nodes = self
            .nodes
            .iter()
            .map(|n| Node {
                id: n.id,
                name: n.name.clone(),
                address: self.address_for(n.id),
                public_endpoint: n.public_ip.clone(),
                public_key: n.wg_pubkey.clone(),
                ssh_key: n.ssh_key.clone(),
                peers: n.peers.clone(),
                routes: vec![],
            })
            .collect();
        Topology::new(nodes)
    }

    /// The node this machine runs as, selected by name
    pub fn local_node(&self, name: &str) -> Result<&NodeConfig, ConfigError> {
        self.nodes
            .iter()
            .find(|n| n.name == name)
            .ok_or_else(|| ConfigError::NodeNotFound(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
address = "10.0.0.{id}"

[systemd]
networkd-importance = 50

[ssh]
user-home = "/root"
key = ["ssh-ed25519 AAAAadmin admin"]

[docker]
address = "172.{id}.{i}.0/24"
host = [2]

[[node]]
id = 1
name = "alpha"
public-ip = "198.51.100.1"
wg-pubkey = "pub1"
ssh-key = "ssh-ed25519 AAAA1 root@alpha"
peers = [2]

[[node]]
id = 2
name = "beta"
public-ip = "198.51.100.2"
wg-pubkey = "pub2"
ssh-key = "ssh-ed25519 AAAA2 root@beta"
peers = [1]
"#;

    #[test]
    fn test_parse_sample() {
        let config: MeshConfig = toml::from_str(SAMPLE).unwrap();
        assert_eq!(config.systemd.networkd_importance, 50);
        assert_eq!(config.ssh.keys.len(), 1);
        assert_eq!(config.nodes.len(), 2);
        assert_eq!(config.nodes[0].peers, vec![NodeId(2)]);
        assert_eq!(config.docker.as_ref().unwrap().hosts, vec![NodeId(2)]);
    }

    #[test]
    fn test_addresses_are_derived_from_template() {
        let config: MeshConfig = toml::from_str(SAMPLE).unwrap();
        assert_eq!(config.address_for(NodeId(1)), "10.0.0.1");

        let topo = config.topology();
        assert_eq!(topo.get(NodeId(2)).unwrap().address, "10.0.0.2");
        assert!(topo.nodes().iter().all(|n| n.routes.is_empty()));
    }

    #[test]
    fn test_docker_subnet_substitution() {
        let config: MeshConfig = toml::from_str(SAMPLE).unwrap();
        let docker = config.docker.unwrap();
        assert_eq!(docker.subnet(NodeId(2), 3), "172.2.3.0/24");
    }

    #[test]
    fn test_local_node_selection() {
        let config: MeshConfig = toml::from_str(SAMPLE).unwrap();
        assert_eq!(config.local_node("beta").unwrap().id, NodeId(2));
        assert!(matches!(
            config.local_node("gamma"),
            Err(ConfigError::NodeNotFound(name)) if name == "gamma"
        ));
    }

    #[test]
    fn test_read_private_key_trims() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "SECRETKEY=  ").unwrap();
        let key = read_private_key(file.path()).unwrap();
        assert_eq!(key, "SECRETKEY=");
    }

    #[test]
    fn test_empty_private_key_is_an_error() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(matches!(
            read_private_key(file.path()),
            Err(ConfigError::EmptyKey { .. })
        ));
    }
}
