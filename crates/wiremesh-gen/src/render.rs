//! Template rendering for systemd-networkd artifacts.
//!
//! Templates are embedded at compile time and use `{placeholder}`
//! substitution. One `.netdev`/`.network` pair describes the tunnel to
//! one declared peer; every `.network` body carries the local node's
//! full set of learned routes plus any docker subnet routes.

use wiremesh_config::MeshConfig;
use wiremesh_core::{Node, RouteKind};

const NETDEV_TEMPLATE: &str = include_str!("../templates/systemd.netdev");
const NETWORK_TEMPLATE: &str = include_str!("../templates/systemd.network");
const ROUTE_TEMPLATE: &str = include_str!("../templates/systemd.network-route");

fn fill(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (key, value) in vars {
        out = out.replace(&format!("{{{key}}}"), value);
    }
    out
}

/// The `.netdev` unit defining the WireGuard tunnel from `local` to `peer`
pub fn render_netdev(local: &Node, peer: &Node, private_key: &str) -> String {
    fill(
        NETDEV_TEMPLATE,
        &[
            ("peer_id", &peer.id.to_string()),
            ("node_id", &local.id.to_string()),
            ("peer_pubkey", &peer.public_key),
            ("peer_public_ip", &peer.public_endpoint),
            ("node_privkey", private_key),
        ],
    )
}

/// The `.network` unit for the tunnel device, with route stanzas.
///
/// Direct routes are omitted: the host route to the peer is already part
/// of the base unit. Learned routes become `[Route]` stanzas via their
/// advertising gateway, followed by docker subnet routes for every
/// container host other than the local node.
pub fn render_network(mesh: &MeshConfig, local: &Node, peer: &Node) -> String {
    let mut out = fill(
        NETWORK_TEMPLATE,
        &[
            ("peer_id", &peer.id.to_string()),
            ("node_id", &local.id.to_string()),
            ("peer_private_ip", &peer.address),
            ("node_private_ip", &local.address),
        ],
    );

    for route in &local.routes {
        if route.kind == RouteKind::Direct {
            continue;
        }
        if let Some(gateway) = &route.gateway {
            let stanza = fill(
                ROUTE_TEMPLATE,
                &[
                    ("network", &format!("{}/32", route.destination)),
                    ("gateway", gateway),
                ],
            );
            out.push('\n');
            out.push_str(&stanza);
        }
    }

    if let Some(docker) = &mesh.docker {
        for host in &docker.hosts {
            if *host == local.id {
                continue;
            }
            let gateway = mesh.address_for(*host);
            for i in 0..10 {
                let stanza = fill(
                    ROUTE_TEMPLATE,
                    &[("network", &docker.subnet(*host, i)), ("gateway", &gateway)],
                );
                out.push('\n');
                out.push_str(&stanza);
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremesh_core::{NodeId, Route};

    fn node(id: u64) -> Node {
        Node {
            id: NodeId(id),
            name: format!("node{id}"),
            address: format!("10.0.0.{id}"),
            public_endpoint: format!("198.51.100.{id}"),
            public_key: format!("pub{id}"),
            ssh_key: format!("ssh-ed25519 AAAA{id}"),
            peers: vec![],
            routes: vec![],
        }
    }

    fn mesh(docker: bool) -> MeshConfig {
        let docker_table = if docker {
            "[docker]\naddress = \"172.{id}.{i}.0/24\"\nhost = [2]\n"
        } else {
            ""
        };
        let raw = format!(
            r#"
address = "10.0.0.{{id}}"
{docker_table}
[systemd]
networkd-importance = 50

[ssh]
user-home = "/root"
key = []

[[node]]
id = 1
name = "node1"
public-ip = "198.51.100.1"
wg-pubkey = "pub1"
ssh-key = "k1"
peers = [2]

[[node]]
id = 2
name = "node2"
public-ip = "198.51.100.2"
wg-pubkey = "pub2"
ssh-key = "k2"
peers = [1]
"#
        );
        toml::from_str(&raw).unwrap()
    }

    #[test]
    fn test_netdev_substitution() {
        let rendered = render_netdev(&node(1), &node(2), "PRIVKEY");
        assert!(rendered.contains("Name=wg2"));
        assert!(rendered.contains("PrivateKey=PRIVKEY"));
        assert!(rendered.contains("PublicKey=pub2"));
        assert!(rendered.contains("Endpoint=198.51.100.2:51820"));
        assert!(!rendered.contains('{'), "unsubstituted placeholder:\n{rendered}");
    }

    #[test]
    fn test_network_emits_learned_routes_only() {
        let mut local = node(1);
        local.routes.push(Route::direct("10.0.0.2", "wg2"));
        local.routes.push(Route::learned("10.0.0.3", "10.0.0.2"));

        let rendered = render_network(&mesh(false), &local, &node(2));
        assert!(rendered.contains("Address=10.0.0.1/32"));
        assert!(rendered.contains("Destination=10.0.0.2/32")); // host route from base unit
        assert!(rendered.contains("Destination=10.0.0.3/32\nGateway=10.0.0.2"));
        // The direct route must not get its own stanza.
        assert_eq!(rendered.matches("Gateway=").count(), 1);
    }

    #[test]
    fn test_network_appends_docker_routes() {
        let rendered = render_network(&mesh(true), &node(1), &node(2));
        assert!(rendered.contains("Destination=172.2.0.0/24\nGateway=10.0.0.2"));
        assert!(rendered.contains("Destination=172.2.9.0/24"));
        assert_eq!(rendered.matches("Gateway=10.0.0.2").count(), 10);
    }

    #[test]
    fn test_docker_routes_skip_the_local_host() {
        let mut m = mesh(true);
        m.docker.as_mut().unwrap().hosts = vec![NodeId(1)];
        let rendered = render_network(&m, &node(1), &node(2));
        assert!(!rendered.contains("172."));
    }
}
