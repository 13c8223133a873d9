//! Core types for the mesh topology and per-node routing tables.
//!
//! Nodes are constructed once from external configuration before a
//! simulation run. A node's peer list is never mutated by the core; its
//! route store is mutated only by [`Node::install`], strictly by appending.

use serde::{Deserialize, Serialize};
use tracing::info;

/// Stable identifier of a mesh node, as declared in configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a routing entry came to be installed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteKind {
    /// Seeded from a declared peer link; the destination is directly attached
    Direct,
    /// Installed by the propagation engine; an intermediate node advertised it
    Learned,
}

impl std::fmt::Display for RouteKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RouteKind::Direct => write!(f, "direct"),
            RouteKind::Learned => write!(f, "learned"),
        }
    }
}

/// A single routing entry in a node's store
///
/// Destinations, gateways and devices are opaque identifiers at this layer;
/// no address format validation is performed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    /// Mesh address being made reachable
    pub destination: String,
    /// Next hop, or `None` for directly attached (no gateway)
    pub gateway: Option<String>,
    /// Egress device, or `None` when the kernel picks it from the gateway
    pub device: Option<String>,
    /// Whether the route was seeded or learned
    pub kind: RouteKind,
}

impl Route {
    /// A route to a directly attached peer, egressing its tunnel device
    pub fn direct(destination: impl Into<String>, device: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            gateway: None,
            device: Some(device.into()),
            kind: RouteKind::Direct,
        }
    }

    /// A route learned from an advertising node, reached via its address
    pub fn learned(destination: impl Into<String>, gateway: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            gateway: Some(gateway.into()),
            device: None,
            kind: RouteKind::Learned,
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.kind, self.destination)?;
        if let Some(gateway) = &self.gateway {
            write!(f, " via {}", gateway)?;
        }
        if let Some(device) = &self.device {
            write!(f, " dev {}", device)?;
        }
        Ok(())
    }
}

/// One member of the mesh
///
/// The endpoint and key fields are carried through untouched for the
/// config renderer; the core only reads `id`, `address` and `peers`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Stable identity
    pub id: NodeId,
    /// Human-readable name (matches the machine hostname)
    pub name: String,
    /// Mesh address, derived from the address template plus `id`
    pub address: String,
    /// Publicly reachable endpoint for the tunnel transport
    pub public_endpoint: String,
    /// WireGuard public key
    pub public_key: String,
    /// SSH public key authorized on every mesh member
    pub ssh_key: String,
    /// Declared peer links, in declared order; directed as declared
    pub peers: Vec<NodeId>,
    /// Route store: append-only, insertion order observable
    pub routes: Vec<Route>,
}

impl Node {
    /// Conditionally install one candidate route into this node's store.
    ///
    /// Returns `true` only when the route was appended. Two rules make
    /// this a silent no-op: the destination equals this node's own
    /// address, or an entry for the destination already exists (first
    /// writer wins; the stored gateway/device/kind are never overwritten).
    ///
    /// `quiet` gates narration only; store contents are identical either way.
    pub fn install(&mut self, route: Route, quiet: bool) -> bool {
        if route.destination == self.address {
            if !quiet {
                info!("        {}: destination is my own address, ignoring", self.address);
            }
            return false;
        }
        if self.routes.iter().any(|r| r.destination == route.destination) {
            if !quiet {
                info!("        {}: I already have a route to {}", self.address, route.destination);
            }
            return false;
        }
        if !quiet {
            info!("        {}: installing {}", self.address, route);
        }
        self.routes.push(route);
        true
    }

    /// Whether this node already holds a route for `destination`
    pub fn has_route_to(&self, destination: &str) -> bool {
        self.routes.iter().any(|r| r.destination == destination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(address: &str) -> Node {
        Node {
            id: NodeId(1),
            name: "alpha".to_string(),
            address: address.to_string(),
            public_endpoint: "198.51.100.1".to_string(),
            public_key: "pub1".to_string(),
            ssh_key: "ssh-ed25519 AAAA1".to_string(),
            peers: vec![],
            routes: vec![],
        }
    }

    #[test]
    fn test_self_route_is_rejected() {
        let mut n = node("10.0.0.1");
        assert!(!n.install(Route::direct("10.0.0.1", "wg2"), true));
        assert!(n.routes.is_empty());
    }

    #[test]
    fn test_first_writer_wins() {
        let mut n = node("10.0.0.1");
        assert!(n.install(Route::direct("10.0.0.2", "wg2"), true));
        assert!(!n.install(Route::learned("10.0.0.2", "10.0.0.3"), true));

        assert_eq!(n.routes.len(), 1);
        assert_eq!(n.routes[0].kind, RouteKind::Direct);
        assert_eq!(n.routes[0].gateway, None);
        assert_eq!(n.routes[0].device.as_deref(), Some("wg2"));
    }

    #[test]
    fn test_insertion_order_is_preserved() {
        let mut n = node("10.0.0.1");
        n.install(Route::direct("10.0.0.3", "wg3"), true);
        n.install(Route::learned("10.0.0.2", "10.0.0.3"), true);

        let destinations: Vec<&str> =
            n.routes.iter().map(|r| r.destination.as_str()).collect();
        assert_eq!(destinations, vec!["10.0.0.3", "10.0.0.2"]);
    }
}
