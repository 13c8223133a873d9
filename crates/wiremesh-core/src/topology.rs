//! The full node graph, built once per simulation run.
//!
//! Declared node order is preserved and drives the deterministic visit
//! order of the propagation engine. Peer lookups return found/not-found;
//! an unresolved peer identity is classified by the engine as a
//! configuration error, never an unhandled crash.

use tracing::warn;

use crate::types::{Node, NodeId};

/// An owned mesh topology: node records by declared order
///
/// Read-only for the duration of a run except for the per-node route
/// stores, which are mutated exclusively through [`Node::install`].
#[derive(Debug, Clone)]
pub struct Topology {
    nodes: Vec<Node>,
}

impl Topology {
    /// Build a topology from nodes in declared order.
    ///
    /// Logs a warning for every directed peer link with no reciprocal
    /// declaration. Asymmetric links are accepted as declared; they are
    /// usually a forgotten `peers` entry rather than a deliberate
    /// one-way tunnel.
    pub fn new(nodes: Vec<Node>) -> Self {
        let topology = Self { nodes };
        for node in &topology.nodes {
            for peer_id in &node.peers {
                if let Some(peer) = topology.get(*peer_id)
                    && !peer.peers.contains(&node.id)
                {
                    warn!(
                        "node {} declares peer {} but {} does not peer back",
                        node.name, peer.name, peer.name
                    );
                }
            }
        }
        topology
    }

    /// Number of nodes in the mesh
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the mesh is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes in declared order
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Look up a node by identity
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Position of a node in declared order
    pub fn index_of(&self, id: NodeId) -> Option<usize> {
        self.nodes.iter().position(|n| n.id == id)
    }

    pub(crate) fn node_at(&self, index: usize) -> &Node {
        &self.nodes[index]
    }

    pub(crate) fn node_at_mut(&mut self, index: usize) -> &mut Node {
        &mut self.nodes[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: u64, peers: &[u64]) -> Node {
        Node {
            id: NodeId(id),
            name: format!("node{id}"),
            address: format!("10.0.0.{id}"),
            public_endpoint: format!("198.51.100.{id}"),
            public_key: format!("pub{id}"),
            ssh_key: format!("ssh-ed25519 AAAA{id}"),
            peers: peers.iter().map(|p| NodeId(*p)).collect(),
            routes: vec![],
        }
    }

    #[test]
    fn test_lookup_by_id() {
        let topo = Topology::new(vec![node(1, &[2]), node(2, &[1])]);
        assert_eq!(topo.get(NodeId(2)).unwrap().address, "10.0.0.2");
        assert!(topo.get(NodeId(9)).is_none());
        assert_eq!(topo.index_of(NodeId(1)), Some(0));
    }

    #[test]
    fn test_declared_order_is_kept() {
        let topo = Topology::new(vec![node(3, &[]), node(1, &[]), node(2, &[])]);
        let ids: Vec<u64> = topo.nodes().iter().map(|n| n.id.0).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }
}
