//! Error types for the route-convergence simulator

use thiserror::Error;

use crate::types::NodeId;

/// One missing reachability fact in a non-converged system
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnreachablePair {
    /// Name of the node missing a route
    pub node: String,
    /// Mesh address it cannot reach
    pub destination: String,
}

impl std::fmt::Display for UnreachablePair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} has no route to {}", self.node, self.destination)
    }
}

/// Errors raised by the propagation engine
///
/// Self-route and duplicate-route installs are defined as silent no-ops
/// and never surface here.
#[derive(Debug, Error)]
pub enum SimError {
    /// A declared peer identity does not correspond to any node.
    /// Fatal for the run; simulating with partial adjacency would
    /// produce a table that silently omits reachability.
    #[error("node {node} declares unknown peer {peer}")]
    UnresolvedPeer { node: String, peer: NodeId },

    /// The round cap was reached before every node could reach every
    /// other node: the declared peer graph is disconnected (accounting
    /// for the direction of advertisement).
    #[error("no convergence after {rounds} rounds; unreachable: {}", format_pairs(.unreachable))]
    NotConverged {
        rounds: u32,
        unreachable: Vec<UnreachablePair>,
    },
}

fn format_pairs(pairs: &[UnreachablePair]) -> String {
    pairs
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
