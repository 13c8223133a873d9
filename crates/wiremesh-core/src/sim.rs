//! Route-convergence simulator.
//!
//! Runs a distance-vector-style flooding protocol over a static topology
//! snapshot: seed direct routes from declared peer links, then repeat
//! advertisement rounds until every node holds a route to every other
//! node's address.
//!
//! Rounds iterate live stores, not per-round snapshots: a route installed
//! into some node earlier within a round is re-advertised further by
//! later-visited nodes in the same round. Round counts therefore depend
//! on declaration order; the converged state does not, because the loop
//! only terminates once every node already has every destination.

use tracing::info;

use crate::error::{SimError, UnreachablePair};
use crate::topology::Topology;
use crate::types::{Node, NodeId, Route};

/// True iff `node` holds a route to every other node's address
pub fn node_converged(node: &Node, topology: &Topology) -> bool {
    topology
        .nodes()
        .iter()
        .all(|m| m.address == node.address || node.has_route_to(&m.address))
}

/// True iff every node in the topology is converged
pub fn system_converged(topology: &Topology) -> bool {
    topology.nodes().iter().all(|n| node_converged(n, topology))
}

/// Tuning knobs for one simulation run
#[derive(Debug, Clone, Default)]
pub struct SimConfig {
    /// Suppress per-insertion and per-round narration. Never changes
    /// which routes end up installed or how many rounds are taken.
    pub quiet: bool,
    /// Advertisement round cap; `None` derives it from the node count.
    /// A route crosses at least one peer link per round, so any
    /// connected mesh converges within that bound.
    pub max_rounds: Option<u32>,
}

/// Successful simulation outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Convergence {
    /// Advertisement rounds taken after seeding (0 when already converged)
    pub rounds: u32,
}

/// The propagation engine: owns the topology for the duration of a run
///
/// Build a fresh topology for every run. Reusing mutated stores would
/// make the dedup rule suppress legitimate first insertions.
#[derive(Debug)]
pub struct Simulation {
    topology: Topology,
    config: SimConfig,
}

impl Simulation {
    pub fn new(topology: Topology, config: SimConfig) -> Self {
        Self { topology, config }
    }

    /// The topology in its current state
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Consume the engine and hand the final stores to the renderer
    pub fn into_topology(self) -> Topology {
        self.topology
    }

    /// Seed direct routes, then run advertisement rounds to the fixed point.
    ///
    /// Fails when a declared peer cannot be resolved, or when the round
    /// cap is reached with reachability still missing (disconnected mesh).
    pub fn run(&mut self) -> Result<Convergence, SimError> {
        self.seed()?;

        let cap = self
            .config
            .max_rounds
            .unwrap_or_else(|| self.topology.len().max(1) as u32);

        if !self.config.quiet {
            info!("starting routing protocol simulation");
        }
        let mut rounds = 0;
        while !system_converged(&self.topology) {
            if rounds >= cap {
                return Err(SimError::NotConverged {
                    rounds,
                    unreachable: self.unreachable(),
                });
            }
            rounds += 1;
            if !self.config.quiet {
                info!("    round {rounds}");
            }
            self.advertise_round()?;
            if !self.config.quiet {
                info!("        system converged: {}", system_converged(&self.topology));
            }
        }

        Ok(Convergence { rounds })
    }

    /// Phase A: a tunnel interface to a directly connected peer is a host
    /// route to that peer's address with no intermediate hop.
    fn seed(&mut self) -> Result<(), SimError> {
        for node_idx in 0..self.topology.len() {
            let peers = self.topology.node_at(node_idx).peers.clone();
            for peer_id in peers {
                let peer_idx = self.resolve(node_idx, peer_id)?;
                let (peer_address, device) = {
                    let peer = self.topology.node_at(peer_idx);
                    (peer.address.clone(), format!("wg{}", peer.id))
                };
                let quiet = self.config.quiet;
                self.topology
                    .node_at_mut(node_idx)
                    .install(Route::direct(peer_address, device), quiet);
            }
        }
        Ok(())
    }

    /// Phase B, one round: every node advertises, to each declared peer,
    /// the routes present in its store at the moment it is visited.
    /// Installs land on the peer's store, so the visited node's own store
    /// never changes under the iteration.
    fn advertise_round(&mut self) -> Result<(), SimError> {
        for node_idx in 0..self.topology.len() {
            let peers = self.topology.node_at(node_idx).peers.clone();
            for peer_id in peers {
                let peer_idx = self.resolve(node_idx, peer_id)?;
                if peer_idx == node_idx {
                    // Self-peering: every install would hit the self-route
                    // or dedup rule, so there is nothing to do.
                    continue;
                }
                let (gateway, advertised) = {
                    let node = self.topology.node_at(node_idx);
                    let destinations: Vec<String> = node
                        .routes
                        .iter()
                        .map(|r| r.destination.clone())
                        .collect();
                    (node.address.clone(), destinations)
                };
                let peer_address = self.topology.node_at(peer_idx).address.clone();
                let quiet = self.config.quiet;
                for destination in advertised {
                    if !quiet {
                        info!("        {gateway} -> {peer_address}: I have a route to {destination}");
                    }
                    self.topology
                        .node_at_mut(peer_idx)
                        .install(Route::learned(destination, gateway.clone()), quiet);
                }
            }
        }
        Ok(())
    }

    fn resolve(&self, node_idx: usize, peer_id: NodeId) -> Result<usize, SimError> {
        self.topology
            .index_of(peer_id)
            .ok_or_else(|| SimError::UnresolvedPeer {
                node: self.topology.node_at(node_idx).name.clone(),
                peer: peer_id,
            })
    }

    /// Every missing (node, destination) fact, in declared order
    fn unreachable(&self) -> Vec<UnreachablePair> {
        let mut pairs = Vec::new();
        for node in self.topology.nodes() {
            for m in self.topology.nodes() {
                if m.address != node.address && !node.has_route_to(&m.address) {
                    pairs.push(UnreachablePair {
                        node: node.name.clone(),
                        destination: m.address.clone(),
                    });
                }
            }
        }
        pairs
    }
}
