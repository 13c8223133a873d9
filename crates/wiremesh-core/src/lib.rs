//! # Wiremesh Core
//!
//! Topology model and route-convergence simulator for a mesh of nodes
//! connected by point-to-point WireGuard links.
//!
//! Given a static topology (nodes and their declared peer links), the
//! simulator computes every node's routing table by seeding direct routes
//! from peer adjacency and then flooding reachability information in
//! rounds until the whole system reaches a fixed point.
//!
//! ## Key Types
//!
//! - [`Topology`]: the full node graph, built once per run
//! - [`Node`]: one mesh member, exclusively owning its route store
//! - [`Route`] / [`RouteKind`]: a single routing entry, `direct` or `learned`
//! - [`Simulation`] / [`SimConfig`]: the propagation engine
//! - [`Convergence`] / [`SimError`]: typed outcome of a run

pub mod error;
pub mod sim;
pub mod topology;
pub mod types;

pub use error::{SimError, UnreachablePair};
pub use sim::{node_converged, system_converged, Convergence, SimConfig, Simulation};
pub use topology::Topology;
pub use types::{Node, NodeId, Route, RouteKind};
