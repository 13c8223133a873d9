//! # Wiremesh Gen
//!
//! Turns converged routing tables into systemd-networkd WireGuard
//! artifacts and deploys them: one `.netdev`/`.network` pair per
//! declared peer of the local node, the shared `authorized_keys` file,
//! a purge of stale generated files, and a service reload.
//!
//! Rendering consumes the simulator's output as-is: `direct` routes are
//! skipped (they correspond to the tunnel interfaces themselves) and
//! `learned` routes become explicit `[Route]` stanzas naming destination
//! and gateway.

pub mod deploy;
pub mod error;
pub mod render;

pub use deploy::{purge_networkd, reload_services, write_networkd, write_ssh_keys, Paths};
pub use error::GenError;
pub use render::{render_netdev, render_network};
