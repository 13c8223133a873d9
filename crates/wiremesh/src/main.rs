//! WireGuard mesh provisioner.
//!
//! `plan` simulates route convergence verbosely and prints the resulting
//! per-node routing tables without touching the filesystem. `apply` runs
//! the same simulation quietly, refuses to proceed unless the mesh
//! converged, and then writes SSH keys and systemd-networkd units for
//! the local node before reloading services.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use wiremesh_config::{machine_name, read_private_key, MeshConfig};
use wiremesh_core::{NodeId, SimConfig, Simulation, Topology};
use wiremesh_gen::{purge_networkd, reload_services, write_networkd, write_ssh_keys, Paths};

#[derive(Parser)]
#[command(
    name = "wiremesh",
    about = "WireGuard mesh provisioner with route-convergence planning",
    version
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the mesh configuration
    #[arg(short, long, global = true, default_value = "config.toml")]
    config: PathBuf,

    /// Act as this node instead of the machine hostname
    #[arg(short, long, global = true)]
    node: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate route convergence and print the per-node routing tables
    Plan,

    /// Generate and deploy configuration for the local node
    Apply,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let mesh = MeshConfig::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;

    match cli.command {
        Commands::Plan => plan(&mesh, cli.node.as_deref()),
        Commands::Apply => apply(&mesh, cli.node.as_deref()),
    }
}

fn local_name(explicit: Option<&str>) -> anyhow::Result<String> {
    match explicit {
        Some(name) => Ok(name.to_string()),
        None => machine_name().context("determining local node name"),
    }
}

fn converge(mesh: &MeshConfig, quiet: bool) -> anyhow::Result<Topology> {
    // Always a fresh topology: mutated route stores must never carry
    // over into a second run.
    let mut sim = Simulation::new(mesh.topology(), SimConfig { quiet, ..Default::default() });
    sim.run().context("mesh did not reach full reachability")?;
    Ok(sim.into_topology())
}

fn plan(mesh: &MeshConfig, node: Option<&str>) -> anyhow::Result<()> {
    let topology = converge(mesh, false)?;

    if let Ok(name) = local_name(node)
        && let Ok(local) = mesh.local_node(&name)
    {
        println!("Node \"{}\" information:", local.name);
        println!("    id: {}", local.id);
        println!("    address: {}", mesh.address_for(local.id));
        println!("    public-ip: {}", local.public_ip);
        let peers: Vec<String> = local.peers.iter().map(NodeId::to_string).collect();
        println!("    peers: [{}]", peers.join(", "));
    }

    println!("Routing table:");
    for node in topology.nodes() {
        println!("    Node {} ({})", node.address, node.name);
        for route in &node.routes {
            println!("        {route}");
        }
    }
    Ok(())
}

fn apply(mesh: &MeshConfig, node: Option<&str>) -> anyhow::Result<()> {
    // Converge before touching anything; a half-converged table must
    // never reach the filesystem.
    let topology = converge(mesh, true)?;

    let name = local_name(node)?;
    let local_config = mesh.local_node(&name)?;
    let local = topology
        .get(local_config.id)
        .with_context(|| format!("node {} missing from topology", local_config.id))?;

    let paths = Paths::default();
    let private_key = read_private_key(&paths.private_key)?;

    write_ssh_keys(&mesh.ssh, &mesh.nodes)?;
    purge_networkd(&paths.networkd_dir, mesh.systemd.networkd_importance)?;
    write_networkd(&paths.networkd_dir, mesh, &topology, local, &private_key)?;
    reload_services()?;

    tracing::info!("node {} configured", local.name);
    Ok(())
}
