//! Write a random mission document.
//!
//! Usage:
//!   cargo run -p deconflict-cli --bin generate_scenario -- --drones 5 --seed 42

use anyhow::{ensure, Context, Result};
use clap::Parser;
use deconflict_cli::{generate_scenario, init_tracing, ScenarioSpec};
use std::path::PathBuf;

/// Generate a random primary drone and fleet
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Number of fleet drones
    #[arg(long, default_value_t = 3)]
    drones: usize,

    /// Waypoints per drone (at least 2)
    #[arg(long, default_value_t = 4)]
    waypoints_per_drone: usize,

    /// Half-width of the horizontal area and height of the vertical range
    #[arg(long, default_value_t = 50.0)]
    extent: f64,

    /// Seed for a reproducible scenario
    #[arg(long)]
    seed: Option<u64>,

    /// Output file
    #[arg(long, default_value = "waypoints.json")]
    out: PathBuf,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing()?;
    ensure!(
        args.extent.is_finite() && args.extent >= 0.0,
        "extent must be a non-negative number, got {}",
        args.extent
    );

    let spec = ScenarioSpec {
        fleet_size: args.drones,
        waypoints_per_drone: args.waypoints_per_drone,
        extent: args.extent,
        seed: args.seed,
    };
    let document = generate_scenario(&spec);
    tracing::info!(
        "Generated primary drone and {} fleet drone(s) with {} waypoint(s) each",
        document.drones.len(),
        document.primary.waypoints.len()
    );

    let json = serde_json::to_string_pretty(&document)?;
    std::fs::write(&args.out, json)
        .with_context(|| format!("failed to write {}", args.out.display()))?;
    println!("Scenario saved as {}", args.out.display());

    Ok(())
}
