//! Plan every drone's trajectory, scan the fleet against the primary drone
//! and write the conflict report.
//!
//! Usage:
//!   cargo run -p deconflict-cli --bin deconflict -- --waypoints waypoints.json

use anyhow::{Context, Result};
use clap::Parser;
use deconflict_cli::{init_tracing, resolve_config, ConfigOverrides};
use deconflict_core::{ConflictReport, MissionDocument, MissionPlanner};
use std::path::PathBuf;

/// Detect spatial and temporal conflicts between a primary drone and its fleet
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Mission document with primary and fleet waypoints
    #[arg(long, default_value = "waypoints.json")]
    waypoints: PathBuf,

    /// JSON config file (replaces DECONFLICT_* environment settings)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Samples per trajectory
    #[arg(long)]
    samples: Option<usize>,

    /// Spatial conflict threshold
    #[arg(long)]
    safety_distance: Option<f64>,

    /// Maximum Bézier curve degree
    #[arg(long)]
    max_degree: Option<usize>,

    /// Per-coordinate tolerance for temporal conflicts
    #[arg(long)]
    tolerance: Option<f64>,

    /// Abort on the first invalid drone instead of skipping it
    #[arg(long)]
    fail_fast: bool,

    /// Text report output
    #[arg(long, default_value = "conflict_report.txt")]
    report: PathBuf,

    /// Optional JSON report output
    #[arg(long)]
    json_report: Option<PathBuf>,

    /// Optional animation frame export (JSON)
    #[arg(long)]
    frames: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing()?;

    let overrides = ConfigOverrides {
        sample_count: args.samples,
        safety_distance: args.safety_distance,
        max_degree: args.max_degree,
        temporal_tolerance: args.tolerance,
        fail_fast: args.fail_fast,
    };
    let config = resolve_config(args.config.as_deref(), &overrides)?;
    tracing::debug!("Run configuration: {:?}", config);

    let document = MissionDocument::from_path(&args.waypoints)
        .with_context(|| format!("failed to load waypoints from {}", args.waypoints.display()))?;

    let plan = MissionPlanner::new(config)
        .plan(&document)
        .context("deconfliction run failed")?;

    let report = ConflictReport::from_plan(&plan);
    report
        .write_text(&args.report)
        .with_context(|| format!("failed to write report {}", args.report.display()))?;
    println!("Report saved as {}", args.report.display());

    if let Some(path) = &args.json_report {
        report
            .write_json(path)
            .with_context(|| format!("failed to write JSON report {}", path.display()))?;
        println!("JSON report saved as {}", path.display());
    }

    if let Some(path) = &args.frames {
        let frame_count = plan
            .timeline()
            .write_json(path)
            .with_context(|| format!("failed to write frames {}", path.display()))?;
        println!("{} animation frames saved as {}", frame_count, path.display());
    }

    println!();
    println!(
        "Scanned {} of {} fleet drone(s) over {} samples",
        plan.summary.scanned, plan.summary.fleet_size, plan.config.sample_count
    );
    println!("  Spatial conflicts:  {}", plan.spatial.len());
    println!("  Temporal conflicts: {}", plan.temporal.len());
    for failure in &plan.summary.failures {
        println!("  Skipped {}: {}", failure.drone_id, failure.error);
    }

    Ok(())
}
