//! Deconflict CLI - Command line tools for the fleet deconfliction system.
//!
//! This crate provides the binaries:
//! - deconflict: plan trajectories, scan the fleet, write the report
//! - generate_scenario: write a random mission document

pub mod config;
pub mod scenario;

pub use config::{init_tracing, resolve_config, ConfigOverrides};
pub use scenario::{generate_scenario, ScenarioSpec};
