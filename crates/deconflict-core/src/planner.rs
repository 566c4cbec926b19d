//! Run orchestration: waypoints in, trajectories and conflicts out.

use crate::curve::TrajectoryGenerator;
use crate::error::{DeconflictError, Result};
use crate::models::{ConflictRecord, Drone, MissionDocument, Trajectory, PRIMARY_DRONE_ID};
use crate::rules::{DeconflictConfig, FailurePolicy};
use crate::scan::{DroneFailure, FleetConflictScan};
use crate::timeline::ConflictTimeline;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Which drones made it into a run and which were left out.
#[derive(Debug, Default, Serialize)]
pub struct RunSummary {
    /// Fleet entries in the input
    pub fleet_size: usize,
    /// Fleet drones whose conflicts are included
    pub scanned: usize,
    pub failures: Vec<DroneFailure>,
}

impl RunSummary {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Everything computed for one run. Read-only once built.
#[derive(Debug)]
pub struct MissionPlan {
    pub config: DeconflictConfig,
    pub primary: Drone,
    /// Successfully planned fleet drones, in input order
    pub fleet: Vec<Drone>,
    /// Drone id -> trajectory, including the primary drone
    pub trajectories: HashMap<String, Trajectory>,
    pub spatial: Vec<ConflictRecord>,
    pub temporal: Vec<ConflictRecord>,
    pub summary: RunSummary,
}

impl MissionPlan {
    pub fn primary_trajectory(&self) -> &Trajectory {
        &self.trajectories[&self.primary.id]
    }

    pub fn trajectory(&self, drone_id: &str) -> Option<&Trajectory> {
        self.trajectories.get(drone_id)
    }

    pub fn fleet_ids(&self) -> impl Iterator<Item = &str> {
        self.fleet.iter().map(|d| d.id.as_str())
    }

    pub fn timeline(&self) -> ConflictTimeline<'_> {
        ConflictTimeline::new(self)
    }
}

/// Generates every trajectory and scans the fleet against the primary drone.
#[derive(Debug, Clone, Default)]
pub struct MissionPlanner {
    config: DeconflictConfig,
}

impl MissionPlanner {
    pub fn new(config: DeconflictConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DeconflictConfig {
        &self.config
    }

    /// Plan a run from a mission document.
    pub fn plan(&self, document: &MissionDocument) -> Result<MissionPlan> {
        self.config.validate()?;
        let primary = document.primary_drone()?;
        self.run(primary, document.fleet())
    }

    /// Plan a run from an already validated primary drone and fleet entries.
    ///
    /// A failure of the primary drone fails the run. Fleet failures follow
    /// the configured [`FailurePolicy`].
    pub fn plan_fleet(&self, primary: Drone, fleet: Vec<Result<Drone>>) -> Result<MissionPlan> {
        self.config.validate()?;
        self.run(primary, fleet)
    }

    fn run(&self, primary: Drone, fleet: Vec<Result<Drone>>) -> Result<MissionPlan> {
        let generator = TrajectoryGenerator::from_config(&self.config);
        let fleet_size = fleet.len();

        tracing::info!(
            "Planning primary drone {} against {} fleet drone(s)",
            primary.id,
            fleet_size
        );
        let primary_trajectory = generator.generate_for(&primary)?;

        let candidates = reject_duplicate_ids(&primary.id, fleet);
        let generated: Vec<Result<(Drone, Trajectory)>> = candidates
            .into_par_iter()
            .map(|candidate| -> Result<(Drone, Trajectory)> {
                let drone = candidate?;
                let trajectory = generator.generate_for(&drone)?;
                Ok((drone, trajectory))
            })
            .collect();

        let mut summary = RunSummary {
            fleet_size,
            ..RunSummary::default()
        };
        let mut planned = Vec::with_capacity(generated.len());
        for result in generated {
            match result {
                Ok(entry) => planned.push(entry),
                Err(err) if self.config.failure_policy == FailurePolicy::Abort => return Err(err),
                Err(err) => {
                    tracing::warn!("Skipping drone: {}", err);
                    summary.failures.push(DroneFailure::new(err));
                }
            }
        }

        let members: Vec<(&str, &Trajectory)> = planned
            .iter()
            .map(|(drone, trajectory)| (drone.id.as_str(), trajectory))
            .collect();
        let outcome = FleetConflictScan::from_config(&self.config).scan(&primary_trajectory, &members)?;
        let failed: HashSet<String> = outcome.failures.iter().map(|f| f.drone_id.clone()).collect();
        summary.scanned = outcome.scanned;
        summary.failures.extend(outcome.failures);

        let mut trajectories = HashMap::with_capacity(planned.len() + 1);
        let mut fleet = Vec::with_capacity(planned.len());
        for (drone, trajectory) in planned {
            if failed.contains(drone.id.as_str()) {
                continue;
            }
            trajectories.insert(drone.id.clone(), trajectory);
            fleet.push(drone);
        }
        trajectories.insert(primary.id.clone(), primary_trajectory);

        if summary.has_failures() {
            tracing::warn!(
                "{} of {} fleet drone(s) skipped",
                summary.failures.len(),
                fleet_size
            );
        }

        Ok(MissionPlan {
            config: self.config.clone(),
            primary,
            fleet,
            trajectories,
            spatial: outcome.spatial,
            temporal: outcome.temporal,
            summary,
        })
    }
}

/// Turn repeated ids (including reuse of the primary id) into per-drone errors.
fn reject_duplicate_ids(primary_id: &str, fleet: Vec<Result<Drone>>) -> Vec<Result<Drone>> {
    let mut seen: HashSet<String> = HashSet::from([primary_id.to_string(), PRIMARY_DRONE_ID.to_string()]);
    fleet
        .into_iter()
        .map(|entry| -> Result<Drone> {
            let drone = entry?;
            if seen.insert(drone.id.clone()) {
                Ok(drone)
            } else {
                Err(DeconflictError::DuplicateDroneId(drone.id))
            }
        })
        .collect()
}
