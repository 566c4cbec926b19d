//! Frame-by-frame view of a planned run for animation front-ends.
//!
//! Each sample index is one frame. Positions and conflict flags are looked
//! up in constant time.

use crate::error::{DeconflictError, Result};
use crate::models::{ConflictKind, ConflictRecord, Position};
use crate::planner::MissionPlan;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

/// Colour state of a fleet drone's marker at one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerState {
    #[default]
    Clear,
    Spatial,
    /// Takes precedence over `Spatial`
    Temporal,
}

#[derive(Debug, Clone)]
struct ConflictFlags {
    spatial: Vec<bool>,
    temporal: Vec<bool>,
}

impl ConflictFlags {
    fn new(frames: usize) -> Self {
        Self {
            spatial: vec![false; frames],
            temporal: vec![false; frames],
        }
    }

    fn get(&self, kind: ConflictKind) -> &[bool] {
        match kind {
            ConflictKind::Spatial => &self.spatial,
            ConflictKind::Temporal => &self.temporal,
        }
    }
}

/// One drone marker in a frame.
#[derive(Debug, Clone, Serialize)]
pub struct DroneMarker<'a> {
    pub drone_id: &'a str,
    pub position: Position,
    pub state: MarkerState,
}

/// Positions of every drone at one sample index.
#[derive(Debug, Clone, Serialize)]
pub struct Frame<'a> {
    pub time_index: usize,
    pub primary: Position,
    /// Fleet drones in input order
    pub drones: Vec<DroneMarker<'a>>,
}

/// Serializable animation payload.
#[derive(Debug, Serialize)]
pub struct TimelineExport<'a> {
    pub frame_count: usize,
    pub primary_id: &'a str,
    pub drone_ids: Vec<&'a str>,
    pub frames: Vec<Frame<'a>>,
}

/// Read-only lookup over a [`MissionPlan`].
#[derive(Debug)]
pub struct ConflictTimeline<'a> {
    plan: &'a MissionPlan,
    flags: HashMap<&'a str, ConflictFlags>,
}

impl<'a> ConflictTimeline<'a> {
    pub fn new(plan: &'a MissionPlan) -> Self {
        let frames = plan.config.sample_count;
        let mut flags: HashMap<&'a str, ConflictFlags> = plan
            .fleet
            .iter()
            .map(|drone| (drone.id.as_str(), ConflictFlags::new(frames)))
            .collect();

        mark(&mut flags, &plan.spatial, |f| &mut f.spatial);
        mark(&mut flags, &plan.temporal, |f| &mut f.temporal);

        Self { plan, flags }
    }

    pub fn frame_count(&self) -> usize {
        self.plan.config.sample_count
    }

    /// Position of `drone_id` (fleet or primary) at frame `t`.
    pub fn position(&self, drone_id: &str, t: usize) -> Option<&'a Position> {
        self.plan.trajectory(drone_id)?.position(t)
    }

    /// Path flown by `drone_id` up to and including frame `t`.
    pub fn trail(&self, drone_id: &str, t: usize) -> Option<&'a [Position]> {
        let points = self.plan.trajectory(drone_id)?.points();
        points.get(..=t.min(points.len().checked_sub(1)?))
    }

    pub fn has_conflict(&self, drone_id: &str, t: usize, kind: ConflictKind) -> bool {
        self.flags
            .get(drone_id)
            .and_then(|f| f.get(kind).get(t).copied())
            .unwrap_or(false)
    }

    pub fn marker_state(&self, drone_id: &str, t: usize) -> MarkerState {
        if self.has_conflict(drone_id, t, ConflictKind::Temporal) {
            MarkerState::Temporal
        } else if self.has_conflict(drone_id, t, ConflictKind::Spatial) {
            MarkerState::Spatial
        } else {
            MarkerState::Clear
        }
    }

    pub fn frame(&self, t: usize) -> Option<Frame<'a>> {
        let primary = *self.plan.primary_trajectory().position(t)?;
        let drones = self
            .plan
            .fleet
            .iter()
            .filter_map(|drone| {
                let position = *self.position(&drone.id, t)?;
                Some(DroneMarker {
                    drone_id: drone.id.as_str(),
                    position,
                    state: self.marker_state(&drone.id, t),
                })
            })
            .collect();

        Some(Frame {
            time_index: t,
            primary,
            drones,
        })
    }

    pub fn frames(&self) -> impl Iterator<Item = Frame<'a>> + '_ {
        (0..self.frame_count()).filter_map(move |t| self.frame(t))
    }

    pub fn export(&self) -> TimelineExport<'a> {
        TimelineExport {
            frame_count: self.frame_count(),
            primary_id: self.plan.primary.id.as_str(),
            drone_ids: self.plan.fleet_ids().collect(),
            frames: self.frames().collect(),
        }
    }

    /// Write every frame as JSON; returns the number of frames written.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<usize> {
        let export = self.export();
        let json = serde_json::to_string(&export).map_err(|source| DeconflictError::Serialize {
            what: "animation frames",
            source,
        })?;
        std::fs::write(path, json)?;
        Ok(export.frame_count)
    }
}

fn mark<'a>(
    flags: &mut HashMap<&'a str, ConflictFlags>,
    records: &[ConflictRecord],
    select: impl Fn(&mut ConflictFlags) -> &mut Vec<bool>,
) {
    for record in records {
        if let Some(slot) = flags
            .get_mut(record.drone_id.as_str())
            .and_then(|f| select(f).get_mut(record.time_index))
        {
            *slot = true;
        }
    }
}
