//! Conflict detection module.
//!
//! Compares two trajectories sample by sample. Index `t` is the same moment
//! in both trajectories, so every check is an instantaneous snapshot with
//! no prediction or closing-rate logic.

use crate::error::{DeconflictError, Result};
use crate::models::{ConflictKind, ConflictRecord, Position, Trajectory};
use crate::rules::DeconflictConfig;
use serde::Serialize;

/// Conflicts found between the primary drone and one fleet drone.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PairConflicts {
    /// Samples closer than the safety distance, in increasing `t`
    pub spatial: Vec<ConflictRecord>,
    /// Samples at the same position within tolerance, in increasing `t`
    pub temporal: Vec<ConflictRecord>,
}

impl PairConflicts {
    pub fn is_empty(&self) -> bool {
        self.spatial.is_empty() && self.temporal.is_empty()
    }

    pub fn records(&self, kind: ConflictKind) -> &[ConflictRecord] {
        match kind {
            ConflictKind::Spatial => &self.spatial,
            ConflictKind::Temporal => &self.temporal,
        }
    }
}

/// Per-sample conflict detector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConflictDetector {
    /// Spatial conflict when the separation is strictly below this
    pub safety_distance: f64,
    /// Temporal conflict when every coordinate differs by at most this
    /// (plus [`RELATIVE_TOLERANCE`] of the fleet drone's coordinate)
    pub temporal_tolerance: f64,
}

impl Default for ConflictDetector {
    fn default() -> Self {
        Self::from_config(&DeconflictConfig::default())
    }
}

impl ConflictDetector {
    pub fn new(safety_distance: f64, temporal_tolerance: f64) -> Self {
        Self {
            safety_distance,
            temporal_tolerance,
        }
    }

    pub fn from_config(config: &DeconflictConfig) -> Self {
        Self::new(config.safety_distance, config.temporal_tolerance)
    }

    /// Check `other` against `primary` at every sample.
    ///
    /// Both trajectories must have the same length; a mismatch is reported
    /// against `drone_id` instead of comparing a truncated prefix.
    pub fn detect(
        &self,
        primary: &Trajectory,
        other: &Trajectory,
        drone_id: &str,
    ) -> Result<PairConflicts> {
        if primary.len() != other.len() {
            return Err(DeconflictError::MismatchedTrajectoryLength {
                drone_id: drone_id.to_string(),
                expected: primary.len(),
                actual: other.len(),
            });
        }

        let mut conflicts = PairConflicts::default();
        for (t, (p, o)) in primary.iter().zip(other.iter()).enumerate() {
            if self.is_spatial_conflict(p, o) {
                conflicts.spatial.push(ConflictRecord {
                    drone_id: drone_id.to_string(),
                    time_index: t,
                    position: *p,
                });
            }
            if self.is_temporal_conflict(p, o) {
                conflicts.temporal.push(ConflictRecord {
                    drone_id: drone_id.to_string(),
                    time_index: t,
                    position: *p,
                });
            }
        }

        Ok(conflicts)
    }

    pub fn is_spatial_conflict(&self, a: &Position, b: &Position) -> bool {
        separation(a, b) < self.safety_distance
    }

    pub fn is_temporal_conflict(&self, a: &Position, b: &Position) -> bool {
        positions_coincide(a, b, self.temporal_tolerance)
    }
}

/// Euclidean distance between two positions.
pub fn separation(a: &Position, b: &Position) -> f64 {
    (a - b).norm()
}

/// Relative term added to the absolute tolerance, scaled by the magnitude
/// of the compared coordinate.
pub const RELATIVE_TOLERANCE: f64 = 1e-5;

/// True when every coordinate satisfies `|a - b| <= tolerance + RELATIVE_TOLERANCE * |b|`.
///
/// The relative term keeps values like `1.01` vs `1.0` inside a `1e-2`
/// tolerance despite rounding in the subtraction.
pub fn positions_coincide(a: &Position, b: &Position, tolerance: f64) -> bool {
    a.coords
        .iter()
        .zip(b.coords.iter())
        .all(|(x, y)| (x - y).abs() <= tolerance + RELATIVE_TOLERANCE * y.abs())
}
