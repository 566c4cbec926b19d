//! Fleet-wide conflict scan.
//!
//! Every fleet drone is checked against the primary trajectory only; fleet
//! drones are never compared with each other.

use crate::conflict::{ConflictDetector, PairConflicts};
use crate::error::{DeconflictError, Result};
use crate::models::{ConflictRecord, Trajectory};
use crate::rules::{DeconflictConfig, FailurePolicy};
use rayon::prelude::*;
use serde::{Serialize, Serializer};

/// A drone whose contribution was left out of a run.
#[derive(Debug, Serialize)]
pub struct DroneFailure {
    pub drone_id: String,
    #[serde(rename = "reason", serialize_with = "serialize_display")]
    pub error: DeconflictError,
}

impl DroneFailure {
    pub fn new(error: DeconflictError) -> Self {
        let drone_id = error.drone_id().unwrap_or_default().to_string();
        Self { drone_id, error }
    }
}

fn serialize_display<S, T>(value: &T, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
    T: std::fmt::Display,
{
    serializer.collect_str(value)
}

/// Aggregated result of scanning the whole fleet.
#[derive(Debug, Default, Serialize)]
pub struct ScanOutcome {
    /// Fleet order, then time order
    pub spatial: Vec<ConflictRecord>,
    /// Fleet order, then time order
    pub temporal: Vec<ConflictRecord>,
    /// Drones skipped during the scan, in fleet order
    pub failures: Vec<DroneFailure>,
    /// Number of drones whose conflicts are included
    pub scanned: usize,
}

impl ScanOutcome {
    fn absorb(&mut self, pair: PairConflicts) {
        self.spatial.extend(pair.spatial);
        self.temporal.extend(pair.temporal);
        self.scanned += 1;
    }
}

/// Runs the conflict detector for each fleet drone against the primary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FleetConflictScan {
    detector: ConflictDetector,
    policy: FailurePolicy,
}

impl Default for FleetConflictScan {
    fn default() -> Self {
        Self::from_config(&DeconflictConfig::default())
    }
}

impl FleetConflictScan {
    pub fn new(detector: ConflictDetector, policy: FailurePolicy) -> Self {
        Self { detector, policy }
    }

    pub fn from_config(config: &DeconflictConfig) -> Self {
        Self::new(ConflictDetector::from_config(config), config.failure_policy)
    }

    pub fn detector(&self) -> &ConflictDetector {
        &self.detector
    }

    /// Scan `fleet` (drone id, trajectory) in order.
    ///
    /// Drones are checked in parallel; results are concatenated in fleet
    /// order. Under [`FailurePolicy::Abort`] the first failing drone (in fleet
    /// order) aborts the scan; otherwise failing drones are skipped and listed
    /// in [`ScanOutcome::failures`].
    pub fn scan(&self, primary: &Trajectory, fleet: &[(&str, &Trajectory)]) -> Result<ScanOutcome> {
        let results: Vec<Result<PairConflicts>> = fleet
            .par_iter()
            .map(|(drone_id, trajectory)| self.detector.detect(primary, trajectory, drone_id))
            .collect();

        let mut outcome = ScanOutcome::default();
        for result in results {
            match result {
                Ok(pair) => outcome.absorb(pair),
                Err(err) if self.policy == FailurePolicy::Abort => return Err(err),
                Err(err) => {
                    tracing::warn!("Skipping drone in conflict scan: {}", err);
                    outcome.failures.push(DroneFailure::new(err));
                }
            }
        }

        tracing::info!(
            "Scanned {} drone(s): {} spatial, {} temporal conflict(s)",
            outcome.scanned,
            outcome.spatial.len(),
            outcome.temporal.len()
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Position;

    fn straight(y: f64, count: usize) -> Trajectory {
        (0..count)
            .map(|i| Position::new(i as f64, y, 0.0))
            .collect::<Vec<_>>()
            .into()
    }

    #[test]
    fn concatenates_in_fleet_then_time_order() {
        let primary = straight(0.0, 6);
        let near = straight(1.0, 6);
        let same = straight(0.0, 6);
        let far = straight(50.0, 6);
        let fleet = [("near", &near), ("far", &far), ("same", &same)];

        let outcome = FleetConflictScan::default().scan(&primary, &fleet).unwrap();

        let spatial: Vec<(&str, usize)> = outcome
            .spatial
            .iter()
            .map(|c| (c.drone_id.as_str(), c.time_index))
            .collect();
        let mut expected: Vec<(&str, usize)> = (0..6).map(|t| ("near", t)).collect();
        expected.extend((0..6).map(|t| ("same", t)));
        assert_eq!(spatial, expected);
        assert!(outcome.temporal.iter().all(|c| c.drone_id == "same"));
        assert_eq!(outcome.temporal.len(), 6);
        assert_eq!(outcome.scanned, 3);
    }

    #[test]
    fn totals_equal_sum_of_pairwise_detections() {
        let primary = straight(0.0, 8);
        let a = straight(0.5, 8);
        let b = straight(0.0, 8);
        let fleet = [("a", &a), ("b", &b)];
        let scan = FleetConflictScan::default();

        let outcome = scan.scan(&primary, &fleet).unwrap();
        let (mut spatial, mut temporal) = (0, 0);
        for (id, trajectory) in fleet {
            let pair = scan.detector().detect(&primary, trajectory, id).unwrap();
            spatial += pair.spatial.len();
            temporal += pair.temporal.len();
        }
        assert_eq!(outcome.spatial.len(), spatial);
        assert_eq!(outcome.temporal.len(), temporal);
    }

    #[test]
    fn skips_and_reports_mismatched_drone() {
        let primary = straight(0.0, 10);
        let short = straight(0.0, 4);
        let good = straight(0.0, 10);
        let fleet = [("short", &short), ("good", &good)];

        let outcome = FleetConflictScan::default().scan(&primary, &fleet).unwrap();

        assert_eq!(outcome.scanned, 1);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].drone_id, "short");
        assert!(outcome.spatial.iter().all(|c| c.drone_id == "good"));
        assert_eq!(outcome.spatial.len(), 10);
    }

    #[test]
    fn abort_policy_returns_first_failure() {
        let primary = straight(0.0, 10);
        let first = straight(0.0, 3);
        let second = straight(0.0, 12);
        let fleet = [("first", &first), ("second", &second)];
        let scan = FleetConflictScan::new(ConflictDetector::default(), FailurePolicy::Abort);

        let err = scan.scan(&primary, &fleet).unwrap_err();
        assert_eq!(err.drone_id(), Some("first"));
    }

    #[test]
    fn empty_fleet_has_no_conflicts() {
        let outcome = FleetConflictScan::default().scan(&straight(0.0, 5), &[]).unwrap();
        assert!(outcome.spatial.is_empty() && outcome.temporal.is_empty());
        assert_eq!(outcome.scanned, 0);
    }

    #[test]
    fn failure_serializes_reason_text() {
        let failure = DroneFailure::new(DeconflictError::DuplicateDroneId("D9".to_string()));
        let json = serde_json::to_value(&failure).unwrap();
        assert_eq!(json["drone_id"], "D9");
        assert_eq!(json["reason"], "duplicate drone id: D9");
    }
}
