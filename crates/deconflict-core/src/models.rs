//! Core data models for the deconfliction system.

use crate::error::{DeconflictError, Result};
use nalgebra::Point3;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

/// A 3D position in the mission's length units.
pub type Position = Point3<f64>;

/// Identifier given to the primary drone in trajectory maps and timelines.
pub const PRIMARY_DRONE_ID: &str = "primary";

/// A drone and the waypoints its path is built from.
///
/// Drones are plain values; computed trajectories are kept in a separate
/// map keyed by [`Drone::id`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Drone {
    pub id: String,
    pub waypoints: Vec<Position>,
}

impl Drone {
    pub fn new(id: impl Into<String>, waypoints: Vec<Position>) -> Self {
        Self {
            id: id.into(),
            waypoints,
        }
    }

    /// Build a drone from raw coordinate rows, rejecting anything that is not
    /// at least two 3-element rows.
    pub fn from_rows(id: impl Into<String>, rows: &[Vec<f64>]) -> Result<Self> {
        let id = id.into();
        let waypoints = waypoints_from_rows(&id, rows)?;
        Ok(Self { id, waypoints })
    }
}

fn waypoints_from_rows(drone_id: &str, rows: &[Vec<f64>]) -> Result<Vec<Position>> {
    let invalid = |cols: usize| DeconflictError::InvalidWaypoints {
        drone_id: drone_id.to_string(),
        rows: rows.len(),
        cols,
    };

    if let Some(bad) = rows.iter().find(|row| row.len() != 3) {
        return Err(invalid(bad.len()));
    }
    if rows.len() < 2 {
        return Err(invalid(rows.first().map_or(0, Vec::len)));
    }

    Ok(rows
        .iter()
        .map(|row| Position::new(row[0], row[1], row[2]))
        .collect())
}

/// Uniformly sampled positions along a drone's curve.
///
/// Index `t` refers to the same moment in every trajectory of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Trajectory {
    points: Vec<Position>,
}

impl Trajectory {
    pub(crate) fn from_points(points: Vec<Position>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Position at sample index `t`.
    pub fn position(&self, t: usize) -> Option<&Position> {
        self.points.get(t)
    }

    pub fn points(&self) -> &[Position] {
        &self.points
    }

    pub fn iter(&self) -> impl Iterator<Item = &Position> {
        self.points.iter()
    }

    pub fn first(&self) -> Option<&Position> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&Position> {
        self.points.last()
    }
}

impl From<Vec<Position>> for Trajectory {
    fn from(points: Vec<Position>) -> Self {
        Self::from_points(points)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictKind {
    /// Closer than the safety distance
    Spatial,
    /// Same position (within tolerance) at the same sample
    Temporal,
}

/// One conflicting sample between the primary drone and a fleet drone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConflictRecord {
    pub drone_id: String,
    pub time_index: usize,
    /// Primary drone position at `time_index`
    pub position: Position,
}

// ========== MISSION DOCUMENT ==========

/// Waypoint source document: one primary drone plus a fleet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionDocument {
    pub primary: PrimaryEntry,
    #[serde(default)]
    pub drones: Vec<FleetEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrimaryEntry {
    #[serde(default)]
    pub waypoints: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleetEntry {
    /// Accepts JSON strings or integers
    #[serde(deserialize_with = "drone_id_from_json")]
    pub id: String,
    pub waypoints: Vec<Vec<f64>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDroneId {
    Text(String),
    Number(serde_json::Number),
}

fn drone_id_from_json<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RawDroneId::deserialize(deserializer)? {
        RawDroneId::Text(id) => id,
        RawDroneId::Number(n) => n.to_string(),
    })
}

impl MissionDocument {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Validated primary drone.
    pub fn primary_drone(&self) -> Result<Drone> {
        Drone::from_rows(PRIMARY_DRONE_ID, &self.primary.waypoints)
    }

    /// Validated fleet drones in document order; each entry succeeds or fails
    /// on its own.
    pub fn fleet(&self) -> Vec<Result<Drone>> {
        self.drones
            .iter()
            .map(|entry| Drone::from_rows(entry.id.clone(), &entry.waypoints))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_string_and_integer_ids() {
        let doc = MissionDocument::from_json_str(
            r#"{
                "primary": {"waypoints": [[0,0,0],[10,0,0]]},
                "drones": [
                    {"id": "alpha", "waypoints": [[0,5,0],[10,5,0]]},
                    {"id": 7, "waypoints": [[0,9,0],[10,9,0]]}
                ]
            }"#,
        )
        .unwrap();

        let ids: Vec<&str> = doc.drones.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["alpha", "7"]);
        assert_eq!(doc.primary_drone().unwrap().waypoints.len(), 2);
    }

    #[test]
    fn missing_primary_waypoints_is_invalid() {
        let doc = MissionDocument::from_json_str(r#"{"primary": {}, "drones": []}"#).unwrap();
        let err = doc.primary_drone().unwrap_err();
        assert!(matches!(
            err,
            DeconflictError::InvalidWaypoints { rows: 0, cols: 0, .. }
        ));
    }

    #[test]
    fn rejects_single_waypoint_and_wrong_dimension() {
        let err = Drone::from_rows("D1", &[vec![1.0, 2.0, 3.0]]).unwrap_err();
        assert!(matches!(
            err,
            DeconflictError::InvalidWaypoints { rows: 1, cols: 3, .. }
        ));

        let err = Drone::from_rows("D2", &[vec![0.0, 0.0, 0.0], vec![1.0, 1.0]]).unwrap_err();
        assert!(matches!(
            err,
            DeconflictError::InvalidWaypoints { rows: 2, cols: 2, .. }
        ));
        assert_eq!(err.drone_id(), Some("D2"));
    }

    #[test]
    fn fleet_validates_entries_independently() {
        let doc = MissionDocument::from_json_str(
            r#"{
                "primary": {"waypoints": [[0,0,0],[1,1,1]]},
                "drones": [
                    {"id": "bad", "waypoints": [[0,0,0]]},
                    {"id": "good", "waypoints": [[0,0,0],[2,2,2]]}
                ]
            }"#,
        )
        .unwrap();

        let fleet = doc.fleet();
        assert!(fleet[0].is_err());
        assert_eq!(fleet[1].as_ref().unwrap().id, "good");
    }

    #[test]
    fn malformed_document_is_reported() {
        let err = MissionDocument::from_json_str(r#"{"drones": []}"#).unwrap_err();
        assert!(matches!(err, DeconflictError::Document(_)));
    }
}
