pub mod conflict;
pub mod curve;
pub mod error;
pub mod models;
pub mod planner;
pub mod report;
pub mod rules;
pub mod scan;
pub mod timeline;

pub use conflict::{
    positions_coincide, separation, ConflictDetector, PairConflicts, RELATIVE_TOLERANCE,
};
pub use curve::{curve_degree, BezierCurve, TrajectoryGenerator, DEFAULT_MAX_DEGREE};
pub use error::{DeconflictError, Result};
pub use models::{
    ConflictKind, ConflictRecord, Drone, FleetEntry, MissionDocument, Position, PrimaryEntry,
    Trajectory, PRIMARY_DRONE_ID,
};
pub use planner::{MissionPlan, MissionPlanner, RunSummary};
pub use report::ConflictReport;
pub use rules::{DeconflictConfig, FailurePolicy};
pub use scan::{DroneFailure, FleetConflictScan, ScanOutcome};
pub use timeline::{ConflictTimeline, DroneMarker, Frame, MarkerState, TimelineExport};
