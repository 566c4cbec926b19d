//! Error types for trajectory generation and conflict scanning.

use thiserror::Error;

/// Errors raised by the deconfliction core.
///
/// Per-drone variants carry the drone identifier so a run summary can say
/// which drone was skipped and why.
#[derive(Debug, Error)]
pub enum DeconflictError {
    /// Fewer than two waypoints, or a waypoint that is not 3-dimensional.
    #[error("invalid waypoints for drone {drone_id}: shape ({rows}, {cols}), must be (N>=2, 3)")]
    InvalidWaypoints {
        drone_id: String,
        rows: usize,
        cols: usize,
    },

    #[error("trajectory length mismatch for drone {drone_id}: expected {expected} samples, got {actual}")]
    MismatchedTrajectoryLength {
        drone_id: String,
        expected: usize,
        actual: usize,
    },

    #[error("duplicate drone id: {0}")]
    DuplicateDroneId(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("curve fit failed for drone {drone_id}: {reason}")]
    CurveFit { drone_id: String, reason: String },

    #[error("malformed mission document: {0}")]
    Document(#[from] serde_json::Error),

    #[error("failed to serialize {what}: {source}")]
    Serialize {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl DeconflictError {
    /// Drone the error is scoped to, if it is a per-drone failure.
    pub fn drone_id(&self) -> Option<&str> {
        match self {
            Self::InvalidWaypoints { drone_id, .. }
            | Self::MismatchedTrajectoryLength { drone_id, .. }
            | Self::CurveFit { drone_id, .. } => Some(drone_id),
            Self::DuplicateDroneId(id) => Some(id),
            Self::InvalidConfig(_) | Self::Document(_) | Self::Serialize { .. } | Self::Io(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, DeconflictError>;
