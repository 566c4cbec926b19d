//! Safety rules and sampling parameters for a deconfliction run.

use crate::error::{DeconflictError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::str::FromStr;

/// What a scan does when a single drone's contribution fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop the whole run on the first drone failure
    Abort,
    /// Leave the drone out of the results and list it in the run summary
    #[default]
    SkipAndReport,
}

impl FromStr for FailurePolicy {
    type Err = DeconflictError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(Self::Abort),
            "skip" | "skip_and_report" => Ok(Self::SkipAndReport),
            other => Err(DeconflictError::InvalidConfig(format!(
                "unknown failure policy '{other}'"
            ))),
        }
    }
}

/// Configuration for trajectory sampling and conflict thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeconflictConfig {
    /// Distance below which two drones at the same sample are in spatial conflict
    pub safety_distance: f64,
    /// Samples per trajectory (animation frames)
    pub sample_count: usize,
    /// Upper bound on the Bézier curve degree
    pub max_degree: usize,
    /// Absolute per-coordinate tolerance for a temporal conflict
    pub temporal_tolerance: f64,
    pub failure_policy: FailurePolicy,
}

impl Default for DeconflictConfig {
    fn default() -> Self {
        Self {
            safety_distance: 2.0,
            sample_count: 100,
            max_degree: 5,
            temporal_tolerance: 1e-2,
            failure_policy: FailurePolicy::SkipAndReport,
        }
    }
}

impl DeconflictConfig {
    /// Defaults overlaid with any `DECONFLICT_*` environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(v) = env_value("DECONFLICT_SAFETY_DISTANCE") {
            config.safety_distance = v;
        }
        if let Some(v) = env_value("DECONFLICT_SAMPLE_COUNT") {
            config.sample_count = v;
        }
        if let Some(v) = env_value("DECONFLICT_MAX_DEGREE") {
            config.max_degree = v;
        }
        if let Some(v) = env_value("DECONFLICT_TEMPORAL_TOLERANCE") {
            config.temporal_tolerance = v;
        }
        if let Some(v) = env_value("DECONFLICT_FAILURE_POLICY") {
            config.failure_policy = v;
        }
        config
    }

    /// Load a (possibly partial) JSON config; missing fields keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Check that every threshold is usable.
    pub fn validate(&self) -> Result<()> {
        if !self.safety_distance.is_finite() || self.safety_distance <= 0.0 {
            return Err(DeconflictError::InvalidConfig(format!(
                "safety_distance must be a positive finite number, got {}",
                self.safety_distance
            )));
        }
        if self.sample_count == 0 {
            return Err(DeconflictError::InvalidConfig(
                "sample_count must be at least 1".to_string(),
            ));
        }
        if self.max_degree == 0 {
            return Err(DeconflictError::InvalidConfig(
                "max_degree must be at least 1".to_string(),
            ));
        }
        if !self.temporal_tolerance.is_finite() || self.temporal_tolerance < 0.0 {
            return Err(DeconflictError::InvalidConfig(format!(
                "temporal_tolerance must be a non-negative finite number, got {}",
                self.temporal_tolerance
            )));
        }
        Ok(())
    }
}

fn env_value<T: FromStr>(key: &str) -> Option<T> {
    let raw = env::var(key).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring unparsable {}={:?}", key, raw);
            None
        }
    }
}
