//! Human-readable conflict report.

use crate::error::{DeconflictError, Result};
use crate::models::{ConflictRecord, Position};
use crate::planner::MissionPlan;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::Path;

pub const REPORT_TITLE: &str = "Drone Conflict Report";

#[derive(Debug, Clone, Serialize)]
pub struct SkippedDrone {
    pub drone_id: String,
    pub reason: String,
}

/// Snapshot of a run's conflicts, ready to render.
#[derive(Debug, Clone, Serialize)]
pub struct ConflictReport {
    pub title: String,
    pub generated_at: DateTime<Utc>,
    pub sample_count: usize,
    pub safety_distance: f64,
    pub spatial: Vec<ConflictRecord>,
    pub temporal: Vec<ConflictRecord>,
    pub skipped: Vec<SkippedDrone>,
}

impl ConflictReport {
    pub fn from_plan(plan: &MissionPlan) -> Self {
        Self {
            title: REPORT_TITLE.to_string(),
            generated_at: Utc::now(),
            sample_count: plan.config.sample_count,
            safety_distance: plan.config.safety_distance,
            spatial: plan.spatial.clone(),
            temporal: plan.temporal.clone(),
            skipped: plan
                .summary
                .failures
                .iter()
                .map(|f| SkippedDrone {
                    drone_id: f.drone_id.clone(),
                    reason: f.error.to_string(),
                })
                .collect(),
        }
    }

    pub fn has_conflicts(&self) -> bool {
        !self.spatial.is_empty() || !self.temporal.is_empty()
    }

    /// Render as plain text. Empty sections are left out.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", self.title);
        let _ = writeln!(out, "Generated: {}", self.generated_at.to_rfc3339());
        out.push('\n');

        if !self.spatial.is_empty() {
            out.push_str("Spatial Conflicts:\n");
            write_records(&mut out, &self.spatial);
        }

        if !self.temporal.is_empty() {
            if !self.spatial.is_empty() {
                out.push('\n');
            }
            out.push_str("Temporal Conflicts:\n");
            write_records(&mut out, &self.temporal);
        }

        if !self.has_conflicts() {
            out.push_str("No conflicts detected.\n");
        }

        if !self.skipped.is_empty() {
            out.push_str("\nSkipped Drones:\n");
            for skipped in &self.skipped {
                let _ = writeln!(out, "Drone: {}, Reason: {}", skipped.drone_id, skipped.reason);
            }
        }

        out
    }

    pub fn write_text(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.render_text())?;
        Ok(())
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(|source| DeconflictError::Serialize {
            what: "conflict report",
            source,
        })?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

fn write_records(out: &mut String, records: &[ConflictRecord]) {
    for record in records {
        let _ = writeln!(
            out,
            "Time: {}, Drone: {}, Position: {}",
            record.time_index,
            record.drone_id,
            format_position(&record.position)
        );
    }
}

fn format_position(p: &Position) -> String {
    format!("[{:?}, {:?}, {:?}]", p.x, p.y, p.z)
}
