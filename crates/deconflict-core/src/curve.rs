//! Bézier trajectory generation.
//!
//! Waypoints become the control points of a single Bézier curve over
//! `u in [0, 1]`, which is then sampled at uniformly spaced parameters.
//! The degree is capped; when a drone has more waypoints than a capped
//! curve has control points, a curve of the capped degree is fitted to
//! them by least squares with both endpoints pinned.

use crate::error::{DeconflictError, Result};
use crate::models::{Drone, Position, Trajectory};
use crate::rules::DeconflictConfig;
use nalgebra::{DMatrix, Vector3};

/// Default cap on the curve degree.
pub const DEFAULT_MAX_DEGREE: usize = 5;

const SVD_EPS: f64 = 1e-12;

/// Degree of the curve used for `waypoint_count` waypoints.
pub fn curve_degree(waypoint_count: usize, max_degree: usize) -> usize {
    waypoint_count.saturating_sub(1).min(max_degree)
}

/// A single Bézier curve in 3D.
#[derive(Debug, Clone, PartialEq)]
pub struct BezierCurve {
    control_points: Vec<Position>,
}

impl BezierCurve {
    /// Build the curve for a drone's waypoints.
    ///
    /// With at most `max_degree + 1` waypoints the waypoints are used as
    /// control points directly; otherwise a degree `max_degree` curve is
    /// fitted (see [`BezierCurve::fit`]).
    pub fn through(drone_id: &str, waypoints: &[Position], max_degree: usize) -> Result<Self> {
        if waypoints.len() < 2 {
            return Err(DeconflictError::InvalidWaypoints {
                drone_id: drone_id.to_string(),
                rows: waypoints.len(),
                cols: 3,
            });
        }
        if max_degree == 0 {
            return Err(DeconflictError::InvalidConfig(
                "max_degree must be at least 1".to_string(),
            ));
        }

        let degree = curve_degree(waypoints.len(), max_degree);
        if degree + 1 == waypoints.len() {
            Ok(Self {
                control_points: waypoints.to_vec(),
            })
        } else {
            Self::fit(drone_id, waypoints, degree)
        }
    }

    /// Least-squares fit of a degree `degree` curve whose first and last
    /// control points are the first and last waypoints.
    ///
    /// Waypoints are assigned chord-length parameters (uniform parameters if
    /// the polyline has zero length). The interior control points are solved
    /// as offsets from the straight chord between the endpoints, so the fit
    /// moves with the waypoints and an under-determined system (repeated
    /// waypoints) collapses towards the chord rather than the origin.
    pub fn fit(drone_id: &str, waypoints: &[Position], degree: usize) -> Result<Self> {
        let (Some(&first), Some(&last)) = (waypoints.first(), waypoints.last()) else {
            return Err(DeconflictError::InvalidWaypoints {
                drone_id: drone_id.to_string(),
                rows: 0,
                cols: 0,
            });
        };
        if degree <= 1 {
            return Ok(Self {
                control_points: vec![first, last],
            });
        }

        let params = chord_length_params(waypoints);
        let interior = degree - 1;
        let chord = last - first;

        // Evenly spaced control points on the chord trace the chord itself
        // at `first + u * chord`, so only the deviation from it is fitted.
        let mut basis = DMatrix::<f64>::zeros(waypoints.len(), interior);
        let mut residual = DMatrix::<f64>::zeros(waypoints.len(), 3);
        for (row, (waypoint, &u)) in waypoints.iter().zip(&params).enumerate() {
            for k in 1..degree {
                basis[(row, k - 1)] = bernstein(degree, k, u);
            }
            let deviation = *waypoint - (first + chord * u);
            for axis in 0..3 {
                residual[(row, axis)] = deviation[axis];
            }
        }

        let offsets = basis
            .svd(true, true)
            .solve(&residual, SVD_EPS)
            .map_err(|reason| DeconflictError::CurveFit {
                drone_id: drone_id.to_string(),
                reason: reason.to_string(),
            })?;

        let mut control_points = Vec::with_capacity(degree + 1);
        control_points.push(first);
        for k in 0..interior {
            let on_chord = first + chord * ((k + 1) as f64 / degree as f64);
            let point = on_chord + Vector3::new(offsets[(k, 0)], offsets[(k, 1)], offsets[(k, 2)]);
            if !point.coords.iter().all(|c| c.is_finite()) {
                return Err(DeconflictError::CurveFit {
                    drone_id: drone_id.to_string(),
                    reason: "non-finite control point".to_string(),
                });
            }
            control_points.push(point);
        }
        control_points.push(last);

        Ok(Self { control_points })
    }

    pub fn degree(&self) -> usize {
        self.control_points.len() - 1
    }

    pub fn control_points(&self) -> &[Position] {
        &self.control_points
    }

    /// Evaluate the curve at `u` with de Casteljau's algorithm, which returns
    /// the end control points exactly at `u = 0` and `u = 1`.
    pub fn evaluate(&self, u: f64) -> Position {
        let mut work: Vec<Vector3<f64>> = self.control_points.iter().map(|p| p.coords).collect();
        let n = work.len();
        for level in 1..n {
            for i in 0..n - level {
                work[i] = work[i] * (1.0 - u) + work[i + 1] * u;
            }
        }
        Position::from(work[0])
    }

    /// Sample `count` uniformly spaced parameters in `[0, 1]`, both ends included.
    pub fn sample(&self, count: usize) -> Trajectory {
        let points = (0..count)
            .map(|i| self.evaluate(sample_parameter(i, count)))
            .collect();
        Trajectory::from_points(points)
    }
}

/// Parameter of sample `i` out of `count`; a single sample sits at `u = 0`.
pub fn sample_parameter(i: usize, count: usize) -> f64 {
    if count <= 1 {
        return 0.0;
    }
    if i + 1 == count {
        return 1.0;
    }
    i as f64 / (count - 1) as f64
}

fn chord_length_params(waypoints: &[Position]) -> Vec<f64> {
    let mut cumulative = Vec::with_capacity(waypoints.len());
    let mut total = 0.0;
    cumulative.push(0.0);
    for pair in waypoints.windows(2) {
        total += nalgebra::distance(&pair[0], &pair[1]);
        cumulative.push(total);
    }

    let last = waypoints.len() - 1;
    if total <= f64::EPSILON {
        return (0..waypoints.len())
            .map(|i| i as f64 / last as f64)
            .collect();
    }

    let mut params: Vec<f64> = cumulative.into_iter().map(|d| d / total).collect();
    params[last] = 1.0;
    params
}

fn bernstein(degree: usize, k: usize, u: f64) -> f64 {
    binomial(degree, k) * u.powi(k as i32) * (1.0 - u).powi((degree - k) as i32)
}

fn binomial(n: usize, k: usize) -> f64 {
    let k = k.min(n - k);
    (0..k).fold(1.0, |acc, i| acc * (n - i) as f64 / (i + 1) as f64)
}

/// Turns waypoint lists into fixed-length trajectories.
///
/// All trajectories produced by one generator share the same sample count
/// and parameter spacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrajectoryGenerator {
    max_degree: usize,
    sample_count: usize,
}

impl TrajectoryGenerator {
    pub fn new(max_degree: usize, sample_count: usize) -> Self {
        Self {
            max_degree,
            sample_count,
        }
    }

    pub fn from_config(config: &DeconflictConfig) -> Self {
        Self::new(config.max_degree, config.sample_count)
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    pub fn max_degree(&self) -> usize {
        self.max_degree
    }

    /// Generate the trajectory for one drone's waypoints.
    pub fn generate(&self, drone_id: &str, waypoints: &[Position]) -> Result<Trajectory> {
        if self.sample_count == 0 {
            return Err(DeconflictError::InvalidConfig(
                "sample_count must be at least 1".to_string(),
            ));
        }

        let curve = BezierCurve::through(drone_id, waypoints, self.max_degree)?;
        tracing::debug!(
            "Drone {}: {} waypoints -> degree {} curve, {} samples",
            drone_id,
            waypoints.len(),
            curve.degree(),
            self.sample_count
        );
        Ok(curve.sample(self.sample_count))
    }

    pub fn generate_for(&self, drone: &Drone) -> Result<Trajectory> {
        self.generate(&drone.id, &drone.waypoints)
    }
}

impl Default for TrajectoryGenerator {
    fn default() -> Self {
        Self::from_config(&DeconflictConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(count: usize) -> Vec<Position> {
        (0..count)
            .map(|i| Position::new(i as f64, 0.0, 0.0))
            .collect()
    }

    fn zigzag(count: usize) -> Vec<Position> {
        (0..count)
            .map(|i| {
                let i = i as f64;
                Position::new(i * 3.0, if i as usize % 2 == 0 { 0.0 } else { 4.0 }, i * 0.5)
            })
            .collect()
    }

    #[test]
    fn degree_is_capped() {
        assert_eq!(curve_degree(2, 5), 1);
        assert_eq!(curve_degree(6, 5), 5);
        assert_eq!(curve_degree(7, 5), 5);
        assert_eq!(curve_degree(40, 5), 5);
        assert_eq!(curve_degree(4, 2), 2);
    }

    #[test]
    fn curve_uses_capped_degree() {
        for count in 2..=12 {
            let curve = BezierCurve::through("D", &zigzag(count), DEFAULT_MAX_DEGREE).unwrap();
            assert_eq!(curve.degree(), (count - 1).min(DEFAULT_MAX_DEGREE));
        }
    }

    #[test]
    fn endpoints_are_exact_for_every_waypoint_count() {
        let generator = TrajectoryGenerator::new(DEFAULT_MAX_DEGREE, 37);
        for count in 2..=12 {
            let waypoints = zigzag(count);
            let trajectory = generator.generate("D", &waypoints).unwrap();
            assert_eq!(trajectory.len(), 37);
            assert_eq!(trajectory.first(), waypoints.first());
            assert_eq!(trajectory.last(), waypoints.last());
        }
    }

    #[test]
    fn two_waypoints_give_a_straight_line() {
        let waypoints = [Position::new(0.0, 0.0, 0.0), Position::new(10.0, 4.0, -2.0)];
        let trajectory = TrajectoryGenerator::new(5, 11).generate("D", &waypoints).unwrap();
        let mid = trajectory.position(5).unwrap();
        assert!((mid - Position::new(5.0, 2.0, -1.0)).norm() < 1e-12);
        for (i, p) in trajectory.iter().enumerate() {
            assert!((p.x - i as f64).abs() < 1e-9, "sample {i} off the line: {p}");
        }
    }

    #[test]
    fn quadratic_matches_bernstein_form() {
        let p0 = Position::new(0.0, 0.0, 0.0);
        let p1 = Position::new(4.0, 8.0, 0.0);
        let p2 = Position::new(8.0, 0.0, 2.0);
        let curve = BezierCurve::through("D", &[p0, p1, p2], 5).unwrap();
        let expected = p0.coords * 0.25 + p1.coords * 0.5 + p2.coords * 0.25;
        assert!((curve.evaluate(0.5).coords - expected).norm() < 1e-12);
    }

    #[test]
    fn fitted_curve_reproduces_collinear_waypoints() {
        let curve = BezierCurve::through("D", &line(9), 5).unwrap();
        assert_eq!(curve.degree(), 5);
        let trajectory = curve.sample(17);
        for (i, p) in trajectory.iter().enumerate() {
            assert!((p.x - i as f64 * 0.5).abs() < 1e-6, "sample {i}: {p}");
            assert!(p.y.abs() < 1e-6 && p.z.abs() < 1e-6);
        }
    }

    #[test]
    fn coincident_waypoints_fall_back_to_uniform_parameters() {
        let waypoints = vec![Position::new(1.0, 2.0, 3.0); 8];
        let trajectory = TrajectoryGenerator::new(5, 5).generate("D", &waypoints).unwrap();
        for p in trajectory.iter() {
            assert!((p - waypoints[0]).norm() < 1e-9);
        }
    }

    #[test]
    fn hover_then_move_stays_on_its_path() {
        let mut waypoints = vec![Position::new(50.0, 50.0, 50.0); 5];
        waypoints.push(Position::new(51.0, 50.0, 50.0));
        waypoints.push(Position::new(52.0, 50.0, 50.0));

        let curve = BezierCurve::through("hover", &waypoints, 5).unwrap();
        assert_eq!(curve.degree(), 5);
        for p in curve.control_points() {
            assert!((p.y - 50.0).abs() < 1e-9 && (p.z - 50.0).abs() < 1e-9, "control point {p}");
        }
        for p in curve.sample(11).iter() {
            assert!((p.y - 50.0).abs() < 1e-9, "sample {p}");
            assert!((p.z - 50.0).abs() < 1e-9, "sample {p}");
            assert!(p.x > 50.0 - 1e-9 && p.x < 52.0 + 1e-9, "sample {p}");
        }
    }

    #[test]
    fn fit_follows_translated_waypoints() {
        let offset = Vector3::new(120.0, -75.0, 40.0);
        let waypoints = zigzag(10);
        let moved: Vec<Position> = waypoints.iter().map(|p| *p + offset).collect();

        let a = BezierCurve::through("D", &waypoints, 5).unwrap();
        let b = BezierCurve::through("D", &moved, 5).unwrap();
        for (p, q) in a.control_points().iter().zip(b.control_points()) {
            assert!((*p + offset - *q).norm() < 1e-9, "{p} + offset != {q}");
        }
        for (p, q) in a.sample(25).iter().zip(b.sample(25).iter()) {
            assert!((*p + offset - *q).norm() < 1e-9);
        }
    }

    #[test]
    fn generation_is_deterministic() {
        let generator = TrajectoryGenerator::default();
        let waypoints = zigzag(9);
        let a = generator.generate("D", &waypoints).unwrap();
        let b = generator.generate("D", &waypoints).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn too_few_waypoints_are_rejected() {
        let generator = TrajectoryGenerator::default();
        for waypoints in [vec![], vec![Position::origin()]] {
            let err = generator.generate("short", &waypoints).unwrap_err();
            assert!(matches!(err, DeconflictError::InvalidWaypoints { .. }));
            assert_eq!(err.drone_id(), Some("short"));
        }
    }

    #[test]
    fn zero_samples_is_a_config_error() {
        let err = TrajectoryGenerator::new(5, 0).generate("D", &line(2)).unwrap_err();
        assert!(matches!(err, DeconflictError::InvalidConfig(_)));
    }

    #[test]
    fn single_sample_is_the_first_waypoint() {
        let waypoints = zigzag(4);
        let trajectory = TrajectoryGenerator::new(5, 1).generate("D", &waypoints).unwrap();
        assert_eq!(trajectory.points(), &waypoints[..1]);
    }

    #[test]
    fn sample_parameters_cover_unit_interval() {
        assert_eq!(sample_parameter(0, 10), 0.0);
        assert_eq!(sample_parameter(9, 10), 1.0);
        assert!((sample_parameter(3, 10) - 1.0 / 3.0).abs() < 1e-15);
        assert_eq!(sample_parameter(0, 1), 0.0);
    }
}
