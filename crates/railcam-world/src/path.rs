//! Level path (spline) access
//!
//! Progress is measured in world units along the path. The camera reads the
//! path at the actor's progress and at points behind it.

use glam::{Mat3, Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// A position and orientation read from the path
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathSample {
    /// World position on the path
    pub position: Vec3,
    /// Orthonormal frame: local -Z is the path direction, +Y is up
    pub rotation: Quat,
    /// Roll of the frame around the path direction (radians)
    pub tilt: f32,
}

impl Default for PathSample {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            tilt: 0.0,
        }
    }
}

impl PathSample {
    /// Path direction at this sample
    pub fn forward(&self) -> Vec3 {
        self.rotation * -Vec3::Z
    }

    /// Up vector of the path frame
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    /// Side axis of the path frame
    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    /// True when every component is finite
    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.rotation.is_finite() && self.tilt.is_finite()
    }
}

/// Service exposing the level path the actor runs along
pub trait PathService {
    /// Sample at `progress`, displaced by `offset` (x = lateral, y = vertical)
    fn sample(&self, progress: f32, offset: Vec2) -> PathSample;

    /// Progress of the point on the path closest to `position`
    fn closest_progress(&self, position: Vec3) -> f32;

    /// The actor's current progress
    fn progress(&self) -> f32;

    /// Whether progress wraps around
    fn is_looping(&self) -> bool;

    /// Total length in world units
    fn length(&self) -> f32;
}

/// A control point of a [`PolylinePath`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathPoint {
    pub position: Vec3,
    /// Banking angle at this point (radians)
    #[serde(default)]
    pub tilt: f32,
}

impl PathPoint {
    pub fn new(position: Vec3) -> Self {
        Self { position, tilt: 0.0 }
    }

    pub fn with_tilt(position: Vec3, tilt: f32) -> Self {
        Self { position, tilt }
    }
}

/// Piecewise-linear path with per-point tilt
#[derive(Debug, Clone)]
pub struct PolylinePath {
    points: Vec<PathPoint>,
    /// Distance along the path at the start of each segment, plus the total
    cumulative: Vec<f32>,
    looping: bool,
    progress: f32,
}

impl PolylinePath {
    /// Build a path through `points`. A looping path closes back to the first point.
    pub fn new(points: Vec<PathPoint>, looping: bool) -> Self {
        let mut path = Self {
            points,
            cumulative: Vec::new(),
            looping,
            progress: 0.0,
        };
        path.rebuild_lengths();
        path
    }

    /// Straight path from `start` along `direction` for `length` units
    pub fn straight(start: Vec3, direction: Vec3, length: f32) -> Self {
        let direction = direction.normalize_or_zero();
        Self::new(
            vec![
                PathPoint::new(start),
                PathPoint::new(start + direction * length),
            ],
            false,
        )
    }

    fn segment_count(&self) -> usize {
        match self.points.len() {
            0 | 1 => 0,
            n if self.looping => n,
            n => n - 1,
        }
    }

    fn rebuild_lengths(&mut self) {
        let mut total = 0.0;
        self.cumulative.clear();
        self.cumulative.push(0.0);
        for i in 0..self.segment_count() {
            let (a, b) = self.segment(i);
            total += a.position.distance(b.position);
            self.cumulative.push(total);
        }
    }

    fn segment(&self, index: usize) -> (PathPoint, PathPoint) {
        let a = self.points[index];
        let b = self.points[(index + 1) % self.points.len()];
        (a, b)
    }

    fn wrap(&self, progress: f32) -> f32 {
        let length = self.length();
        if length <= 0.0 {
            0.0
        } else if self.looping {
            progress.rem_euclid(length)
        } else {
            progress.clamp(0.0, length)
        }
    }

    /// Segment index and interpolation factor for a wrapped progress
    fn locate(&self, progress: f32) -> (usize, f32) {
        let segments = self.segment_count();
        let index = self
            .cumulative
            .partition_point(|&start| start <= progress)
            .saturating_sub(1)
            .min(segments - 1);
        let start = self.cumulative[index];
        let span = self.cumulative[index + 1] - start;
        let t = if span > 0.0 {
            ((progress - start) / span).clamp(0.0, 1.0)
        } else {
            0.0
        };
        (index, t)
    }

    /// Set the actor's progress
    pub fn set_progress(&mut self, progress: f32) {
        self.progress = self.wrap(progress);
    }

    /// Move the actor's progress by `delta`
    pub fn advance(&mut self, delta: f32) {
        self.set_progress(self.progress + delta);
    }

    pub fn points(&self) -> &[PathPoint] {
        &self.points
    }
}

/// Orthonormal frame looking along `forward`, rolled by `tilt`
fn path_frame(forward: Vec3, tilt: f32) -> Quat {
    let forward = if forward.length_squared() > f32::EPSILON {
        forward.normalize()
    } else {
        -Vec3::Z
    };
    let reference = if forward.y.abs() > 0.999 { Vec3::Z } else { Vec3::Y };
    let right = forward.cross(reference).normalize();
    let up = right.cross(forward);
    let base = Quat::from_mat3(&Mat3::from_cols(right, up, -forward));
    base * Quat::from_rotation_z(tilt)
}

impl PathService for PolylinePath {
    fn sample(&self, progress: f32, offset: Vec2) -> PathSample {
        let (position, forward, tilt) = match self.points.len() {
            0 => (Vec3::ZERO, -Vec3::Z, 0.0),
            1 => (self.points[0].position, -Vec3::Z, self.points[0].tilt),
            _ => {
                let (index, t) = self.locate(self.wrap(progress));
                let (a, b) = self.segment(index);
                (
                    a.position.lerp(b.position, t),
                    b.position - a.position,
                    a.tilt + (b.tilt - a.tilt) * t,
                )
            }
        };

        let rotation = path_frame(forward, tilt);
        PathSample {
            position: position + rotation * Vec3::new(offset.x, offset.y, 0.0),
            rotation,
            tilt,
        }
    }

    fn closest_progress(&self, position: Vec3) -> f32 {
        let mut best = (f32::MAX, 0.0);
        for i in 0..self.segment_count() {
            let (a, b) = self.segment(i);
            let ab = b.position - a.position;
            let length_sq = ab.length_squared();
            let t = if length_sq > 0.0 {
                ((position - a.position).dot(ab) / length_sq).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let distance = position.distance_squared(a.position + ab * t);
            if distance < best.0 {
                let span = self.cumulative[i + 1] - self.cumulative[i];
                best = (distance, self.cumulative[i] + span * t);
            }
        }
        best.1
    }

    fn progress(&self) -> f32 {
        self.progress
    }

    fn is_looping(&self) -> bool {
        self.looping
    }

    fn length(&self) -> f32 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }
}

/// Caches the last valid path sample so the camera never reads NaN
#[derive(Debug, Clone, Default)]
pub struct PathSampler {
    current: PathSample,
    progress: f32,
    looping: bool,
    valid: bool,
}

impl PathSampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the path at its current progress. Keeps the previous sample when
    /// the path is missing or returns non-finite data.
    pub fn refresh(&mut self, path: Option<&dyn PathService>) -> PathSample {
        if let Some(path) = path {
            let progress = path.progress();
            let sample = path.sample(progress, Vec2::ZERO);
            if progress.is_finite() && sample.is_finite() {
                self.current = sample;
                self.progress = progress;
                self.looping = path.is_looping();
                self.valid = true;
            } else {
                warn!("Ignoring non-finite path sample at progress {}", progress);
            }
        }
        self.current
    }

    /// Sample `distance` units behind the current progress, falling back to
    /// the current sample.
    pub fn sample_behind(&self, path: Option<&dyn PathService>, distance: f32) -> PathSample {
        let Some(path) = path else {
            return self.current;
        };
        let sample = path.sample(self.progress - distance, Vec2::ZERO);
        if sample.is_finite() {
            sample
        } else {
            self.current
        }
    }

    /// Last valid sample at the actor's progress
    pub fn current(&self) -> PathSample {
        self.current
    }

    /// Progress of the last valid sample
    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    /// Whether any valid sample has been read yet
    pub fn has_sample(&self) -> bool {
        self.valid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn l_path() -> PolylinePath {
        PolylinePath::new(
            vec![
                PathPoint::new(Vec3::ZERO),
                PathPoint::new(Vec3::new(0.0, 0.0, -10.0)),
                PathPoint::new(Vec3::new(10.0, 0.0, -10.0)),
            ],
            false,
        )
    }

    #[test]
    fn test_length_and_sample_positions() {
        let path = l_path();
        assert!((path.length() - 20.0).abs() < 1e-5);

        let sample = path.sample(5.0, Vec2::ZERO);
        assert!(sample.position.distance(Vec3::new(0.0, 0.0, -5.0)) < 1e-5);
        assert!(sample.forward().distance(-Vec3::Z) < 1e-5);
        assert!(sample.right().distance(Vec3::X) < 1e-5);

        let sample = path.sample(15.0, Vec2::ZERO);
        assert!(sample.position.distance(Vec3::new(5.0, 0.0, -10.0)) < 1e-5);
        assert!(sample.forward().distance(Vec3::X) < 1e-5);
    }

    #[test]
    fn test_non_looping_path_clamps_progress() {
        let path = l_path();
        let before = path.sample(-5.0, Vec2::ZERO);
        assert!(before.position.distance(Vec3::ZERO) < 1e-5);
        let after = path.sample(50.0, Vec2::ZERO);
        assert!(after.position.distance(Vec3::new(10.0, 0.0, -10.0)) < 1e-5);
    }

    #[test]
    fn test_looping_path_wraps() {
        let path = PolylinePath::new(
            vec![
                PathPoint::new(Vec3::ZERO),
                PathPoint::new(Vec3::new(10.0, 0.0, 0.0)),
                PathPoint::new(Vec3::new(10.0, 0.0, 10.0)),
                PathPoint::new(Vec3::new(0.0, 0.0, 10.0)),
            ],
            true,
        );
        assert!((path.length() - 40.0).abs() < 1e-5);
        let a = path.sample(-5.0, Vec2::ZERO);
        let b = path.sample(35.0, Vec2::ZERO);
        assert!(a.position.distance(b.position) < 1e-4);
    }

    #[test]
    fn test_offset_sample_is_lateral() {
        let path = PolylinePath::straight(Vec3::ZERO, -Vec3::Z, 10.0);
        let sample = path.sample(2.0, Vec2::new(1.5, 0.5));
        assert!(sample.position.distance(Vec3::new(1.5, 0.5, -2.0)) < 1e-5);
    }

    #[test]
    fn test_tilt_rolls_side_axis() {
        let path = PolylinePath::new(
            vec![
                PathPoint::with_tilt(Vec3::ZERO, FRAC_PI_2),
                PathPoint::with_tilt(Vec3::new(0.0, 0.0, -10.0), FRAC_PI_2),
            ],
            false,
        );
        let sample = path.sample(5.0, Vec2::ZERO);
        assert!(sample.right().distance(Vec3::Y) < 1e-4);
        assert!(sample.forward().distance(-Vec3::Z) < 1e-4);
    }

    #[test]
    fn test_closest_progress() {
        let path = l_path();
        let progress = path.closest_progress(Vec3::new(1.0, 3.0, -4.0));
        assert!((progress - 4.0).abs() < 1e-4);
        let progress = path.closest_progress(Vec3::new(6.0, 0.0, -12.0));
        assert!((progress - 16.0).abs() < 1e-4);
    }

    #[test]
    fn test_sampler_keeps_last_sample_without_path() {
        let mut path = PolylinePath::straight(Vec3::ZERO, -Vec3::Z, 100.0);
        path.set_progress(30.0);

        let mut sampler = PathSampler::new();
        assert!(!sampler.has_sample());
        let sample = sampler.refresh(Some(&path));
        assert!(sampler.has_sample());
        assert!(sample.position.distance(Vec3::new(0.0, 0.0, -30.0)) < 1e-4);

        let fallback = sampler.refresh(None);
        assert_eq!(fallback, sample);
        assert_eq!(sampler.sample_behind(None, 10.0), sample);

        let behind = sampler.sample_behind(Some(&path), 10.0);
        assert!(behind.position.distance(Vec3::new(0.0, 0.0, -20.0)) < 1e-4);
    }
}
