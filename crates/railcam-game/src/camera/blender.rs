//! Weighted combination of the blend stack into a single camera candidate

use glam::{EulerRot, Quat, Vec2, Vec3};
use railcam_core::lerp_angle;
use railcam_world::PathSample;

use super::blend::BlendEntry;

/// Camera geometry computed for one profile, before it is turned into a transform.
///
/// Blending works on these fields rather than on finished transforms so that a
/// large change in orientation swings the camera around its pivot instead of
/// cutting straight through it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraCandidate {
    /// Orientation frame the angles are applied in
    pub basis: Quat,
    /// Precalculated position, used in proportion to `static_ratio`
    pub static_position: Vec3,
    /// 1 for fixed-position profiles, 0 for path-following ones
    pub static_ratio: f32,
    pub distance: f32,
    pub yaw: f32,
    pub pitch: f32,
    pub tilt: f32,
    /// Pivot offset from the path centre (x = lateral, y = vertical)
    pub tracking_offset: Vec2,
    pub viewport_offset: Vec2,
    /// Vertical field of view in degrees
    pub fov: f32,
    /// How strongly lock-on adjustments apply
    pub lockon_weight: f32,
}

impl Default for CameraCandidate {
    fn default() -> Self {
        Self {
            basis: Quat::IDENTITY,
            static_position: Vec3::ZERO,
            static_ratio: 0.0,
            distance: 0.0,
            yaw: 0.0,
            pitch: 0.0,
            tilt: 0.0,
            tracking_offset: Vec2::ZERO,
            viewport_offset: Vec2::ZERO,
            fov: 70.0,
            lockon_weight: 1.0,
        }
    }
}

impl CameraCandidate {
    /// Interpolate toward `other` by `t`
    pub fn lerp(&self, other: &CameraCandidate, t: f32) -> CameraCandidate {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: f32, b: f32| a + (b - a) * t;
        CameraCandidate {
            basis: self.basis.slerp(other.basis, t),
            static_position: self.static_position.lerp(other.static_position, t),
            static_ratio: mix(self.static_ratio, other.static_ratio),
            distance: mix(self.distance, other.distance),
            yaw: lerp_angle(self.yaw, other.yaw, t),
            pitch: lerp_angle(self.pitch, other.pitch, t),
            tilt: lerp_angle(self.tilt, other.tilt, t),
            tracking_offset: self.tracking_offset.lerp(other.tracking_offset, t),
            viewport_offset: self.viewport_offset.lerp(other.viewport_offset, t),
            fov: mix(self.fov, other.fov),
            lockon_weight: mix(self.lockon_weight, other.lockon_weight),
        }
    }

    /// Camera orientation
    pub fn rotation(&self) -> Quat {
        self.basis * Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, self.tilt)
    }

    /// Point the camera orbits around
    pub fn pivot(&self, sample: &PathSample, pivot_height: f32) -> Vec3 {
        sample.position
            + sample.right() * self.tracking_offset.x
            + sample.up() * (self.tracking_offset.y + pivot_height)
    }

    /// Position derived from orientation and distance around the pivot
    pub fn orbit_position(&self, sample: &PathSample, pivot_height: f32) -> Vec3 {
        let local = Vec3::new(
            self.viewport_offset.x,
            self.viewport_offset.y,
            self.distance,
        );
        self.pivot(sample, pivot_height) + self.rotation() * local
    }

    /// Final camera position
    pub fn position(&self, sample: &PathSample, pivot_height: f32) -> Vec3 {
        let orbit = self.orbit_position(sample, pivot_height);
        orbit.lerp(self.static_position, self.static_ratio.clamp(0.0, 1.0))
    }
}

/// Fold every entry into one candidate, oldest first.
///
/// The oldest group is the base. Each later group is mixed in by its smoothed
/// influence. A distance-blend pair is first combined by the second member's
/// overlap ratio and then mixed in at the first member's influence.
pub fn blend_entries<F>(entries: &mut [BlendEntry], mut simulate: F) -> CameraCandidate
where
    F: FnMut(&mut BlendEntry) -> CameraCandidate,
{
    let mut accumulated: Option<CameraCandidate> = None;
    let mut index = 0;

    while index < entries.len() {
        let influence = entries[index].smoothed_influence();
        let paired = entries
            .get(index + 1)
            .is_some_and(|next| next.is_paired_with_previous());

        let candidate = if paired {
            let ratio = entries[index + 1].distance_blend_ratio();
            let lead = simulate(&mut entries[index]);
            let tail = simulate(&mut entries[index + 1]);
            index += 2;
            lead.lerp(&tail, ratio)
        } else {
            let candidate = simulate(&mut entries[index]);
            index += 1;
            candidate
        };

        accumulated = Some(match accumulated {
            None => candidate,
            Some(previous) => previous.lerp(&candidate, influence),
        });
    }

    accumulated.unwrap_or_default()
}
