//! Lock-on framing
//!
//! Tracks how strongly the camera should frame a focus target together with
//! the actor, and how far to tilt toward it.

use glam::Vec3;
use railcam_core::{elevation, SmoothDamp};
use railcam_world::{ActorState, TargetId};
use tracing::debug;

use super::config::CameraConfig;

/// Difference below which a newly acquired pitch offset counts as settled
const PITCH_SETTLE_EPSILON: f32 = 1.0e-3;

/// Smoothed lock-on ratios and pitch offset
#[derive(Debug, Clone, Default)]
pub struct LockOnTracker {
    blend: f32,
    blend_velocity: f32,
    target_blend: f32,
    target_blend_velocity: f32,
    focus: Option<TargetId>,
    pitch_offset: f32,
    pitch_velocity: f32,
    acquiring: bool,
}

impl LockOnTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// "Any lock-on active" ratio
    pub fn blend(&self) -> f32 {
        self.blend
    }

    /// "Concrete focus present" ratio
    pub fn target_blend(&self) -> f32 {
        self.target_blend
    }

    /// Raw pitch offset toward the focus (radians)
    pub fn pitch_offset(&self) -> f32 {
        self.pitch_offset
    }

    /// Focus currently being tracked
    pub fn focus(&self) -> Option<TargetId> {
        self.focus
    }

    /// Pitch to add for a candidate with the given lock-on weight
    pub fn pitch_adjustment(&self, lockon_weight: f32) -> f32 {
        self.pitch_offset * self.target_blend * lockon_weight
    }

    /// Advance the ratios and pitch offset for one tick.
    ///
    /// `camera_position` is the blended camera position before lock-on.
    pub fn update(
        &mut self,
        actor: &ActorState,
        camera_position: Vec3,
        config: &CameraConfig,
        snap: bool,
        dt: f32,
    ) {
        let focus = actor.focus;
        let focus_id = focus.map(|f| f.id);
        if focus_id != self.focus {
            // Losing the focus lets the ratio fall; only a new focus restarts it.
            if focus_id.is_some() {
                debug!("Camera lock-on acquired new focus");
                self.acquiring = true;
                self.target_blend = 0.0;
                self.target_blend_velocity = 0.0;
            }
            self.focus = focus_id;
        }

        let wants_blend = actor.lockon_moment || focus.is_some();
        let blend_target = if wants_blend { 1.0 } else { 0.0 };
        let rise_or_fall = if blend_target > self.blend {
            config.lockon_rise_time
        } else {
            config.lockon_fall_time
        };
        let target_blend_target = if focus.is_some() { 1.0 } else { 0.0 };

        if snap {
            self.blend = blend_target;
            self.blend_velocity = 0.0;
            self.target_blend = target_blend_target;
            self.target_blend_velocity = 0.0;
        } else {
            self.blend = self
                .blend
                .smooth_damp(blend_target, &mut self.blend_velocity, rise_or_fall, f32::INFINITY, dt)
                .clamp(0.0, 1.0);
            self.target_blend = self
                .target_blend
                .smooth_damp(
                    target_blend_target,
                    &mut self.target_blend_velocity,
                    config.lockon_fall_time,
                    f32::INFINITY,
                    dt,
                )
                .clamp(0.0, 1.0);
        }

        // Without a focus the last offset is held while the ratio fades out.
        let Some(focus) = focus else {
            self.acquiring = false;
            return;
        };

        let midpoint = (focus.position + actor.position) * 0.5;
        let target = elevation(midpoint - camera_position) - elevation(actor.position - camera_position);

        if snap || !self.acquiring {
            self.pitch_offset = target;
            self.pitch_velocity = 0.0;
            self.acquiring = false;
            return;
        }

        self.pitch_offset = self.pitch_offset.smooth_damp(
            target,
            &mut self.pitch_velocity,
            config.lockon_pitch_smoothing,
            f32::INFINITY,
            dt,
        );
        if (self.pitch_offset - target).abs() < PITCH_SETTLE_EPSILON {
            self.pitch_offset = target;
            self.pitch_velocity = 0.0;
            self.acquiring = false;
        }
    }

    /// Drop every ratio and the tracked focus
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
