//! Motion blur parameters derived from camera motion

use glam::Vec3;
use railcam_core::{move_toward, Transform};
use tracing::debug;

use super::config::CameraConfig;

/// Floor for the time scale divisor
const MIN_TIME_SCALE: f32 = 1.0e-3;

/// Per-tick parameters for the renderer's blur pass
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MotionBlurParams {
    /// Blend of the blur pass (0 = off)
    pub opacity: f32,
    /// Camera displacement since last tick
    pub linear_velocity: Vec3,
    /// Camera rotation since last tick (axis scaled by angle)
    pub angular_velocity: Vec3,
}

/// Reference-counted motion blur with a fading opacity
#[derive(Debug, Clone, Default)]
pub struct MotionBlurController {
    requests: u32,
    opacity: f32,
    previous: Option<Transform>,
}

impl MotionBlurController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_start(&mut self) {
        self.requests = self.requests.saturating_add(1);
        if self.requests == 1 {
            debug!("Motion blur requested");
        }
    }

    pub fn request_stop(&mut self) {
        self.requests = self.requests.saturating_sub(1);
    }

    /// Outstanding blur requests
    pub fn requests(&self) -> u32 {
        self.requests
    }

    /// Forget the previous pose so the next tick reports no motion
    pub fn reset_history(&mut self) {
        self.previous = None;
    }

    pub fn update(
        &mut self,
        dt: f32,
        pose: &Transform,
        time_scale: f32,
        time_break: bool,
        config: &CameraConfig,
        enabled: bool,
    ) -> MotionBlurParams {
        let target = if enabled && self.requests > 0 { 1.0 } else { 0.0 };
        let rate = config.motion_blur_fade_speed.max(0.0);
        self.opacity = move_toward(self.opacity, target, rate * dt.max(0.0));

        let (linear_velocity, angular_velocity) = match self.previous {
            Some(previous) => {
                let mut linear = pose.position - previous.position;
                if time_break {
                    linear *= config.time_break_blur_scale;
                }
                linear /= time_scale.max(MIN_TIME_SCALE);

                let (axis, angle) = (pose.rotation * previous.rotation.inverse())
                    .normalize()
                    .to_axis_angle();
                // Take the short way round
                let angle = if angle > std::f32::consts::PI {
                    angle - std::f32::consts::TAU
                } else {
                    angle
                };
                (linear, axis * angle)
            }
            None => (Vec3::ZERO, Vec3::ZERO),
        };
        self.previous = Some(*pose);

        MotionBlurParams {
            opacity: self.opacity,
            linear_velocity,
            angular_velocity,
        }
    }
}
