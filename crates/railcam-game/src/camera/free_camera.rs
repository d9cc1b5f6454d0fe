//! Debug fly camera
//!
//! Overrides the gameplay camera output without touching its simulation.

use glam::{EulerRot, Quat, Vec2, Vec3};
use railcam_core::{SmoothDamp, Transform};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::input::{InputAction, InputState};

use super::config::FreeCameraConfig;

/// Fly camera mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FreeCameraState {
    /// Gameplay camera is shown
    #[default]
    Off,
    /// Flying under user control, gameplay camera still shown
    Active,
    /// Flying, and shown in place of the gameplay camera
    Locked,
}

#[derive(Debug, Clone, Default)]
pub struct FreeCamera {
    state: FreeCameraState,
    position: Vec3,
    yaw: f32,
    pitch: f32,
    velocity: Vec3,
    acceleration: Vec3,
}

impl FreeCamera {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> FreeCameraState {
        self.state
    }

    /// Whether the fly camera replaces the gameplay output
    pub fn is_overriding(&self) -> bool {
        self.state == FreeCameraState::Locked
    }

    pub fn transform(&self) -> Transform {
        Transform::from_angles(self.position, self.yaw, self.pitch, 0.0)
    }

    /// Apply mode switches. Returns the new state when it changed.
    pub fn handle_input(
        &mut self,
        input: &InputState,
        gameplay: &Transform,
    ) -> Option<FreeCameraState> {
        let previous = self.state;

        if input.is_just_pressed(InputAction::ToggleFreeCamera) {
            self.state = match self.state {
                FreeCameraState::Off => {
                    self.seed(gameplay);
                    FreeCameraState::Active
                }
                FreeCameraState::Active | FreeCameraState::Locked => FreeCameraState::Off,
            };
        }
        if input.is_just_pressed(InputAction::LockFreeCamera) {
            self.state = match self.state {
                FreeCameraState::Off => FreeCameraState::Off,
                FreeCameraState::Active => FreeCameraState::Locked,
                FreeCameraState::Locked => FreeCameraState::Active,
            };
        }

        if self.state == previous {
            return None;
        }
        info!("Free camera {:?} -> {:?}", previous, self.state);
        self.velocity = Vec3::ZERO;
        self.acceleration = Vec3::ZERO;
        Some(self.state)
    }

    /// Start flying from the gameplay pose
    fn seed(&mut self, gameplay: &Transform) {
        let (yaw, pitch, _) = gameplay.rotation.to_euler(EulerRot::YXZ);
        self.position = gameplay.position;
        self.yaw = yaw;
        self.pitch = pitch;
    }

    /// Handle mouse look input
    fn handle_mouse_look(&mut self, mouse_delta: Vec2, config: &FreeCameraConfig) {
        self.yaw -= mouse_delta.x * config.sensitivity;

        self.pitch -= mouse_delta.y * config.sensitivity;
        let pitch_min = config.pitch_min.to_radians();
        let pitch_max = config.pitch_max.to_radians();
        self.pitch = self.pitch.clamp(pitch_min, pitch_max);
    }

    /// Fly for one tick. Does nothing while off.
    pub fn update(&mut self, input: &InputState, config: &FreeCameraConfig, dt: f32) {
        if self.state == FreeCameraState::Off {
            return;
        }

        if input.is_held(InputAction::FreeLook) {
            self.handle_mouse_look(input.mouse_delta, config);
        }

        let local = Vec3::new(
            input.axis(InputAction::FreeCamLeft, InputAction::FreeCamRight),
            input.axis(InputAction::FreeCamDown, InputAction::FreeCamUp),
            -input.axis(InputAction::FreeCamBackward, InputAction::FreeCamForward),
        );
        let mut speed = config.move_speed;
        if input.is_held(InputAction::FreeBoost) {
            speed *= config.boost_multiplier;
        }
        let rotation = Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, 0.0);
        let target = rotation * local.normalize_or_zero() * speed;

        self.velocity = self.velocity.smooth_damp(
            target,
            &mut self.acceleration,
            config.smoothing,
            f32::INFINITY,
            dt,
        );
        self.position += self.velocity * dt.max(0.0);
    }
}
