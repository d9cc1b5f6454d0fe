//! Railcam Core - Shared types and math for the Railcam camera stack
//!
//! This crate provides the foundations used by the world and camera crates:
//! - Mathematical primitives (re-exported from glam)
//! - A position/rotation transform for cameras and actors
//! - Fixed-timestep game time with time scaling
//! - Critically damped smoothing and angle helpers

pub mod math;
pub mod time;
pub mod types;

pub use glam::{EulerRot, Mat3, Mat4, Quat, Vec2, Vec3, Vec4};
pub use math::{
    delta_angle, elevation, heading, lerp_angle, move_toward, signed_angle, smooth_damp_angle,
    smoothstep, SmoothDamp, MIN_SMOOTH_TIME,
};
pub use time::{GameTime, TimeConfig};
pub use types::Transform;
