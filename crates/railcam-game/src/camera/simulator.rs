//! Per-profile camera simulation
//!
//! Turns a profile plus the current actor and path state into a
//! [`CameraCandidate`], advancing the entry's own smoothing state.

use std::f32::consts::PI;

use glam::{EulerRot, Quat, Vec2, Vec3};
use railcam_core::{elevation, heading, lerp_angle, move_toward, signed_angle, SmoothDamp};
use railcam_world::{ActorState, PathSample, PathSampler, PathService};

use super::blend::EntryState;
use super::blender::CameraCandidate;
use super::config::CameraConfig;
use super::profile::{CameraProfile, DistanceMode, TrackingMode};

/// Reach used for tracking rotation when the camera sits on its pivot
const MIN_TRACKING_REACH: f32 = 0.5;

/// Inputs shared by every entry during one tick
pub struct SimulationContext<'a> {
    pub config: &'a CameraConfig,
    pub actor: &'a ActorState,
    pub sampler: &'a PathSampler,
    pub path: Option<&'a dyn PathService>,
    /// Complete every smoothing step instantly
    pub snap: bool,
    /// Smoothed "any lock-on active" ratio from the previous tick
    pub lockon_blend: f32,
    pub dt: f32,
}

/// Simulate one entry
pub fn simulate(
    profile: &CameraProfile,
    state: &mut EntryState,
    ctx: &SimulationContext<'_>,
) -> CameraCandidate {
    let snap = ctx.snap || !state.initialized;
    state.fov = if profile.fov > 0.0 {
        profile.fov
    } else {
        ctx.config.default_fov
    };

    let candidate = if profile.copy_position {
        simulate_static(profile, state, ctx)
    } else {
        simulate_dynamic(profile, state, ctx, snap)
    };

    state.initialized = true;
    candidate
}

/// Actor displacement from the path centre along the sample's side and up axes
fn lateral_delta(actor: &ActorState, sample: &PathSample) -> Vec2 {
    let delta = actor.position - sample.position;
    Vec2::new(delta.dot(sample.right()), delta.dot(sample.up()))
}

fn simulate_static(
    profile: &CameraProfile,
    state: &mut EntryState,
    ctx: &SimulationContext<'_>,
) -> CameraCandidate {
    let sample = ctx.sampler.current();
    let tracking = lateral_delta(ctx.actor, &sample);

    let probe = CameraCandidate {
        tracking_offset: tracking,
        ..Default::default()
    };
    let to_actor = probe.pivot(&sample, ctx.config.pivot_height) - state.static_position;

    let (basis, yaw, pitch) = if profile.copy_rotation {
        (state.static_rotation, 0.0, 0.0)
    } else {
        let away = -to_actor;
        let yaw = heading(away) + PI;
        let pitch = -elevation(away);
        (
            Quat::IDENTITY,
            profile.yaw_mode.apply(yaw, profile.yaw),
            profile.pitch_mode.apply(pitch, profile.pitch),
        )
    };

    state.distance = to_actor.length();
    state.distance_velocity = 0.0;
    state.yaw = yaw;
    state.pitch = pitch;
    state.tracking_offset = tracking;

    CameraCandidate {
        basis,
        static_position: state.static_position,
        static_ratio: 1.0,
        distance: state.distance,
        yaw,
        pitch,
        tilt: 0.0,
        tracking_offset: tracking,
        viewport_offset: profile.viewport_offset,
        fov: state.fov,
        lockon_weight: if profile.ignore_lockon { 0.0 } else { 1.0 },
    }
}

fn simulate_dynamic(
    profile: &CameraProfile,
    state: &mut EntryState,
    ctx: &SimulationContext<'_>,
    snap: bool,
) -> CameraCandidate {
    let config = ctx.config;
    let actor = ctx.actor;
    let sample = ctx.sampler.current();
    let dt = ctx.dt;

    // Distance
    let mut target = profile.distance;
    if actor.moving_backward {
        target += profile.backstep_distance;
    }
    if !profile.ignore_lockon {
        target += config.lockon_distance_bonus * ctx.lockon_blend;
    }
    if ctx.sampler.has_sample() && !ctx.sampler.is_looping() {
        target = target.min(ctx.sampler.progress().max(0.0));
    }

    if snap || (actor.moving_backward && target < state.distance) {
        state.distance = target;
        state.distance_velocity = 0.0;
    } else {
        state.distance = state.distance.smooth_damp(
            target,
            &mut state.distance_velocity,
            config.distance_smoothing,
            config.distance_max_speed,
            dt,
        );
    }

    // Live and sampled directions
    let live_forward = if actor.forward.length_squared() > f32::EPSILON {
        actor.forward.normalize()
    } else {
        sample.forward()
    };
    let sampled_forward = ctx
        .sampler
        .sample_behind(ctx.path, state.distance + profile.sample_offset)
        .forward();

    let blend_target = match profile.distance_mode {
        DistanceMode::Offset => 0.0,
        DistanceMode::Sample => 1.0,
        DistanceMode::Auto => {
            if sampled_forward.y - live_forward.y > config.slope_threshold {
                1.0
            } else {
                0.0
            }
        }
    };
    state.sample_blend = if profile.distance_mode == DistanceMode::Auto && !snap {
        move_toward(
            state.sample_blend,
            blend_target,
            config.sample_blend_speed * dt.max(0.0),
        )
    } else {
        blend_target
    };

    let yaw = lerp_angle(
        heading(live_forward),
        heading(sampled_forward),
        state.sample_blend,
    );
    let pitch = lerp_angle(
        elevation(live_forward),
        elevation(sampled_forward),
        state.sample_blend,
    );
    let mut yaw = profile.yaw_mode.apply(yaw, profile.yaw);
    let mut pitch = profile.pitch_mode.apply(pitch, profile.pitch);

    // Tracking
    let delta = lateral_delta(actor, &sample);
    let reach = state.distance.max(MIN_TRACKING_REACH);

    let horizontal = match profile.horizontal_tracking {
        TrackingMode::Move if profile.hall_width > 0.0 => {
            let hall = profile.hall_width;
            let clamped = delta.x.clamp(-hall, hall);
            let offset = if snap {
                state.tracking_velocity.x = 0.0;
                clamped
            } else {
                state.tracking_offset.x.smooth_damp(
                    clamped,
                    &mut state.tracking_velocity.x,
                    config.hall_smoothing,
                    f32::INFINITY,
                    dt,
                )
            };
            yaw -= (delta.x - clamped) * profile.hall_rotation_strength;
            offset.clamp(-hall, hall)
        }
        TrackingMode::Move => delta.x,
        TrackingMode::Rotate => {
            yaw -= delta.x.atan2(reach);
            0.0
        }
        TrackingMode::Disable => 0.0,
    };

    let vertical = match profile.vertical_tracking {
        TrackingMode::Move => delta.y,
        TrackingMode::Rotate => {
            pitch += delta.y.atan2(reach);
            0.0
        }
        TrackingMode::Disable => 0.0,
    };
    state.tracking_offset = Vec2::new(horizontal, vertical);

    // Roll with the path's banking
    let tilt = if profile.follow_path_tilt {
        let unrolled = Quat::from_euler(EulerRot::YXZ, yaw, pitch, 0.0);
        signed_angle(unrolled * Vec3::X, sample.right(), unrolled * Vec3::Z)
    } else {
        0.0
    };

    state.yaw = yaw;
    state.pitch = pitch;

    let mut candidate = CameraCandidate {
        basis: Quat::IDENTITY,
        static_position: Vec3::ZERO,
        static_ratio: 0.0,
        distance: state.distance,
        yaw,
        pitch,
        tilt,
        tracking_offset: state.tracking_offset,
        viewport_offset: profile.viewport_offset,
        fov: state.fov,
        lockon_weight: if profile.ignore_lockon { 0.0 } else { 1.0 },
    };
    // Static blends mix toward where this camera actually is.
    candidate.static_position = candidate.orbit_position(&sample, config.pivot_height);
    candidate
}
