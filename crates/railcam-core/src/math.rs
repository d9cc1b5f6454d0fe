//! Smoothing and angle helpers
//!
//! Every camera value that eases toward a target goes through [`SmoothDamp`],
//! a critically damped spring with a bounded speed. It never overshoots the
//! target and returns the current value unchanged when `dt <= 0`.

use std::f32::consts::{PI, TAU};

use glam::{Vec2, Vec3};

/// Smoothing times are floored to this value to keep `2 / smooth_time` finite.
pub const MIN_SMOOTH_TIME: f32 = 1.0e-4;

/// Critically damped smoothing toward a target.
///
/// `velocity` is caller-owned state that must persist between calls for the
/// same value. `max_speed` bounds how fast the value may travel (use
/// `f32::INFINITY` for no bound).
pub trait SmoothDamp: Sized + Copy {
    fn smooth_damp(
        self,
        target: Self,
        velocity: &mut Self,
        smooth_time: f32,
        max_speed: f32,
        dt: f32,
    ) -> Self;
}

/// Returns `(omega, decay)` for the spring approximation.
#[inline]
fn spring_terms(smooth_time: f32, dt: f32) -> (f32, f32) {
    let omega = 2.0 / smooth_time.max(MIN_SMOOTH_TIME);
    let x = omega * dt;
    let decay = 1.0 / (1.0 + x + 0.48 * x * x + 0.235 * x * x * x);
    (omega, decay)
}

impl SmoothDamp for f32 {
    fn smooth_damp(
        self,
        target: f32,
        velocity: &mut f32,
        smooth_time: f32,
        max_speed: f32,
        dt: f32,
    ) -> f32 {
        if dt <= 0.0 {
            return self;
        }

        let smooth_time = smooth_time.max(MIN_SMOOTH_TIME);
        let (omega, decay) = spring_terms(smooth_time, dt);

        let max_change = max_speed.max(0.0) * smooth_time;
        let change = (self - target).clamp(-max_change, max_change);
        let clamped_target = self - change;

        let temp = (*velocity + omega * change) * dt;
        *velocity = (*velocity - omega * temp) * decay;
        let mut output = clamped_target + (change + temp) * decay;

        if (target - self > 0.0) == (output > target) {
            output = target;
            *velocity = 0.0;
        }
        output
    }
}

macro_rules! impl_smooth_damp_vec {
    ($ty:ty) => {
        impl SmoothDamp for $ty {
            fn smooth_damp(
                self,
                target: $ty,
                velocity: &mut $ty,
                smooth_time: f32,
                max_speed: f32,
                dt: f32,
            ) -> $ty {
                if dt <= 0.0 {
                    return self;
                }

                let smooth_time = smooth_time.max(MIN_SMOOTH_TIME);
                let (omega, decay) = spring_terms(smooth_time, dt);

                let max_change = max_speed.max(0.0) * smooth_time;
                let mut change = self - target;
                let length = change.length();
                if length > max_change {
                    change = change / length * max_change;
                }
                let clamped_target = self - change;

                let temp = (*velocity + change * omega) * dt;
                *velocity = (*velocity - temp * omega) * decay;
                let mut output = clamped_target + (change + temp) * decay;

                if (target - self).dot(output - target) > 0.0 {
                    output = target;
                    *velocity = <$ty>::ZERO;
                }
                output
            }
        }
    };
}

impl_smooth_damp_vec!(Vec2);
impl_smooth_damp_vec!(Vec3);

/// [`SmoothDamp`] for angles in radians, always taking the shortest way around.
pub fn smooth_damp_angle(
    current: f32,
    target: f32,
    velocity: &mut f32,
    smooth_time: f32,
    max_speed: f32,
    dt: f32,
) -> f32 {
    let target = current + delta_angle(current, target);
    current.smooth_damp(target, velocity, smooth_time, max_speed, dt)
}

/// Hermite smoothstep of `t` clamped to `[0, 1]`.
#[inline]
pub fn smoothstep(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Shortest signed difference `to - from`, in `(-PI, PI]`.
#[inline]
pub fn delta_angle(from: f32, to: f32) -> f32 {
    let delta = (to - from).rem_euclid(TAU);
    if delta > PI {
        delta - TAU
    } else {
        delta
    }
}

/// Interpolate between two angles along the shortest arc.
#[inline]
pub fn lerp_angle(from: f32, to: f32, t: f32) -> f32 {
    from + delta_angle(from, to) * t
}

/// Move `current` toward `target` by at most `max_delta`.
#[inline]
pub fn move_toward(current: f32, target: f32, max_delta: f32) -> f32 {
    let delta = target - current;
    if delta.abs() <= max_delta {
        target
    } else {
        current + delta.signum() * max_delta
    }
}

/// Signed angle from `from` to `to`, measured counter-clockwise around `axis`.
pub fn signed_angle(from: Vec3, to: Vec3, axis: Vec3) -> f32 {
    let cross = from.cross(to);
    cross.dot(axis).atan2(from.dot(to))
}

/// Yaw (rotation about +Y) that points the local -Z axis along `direction`.
#[inline]
pub fn heading(direction: Vec3) -> f32 {
    (-direction.x).atan2(-direction.z)
}

/// Pitch (rotation about local +X) that tilts the local -Z axis onto `direction`.
#[inline]
pub fn elevation(direction: Vec3) -> f32 {
    direction.normalize_or_zero().y.clamp(-1.0, 1.0).asin()
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{EulerRot, Quat};

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn test_smooth_damp_never_overshoots() {
        for start in [-50.0_f32, -3.0, 0.0, 7.5, 40.0] {
            let target = 10.0;
            let mut value = start;
            let mut velocity = 0.0;
            for _ in 0..600 {
                value = value.smooth_damp(target, &mut velocity, 0.3, f32::INFINITY, DT);
                if start < target {
                    assert!(value <= target + 1e-4, "overshot from {start}: {value}");
                } else {
                    assert!(value >= target - 1e-4, "overshot from {start}: {value}");
                }
            }
            assert!((value - target).abs() < 1e-3);
        }
    }

    #[test]
    fn test_smooth_damp_respects_max_speed() {
        let mut velocity = 0.0;
        let value = 0.0_f32.smooth_damp(100.0, &mut velocity, 0.1, 5.0, DT);
        assert!(value <= 5.0 * DT * 2.0, "moved too far: {value}");
    }

    #[test]
    fn test_smooth_damp_zero_dt_is_identity() {
        let mut velocity = 3.0;
        let value = 4.0_f32.smooth_damp(10.0, &mut velocity, 0.2, f32::INFINITY, 0.0);
        assert_eq!(value, 4.0);
        assert_eq!(velocity, 3.0);

        let mut velocity = 0.0;
        let value = 10.0_f32.smooth_damp(10.0, &mut velocity, 0.0, f32::INFINITY, 0.0);
        assert_eq!(value, 10.0);
        assert!(velocity.is_finite());
    }

    #[test]
    fn test_smooth_damp_zero_smooth_time_is_finite() {
        let mut velocity = 0.0;
        let value = 0.0_f32.smooth_damp(1.0, &mut velocity, 0.0, f32::INFINITY, DT);
        assert!(value.is_finite());
        assert!(velocity.is_finite());
    }

    #[test]
    fn test_smooth_damp_vec3_converges() {
        let target = Vec3::new(3.0, -2.0, 8.0);
        let mut value = Vec3::ZERO;
        let mut velocity = Vec3::ZERO;
        for _ in 0..600 {
            value = value.smooth_damp(target, &mut velocity, 0.25, f32::INFINITY, DT);
        }
        assert!(value.distance(target) < 1e-3);
    }

    #[test]
    fn test_smooth_damp_angle_takes_short_way() {
        let mut velocity = 0.0;
        let current = 170_f32.to_radians();
        let target = -170_f32.to_radians();
        let next = smooth_damp_angle(current, target, &mut velocity, 0.2, f32::INFINITY, DT);
        assert!(next > current, "should rotate through PI, got {next}");
    }

    #[test]
    fn test_delta_and_lerp_angle() {
        assert!((delta_angle(0.0, PI) - PI).abs() < 1e-6);
        assert!((delta_angle(0.1, TAU - 0.1) + 0.2).abs() < 1e-5);
        assert!((lerp_angle(0.0, PI, 0.5) - PI / 2.0).abs() < 1e-6);
        assert!((lerp_angle(3.0, -3.0, 0.5).abs() - PI).abs() < 1e-3);
    }

    #[test]
    fn test_smoothstep() {
        assert_eq!(smoothstep(0.0), 0.0);
        assert_eq!(smoothstep(1.0), 1.0);
        assert!((smoothstep(0.5) - 0.5).abs() < 1e-6);
        assert_eq!(smoothstep(2.0), 1.0);
    }

    #[test]
    fn test_heading_and_elevation_match_euler() {
        let rotation = Quat::from_euler(EulerRot::YXZ, 0.7, -0.3, 0.0);
        let forward = rotation * -Vec3::Z;
        assert!((heading(forward) - 0.7).abs() < 1e-4);
        assert!((elevation(forward) + 0.3).abs() < 1e-4);
    }

    #[test]
    fn test_signed_angle() {
        let angle = signed_angle(Vec3::X, Vec3::Y, Vec3::Z);
        assert!((angle - PI / 2.0).abs() < 1e-5);
        let angle = signed_angle(Vec3::X, -Vec3::Y, Vec3::Z);
        assert!((angle + PI / 2.0).abs() < 1e-5);
    }
}
