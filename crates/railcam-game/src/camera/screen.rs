//! Projection and screen-space queries

use glam::{Mat4, Vec2, Vec3};
use railcam_core::Transform;

use super::config::CameraConfig;

/// Perspective lens parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// Vertical field of view in degrees
    pub fov: f32,
    pub aspect_ratio: f32,
    pub near: f32,
    pub far: f32,
}

impl Projection {
    /// Lens with the configured viewport and clip planes
    pub fn from_config(config: &CameraConfig, fov: f32) -> Self {
        Self {
            fov,
            aspect_ratio: config.aspect_ratio,
            near: config.near_plane,
            far: config.far_plane,
        }
    }

    /// Get a projection matrix
    pub fn matrix(&self) -> Mat4 {
        let fov_radians = self.fov.to_radians();
        Mat4::perspective_rh(fov_radians, self.aspect_ratio, self.near, self.far)
    }
}

/// Get the view matrix for a camera pose
pub fn view_matrix(camera: &Transform) -> Mat4 {
    camera.view_matrix()
}

/// True when `point` lies behind the camera plane
pub fn is_behind_camera(point: Vec3, camera: &Transform) -> bool {
    (point - camera.position).dot(camera.forward()) <= 0.0
}

/// Normalized screen position of `point`: (0, 0) top-left, (1, 1) bottom-right.
///
/// Points behind the camera project mirrored; check [`is_behind_camera`].
pub fn convert_to_screen_space(point: Vec3, camera: &Transform, projection: &Projection) -> Vec2 {
    let clip = projection.matrix() * view_matrix(camera) * point.extend(1.0);
    let w = if clip.w.abs() < f32::EPSILON {
        f32::EPSILON.copysign(clip.w)
    } else {
        clip.w
    };
    let ndc = Vec2::new(clip.x / w, clip.y / w);
    Vec2::new((ndc.x + 1.0) * 0.5, (1.0 - ndc.y) * 0.5)
}

/// True when `point` is in front of the camera and inside the screen,
/// shrunk by `margin` on every side.
pub fn is_on_screen(point: Vec3, camera: &Transform, projection: &Projection, margin: f32) -> bool {
    if is_behind_camera(point, camera) {
        return false;
    }
    let screen = convert_to_screen_space(point, camera, projection);
    let range = margin..=(1.0 - margin);
    range.contains(&screen.x) && range.contains(&screen.y)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lens() -> Projection {
        Projection::from_config(&CameraConfig::default(), 70.0)
    }

    #[test]
    fn test_point_ahead_is_centred() {
        let camera = Transform::from_position(Vec3::new(0.0, 2.0, 10.0));
        let screen = convert_to_screen_space(Vec3::new(0.0, 2.0, 0.0), &camera, &lens());
        assert!(screen.distance(Vec2::splat(0.5)) < 1e-5);
        assert!(is_on_screen(Vec3::new(0.0, 2.0, 0.0), &camera, &lens(), 0.1));
    }

    #[test]
    fn test_screen_axes() {
        let camera = Transform::default();
        let right = convert_to_screen_space(Vec3::new(1.0, 0.0, -10.0), &camera, &lens());
        assert!(right.x > 0.5);
        let up = convert_to_screen_space(Vec3::new(0.0, 1.0, -10.0), &camera, &lens());
        assert!(up.y < 0.5);
    }

    #[test]
    fn test_behind_camera() {
        let camera = Transform::default();
        let behind = Vec3::new(0.0, 0.0, 5.0);
        assert!(is_behind_camera(behind, &camera));
        assert!(!is_on_screen(behind, &camera, &lens(), 0.0));
        assert!(!is_behind_camera(Vec3::new(0.0, 0.0, -5.0), &camera));
    }

    #[test]
    fn test_outside_frustum_and_margin() {
        let camera = Transform::default();
        assert!(!is_on_screen(Vec3::new(50.0, 0.0, -5.0), &camera, &lens(), 0.0));

        // Just inside the right edge
        let lens = lens();
        let half_width = (lens.fov.to_radians() * 0.5).tan() * lens.aspect_ratio * 10.0;
        let edge = Vec3::new(half_width * 0.95, 0.0, -10.0);
        assert!(is_on_screen(edge, &camera, &lens, 0.0));
        assert!(!is_on_screen(edge, &camera, &lens, 0.1));
    }

    #[test]
    fn test_projection_uses_config_planes() {
        let config = CameraConfig {
            near_plane: 0.5,
            far_plane: 50.0,
            ..Default::default()
        };
        let projection = Projection::from_config(&config, 60.0);
        assert_eq!(projection.near, 0.5);
        assert_eq!(projection.far, 50.0);
        assert!(projection.matrix().is_finite());
    }
}
