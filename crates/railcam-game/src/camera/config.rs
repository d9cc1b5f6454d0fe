//! Camera configuration

use serde::{Deserialize, Serialize};

/// Controller-wide camera tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees used when a profile does not override it
    pub default_fov: f32,
    /// Smoothing time for distance changes (seconds)
    pub distance_smoothing: f32,
    /// Maximum speed of distance changes (units per second)
    pub distance_max_speed: f32,
    /// Smoothing time for hall tracking (seconds)
    pub hall_smoothing: f32,
    /// Rate at which the sample blend ratio moves (per second)
    pub sample_blend_speed: f32,
    /// Vertical difference between sampled and live path direction that counts as a slope change
    pub slope_threshold: f32,
    /// Extra distance while a lock-on or jump-dash is active
    pub lockon_distance_bonus: f32,
    /// Smoothing time for lock-on ratios when rising (seconds)
    pub lockon_rise_time: f32,
    /// Smoothing time for lock-on ratios when falling (seconds)
    pub lockon_fall_time: f32,
    /// Smoothing time for the lock-on pitch offset after a new focus (seconds)
    pub lockon_pitch_smoothing: f32,
    /// Height of the look pivot above the path
    pub pivot_height: f32,
    /// Motion blur opacity change per second
    pub motion_blur_fade_speed: f32,
    /// Linear velocity multiplier during time-break
    pub time_break_blur_scale: f32,
    /// Viewport aspect ratio (width / height)
    pub aspect_ratio: f32,
    /// Near clip plane
    pub near_plane: f32,
    /// Far clip plane
    pub far_plane: f32,
    /// Normalized margin inside which a point still counts as on screen
    pub screen_margin: f32,
    /// Debug fly camera
    pub free_camera: FreeCameraConfig,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            default_fov: 70.0,
            distance_smoothing: 0.3,
            distance_max_speed: 40.0,
            hall_smoothing: 0.25,
            sample_blend_speed: 2.0,
            slope_threshold: 0.1,
            lockon_distance_bonus: 2.0,
            lockon_rise_time: 0.1,
            lockon_fall_time: 0.6,
            lockon_pitch_smoothing: 0.4,
            pivot_height: 1.0,
            motion_blur_fade_speed: 4.0,
            time_break_blur_scale: 2.0,
            aspect_ratio: 16.0 / 9.0,
            near_plane: 0.1,
            far_plane: 1000.0,
            screen_margin: 0.0,
            free_camera: FreeCameraConfig::default(),
        }
    }
}

/// Debug fly camera tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FreeCameraConfig {
    /// Movement speed (units per second)
    pub move_speed: f32,
    /// Speed multiplier while boosting
    pub boost_multiplier: f32,
    /// Mouse sensitivity (radians per pixel)
    pub sensitivity: f32,
    /// Velocity smoothing time (seconds)
    pub smoothing: f32,
    /// Minimum pitch angle in degrees
    pub pitch_min: f32,
    /// Maximum pitch angle in degrees
    pub pitch_max: f32,
}

impl Default for FreeCameraConfig {
    fn default() -> Self {
        Self {
            move_speed: 10.0,
            boost_multiplier: 4.0,
            sensitivity: 0.003,
            smoothing: 0.15,
            pitch_min: -89.0,
            pitch_max: 89.0,
        }
    }
}

/// User-facing camera settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Screen shake enabled
    pub screen_shake_enabled: bool,
    /// Screen shake multiplier (0.0 to 1.0)
    pub screen_shake_strength: f32,
    /// Motion blur enabled
    pub motion_blur_enabled: bool,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            screen_shake_enabled: true,
            screen_shake_strength: 1.0,
            motion_blur_enabled: true,
        }
    }
}

impl CameraSettings {
    /// Effective shake multiplier (0 when disabled)
    pub fn effective_shake_strength(&self) -> f32 {
        if self.screen_shake_enabled {
            self.screen_shake_strength.max(0.0)
        } else {
            0.0
        }
    }
}
