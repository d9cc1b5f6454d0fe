//! Camera profiles: immutable, shared camera configurations

use std::collections::HashMap;
use std::sync::Arc;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::CameraError;

/// Shared handle to a profile. Many blend entries may reference one profile.
pub type ProfileHandle = Arc<CameraProfile>;

/// How the path direction used for yaw/pitch is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DistanceMode {
    /// Blend from live to sampled direction on downward slope changes
    #[default]
    Auto,
    /// Always use the live direction (hugs corners)
    Offset,
    /// Always use the direction sampled behind the camera
    Sample,
}

/// How a profile angle combines with the computed angle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AngleMode {
    #[default]
    Add,
    Replace,
}

impl AngleMode {
    pub fn apply(self, computed: f32, profile: f32) -> f32 {
        match self {
            AngleMode::Add => computed + profile,
            AngleMode::Replace => profile,
        }
    }
}

/// How the camera follows the actor off the path centre on one axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TrackingMode {
    /// Translate with the actor (optionally confined to a hall)
    #[default]
    Move,
    /// Stay on the path centre and turn toward the actor
    Rotate,
    /// Stay on the path centre
    Disable,
}

/// An immutable camera configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraProfile {
    /// Display name (for logs and events)
    pub name: String,
    /// Distance behind the pivot
    pub distance: f32,
    /// Extra distance while the actor moves backward
    pub backstep_distance: f32,
    pub distance_mode: DistanceMode,
    /// Extra distance behind the camera at which the path direction is sampled
    pub sample_offset: f32,
    /// Pitch in radians
    pub pitch: f32,
    pub pitch_mode: AngleMode,
    /// Yaw in radians
    pub yaw: f32,
    pub yaw_mode: AngleMode,
    /// Roll with the path's banking
    pub follow_path_tilt: bool,
    pub horizontal_tracking: TrackingMode,
    pub vertical_tracking: TrackingMode,
    /// Half-width of the corridor the camera may drift in (0 = no corridor)
    pub hall_width: f32,
    /// Yaw per unit the actor strays outside the hall
    pub hall_rotation_strength: f32,
    /// Screen-space shift of the camera (right, up)
    pub viewport_offset: Vec2,
    /// Field of view in degrees (0 = default)
    pub fov: f32,
    /// Use the trigger's static position instead of following the path
    pub copy_position: bool,
    /// Use the trigger's static rotation verbatim
    pub copy_rotation: bool,
    /// Ignore lock-on distance and pitch adjustments
    pub ignore_lockon: bool,
}

impl Default for CameraProfile {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            distance: 6.0,
            backstep_distance: 1.5,
            distance_mode: DistanceMode::Auto,
            sample_offset: 0.0,
            pitch: -0.25,
            pitch_mode: AngleMode::Add,
            yaw: 0.0,
            yaw_mode: AngleMode::Add,
            follow_path_tilt: false,
            horizontal_tracking: TrackingMode::Move,
            vertical_tracking: TrackingMode::Move,
            hall_width: 0.0,
            hall_rotation_strength: 0.0,
            viewport_offset: Vec2::ZERO,
            fov: 0.0,
            copy_position: false,
            copy_rotation: false,
            ignore_lockon: false,
        }
    }
}

impl CameraProfile {
    /// Create a dynamic profile at a distance with a flat pitch
    pub fn with_distance(name: impl Into<String>, distance: f32) -> Self {
        Self {
            name: name.into(),
            distance,
            pitch: 0.0,
            ..Default::default()
        }
    }

    /// Wrap the profile in a shared handle
    pub fn into_handle(self) -> ProfileHandle {
        Arc::new(self)
    }

    /// True when the camera holds a fixed position
    pub fn is_static(&self) -> bool {
        self.copy_position
    }

    /// True when every numeric field is finite and distances are non-negative
    pub fn is_valid(&self) -> bool {
        let scalars = [
            self.distance,
            self.backstep_distance,
            self.sample_offset,
            self.pitch,
            self.yaw,
            self.hall_width,
            self.hall_rotation_strength,
            self.fov,
        ];
        scalars.iter().all(|v| v.is_finite())
            && self.viewport_offset.is_finite()
            && self.distance >= 0.0
            && self.hall_width >= 0.0
            && self.fov >= 0.0
    }
}

#[derive(Debug, Default, Deserialize)]
struct ProfileFile {
    #[serde(default)]
    profiles: HashMap<String, CameraProfile>,
}

/// Named profiles loaded from a TOML asset
#[derive(Debug, Clone, Default)]
pub struct ProfileLibrary {
    profiles: HashMap<String, ProfileHandle>,
}

impl ProfileLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `[profiles.<name>]` tables. Missing fields take defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, CameraError> {
        let file: ProfileFile = toml::from_str(source)?;
        let mut library = Self::new();
        for (name, mut profile) in file.profiles {
            if !profile.is_valid() {
                return Err(CameraError::InvalidProfile(name));
            }
            profile.name = name.clone();
            library.profiles.insert(name, profile.into_handle());
        }
        Ok(library)
    }

    /// Register a profile under its name, returning its handle
    pub fn insert(&mut self, profile: CameraProfile) -> ProfileHandle {
        let handle = profile.into_handle();
        self.profiles.insert(handle.name.clone(), handle.clone());
        handle
    }

    /// Look up a profile by name
    pub fn get(&self, name: &str) -> Result<ProfileHandle, CameraError> {
        self.profiles
            .get(name)
            .cloned()
            .ok_or_else(|| CameraError::UnknownProfile(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}
