//! Camera system module
//!
//! Blends a stack of camera profiles into one path-following camera and
//! layers lock-on framing, shake, motion blur, crossfades and a debug fly
//! camera on top.

mod blend;
mod blender;
mod config;
mod controller;
mod crossfade;
mod error;
mod events;
mod free_camera;
mod lockon;
mod motion_blur;
mod profile;
mod screen;
mod shake;
mod simulator;

pub use blend::{
    BlendEntry, BlendStack, DistanceBlendLink, EntryId, EntryState, PushOutcome, TransitionKind,
    Trigger, TriggerId,
};
pub use blender::{blend_entries, CameraCandidate};
pub use config::{CameraConfig, CameraSettings, FreeCameraConfig};
pub use controller::{CameraController, CameraOutput, TickContext};
pub use crossfade::Crossfade;
pub use error::CameraError;
pub use events::CameraEvent;
pub use free_camera::{FreeCamera, FreeCameraState};
pub use lockon::LockOnTracker;
pub use motion_blur::{MotionBlurController, MotionBlurParams};
pub use profile::{AngleMode, CameraProfile, DistanceMode, ProfileHandle, ProfileLibrary, TrackingMode};
pub use screen::{convert_to_screen_space, is_behind_camera, is_on_screen, view_matrix, Projection};
pub use shake::{ShakeSettings, ShakeSystem};
pub use simulator::{simulate, SimulationContext};
