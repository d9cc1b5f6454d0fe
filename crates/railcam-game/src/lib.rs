//! Railcam Game - Camera controller and input
//!
//! Provides the blended rail camera, its effects, and input handling for the
//! debug fly camera.

pub mod camera;
pub mod input;

pub use camera::{
    CameraConfig, CameraController, CameraError, CameraEvent, CameraOutput, CameraProfile,
    CameraSettings, FreeCameraState, ProfileHandle, ProfileLibrary, PushOutcome, ShakeSettings,
    TickContext, TransitionKind, Trigger, TriggerId,
};
pub use input::{InputAction, InputBindings, InputHandler, InputState};
