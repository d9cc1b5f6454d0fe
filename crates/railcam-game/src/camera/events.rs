//! Camera notifications drained once per tick

use super::blend::{EntryId, TransitionKind};

/// Something other systems may want to react to
#[derive(Debug, Clone, PartialEq)]
pub enum CameraEvent {
    /// A profile was pushed onto the blend stack
    TransitionStarted {
        entry: EntryId,
        profile: String,
        kind: TransitionKind,
        snapped: bool,
    },
    /// An entry reached full influence
    TransitionCompleted { entry: EntryId, profile: String },
    /// The renderer should capture the current frame for a crossfade overlay
    CrossfadeCaptureRequested,
    /// The crossfade overlay has faded out
    CrossfadeFinished,
    /// The debug fly camera changed state
    FreeCameraChanged(super::FreeCameraState),
}
