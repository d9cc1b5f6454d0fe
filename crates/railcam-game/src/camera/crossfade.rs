//! Crossfade overlay timing
//!
//! The renderer captures the last frame when a crossfade starts and draws it
//! over the new view at [`Crossfade::opacity`] until it reaches zero.

use railcam_core::move_toward;
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Crossfade {
    opacity: f32,
    rate: f32,
}

impl Crossfade {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show the captured frame fully and fade it out at `rate` per second
    pub fn start(&mut self, rate: f32) {
        debug!("Starting camera crossfade at {:.2}/s", rate);
        self.opacity = 1.0;
        self.rate = rate.max(0.0);
    }

    /// Advance the fade. Returns true on the tick the overlay disappears.
    pub fn update(&mut self, dt: f32) -> bool {
        if !self.is_active() {
            return false;
        }
        self.opacity = move_toward(self.opacity, 0.0, self.rate * dt.max(0.0));
        !self.is_active()
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn is_active(&self) -> bool {
        self.opacity > 0.0
    }

    /// Hide the overlay immediately
    pub fn cancel(&mut self) {
        self.opacity = 0.0;
    }
}
