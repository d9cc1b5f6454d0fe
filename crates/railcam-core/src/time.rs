//! Fixed-timestep game time
//!
//! The camera simulation runs once per physics tick. `GameTime` accumulates
//! scaled frame time and hands out whole fixed steps.

use serde::{Deserialize, Serialize};

/// Configuration for game time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeConfig {
    /// How many in-game seconds pass per real second
    pub time_scale: f32,
    /// Fixed timestep for physics and camera ticks (in seconds)
    pub fixed_timestep: f32,
    /// Maximum delta time to prevent spiral of death
    pub max_delta_time: f32,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            time_scale: 1.0,
            fixed_timestep: 1.0 / 60.0,
            max_delta_time: 0.25,
        }
    }
}

/// Game time tracking
#[derive(Debug, Clone, Default)]
pub struct GameTime {
    /// Configuration
    pub config: TimeConfig,
    /// Scaled time since start in seconds
    pub total_time: f64,
    /// Scaled delta time for this frame (clamped)
    pub delta_time: f32,
    /// Unscaled delta time
    pub unscaled_delta_time: f32,
    /// Number of fixed ticks run so far
    pub tick_count: u64,
    /// Whether the game is paused
    pub paused: bool,
    /// Scaled time not yet consumed by fixed steps
    fixed_accumulator: f32,
}

impl GameTime {
    /// Create a new game time with custom config
    pub fn new(config: TimeConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Advance by the raw delta of the previous frame
    pub fn update(&mut self, raw_delta: f32) {
        self.unscaled_delta_time = raw_delta.clamp(0.0, self.config.max_delta_time);

        if self.paused {
            self.delta_time = 0.0;
            return;
        }

        self.delta_time = self.unscaled_delta_time * self.config.time_scale;
        self.total_time += self.delta_time as f64;
        self.fixed_accumulator += self.delta_time;
    }

    /// Consume and return the number of fixed steps available this frame
    pub fn fixed_steps(&mut self) -> u32 {
        let step = self.config.fixed_timestep;
        if step <= 0.0 {
            return 0;
        }

        let mut steps = 0;
        while self.fixed_accumulator >= step {
            self.fixed_accumulator -= step;
            steps += 1;
        }
        self.tick_count += steps as u64;
        steps
    }

    /// Length of one fixed step in seconds
    pub fn fixed_timestep(&self) -> f32 {
        self.config.fixed_timestep
    }

    /// Current time scale (0.0 = frozen)
    pub fn time_scale(&self) -> f32 {
        self.config.time_scale
    }

    /// Set the time scale (0.0 = frozen, 1.0 = normal, 2.0 = double speed)
    pub fn set_time_scale(&mut self, scale: f32) {
        self.config.time_scale = scale.max(0.0);
    }

    /// Pause the game
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resume the game
    pub fn resume(&mut self) {
        self.paused = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_steps() {
        let mut time = GameTime::default();
        time.update(0.06);
        assert_eq!(time.fixed_steps(), 3);
        assert_eq!(time.tick_count, 3);
        assert_eq!(time.fixed_steps(), 0);
    }

    #[test]
    fn test_time_scale_and_pause() {
        let mut time = GameTime::default();
        time.set_time_scale(0.5);
        time.update(0.12);
        assert!((time.delta_time - 0.06).abs() < 1e-6);

        time.pause();
        time.update(0.12);
        assert_eq!(time.delta_time, 0.0);
        assert_eq!(time.fixed_steps(), 3);
    }

    #[test]
    fn test_negative_time_scale_is_clamped() {
        let mut time = GameTime::default();
        time.set_time_scale(-2.0);
        assert_eq!(time.time_scale(), 0.0);
    }
}
