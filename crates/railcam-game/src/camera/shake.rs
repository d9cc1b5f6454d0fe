//! Screen shake
//!
//! Each shake drives a sine per rotation axis (x = pitch, y = yaw, z = roll)
//! whose phase advances with a random jitter. The sample is shaped by a
//! fade-in/hold/fade-out envelope and a distance falloff.

use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Parameters of one shake
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShakeSettings {
    /// Peak angle per axis (radians)
    pub magnitude: Vec3,
    /// Phase speed per axis (radians per second)
    pub intensity: Vec3,
    /// Extra random phase speed per axis
    pub randomness: Vec3,
    /// Starting phase per axis
    pub phase_offset: Vec3,
    /// World position the shake emanates from (None = everywhere)
    pub origin: Option<Vec3>,
    /// Distance from `origin` at which the shake fades to nothing (0 = no falloff)
    pub maximum_distance: f32,
    pub fade_in: f32,
    /// Time at full strength between the fades
    pub duration: f32,
    pub fade_out: f32,
    /// Survives a respawn
    pub persistent: bool,
}

impl Default for ShakeSettings {
    fn default() -> Self {
        Self {
            magnitude: Vec3::splat(0.02),
            intensity: Vec3::splat(20.0),
            randomness: Vec3::splat(5.0),
            phase_offset: Vec3::ZERO,
            origin: None,
            maximum_distance: 0.0,
            fade_in: 0.05,
            duration: 0.3,
            fade_out: 0.3,
            persistent: false,
        }
    }
}

impl ShakeSettings {
    /// Total lifetime in seconds
    pub fn total_time(&self) -> f32 {
        self.fade_in.max(0.0) + self.duration.max(0.0) + self.fade_out.max(0.0)
    }

    /// Strength at `elapsed` seconds: ramp in, hold, ramp out
    pub fn envelope(&self, elapsed: f32) -> f32 {
        let fade_in = self.fade_in.max(0.0);
        let hold_end = fade_in + self.duration.max(0.0);
        let fade_out = self.fade_out.max(0.0);

        if elapsed < 0.0 {
            0.0
        } else if elapsed < fade_in {
            elapsed / fade_in
        } else if elapsed < hold_end {
            1.0
        } else if elapsed < hold_end + fade_out {
            1.0 - (elapsed - hold_end) / fade_out
        } else {
            0.0
        }
    }

    /// Distance attenuation for a camera at `position`
    pub fn falloff(&self, position: Vec3) -> f32 {
        match self.origin {
            Some(origin) if self.maximum_distance > 0.0 => {
                let distance = origin.distance(position);
                if distance >= self.maximum_distance {
                    0.0
                } else {
                    1.0 - distance / self.maximum_distance
                }
            }
            _ => 1.0,
        }
    }
}

#[derive(Debug, Clone)]
struct ActiveShake {
    settings: ShakeSettings,
    elapsed: f32,
    phase: Vec3,
}

impl ActiveShake {
    fn is_finished(&self) -> bool {
        self.elapsed >= self.settings.total_time()
    }
}

/// All running shakes
#[derive(Debug, Clone)]
pub struct ShakeSystem {
    shakes: Vec<ActiveShake>,
    rng: StdRng,
}

impl Default for ShakeSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl ShakeSystem {
    pub fn new() -> Self {
        Self {
            shakes: Vec::new(),
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic jitter for replays and tests
    pub fn with_seed(seed: u64) -> Self {
        Self {
            shakes: Vec::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Start a shake
    pub fn add(&mut self, settings: ShakeSettings) {
        debug!(
            "Starting camera shake ({:.2}s, persistent: {})",
            settings.total_time(),
            settings.persistent
        );
        self.shakes.push(ActiveShake {
            settings,
            elapsed: 0.0,
            phase: Vec3::ZERO,
        });
    }

    /// Advance every shake and return the summed pitch/yaw/roll offset
    pub fn update(&mut self, dt: f32, camera_position: Vec3, strength: f32) -> Vec3 {
        let dt = dt.max(0.0);
        let mut total = Vec3::ZERO;

        for shake in &mut self.shakes {
            shake.elapsed += dt;
            let jitter = Vec3::new(self.rng.gen(), self.rng.gen(), self.rng.gen());
            let settings = &shake.settings;
            shake.phase += settings.intensity * dt + jitter * settings.randomness * dt;

            let envelope = settings.envelope(shake.elapsed);
            let scale = envelope * envelope * settings.falloff(camera_position);
            let wave = Vec3::new(
                (shake.phase.x + settings.phase_offset.x).sin(),
                (shake.phase.y + settings.phase_offset.y).sin(),
                (shake.phase.z + settings.phase_offset.z).sin(),
            );
            total += wave * settings.magnitude * scale;
        }

        self.shakes.retain(|shake| !shake.is_finished());
        total * strength.max(0.0)
    }

    /// Drop every shake that does not survive a respawn
    pub fn on_respawn(&mut self) {
        self.shakes.retain(|shake| shake.settings.persistent);
    }

    pub fn clear(&mut self) {
        self.shakes.clear();
    }

    pub fn len(&self) -> usize {
        self.shakes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shakes.is_empty()
    }
}
