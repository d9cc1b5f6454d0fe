//! Actor state consumed by the camera

use glam::Vec3;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a lock-on focus object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetId(pub Uuid);

impl TargetId {
    /// Create a new random target ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TargetId {
    fn default() -> Self {
        Self::new()
    }
}

/// A focus object the camera should frame together with the actor.
///
/// The camera only looks targets up by id; it never keeps them alive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LockOnTarget {
    pub id: TargetId,
    pub position: Vec3,
}

/// Snapshot of the tracked actor for one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActorState {
    /// World position
    pub position: Vec3,
    /// Facing direction along the path
    pub forward: Vec3,
    /// Up direction
    pub up: Vec3,
    /// Current velocity
    pub velocity: Vec3,
    /// Actor is moving against the path direction
    pub moving_backward: bool,
    /// Homing attack, lock-on or jump-dash in progress
    pub lockon_moment: bool,
    /// Current focus target, if any
    pub focus: Option<LockOnTarget>,
}

impl Default for ActorState {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            forward: -Vec3::Z,
            up: Vec3::Y,
            velocity: Vec3::ZERO,
            moving_backward: false,
            lockon_moment: false,
            focus: None,
        }
    }
}

impl ActorState {
    /// Create a state at a position facing `forward`
    pub fn at(position: Vec3, forward: Vec3) -> Self {
        Self {
            position,
            forward,
            ..Default::default()
        }
    }

    /// Movement speed in units per second
    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }

    /// True when position and directions are usable
    pub fn is_valid(&self) -> bool {
        self.position.is_finite()
            && self.forward.is_finite()
            && self.up.is_finite()
            && self.forward.length_squared() > f32::EPSILON
    }
}

/// Source of the tracked actor's state
pub trait ActorProvider {
    fn actor_state(&self) -> ActorState;
}

impl ActorProvider for ActorState {
    fn actor_state(&self) -> ActorState {
        *self
    }
}
