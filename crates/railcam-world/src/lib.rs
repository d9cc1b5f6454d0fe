//! Railcam World - External collaborators seen by the camera
//!
//! The camera never simulates the actor or owns the level path. It reads them
//! once per tick through the traits defined here:
//! - [`PathService`] and the [`PathSampler`] that caches its last valid sample
//! - [`ActorProvider`] returning an [`ActorState`] snapshot

pub mod actor;
pub mod path;

pub use actor::{ActorProvider, ActorState, LockOnTarget, TargetId};
pub use path::{PathPoint, PathSample, PathSampler, PathService, PolylinePath};
