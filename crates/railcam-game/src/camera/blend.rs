//! Blend stack and transition scheduling
//!
//! The stack is an ordered list of entries, oldest first. Each entry wraps a
//! profile and ramps its influence from 0 to 1. Once an entry is fully blended
//! everything beneath it is eclipsed and dropped, so the stack never grows
//! without bound and never becomes empty.

use std::sync::Arc;

use glam::{Quat, Vec2, Vec3};
use railcam_core::{smoothstep, Transform};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use super::events::CameraEvent;
use super::profile::ProfileHandle;

/// Identifier of a trigger volume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TriggerId(pub Uuid);

impl TriggerId {
    /// Create a new random trigger ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TriggerId {
    fn default() -> Self {
        Self::new()
    }
}

/// Identifier of a blend entry, unique for the lifetime of a stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(pub u64);

/// How a pushed profile takes over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TransitionKind {
    /// Ramp influence over the blend time
    #[default]
    Time,
    /// Cut the geometry instantly behind a fading capture of the last frame
    Crossfade,
}

/// Declares that a trigger overlaps a partner trigger
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceBlendLink {
    /// Trigger whose entry this one pairs with
    pub partner: TriggerId,
    /// How far into this trigger the actor is (0 = partner only, 1 = this only)
    pub ratio: f32,
}

/// The trigger volume a push originated from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trigger {
    pub id: TriggerId,
    /// Camera position for static profiles
    pub static_position: Option<Vec3>,
    /// Camera rotation for static profiles
    pub static_rotation: Option<Quat>,
    /// Set when this trigger is half of a distance-blend pair
    pub distance_blend: Option<DistanceBlendLink>,
}

impl Trigger {
    pub fn new(id: TriggerId) -> Self {
        Self {
            id,
            static_position: None,
            static_rotation: None,
            distance_blend: None,
        }
    }

    /// Trigger carrying a fixed camera pose
    pub fn with_static(id: TriggerId, position: Vec3, rotation: Quat) -> Self {
        Self {
            static_position: Some(position),
            static_rotation: Some(rotation),
            ..Self::new(id)
        }
    }

    /// Trigger blending continuously with `partner`
    pub fn distance_blend(id: TriggerId, partner: TriggerId, ratio: f32) -> Self {
        Self {
            distance_blend: Some(DistanceBlendLink {
                partner,
                ratio: ratio.clamp(0.0, 1.0),
            }),
            ..Self::new(id)
        }
    }
}

/// Per-entry simulation state
#[derive(Debug, Clone, Default)]
pub struct EntryState {
    /// False until the first simulation pass
    pub initialized: bool,
    pub distance: f32,
    pub distance_velocity: f32,
    pub yaw: f32,
    pub pitch: f32,
    /// Camera offset from the path centre (x = lateral, y = vertical)
    pub tracking_offset: Vec2,
    pub tracking_velocity: Vec2,
    /// 0 = live direction, 1 = direction sampled behind the camera
    pub sample_blend: f32,
    pub fov: f32,
    /// Captured pose for static profiles
    pub static_position: Vec3,
    pub static_rotation: Quat,
}

/// One active transition on the stack
#[derive(Debug, Clone)]
pub struct BlendEntry {
    id: EntryId,
    pub profile: ProfileHandle,
    pub trigger: Option<Trigger>,
    trigger_active: bool,
    pub kind: TransitionKind,
    blend_speed: f32,
    linear_influence: f32,
    /// Second member of a distance-blend pair with the entry below it
    paired_with_previous: bool,
    completed: bool,
    pub state: EntryState,
}

impl BlendEntry {
    fn new(
        id: EntryId,
        profile: ProfileHandle,
        kind: TransitionKind,
        trigger: Option<Trigger>,
        current_pose: &Transform,
    ) -> Self {
        let state = EntryState {
            static_position: trigger
                .and_then(|t| t.static_position)
                .unwrap_or(current_pose.position),
            static_rotation: trigger
                .and_then(|t| t.static_rotation)
                .unwrap_or(current_pose.rotation),
            ..Default::default()
        };
        Self {
            id,
            profile,
            trigger,
            trigger_active: true,
            kind,
            blend_speed: 0.0,
            linear_influence: 0.0,
            paired_with_previous: false,
            completed: false,
            state,
        }
    }

    pub fn id(&self) -> EntryId {
        self.id
    }

    pub fn linear_influence(&self) -> f32 {
        self.linear_influence
    }

    pub fn smoothed_influence(&self) -> f32 {
        smoothstep(self.linear_influence)
    }

    pub fn blend_speed(&self) -> f32 {
        self.blend_speed
    }

    pub fn is_paired_with_previous(&self) -> bool {
        self.paired_with_previous
    }

    pub fn is_trigger_active(&self) -> bool {
        self.trigger_active
    }

    /// Overlap ratio of this entry's distance-blend trigger (1 if none)
    pub fn distance_blend_ratio(&self) -> f32 {
        self.trigger
            .and_then(|t| t.distance_blend)
            .map_or(1.0, |link| link.ratio)
    }

    fn trigger_id(&self) -> Option<TriggerId> {
        self.trigger.map(|t| t.id)
    }
}

/// Result of [`BlendStack::push`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PushOutcome {
    /// Missing or invalid profile; nothing changed
    Rejected,
    /// Same profile as the active entry; only its trigger was updated
    Refreshed,
    /// A new entry was appended
    Pushed {
        entry: EntryId,
        snapped: bool,
        /// Overlay fade rate when the push was a crossfade
        crossfade_rate: Option<f32>,
    },
}

/// Ordered stack of weighted camera entries
#[derive(Debug, Clone)]
pub struct BlendStack {
    entries: Vec<BlendEntry>,
    snap_pending: bool,
    next_id: u64,
}

impl BlendStack {
    /// Create a stack holding one fully blended entry
    pub fn new(base: ProfileHandle) -> Self {
        let mut entry = BlendEntry::new(
            EntryId(0),
            base,
            TransitionKind::Time,
            None,
            &Transform::default(),
        );
        entry.linear_influence = 1.0;
        entry.completed = true;
        Self {
            entries: vec![entry],
            snap_pending: false,
            next_id: 1,
        }
    }

    pub fn entries(&self) -> &[BlendEntry] {
        &self.entries
    }

    /// Entries with mutable simulation state; the stack's shape stays fixed
    pub fn entries_mut(&mut self) -> &mut [BlendEntry] {
        &mut self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Most recently pushed entry
    pub fn active(&self) -> &BlendEntry {
        let last = self.entries.len() - 1;
        &self.entries[last]
    }

    fn active_mut(&mut self) -> &mut BlendEntry {
        let last = self.entries.len() - 1;
        &mut self.entries[last]
    }

    /// Whether the current tick completes every transition instantly
    pub fn is_snapping(&self) -> bool {
        self.snap_pending
    }

    /// Request an instant cut on the next update
    pub fn snap(&mut self) {
        self.snap_pending = true;
    }

    /// Clear per-tick flags once the tick has been simulated
    pub fn end_tick(&mut self) {
        self.snap_pending = false;
    }

    /// Push a profile onto the stack.
    ///
    /// `current_pose` seeds the static pose of profiles whose trigger carries none.
    pub fn push(
        &mut self,
        profile: Option<ProfileHandle>,
        blend_time: f32,
        kind: TransitionKind,
        trigger: Option<Trigger>,
        current_pose: &Transform,
    ) -> PushOutcome {
        let Some(profile) = profile else {
            debug!("Ignoring push without a camera profile");
            return PushOutcome::Rejected;
        };
        if !profile.is_valid() || blend_time.is_nan() {
            warn!("Ignoring invalid camera profile '{}'", profile.name);
            return PushOutcome::Rejected;
        }

        let link = trigger.and_then(|t| t.distance_blend);
        let active = self.active_mut();
        if link.is_none()
            && !profile.copy_position
            && !profile.copy_rotation
            && Arc::ptr_eq(&active.profile, &profile)
        {
            active.trigger = trigger;
            active.trigger_active = true;
            return PushOutcome::Refreshed;
        }

        let id = EntryId(self.next_id);
        self.next_id += 1;
        let mut entry = BlendEntry::new(id, profile, kind, trigger, current_pose);

        let mut snapped = false;
        let mut crossfade_rate = None;
        if blend_time <= 0.0 {
            snapped = true;
        } else {
            match kind {
                TransitionKind::Crossfade => {
                    snapped = true;
                    crossfade_rate = Some(1.0 / blend_time);
                }
                TransitionKind::Time => entry.blend_speed = 1.0 / blend_time,
            }
        }

        if let Some(link) = link {
            let active = self.active();
            if !active.paired_with_previous && active.trigger_id() == Some(link.partner) {
                entry.paired_with_previous = true;
                entry.linear_influence = active.linear_influence;
                debug!(
                    "Camera profile '{}' pairs with '{}' for distance blending",
                    entry.profile.name, active.profile.name
                );
            }
        }

        if snapped {
            self.snap_pending = true;
        }
        debug!(
            "Pushed camera profile '{}' ({:?}, blend {:.2}s)",
            entry.profile.name, kind, blend_time
        );
        self.entries.push(entry);

        PushOutcome::Pushed {
            entry: id,
            snapped,
            crossfade_rate,
        }
    }

    /// Mark every entry pushed by `trigger` as exited
    pub fn release_trigger(&mut self, trigger: TriggerId) {
        for entry in &mut self.entries {
            if entry.trigger_id() == Some(trigger) {
                entry.trigger_active = false;
            }
        }
    }

    /// Update the overlap ratio of a distance-blend trigger. Returns false if
    /// no entry on the stack came from that trigger.
    pub fn set_distance_blend_ratio(&mut self, trigger: TriggerId, ratio: f32) -> bool {
        let ratio = if ratio.is_finite() {
            ratio.clamp(0.0, 1.0)
        } else {
            return false;
        };
        let mut found = false;
        for entry in &mut self.entries {
            if let Some(t) = entry.trigger.as_mut() {
                if t.id == trigger {
                    if let Some(link) = t.distance_blend.as_mut() {
                        link.ratio = ratio;
                        found = true;
                    }
                }
            }
        }
        found
    }

    /// Advance influences by `dt` and retire eclipsed entries
    pub fn update_influences(&mut self, dt: f32, events: &mut Vec<CameraEvent>) {
        if self.snap_pending {
            let keep_from = self.active_group_start();
            if keep_from > 0 {
                debug!("Camera snap dropped {} blend entries", keep_from);
                self.entries.drain(..keep_from);
            }
            if let Some(first) = self.entries.first_mut() {
                first.paired_with_previous = false;
            }
            for entry in &mut self.entries {
                entry.linear_influence = 1.0;
            }
        } else {
            let dt = dt.max(0.0);
            for i in 0..self.entries.len() {
                let influence = if self.entries[i].paired_with_previous {
                    self.entries[i - 1].linear_influence
                } else {
                    let entry = &self.entries[i];
                    (entry.linear_influence + entry.blend_speed * dt).min(1.0)
                };
                self.entries[i].linear_influence = influence;
            }
            self.prune();
        }

        for entry in &mut self.entries {
            if !entry.completed && entry.linear_influence >= 1.0 {
                entry.completed = true;
                events.push(CameraEvent::TransitionCompleted {
                    entry: entry.id,
                    profile: entry.profile.name.clone(),
                });
            }
        }
    }

    /// Index of the active entry, or of its partner when it is paired
    fn active_group_start(&self) -> usize {
        let last = self.entries.len() - 1;
        if self.entries[last].paired_with_previous {
            last - 1
        } else {
            last
        }
    }

    fn prune(&mut self) {
        while let Some(index) = self.released_pair_member().or_else(|| self.eclipsed_entry()) {
            let removed = self.remove_entry(index);
            debug!("Retired camera profile '{}'", removed.profile.name);
        }
    }

    /// A pair member whose trigger was exited after the pair fully blended in
    fn released_pair_member(&self) -> Option<usize> {
        (1..self.entries.len()).find_map(|i| {
            let tail = &self.entries[i];
            let lead = &self.entries[i - 1];
            if !tail.paired_with_previous || lead.linear_influence < 1.0 {
                None
            } else if !lead.trigger_active {
                Some(i - 1)
            } else if !tail.trigger_active {
                Some(i)
            } else {
                None
            }
        })
    }

    /// An entry whose successor is fully blended and not its pair partner
    fn eclipsed_entry(&self) -> Option<usize> {
        self.entries.windows(2).position(|pair| {
            let successor = &pair[1];
            successor.linear_influence >= 1.0 && !successor.paired_with_previous
        })
    }

    fn remove_entry(&mut self, index: usize) -> BlendEntry {
        let removed = self.entries.remove(index);
        if !removed.paired_with_previous {
            if let Some(next) = self.entries.get_mut(index) {
                next.paired_with_previous = false;
            }
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::profile::CameraProfile;

    fn profile(name: &str, distance: f32) -> ProfileHandle {
        CameraProfile::with_distance(name, distance).into_handle()
    }

    fn stack() -> BlendStack {
        BlendStack::new(profile("base", 5.0))
    }

    fn push(stack: &mut BlendStack, profile: &ProfileHandle, blend_time: f32) -> PushOutcome {
        stack.push(
            Some(profile.clone()),
            blend_time,
            TransitionKind::Time,
            None,
            &Transform::default(),
        )
    }

    fn tick(stack: &mut BlendStack, dt: f32) -> Vec<CameraEvent> {
        let mut events = Vec::new();
        stack.update_influences(dt, &mut events);
        stack.end_tick();
        events
    }

    #[test]
    fn test_missing_profile_is_ignored() {
        let mut stack = stack();
        let outcome = stack.push(
            None,
            1.0,
            TransitionKind::Time,
            None,
            &Transform::default(),
        );
        assert_eq!(outcome, PushOutcome::Rejected);
        assert_eq!(stack.len(), 1);
        assert!(!stack.is_snapping());
    }

    #[test]
    fn test_invalid_profile_is_ignored() {
        let mut stack = stack();
        let broken = CameraProfile {
            distance: f32::INFINITY,
            ..Default::default()
        }
        .into_handle();
        assert_eq!(push(&mut stack, &broken, 1.0), PushOutcome::Rejected);
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn test_same_profile_refreshes_trigger() {
        let mut stack = stack();
        let run = profile("run", 8.0);
        push(&mut stack, &run, 0.5);
        let trigger = Trigger::new(TriggerId::new());
        let outcome = stack.push(
            Some(run.clone()),
            0.5,
            TransitionKind::Time,
            Some(trigger),
            &Transform::default(),
        );
        assert_eq!(outcome, PushOutcome::Refreshed);
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.active().trigger, Some(trigger));
    }

    #[test]
    fn test_same_static_profile_is_stacked() {
        let mut stack = stack();
        let overlook = CameraProfile {
            copy_position: true,
            ..Default::default()
        }
        .into_handle();
        push(&mut stack, &overlook, 0.5);
        assert!(matches!(
            push(&mut stack, &overlook, 0.5),
            PushOutcome::Pushed { .. }
        ));
        assert_eq!(stack.len(), 3);
    }

    #[test]
    fn test_zero_blend_time_snaps() {
        let mut stack = stack();
        let a = profile("a", 10.0);
        push(&mut stack, &profile("b", 3.0), 2.0);
        let outcome = push(&mut stack, &a, 0.0);
        assert!(matches!(outcome, PushOutcome::Pushed { snapped: true, .. }));
        assert!(stack.is_snapping());
        assert_eq!(stack.active().linear_influence(), 0.0);

        let events = tick(&mut stack, 1.0 / 60.0);
        assert_eq!(stack.len(), 1);
        assert!(Arc::ptr_eq(&stack.active().profile, &a));
        assert_eq!(stack.active().linear_influence(), 1.0);
        assert!(events
            .iter()
            .any(|e| matches!(e, CameraEvent::TransitionCompleted { profile, .. } if profile == "a")));
        assert!(!stack.is_snapping());
    }

    #[test]
    fn test_crossfade_snaps_and_reports_rate() {
        let mut stack = stack();
        let outcome = stack.push(
            Some(profile("a", 10.0)),
            0.5,
            TransitionKind::Crossfade,
            None,
            &Transform::default(),
        );
        assert_eq!(
            outcome,
            PushOutcome::Pushed {
                entry: EntryId(1),
                snapped: true,
                crossfade_rate: Some(2.0),
            }
        );
        assert!(stack.is_snapping());
    }

    #[test]
    fn test_influence_ramps_and_eclipses() {
        let mut stack = stack();
        push(&mut stack, &profile("a", 10.0), 1.0);

        let mut previous = 0.0;
        for _ in 0..5 {
            tick(&mut stack, 0.1);
            let influence = stack.active().linear_influence();
            assert!(influence >= previous);
            assert!((0.0..=1.0).contains(&influence));
            previous = influence;
        }
        assert!((previous - 0.5).abs() < 1e-4);
        assert_eq!(stack.len(), 2);

        for _ in 0..10 {
            tick(&mut stack, 0.1);
        }
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.active().profile.name, "a");
    }

    #[test]
    fn test_stack_never_empties() {
        let mut stack = stack();
        let profiles: Vec<_> = (0..6).map(|i| profile(&format!("p{i}"), i as f32)).collect();
        for (i, p) in profiles.iter().enumerate() {
            push(&mut stack, p, if i % 3 == 0 { 0.0 } else { 0.2 });
            for _ in 0..7 {
                tick(&mut stack, 0.05);
                assert!(!stack.is_empty());
                for entry in stack.entries() {
                    assert!((0.0..=1.0).contains(&entry.linear_influence()));
                }
            }
        }
        stack.release_trigger(TriggerId::new());
        tick(&mut stack, 10.0);
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn test_eclipse_discards_unfinished_middle_entry() {
        let mut stack = stack();
        push(&mut stack, &profile("slow", 4.0), 10.0);
        push(&mut stack, &profile("fast", 6.0), 0.1);
        tick(&mut stack, 0.2);
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.active().profile.name, "fast");
    }

    fn paired_stack(ratio: f32) -> (BlendStack, TriggerId, TriggerId) {
        let mut stack = stack();
        let first = TriggerId::new();
        let second = TriggerId::new();
        stack.push(
            Some(profile("a", 10.0)),
            0.0,
            TransitionKind::Time,
            Some(Trigger::new(first)),
            &Transform::default(),
        );
        tick(&mut stack, 1.0 / 60.0);
        stack.push(
            Some(profile("b", 20.0)),
            0.5,
            TransitionKind::Time,
            Some(Trigger::distance_blend(second, first, ratio)),
            &Transform::default(),
        );
        (stack, first, second)
    }

    #[test]
    fn test_distance_blend_pair_forms_and_survives() {
        let (mut stack, _, second) = paired_stack(0.3);
        assert_eq!(stack.len(), 2);
        assert!(stack.active().is_paired_with_previous());
        assert_eq!(stack.active().linear_influence(), 1.0);

        for _ in 0..30 {
            tick(&mut stack, 0.1);
        }
        assert_eq!(stack.len(), 2);

        assert!(stack.set_distance_blend_ratio(second, 0.8));
        assert!((stack.active().distance_blend_ratio() - 0.8).abs() < 1e-6);
        assert!(!stack.set_distance_blend_ratio(TriggerId::new(), 0.8));
    }

    #[test]
    fn test_released_pair_member_is_pruned() {
        let (mut stack, first, _) = paired_stack(1.0);
        stack.release_trigger(first);
        tick(&mut stack, 0.1);
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.active().profile.name, "b");
        assert!(!stack.active().is_paired_with_previous());
    }

    #[test]
    fn test_snap_keeps_active_pair() {
        let (mut stack, _, _) = paired_stack(0.5);
        stack.snap();
        tick(&mut stack, 0.0);
        assert_eq!(stack.len(), 2);
        assert!(stack.active().is_paired_with_previous());
    }

    #[test]
    fn test_new_push_eclipses_pair() {
        let (mut stack, _, _) = paired_stack(0.5);
        push(&mut stack, &profile("c", 4.0), 0.2);
        tick(&mut stack, 0.5);
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.active().profile.name, "c");
    }

    #[test]
    fn test_static_pose_captured_from_trigger_or_camera() {
        let mut stack = stack();
        let overlook = CameraProfile {
            copy_position: true,
            ..Default::default()
        }
        .into_handle();
        let pose = Transform::from_position(Vec3::new(1.0, 2.0, 3.0));
        stack.push(Some(overlook.clone()), 1.0, TransitionKind::Time, None, &pose);
        assert_eq!(stack.active().state.static_position, pose.position);

        let trigger = Trigger::with_static(TriggerId::new(), Vec3::new(9.0, 9.0, 9.0), Quat::IDENTITY);
        stack.push(Some(overlook), 1.0, TransitionKind::Time, Some(trigger), &pose);
        assert_eq!(stack.active().state.static_position, Vec3::new(9.0, 9.0, 9.0));
    }
}
