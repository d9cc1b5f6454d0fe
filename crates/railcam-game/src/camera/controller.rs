//! Camera controller
//!
//! Owns the blend stack and every camera effect, and runs them in a fixed
//! order each tick: sample path, update influences, simulate and blend,
//! lock-on, shake, motion blur, crossfade, free camera, output.

use glam::{EulerRot, Mat4, Quat, Vec2, Vec3};
use railcam_core::Transform;
use railcam_world::{ActorProvider, ActorState, PathSampler, PathService};
use tracing::{debug, info, warn};

use crate::input::InputState;

use super::blend::{BlendStack, PushOutcome, TransitionKind, Trigger, TriggerId};
use super::blender::blend_entries;
use super::config::{CameraConfig, CameraSettings};
use super::crossfade::Crossfade;
use super::events::CameraEvent;
use super::free_camera::{FreeCamera, FreeCameraState};
use super::lockon::LockOnTracker;
use super::motion_blur::{MotionBlurController, MotionBlurParams};
use super::profile::ProfileHandle;
use super::screen::{self, Projection};
use super::shake::{ShakeSettings, ShakeSystem};
use super::simulator::{simulate, SimulationContext};

/// Collaborators borrowed for one tick
#[derive(Clone, Copy)]
pub struct TickContext<'a> {
    /// Tracked actor (None keeps the last known state)
    pub actor: Option<&'a dyn ActorProvider>,
    /// Level path (None keeps the last valid sample)
    pub path: Option<&'a dyn PathService>,
    /// Global time scale
    pub time_scale: f32,
    /// Slow-motion "time-break" is active
    pub time_break: bool,
}

impl<'a> TickContext<'a> {
    pub fn new(actor: &'a dyn ActorProvider, path: &'a dyn PathService) -> Self {
        Self {
            actor: Some(actor),
            path: Some(path),
            time_scale: 1.0,
            time_break: false,
        }
    }

    /// Context without any collaborators
    pub fn detached() -> Self {
        Self {
            actor: None,
            path: None,
            time_scale: 1.0,
            time_break: false,
        }
    }
}

/// Everything the renderer needs from the camera for one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraOutput {
    pub transform: Transform,
    /// Vertical field of view in degrees
    pub fov: f32,
    /// Actor position in normalized screen space
    pub actor_screen_position: Vec2,
    pub motion_blur: MotionBlurParams,
    /// Opacity of the captured frame drawn over the view
    pub crossfade_opacity: f32,
    /// Shake offset added to pitch (x), yaw (y) and roll (z)
    pub shake_rotation: Vec3,
    pub lockon_blend: f32,
}

impl Default for CameraOutput {
    fn default() -> Self {
        Self {
            transform: Transform::default(),
            fov: CameraConfig::default().default_fov,
            actor_screen_position: Vec2::splat(0.5),
            motion_blur: MotionBlurParams::default(),
            crossfade_opacity: 0.0,
            shake_rotation: Vec3::ZERO,
            lockon_blend: 0.0,
        }
    }
}

/// Camera controller
pub struct CameraController {
    /// Configuration
    pub config: CameraConfig,
    settings: CameraSettings,
    stack: BlendStack,
    sampler: PathSampler,
    /// Last valid actor state
    actor: ActorState,
    lockon: LockOnTracker,
    shakes: ShakeSystem,
    motion_blur: MotionBlurController,
    crossfade: Crossfade,
    free_camera: FreeCamera,
    /// Gameplay pose before any free camera override
    gameplay: Transform,
    output: CameraOutput,
    events: Vec<CameraEvent>,
}

impl CameraController {
    /// Create a controller whose stack starts with `base` fully blended in
    pub fn new(config: CameraConfig, settings: CameraSettings, base: ProfileHandle) -> Self {
        info!("Camera controller starting with profile '{}'", base.name);
        let output = CameraOutput {
            fov: config.default_fov,
            ..Default::default()
        };
        Self {
            config,
            settings,
            stack: BlendStack::new(base),
            sampler: PathSampler::new(),
            actor: ActorState::default(),
            lockon: LockOnTracker::new(),
            shakes: ShakeSystem::new(),
            motion_blur: MotionBlurController::new(),
            crossfade: Crossfade::new(),
            free_camera: FreeCamera::new(),
            gameplay: Transform::default(),
            output,
            events: Vec::new(),
        }
    }

    /// Use a seeded shake generator
    pub fn with_shake_seed(mut self, seed: u64) -> Self {
        self.shakes = ShakeSystem::with_seed(seed);
        self
    }

    pub fn settings(&self) -> &CameraSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: CameraSettings) {
        self.settings = settings;
    }

    pub fn stack(&self) -> &BlendStack {
        &self.stack
    }

    pub fn output(&self) -> &CameraOutput {
        &self.output
    }

    /// Pose computed by the gameplay camera, ignoring the free camera
    pub fn gameplay_transform(&self) -> Transform {
        self.gameplay
    }

    pub fn free_camera_state(&self) -> FreeCameraState {
        self.free_camera.state()
    }

    /// Push a profile, typically from a trigger volume
    pub fn push_profile(
        &mut self,
        profile: Option<ProfileHandle>,
        blend_time: f32,
        kind: TransitionKind,
        trigger: Option<Trigger>,
    ) -> PushOutcome {
        let outcome = self
            .stack
            .push(profile, blend_time, kind, trigger, &self.gameplay);

        if let PushOutcome::Pushed {
            entry,
            snapped,
            crossfade_rate,
        } = outcome
        {
            let name = self.stack.active().profile.name.clone();
            info!("Camera transition to '{}' ({:?})", name, kind);
            if let Some(rate) = crossfade_rate {
                self.events.push(CameraEvent::CrossfadeCaptureRequested);
                self.crossfade.start(rate);
            }
            self.events.push(CameraEvent::TransitionStarted {
                entry,
                profile: name,
                kind,
                snapped,
            });
        }
        outcome
    }

    /// Cut instantly to the active profile on the next tick
    pub fn snap(&mut self) {
        info!("Camera snap requested");
        self.stack.snap();
    }

    /// Reset transient state after the actor respawns or teleports
    pub fn on_respawn(&mut self) {
        self.snap();
        self.shakes.on_respawn();
        self.lockon.reset();
        self.motion_blur.reset_history();
    }

    /// The actor left a trigger volume
    pub fn release_trigger(&mut self, trigger: TriggerId) {
        self.stack.release_trigger(trigger);
    }

    /// Update how far the actor is between two overlapping triggers
    pub fn set_distance_blend_ratio(&mut self, trigger: TriggerId, ratio: f32) -> bool {
        self.stack.set_distance_blend_ratio(trigger, ratio)
    }

    pub fn add_shake(&mut self, settings: ShakeSettings) {
        self.shakes.add(settings);
    }

    pub fn request_motion_blur(&mut self) {
        self.motion_blur.request_start();
    }

    pub fn stop_motion_blur(&mut self) {
        self.motion_blur.request_stop();
    }

    /// Take every event raised since the last drain
    pub fn drain_events(&mut self) -> Vec<CameraEvent> {
        std::mem::take(&mut self.events)
    }

    /// Advance the camera by one tick
    pub fn update(&mut self, ctx: &TickContext<'_>, input: &InputState, dt: f32) -> &CameraOutput {
        if let Some(provider) = ctx.actor {
            let state = provider.actor_state();
            if state.is_valid() {
                self.actor = state;
            } else {
                warn!("Ignoring non-finite actor state");
            }
        }
        let sample = self.sampler.refresh(ctx.path);

        let snap = self.stack.is_snapping();
        if snap {
            debug!("Camera snapping this tick");
        }
        self.stack.update_influences(dt, &mut self.events);

        let sim = SimulationContext {
            config: &self.config,
            actor: &self.actor,
            sampler: &self.sampler,
            path: ctx.path,
            snap,
            lockon_blend: self.lockon.blend(),
            dt,
        };
        let mut candidate = blend_entries(self.stack.entries_mut(), |entry| {
            simulate(&entry.profile, &mut entry.state, &sim)
        });

        // Lock-on
        let pivot_height = self.config.pivot_height;
        let unlocked_position = candidate.position(&sample, pivot_height);
        self.lockon
            .update(&self.actor, unlocked_position, &self.config, snap, dt);
        candidate.pitch += self.lockon.pitch_adjustment(candidate.lockon_weight);

        // Shake
        let position = candidate.position(&sample, pivot_height);
        let shake = self
            .shakes
            .update(dt, position, self.settings.effective_shake_strength());
        let rotation =
            candidate.rotation() * Quat::from_euler(EulerRot::YXZ, shake.y, shake.x, shake.z);

        let pose = Transform::from_position_rotation(position, rotation.normalize());
        if pose.is_finite() {
            self.gameplay = pose;
        } else {
            warn!("Camera produced a non-finite pose, keeping the previous one");
        }
        let fov = if candidate.fov.is_finite() && candidate.fov > 0.0 {
            candidate.fov
        } else {
            self.config.default_fov
        };

        let motion_blur = self.motion_blur.update(
            dt,
            &self.gameplay,
            ctx.time_scale,
            ctx.time_break,
            &self.config,
            self.settings.motion_blur_enabled,
        );

        if self.crossfade.update(dt) {
            debug!("Camera crossfade finished");
            self.events.push(CameraEvent::CrossfadeFinished);
        }

        // Free camera
        if let Some(state) = self.free_camera.handle_input(input, &self.gameplay) {
            self.events.push(CameraEvent::FreeCameraChanged(state));
        }
        self.free_camera.update(input, &self.config.free_camera, dt);
        let transform = if self.free_camera.is_overriding() {
            self.free_camera.transform()
        } else {
            self.gameplay
        };

        self.stack.end_tick();

        let projection = Projection::from_config(&self.config, fov);
        self.output = CameraOutput {
            transform,
            fov,
            actor_screen_position: screen::convert_to_screen_space(
                self.actor.position,
                &transform,
                &projection,
            ),
            motion_blur,
            crossfade_opacity: self.crossfade.opacity(),
            shake_rotation: shake,
            lockon_blend: self.lockon.blend(),
        };
        &self.output
    }

    fn projection(&self) -> Projection {
        Projection::from_config(&self.config, self.output.fov)
    }

    /// Get the view matrix
    pub fn view_matrix(&self) -> Mat4 {
        screen::view_matrix(&self.output.transform)
    }

    /// Get the projection matrix
    pub fn projection_matrix(&self) -> Mat4 {
        self.projection().matrix()
    }

    /// Normalized screen position of a world point
    pub fn convert_to_screen_space(&self, point: Vec3) -> Vec2 {
        screen::convert_to_screen_space(point, &self.output.transform, &self.projection())
    }

    /// Whether a world point is visible within the configured margin
    pub fn is_on_screen(&self, point: Vec3) -> bool {
        screen::is_on_screen(
            point,
            &self.output.transform,
            &self.projection(),
            self.config.screen_margin,
        )
    }

    pub fn is_behind_camera(&self, point: Vec3) -> bool {
        screen::is_behind_camera(point, &self.output.transform)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::profile::CameraProfile;
    use crate::input::InputAction;
    use railcam_world::{LockOnTarget, PolylinePath, TargetId};
    use std::f32::consts::PI;

    const DT: f32 = 1.0 / 60.0;

    struct Scene {
        path: PolylinePath,
        actor: ActorState,
    }

    impl Scene {
        fn new() -> Self {
            let mut path = PolylinePath::straight(Vec3::ZERO, -Vec3::Z, 300.0);
            path.set_progress(100.0);
            Self {
                path,
                actor: ActorState::at(Vec3::new(0.0, 0.0, -100.0), -Vec3::Z),
            }
        }

        fn ctx(&self) -> TickContext<'_> {
            TickContext::new(&self.actor, &self.path)
        }

        /// Pivot for an actor on the path centre
        fn pivot(&self) -> Vec3 {
            self.actor.position + Vec3::Y * CameraConfig::default().pivot_height
        }
    }

    fn controller(base: CameraProfile) -> CameraController {
        CameraController::new(
            CameraConfig::default(),
            CameraSettings::default(),
            base.into_handle(),
        )
        .with_shake_seed(11)
    }

    fn run(camera: &mut CameraController, scene: &Scene, ticks: usize) {
        let input = InputState::new();
        for _ in 0..ticks {
            camera.update(&scene.ctx(), &input, DT);
        }
    }

    fn camera_distance(camera: &CameraController, scene: &Scene) -> f32 {
        camera.output().transform.position.distance(scene.pivot())
    }

    #[test]
    fn test_timed_blend_halfway() {
        let scene = Scene::new();
        let mut camera = controller(CameraProfile::with_distance("a", 10.0));
        run(&mut camera, &scene, 1);
        assert!((camera_distance(&camera, &scene) - 10.0).abs() < 1e-3);

        let b = CameraProfile {
            yaw: PI,
            ..CameraProfile::with_distance("b", 20.0)
        };
        camera.push_profile(Some(b.into_handle()), 1.0, TransitionKind::Time, None);
        run(&mut camera, &scene, 30);

        assert!((camera_distance(&camera, &scene) - 15.0).abs() < 1e-2);
        let forward = camera.output().transform.forward();
        assert!(forward.distance(-Vec3::X) < 1e-2);
        assert_eq!(camera.stack().len(), 2);

        run(&mut camera, &scene, 40);
        assert_eq!(camera.stack().len(), 1);
        assert!((camera_distance(&camera, &scene) - 20.0).abs() < 1e-3);
    }

    #[test]
    fn test_zero_dt_ticks_hold_pose_mid_blend() {
        let scene = Scene::new();
        let mut camera = controller(CameraProfile::with_distance("a", 10.0));
        run(&mut camera, &scene, 10);
        let b = CameraProfile {
            yaw: PI,
            ..CameraProfile::with_distance("b", 20.0)
        };
        camera.push_profile(Some(b.into_handle()), 1.0, TransitionKind::Time, None);
        run(&mut camera, &scene, 20);

        let before = *camera.output();
        let input = InputState::new();
        for _ in 0..5 {
            camera.update(&scene.ctx(), &input, 0.0);
        }
        assert_eq!(camera.output().transform, before.transform);
        assert_eq!(camera.output().fov, before.fov);
        assert_eq!(camera.stack().len(), 2);

        run(&mut camera, &scene, 1);
        assert_ne!(camera.output().transform, before.transform);
    }

    #[test]
    fn test_distance_blend_pair_ratio() {
        let scene = Scene::new();
        let mut camera = controller(CameraProfile::with_distance("base", 6.0));
        let first = TriggerId::new();
        let second = TriggerId::new();

        camera.push_profile(
            Some(CameraProfile::with_distance("a", 10.0).into_handle()),
            0.0,
            TransitionKind::Time,
            Some(Trigger::new(first)),
        );
        run(&mut camera, &scene, 1);
        camera.push_profile(
            Some(CameraProfile::with_distance("b", 20.0).into_handle()),
            0.5,
            TransitionKind::Time,
            Some(Trigger::distance_blend(second, first, 0.3)),
        );
        run(&mut camera, &scene, 1);
        assert!((camera_distance(&camera, &scene) - 13.0).abs() < 1e-3);

        assert!(camera.set_distance_blend_ratio(second, 0.8));
        run(&mut camera, &scene, 1);
        assert!((camera_distance(&camera, &scene) - 18.0).abs() < 1e-3);

        camera.release_trigger(first);
        run(&mut camera, &scene, 1);
        assert_eq!(camera.stack().len(), 1);
        assert_eq!(camera.stack().active().profile.name, "b");
    }

    #[test]
    fn test_snap_is_authoritative_next_tick() {
        let scene = Scene::new();
        let mut camera = controller(CameraProfile::with_distance("a", 10.0));
        camera.push_profile(
            Some(CameraProfile::with_distance("slow", 30.0).into_handle()),
            5.0,
            TransitionKind::Time,
            None,
        );
        run(&mut camera, &scene, 20);

        let outcome = camera.push_profile(
            Some(CameraProfile::with_distance("cut", 4.0).into_handle()),
            0.0,
            TransitionKind::Time,
            None,
        );
        assert!(matches!(outcome, PushOutcome::Pushed { snapped: true, .. }));
        run(&mut camera, &scene, 1);
        assert_eq!(camera.stack().len(), 1);
        assert!((camera_distance(&camera, &scene) - 4.0).abs() < 1e-3);
    }

    #[test]
    fn test_push_events() {
        let scene = Scene::new();
        let mut camera = controller(CameraProfile::with_distance("a", 10.0));
        camera.push_profile(
            Some(CameraProfile::with_distance("b", 12.0).into_handle()),
            0.25,
            TransitionKind::Crossfade,
            None,
        );
        let events = camera.drain_events();
        assert_eq!(events[0], CameraEvent::CrossfadeCaptureRequested);
        assert!(matches!(
            &events[1],
            CameraEvent::TransitionStarted { profile, snapped: true, kind: TransitionKind::Crossfade, .. } if profile == "b"
        ));

        run(&mut camera, &scene, 1);
        assert!(camera.output().crossfade_opacity > 0.0);
        let events = camera.drain_events();
        assert!(events
            .iter()
            .any(|e| matches!(e, CameraEvent::TransitionCompleted { profile, .. } if profile == "b")));

        run(&mut camera, &scene, 30);
        assert_eq!(camera.output().crossfade_opacity, 0.0);
        assert!(camera.drain_events().contains(&CameraEvent::CrossfadeFinished));
        assert!(camera.drain_events().is_empty());
    }

    #[test]
    fn test_rejected_push_has_no_events() {
        let mut camera = controller(CameraProfile::with_distance("a", 10.0));
        assert_eq!(
            camera.push_profile(None, 1.0, TransitionKind::Time, None),
            PushOutcome::Rejected
        );
        assert!(camera.drain_events().is_empty());
    }

    #[test]
    fn test_static_trigger_holds_position() {
        let scene = Scene::new();
        let mut camera = controller(CameraProfile::with_distance("a", 10.0));
        run(&mut camera, &scene, 1);

        let overlook = CameraProfile {
            copy_position: true,
            pitch: 0.0,
            ..Default::default()
        };
        let spot = Vec3::new(8.0, 5.0, -90.0);
        camera.push_profile(
            Some(overlook.into_handle()),
            0.0,
            TransitionKind::Time,
            Some(Trigger::with_static(TriggerId::new(), spot, Quat::IDENTITY)),
        );
        run(&mut camera, &scene, 2);
        let output = camera.output();
        assert!(output.transform.position.distance(spot) < 1e-4);
        // Looking at the actor keeps it centred on screen.
        assert!(output.actor_screen_position.distance(Vec2::new(0.5, 0.5)) < 0.1);
        assert!(camera.is_on_screen(scene.actor.position));
    }

    #[test]
    fn test_missing_collaborators_keep_last_pose() {
        let scene = Scene::new();
        let mut camera = controller(CameraProfile::with_distance("a", 10.0));
        run(&mut camera, &scene, 5);
        let before = camera.output().transform;

        let input = InputState::new();
        camera.update(&TickContext::detached(), &input, DT);
        let after = camera.output().transform;
        assert!(after.is_finite());
        assert!(after.position.distance(before.position) < 1e-3);
    }

    #[test]
    fn test_lockon_raises_distance_and_pitch() {
        let mut scene = Scene::new();
        let mut camera = controller(CameraProfile::with_distance("a", 10.0));
        run(&mut camera, &scene, 1);
        let level_forward = camera.output().transform.forward();

        scene.actor.focus = Some(LockOnTarget {
            id: TargetId::new(),
            position: Vec3::new(0.0, 8.0, -106.0),
        });
        run(&mut camera, &scene, 240);
        let output = camera.output();
        assert!(output.lockon_blend > 0.95);
        assert!(camera_distance(&camera, &scene) > 11.5);
        assert!(output.transform.forward().y > level_forward.y);
    }

    #[test]
    fn test_shake_respects_settings() {
        let scene = Scene::new();
        let mut camera = controller(CameraProfile::with_distance("a", 10.0));
        camera.add_shake(ShakeSettings::default());
        run(&mut camera, &scene, 10);
        assert_ne!(camera.output().shake_rotation, Vec3::ZERO);

        camera.set_settings(CameraSettings {
            screen_shake_enabled: false,
            ..CameraSettings::default()
        });
        camera.add_shake(ShakeSettings::default());
        run(&mut camera, &scene, 1);
        assert_eq!(camera.output().shake_rotation, Vec3::ZERO);

        camera.on_respawn();
        run(&mut camera, &scene, 1);
        assert_eq!(camera.output().shake_rotation, Vec3::ZERO);
    }

    #[test]
    fn test_motion_blur_requests() {
        let scene = Scene::new();
        let mut camera = controller(CameraProfile::with_distance("a", 10.0));
        camera.request_motion_blur();
        run(&mut camera, &scene, 60);
        assert_eq!(camera.output().motion_blur.opacity, 1.0);
        camera.stop_motion_blur();
        run(&mut camera, &scene, 60);
        assert_eq!(camera.output().motion_blur.opacity, 0.0);
    }

    #[test]
    fn test_free_camera_overrides_output_only() {
        let scene = Scene::new();
        let mut camera = controller(CameraProfile::with_distance("a", 10.0));
        run(&mut camera, &scene, 2);

        let mut input = InputState::new();
        input.press(InputAction::ToggleFreeCamera);
        input.press(InputAction::FreeCamUp);
        camera.update(&scene.ctx(), &input, DT);
        assert_eq!(camera.free_camera_state(), FreeCameraState::Active);
        assert!(camera
            .drain_events()
            .contains(&CameraEvent::FreeCameraChanged(FreeCameraState::Active)));

        input.clear_frame();
        for _ in 0..30 {
            camera.update(&scene.ctx(), &input, DT);
        }
        // Active flies but still shows the gameplay camera
        assert_eq!(camera.output().transform, camera.gameplay_transform());

        input.press(InputAction::LockFreeCamera);
        camera.update(&scene.ctx(), &input, DT);
        assert_eq!(camera.free_camera_state(), FreeCameraState::Locked);
        input.clear_frame();
        for _ in 0..30 {
            camera.update(&scene.ctx(), &input, DT);
        }
        let output = camera.output().transform;
        let gameplay = camera.gameplay_transform();
        assert!(output.position.y > gameplay.position.y + 1.0);
        assert!((gameplay.position.distance(scene.pivot()) - 10.0).abs() < 1e-3);
    }

    #[test]
    fn test_screen_queries() {
        let scene = Scene::new();
        let mut camera = controller(CameraProfile::with_distance("a", 10.0));
        run(&mut camera, &scene, 1);

        assert!(camera.is_on_screen(Vec3::new(0.0, 1.0, -120.0)));
        assert!(camera.is_behind_camera(Vec3::new(0.0, 1.0, -50.0)));
        assert!(!camera.is_on_screen(Vec3::new(0.0, 1.0, -50.0)));
        let centre = camera.convert_to_screen_space(Vec3::new(0.0, 1.0, -150.0));
        assert!(centre.distance(Vec2::splat(0.5)) < 1e-3);
        assert!(camera.view_matrix().is_finite());
        assert!(camera.projection_matrix().is_finite());
    }
}
