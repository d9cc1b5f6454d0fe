//! Railcam - Headless demo of the blended rail camera
//!
//! Walks an actor along a hilly path through a series of camera trigger
//! zones and logs the resulting camera pose.

mod settings;

use anyhow::{Context, Result};
use glam::{Quat, Vec2, Vec3};
use railcam_core::{GameTime, TimeConfig};
use railcam_game::camera::{CameraConfig, CameraController, CameraEvent, ShakeSettings};
use railcam_game::{InputHandler, ProfileHandle, ProfileLibrary, TickContext, TransitionKind, Trigger, TriggerId};
use railcam_world::{ActorState, LockOnTarget, PathPoint, PathService, PolylinePath, TargetId};
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;
use winit::event::{ElementState, MouseButton};
use winit::keyboard::{KeyCode, PhysicalKey};

use settings::GameSettings;

/// Camera profiles used by the demo level
const PROFILES: &str = r#"
[profiles.run]
distance = 7.0
pitch = -0.2

[profiles.valley]
distance = 11.0
pitch = -0.35
distance_mode = "Sample"
sample_offset = 2.0

[profiles.ridge]
distance = 14.0
pitch = -0.15
follow_path_tilt = true

[profiles.corridor]
distance = 6.0
hall_width = 1.5
hall_rotation_strength = 0.15
horizontal_tracking = "Move"
vertical_tracking = "Rotate"

[profiles.overlook]
copy_position = true
pitch = -0.05
fov = 55.0

[profiles.finale]
distance = 9.0
yaw = 0.6
viewport_offset = [1.0, 0.0]
"#;

/// Actor speed along the path (units per second)
const RUN_SPEED: f32 = 12.0;
/// Simulated frame length
const FRAME_TIME: f32 = 1.0 / 60.0;

/// A raw window event replayed by the demo
#[derive(Debug, Clone, Copy)]
enum ScriptedInput {
    Key(KeyCode, ElementState),
    Mouse(MouseButton, ElementState),
    Motion(f64, f64),
}

/// Debug fly-camera inspection, keyed by path progress
const INSPECTION: &[(f32, ScriptedInput)] = &[
    (60.0, ScriptedInput::Key(KeyCode::F1, ElementState::Pressed)),
    (60.4, ScriptedInput::Key(KeyCode::F1, ElementState::Released)),
    (61.0, ScriptedInput::Key(KeyCode::F2, ElementState::Pressed)),
    (61.4, ScriptedInput::Key(KeyCode::F2, ElementState::Released)),
    (62.0, ScriptedInput::Key(KeyCode::KeyE, ElementState::Pressed)),
    (63.0, ScriptedInput::Mouse(MouseButton::Right, ElementState::Pressed)),
    (63.2, ScriptedInput::Motion(-40.0, 12.0)),
    (63.6, ScriptedInput::Mouse(MouseButton::Right, ElementState::Released)),
    (70.0, ScriptedInput::Key(KeyCode::KeyE, ElementState::Released)),
    (72.0, ScriptedInput::Key(KeyCode::F1, ElementState::Pressed)),
    (72.4, ScriptedInput::Key(KeyCode::F1, ElementState::Released)),
];

/// A camera trigger volume spanning a stretch of path progress
struct TriggerZone {
    trigger: Trigger,
    profile: ProfileHandle,
    start: f32,
    end: f32,
    blend_time: f32,
    kind: TransitionKind,
    /// Progress over which a distance blend goes from 0 to 1
    blend_span: f32,
    inside: bool,
}

impl TriggerZone {
    fn new(trigger: Trigger, profile: ProfileHandle, start: f32, end: f32, blend_time: f32) -> Self {
        Self {
            trigger,
            profile,
            start,
            end,
            blend_time,
            kind: TransitionKind::Time,
            blend_span: end - start,
            inside: false,
        }
    }

    fn contains(&self, progress: f32) -> bool {
        (self.start..self.end).contains(&progress)
    }

    /// How far the actor is into the zone
    fn ratio(&self, progress: f32) -> f32 {
        ((progress - self.start) / self.blend_span.max(f32::EPSILON)).clamp(0.0, 1.0)
    }
}

/// Demo state
struct Demo {
    game_time: GameTime,
    path: PolylinePath,
    actor: ActorState,
    camera: CameraController,
    zones: Vec<TriggerZone>,
    input: InputHandler,
    next_input: usize,
    focus: TargetId,
    shake_fired: bool,
    time_break: bool,
}

impl Demo {
    fn new(settings: &GameSettings, library: &ProfileLibrary) -> Result<Self> {
        let path = hilly_path();
        let config = CameraConfig {
            default_fov: settings.video.fov,
            aspect_ratio: settings.video.aspect_ratio(),
            ..Default::default()
        };
        let camera = CameraController::new(config, settings.camera.clone(), library.get("run")?);

        let mut zones = Vec::new();

        // Two overlapping zones blend by how far the actor is between them.
        let valley = TriggerId::new();
        let ridge = TriggerId::new();
        zones.push(TriggerZone::new(
            Trigger::new(valley),
            library.get("valley")?,
            40.0,
            110.0,
            0.8,
        ));
        let mut ridge_zone = TriggerZone::new(
            Trigger::distance_blend(ridge, valley, 0.0),
            library.get("ridge")?,
            80.0,
            150.0,
            0.8,
        );
        // Fully on the ridge camera where the valley zone ends
        ridge_zone.blend_span = 30.0;
        zones.push(ridge_zone);

        zones.push(TriggerZone::new(
            Trigger::new(TriggerId::new()),
            library.get("corridor")?,
            160.0,
            210.0,
            0.5,
        ));

        let overlook = path.sample(255.0, Vec2::ZERO).position + Vec3::new(12.0, 6.0, 4.0);
        zones.push(TriggerZone::new(
            Trigger::with_static(TriggerId::new(), overlook, Quat::IDENTITY),
            library.get("overlook")?,
            230.0,
            270.0,
            1.0,
        ));

        let mut finale = TriggerZone::new(
            Trigger::new(TriggerId::new()),
            library.get("finale")?,
            280.0,
            f32::MAX,
            0.4,
        );
        finale.kind = TransitionKind::Crossfade;
        zones.push(finale);

        Ok(Self {
            game_time: GameTime::new(TimeConfig::default()),
            path,
            actor: ActorState::default(),
            camera,
            zones,
            input: InputHandler::new(),
            next_input: 0,
            focus: TargetId::new(),
            shake_fired: false,
            time_break: false,
        })
    }

    /// Advance the actor and fire zone enter/exit callbacks
    fn step_actor(&mut self, dt: f32) {
        self.path.advance(RUN_SPEED * dt);
        let progress = self.path.progress();
        let sample = self.path.sample(progress, Vec2::new((progress * 0.05).sin() * 2.0, 0.0));
        self.actor.velocity = (sample.position - self.actor.position) / dt.max(f32::EPSILON);
        self.actor.position = sample.position;
        self.actor.forward = sample.forward();

        for zone in &mut self.zones {
            let inside = zone.contains(progress);
            if inside && !zone.inside {
                debug!("Entered zone at {:.1}", progress);
                self.camera.push_profile(
                    Some(zone.profile.clone()),
                    zone.blend_time,
                    zone.kind,
                    Some(zone.trigger),
                );
            } else if !inside && zone.inside {
                debug!("Left zone at {:.1}", progress);
                self.camera.release_trigger(zone.trigger.id);
            }
            if inside && zone.trigger.distance_blend.is_some() {
                self.camera
                    .set_distance_blend_ratio(zone.trigger.id, zone.ratio(progress));
            }
            zone.inside = inside;
        }

        // Slow-motion stretch
        let time_break = (180.0..200.0).contains(&progress);
        if time_break != self.time_break {
            self.time_break = time_break;
            if time_break {
                self.game_time.set_time_scale(0.4);
                self.camera.request_motion_blur();
            } else {
                self.game_time.set_time_scale(1.0);
                self.camera.stop_motion_blur();
            }
        }

        // Lock onto a beacon over the corridor
        self.actor.focus = (165.0..205.0).contains(&progress).then(|| LockOnTarget {
            id: self.focus,
            position: self.path.sample(200.0, Vec2::ZERO).position + Vec3::Y * 6.0,
        });

        while let Some((at, event)) = INSPECTION.get(self.next_input) {
            if *at > progress {
                break;
            }
            self.next_input += 1;
            match *event {
                ScriptedInput::Key(key, state) => {
                    self.input.handle_keyboard(PhysicalKey::Code(key), state)
                }
                ScriptedInput::Mouse(button, state) => self.input.handle_mouse_button(button, state),
                ScriptedInput::Motion(dx, dy) => self.input.handle_mouse_motion((dx, dy)),
            }
        }

        if !self.shake_fired && progress > 120.0 {
            self.shake_fired = true;
            self.camera.add_shake(ShakeSettings {
                origin: Some(self.actor.position + Vec3::new(0.0, 0.0, -10.0)),
                maximum_distance: 60.0,
                duration: 0.8,
                fade_out: 0.6,
                ..Default::default()
            });
        }
    }

    /// Run one frame; returns the number of fixed ticks run
    fn frame(&mut self) -> u32 {
        self.game_time.update(FRAME_TIME);
        let steps = self.game_time.fixed_steps();
        let dt = self.game_time.fixed_timestep();

        for _ in 0..steps {
            self.step_actor(dt);
            let ctx = TickContext {
                time_scale: self.game_time.time_scale(),
                time_break: self.time_break,
                ..TickContext::new(&self.actor, &self.path)
            };
            self.camera.update(&ctx, &self.input.state, dt);
            self.input.end_frame();

            for event in self.camera.drain_events() {
                log_event(&event);
            }
        }
        steps
    }

    fn finished(&self) -> bool {
        self.path.progress() >= self.path.length()
    }
}

fn log_event(event: &CameraEvent) {
    match event {
        CameraEvent::TransitionStarted { profile, kind, snapped, .. } => {
            info!("Camera -> '{}' ({:?}{})", profile, kind, if *snapped { ", cut" } else { "" });
        }
        CameraEvent::TransitionCompleted { profile, .. } => {
            debug!("Camera settled on '{}'", profile);
        }
        CameraEvent::CrossfadeCaptureRequested => info!("Capturing frame for crossfade"),
        CameraEvent::CrossfadeFinished => info!("Crossfade finished"),
        CameraEvent::FreeCameraChanged(state) => info!("Free camera: {:?}", state),
    }
}

/// Rolling hills with a banked turn
fn hilly_path() -> PolylinePath {
    let points = (0..=40)
        .map(|i| {
            let t = i as f32 * 8.0;
            let height = (t * 0.04).sin() * 6.0 + (t * 0.013).cos() * 3.0;
            let sway = if t > 100.0 { ((t - 100.0) * 0.02).sin() * 25.0 } else { 0.0 };
            let tilt = if (100.0..160.0).contains(&t) { 0.25 } else { 0.0 };
            PathPoint::with_tilt(Vec3::new(sway, height, -t), tilt)
        })
        .collect();
    PolylinePath::new(points, false)
}

fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set subscriber")?;

    info!("Starting Railcam demo...");

    let settings = GameSettings::load();
    let library = ProfileLibrary::from_toml_str(PROFILES).context("Failed to load camera profiles")?;
    info!("Loaded {} camera profiles", library.len());

    let mut demo = Demo::new(&settings, &library)?;
    info!("Path length {:.1} units", demo.path.length());

    let mut ticks: u64 = 0;
    while !demo.finished() {
        let before = ticks;
        ticks += demo.frame() as u64;
        if ticks / 60 > before / 60 {
            let output = demo.camera.output();
            let position = output.transform.position;
            let forward = output.transform.forward();
            info!(
                "t={:>5.1}s progress={:>6.1} camera=({:.1}, {:.1}, {:.1}) forward=({:.2}, {:.2}, {:.2}) fov={:.0} actor_on_screen={}",
                demo.game_time.total_time,
                demo.path.progress(),
                position.x,
                position.y,
                position.z,
                forward.x,
                forward.y,
                forward.z,
                output.fov,
                demo.camera.is_on_screen(demo.actor.position),
            );
        }
    }

    info!("Demo finished after {} ticks", ticks);
    Ok(())
}
