//! Per-frame driver
//!
//! One [`GameLoop::frame`] call per host animation frame, in a fixed order:
//! camera, entity engine, then the state machine. Entity outcomes feed the
//! state machine in the same frame.

use glam::{Vec2, Vec3};

use crate::audio::SoundEffect;
use crate::camera::CameraRig;
use crate::consts::MAX_FRAME_DT;
use crate::error::FsmError;
use crate::fsm::{StateId, StateMachine, Transition, TransitionContext};
use crate::input::{Action, InputMapper};
use crate::normalized_dt;
use crate::settings::Settings;
use crate::sim::{EntityStore, EntityUpdateEngine, GameEvent, PlayerView};
use crate::tuning::Tuning;

/// What the host's physics produced for this frame
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameInput {
    pub player: PlayerView,
    /// Where the camera should be looking
    pub camera_goal: Vec3,
    /// Horizontal world scroll speed (px/s)
    pub scroll_speed: f32,
}

pub struct GameLoop {
    camera: CameraRig,
    engine: EntityUpdateEngine,
    machine: StateMachine,
    input: InputMapper,
    /// Untouched by player settings
    base_tuning: Tuning,
    last_goal: Vec3,
    pause_on_blur: bool,
    frames: u64,
}

impl GameLoop {
    pub fn new(tuning: Tuning, machine: StateMachine, camera: CameraRig, seed: u64) -> Self {
        let last_goal = camera.target();
        Self {
            camera,
            engine: EntityUpdateEngine::new(tuning.clone(), seed),
            machine,
            input: InputMapper::new(),
            base_tuning: tuning,
            last_goal,
            pause_on_blur: true,
            frames: 0,
        }
    }

    /// Re-derive budgets and camera rates from player settings
    pub fn apply_settings(&mut self, settings: &Settings) {
        let mut tuning = self.base_tuning.clone();
        tuning.apply_settings(settings);
        self.camera.set_rates(tuning.camera_rates);
        self.engine.set_tuning(tuning);
        self.pause_on_blur = settings.pause_on_blur;
    }

    /// Enter the first state
    pub fn start(&mut self, initial: StateId, ctx: &mut TransitionContext<'_>) -> Result<(), FsmError> {
        let transition = self.machine.start(initial, ctx)?;
        self.on_transition(transition);
        Ok(())
    }

    /// Run one frame; returns the entity events it produced
    pub fn frame(
        &mut self,
        elapsed_secs: f32,
        frame: &FrameInput,
        ctx: &mut TransitionContext<'_>,
    ) -> Vec<GameEvent> {
        let dt = elapsed_secs.clamp(0.0, MAX_FRAME_DT);
        self.frames += 1;
        self.last_goal = frame.camera_goal;

        let events = if self.machine.is_playing() {
            self.camera.follow(frame.camera_goal, normalized_dt(dt));
            let events = self.engine.advance_all(dt, frame.scroll_speed, &frame.player);
            route_events(&events, self.engine.store_mut(), ctx);
            events
        } else {
            Vec::new()
        };

        if let Some(transition) = self.machine.apply_pending(ctx) {
            self.on_transition(transition);
        }
        for action in self.input.drain() {
            if let Ok(Some(transition)) = self.machine.handle_input(action, ctx) {
                self.on_transition(transition);
            }
        }
        if let Ok(Some(transition)) = self.machine.update(dt, ctx) {
            self.on_transition(transition);
        }

        ctx.surface
            .present(&self.engine.store().render_view(), &self.camera.view());
        events
    }

    /// Window blur / hidden tab
    pub fn on_focus_lost(&mut self) {
        if self.pause_on_blur && self.machine.is_playing() {
            log::info!("Auto-paused (focus lost)");
            self.input.push(Action::Pause);
        }
    }

    pub fn key_down(&mut self, key: &str) -> Option<Action> {
        self.input.key_down(key)
    }

    pub fn push_action(&mut self, action: Action) {
        self.input.push(action);
    }

    pub fn input_mut(&mut self) -> &mut InputMapper {
        &mut self.input
    }

    pub fn machine(&self) -> &StateMachine {
        &self.machine
    }

    pub fn camera(&self) -> &CameraRig {
        &self.camera
    }

    pub fn engine(&self) -> &EntityUpdateEngine {
        &self.engine
    }

    /// Spawn call sites (level loader, collision handlers)
    pub fn engine_mut(&mut self) -> &mut EntityUpdateEngine {
        &mut self.engine
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    fn on_transition(&mut self, transition: Transition) {
        let resumed = transition.from == Some(StateId::Paused);
        if transition.to == StateId::Playing && !resumed {
            self.engine.store_mut().clear();
            self.camera.snap_to(self.last_goal);
            log::debug!("New run: store cleared, camera snapped");
        }
    }
}

fn route_events(events: &[GameEvent], store: &mut EntityStore, ctx: &mut TransitionContext<'_>) {
    for event in events {
        match event {
            GameEvent::Collected { value, pos, .. } => {
                ctx.score.add_points(u64::from(*value));
                ctx.score.stats_mut().collectibles += 1;
                ctx.audio.play(SoundEffect::Collect);
                store.spawn_floating_text(*pos + Vec2::new(0.0, -8.0), format!("+{}", value));
            }
            GameEvent::PlatformCrumbled { .. } => ctx.audio.play(SoundEffect::Crumble),
            GameEvent::PlatformExited { index } => {
                ctx.levels.platform_exited(*index);
                ctx.score.stats_mut().platforms_passed += 1;
            }
            GameEvent::MagnetExpired | GameEvent::ParticlesEvicted { .. } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fsm::testing::Harness;
    use crate::fsm::{FlowOptions, standard_machine};
    use crate::score::ScoreKeeper;
    use crate::sim::{Collectible, Entity, EntityKind, Platform, PlatformKind};

    fn game() -> GameLoop {
        let tuning = Tuning::default();
        let machine = standard_machine(
            &tuning,
            FlowOptions {
                level_select: false,
                celebrate_goal: false,
            },
        );
        let camera = CameraRig::new(Vec3::ZERO, Vec3::new(0.0, 10.0, 10.0), tuning.camera_rates);
        GameLoop::new(tuning, machine, camera, 7)
    }

    fn started(h: &mut Harness) -> GameLoop {
        let mut g = game();
        g.start(StateId::Menu, &mut h.ctx()).unwrap();
        g.push_action(Action::Start);
        g.frame(0.016, &FrameInput::default(), &mut h.ctx());
        assert!(g.machine().is_playing());
        g
    }

    fn platform(x: f32, index: u32) -> Entity {
        Entity::Platform(Platform::new(
            Vec2::new(x, 300.0),
            Vec2::new(40.0, 10.0),
            Some(index),
            PlatformKind::Solid,
        ))
    }

    #[test]
    fn entities_hold_still_outside_play() {
        let mut h = Harness::new();
        let mut g = started(&mut h);
        g.engine_mut().store_mut().insert(EntityKind::Platforms, platform(500.0, 1));
        let input = FrameInput {
            scroll_speed: 100.0,
            ..FrameInput::default()
        };

        g.frame(0.05, &input, &mut h.ctx());
        let x = g.engine().store().platforms[0].pos.x;
        assert!((x - 495.0).abs() < 1e-3);

        // The pausing frame still advances; input is read after the engine
        g.key_down("Escape");
        g.frame(0.05, &input, &mut h.ctx());
        assert!(g.machine().is_paused());
        let x = g.engine().store().platforms[0].pos.x;
        g.frame(0.05, &input, &mut h.ctx());
        assert_eq!(g.engine().store().platforms[0].pos.x, x);

        // Resume keeps the run's entities
        g.key_down("Escape");
        g.frame(0.05, &input, &mut h.ctx());
        assert!(g.machine().is_playing());
        assert_eq!(g.engine().store().platforms.len(), 1);
    }

    #[test]
    fn long_frames_are_clamped() {
        let mut h = Harness::new();
        let mut g = started(&mut h);
        g.engine_mut().store_mut().insert(EntityKind::Platforms, platform(500.0, 1));
        let input = FrameInput {
            scroll_speed: 100.0,
            ..FrameInput::default()
        };
        g.frame(5.0, &input, &mut h.ctx());
        let x = g.engine().store().platforms[0].pos.x;
        assert!((x - 490.0).abs() < 1e-3, "moved to {}", x);
    }

    #[test]
    fn exits_reach_level_progress_once() {
        let mut h = Harness::new();
        let mut g = started(&mut h);
        g.engine_mut().store_mut().insert(EntityKind::Platforms, platform(-200.0, 3));
        for _ in 0..5 {
            g.frame(0.016, &FrameInput::default(), &mut h.ctx());
        }
        assert_eq!(h.journal.count("platform_exited 3"), 1);
        assert_eq!(h.score.snapshot().stats.platforms_passed, 1);
    }

    #[test]
    fn collected_items_score_and_float_text() {
        let mut h = Harness::new();
        let mut g = started(&mut h);
        let player = PlayerView {
            center: Vec2::new(100.0, 100.0),
            turbo: false,
        };
        let mut coin = Collectible::new(Vec2::new(94.0, 94.0), Vec2::new(12.0, 12.0), 25);
        coin.magnet_timer = 2.0;
        g.engine_mut().store_mut().insert(EntityKind::Collectibles, Entity::Collectible(coin));

        let events = g.frame(
            0.016,
            &FrameInput {
                player,
                ..FrameInput::default()
            },
            &mut h.ctx(),
        );
        assert!(matches!(events[0], GameEvent::Collected { value: 25, .. }));
        assert_eq!(h.score.board.score(), 25);
        assert_eq!(h.score.snapshot().stats.collectibles, 1);
        assert_eq!(h.journal.count("play collect"), 1);
        assert_eq!(g.engine().store().floating_texts[0].text, "+25");
    }

    #[test]
    fn new_run_starts_clean() {
        let mut h = Harness::new();
        let mut g = started(&mut h);
        g.engine_mut().store_mut().insert(EntityKind::Platforms, platform(500.0, 1));
        let goal = FrameInput {
            camera_goal: Vec3::new(300.0, 0.0, 0.0),
            ..FrameInput::default()
        };
        g.frame(0.016, &goal, &mut h.ctx());
        assert!(g.camera().target().x < 300.0);

        g.push_action(Action::PlayerDied);
        g.frame(0.016, &goal, &mut h.ctx());
        assert_eq!(g.machine().current(), Some(StateId::GameOver));
        g.push_action(Action::Restart);
        g.frame(0.016, &goal, &mut h.ctx());

        assert!(g.machine().is_playing());
        assert!(g.engine().store().is_empty());
        assert_eq!(g.camera().target(), goal.camera_goal);
    }

    #[test]
    fn focus_loss_pauses_only_when_enabled() {
        let mut h = Harness::new();
        let mut g = started(&mut h);
        g.on_focus_lost();
        g.frame(0.016, &FrameInput::default(), &mut h.ctx());
        assert!(g.machine().is_paused());

        // Already paused: nothing queued
        g.on_focus_lost();
        g.push_action(Action::Resume);
        g.frame(0.016, &FrameInput::default(), &mut h.ctx());
        assert!(g.machine().is_playing());

        g.apply_settings(&Settings {
            pause_on_blur: false,
            ..Settings::default()
        });
        g.on_focus_lost();
        g.frame(0.016, &FrameInput::default(), &mut h.ctx());
        assert!(g.machine().is_playing());
    }

    #[test]
    fn every_frame_is_presented() {
        let mut h = Harness::new();
        let mut g = started(&mut h);
        for _ in 0..3 {
            g.frame(0.016, &FrameInput::default(), &mut h.ctx());
        }
        assert_eq!(h.surface.presented, 4);
        assert_eq!(g.frames(), 4);
    }
}
