//! Arcade Sim entry point
//!
//! Browser builds wire DOM events into the game loop; native builds run a
//! scripted headless session that exercises the whole core.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec3;
    use wasm_bindgen::prelude::*;

    use arcade_sim::audio::WebAudio;
    use arcade_sim::camera::CameraView;
    use arcade_sim::fsm::{BrowserSpawner, OfflineSession, RenderSurface, standard_machine};
    use arcade_sim::sim::RenderView;
    use arcade_sim::{
        CameraRig, Collaborators, FlowOptions, FrameInput, GameLoop, HighScores, LevelProgress,
        ScoreBoard, Settings, StateId, Tuning,
    };

    /// Shows one `#screen-<state>` overlay at a time
    struct DomSurface {
        document: web_sys::Document,
        visible: Option<StateId>,
        running: bool,
    }

    impl DomSurface {
        fn set_hidden(&self, screen: StateId, hidden: bool) {
            let id = format!("screen-{}", screen.as_str());
            if let Some(el) = self.document.get_element_by_id(&id) {
                let classes = el.class_list();
                let _ = if hidden {
                    classes.add_1("hidden")
                } else {
                    classes.remove_1("hidden")
                };
            }
        }
    }

    impl RenderSurface for DomSurface {
        fn show_screen(&mut self, screen: StateId) {
            if let Some(previous) = self.visible.replace(screen) {
                self.set_hidden(previous, true);
            }
            self.set_hidden(screen, false);
        }

        fn set_running(&mut self, running: bool) {
            self.running = running;
        }

        fn present(&mut self, view: &RenderView<'_>, _camera: &CameraView) {
            // Drawing belongs to the per-game renderer; keep the HUD counter fresh
            if let Some(el) = self.document.get_element_by_id("entity-count") {
                let count = view.platforms.len() + view.collectibles.len() + view.powerup_particles.len();
                el.set_text_content(Some(&count.to_string()));
            }
        }
    }

    struct App {
        game: GameLoop,
        collab: Collaborators,
        last_time: f64,
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Arcade Sim starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        let settings = Settings::load();
        let tuning = Tuning::default();
        let machine = standard_machine(&tuning, FlowOptions::default());
        let camera = CameraRig::new(Vec3::ZERO, Vec3::new(0.0, 0.0, 10.0), tuning.camera_rates);
        let mut game = GameLoop::new(tuning, machine, camera, js_sys::Date::now() as u64);
        game.apply_settings(&settings);

        let mut collab = Collaborators {
            audio: Box::new(WebAudio::new(&settings)),
            surface: Box::new(DomSurface {
                document: document.clone(),
                visible: None,
                running: false,
            }),
            score: Box::new(ScoreBoard::new(HighScores::load())),
            levels: Box::new(LevelProgress::new(vec![40, 60, 80])),
            session: Rc::new(OfflineSession),
            tasks: Box::new(BrowserSpawner),
        };
        if let Err(e) = game.start(StateId::Menu, &mut collab.context()) {
            log::error!("Failed to start: {}", e);
            return;
        }

        let app = Rc::new(RefCell::new(App {
            game,
            collab,
            last_time: 0.0,
        }));

        setup_keyboard(&document, app.clone());
        setup_auto_pause(&window, &document, app.clone());
        request_animation_frame(app);

        log::info!("Arcade Sim running!");
    }

    fn setup_keyboard(document: &web_sys::Document, app: Rc<RefCell<App>>) {
        let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
            if app.borrow_mut().game.key_down(&event.code()).is_some() {
                event.prevent_default();
            }
        });
        let _ = document.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_auto_pause(window: &web_sys::Window, document: &web_sys::Document, app: Rc<RefCell<App>>) {
        // Visibility change (tab switch, minimize)
        {
            let app = app.clone();
            let document_clone = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                    app.borrow_mut().game.on_focus_lost();
                }
            });
            let _ = document.add_event_listener_with_callback(
                "visibilitychange",
                closure.as_ref().unchecked_ref(),
            );
            closure.forget();
        }

        // Window blur (click outside)
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                app.borrow_mut().game.on_focus_lost();
            });
            let _ = window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(app, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(app: Rc<RefCell<App>>, time: f64) {
        {
            let mut guard = app.borrow_mut();
            let App {
                game,
                collab,
                last_time,
            } = &mut *guard;

            let dt = if *last_time > 0.0 {
                ((time - *last_time) / 1000.0) as f32
            } else {
                arcade_sim::consts::REFERENCE_DT
            };
            *last_time = time;

            // Player physics lives in the per-game crate; hold the camera still
            let input = FrameInput {
                camera_goal: game.camera().target(),
                ..FrameInput::default()
            };
            game.frame(dt, &input, &mut collab.context());
        }

        request_animation_frame(app);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(not(target_arch = "wasm32"))]
mod native_demo {
    use std::rc::Rc;

    use futures::executor::LocalPool;
    use glam::{Vec2, Vec3};
    use rand::Rng;

    use arcade_sim::audio::NullAudio;
    use arcade_sim::fsm::{HeadlessSurface, OfflineSession, standard_machine};
    use arcade_sim::sim::{Collectible, Entity, EntityKind, Platform, PlatformKind, TrailEmitter, TrailKind};
    use arcade_sim::{
        Action, CameraRig, Collaborators, FlowOptions, FrameInput, GameLoop, HighScores,
        LevelProgress, PlayerView, ScoreBoard, StateId, Tuning,
    };

    const FRAME_DT: f32 = 1.0 / 60.0;
    const SCROLL_SPEED: f32 = 180.0;

    /// Load tuning from the first CLI argument, if given
    fn load_tuning() -> Tuning {
        let Some(path) = std::env::args().nth(1) else {
            return Tuning::default();
        };
        match std::fs::read_to_string(&path).map(|json| Tuning::from_json(&json)) {
            Ok(Ok(tuning)) => {
                log::info!("Loaded tuning from {}", path);
                tuning
            }
            Ok(Err(e)) => {
                log::warn!("Invalid tuning in {}: {}, using defaults", path, e);
                Tuning::default()
            }
            Err(e) => {
                log::warn!("Cannot read {}: {}, using defaults", path, e);
                Tuning::default()
            }
        }
    }

    /// One scripted run: play level 1, clear it, then die on level 2
    pub fn run() {
        let tuning = load_tuning();
        let machine = standard_machine(&tuning, FlowOptions::default());
        let camera = CameraRig::new(Vec3::ZERO, Vec3::new(0.0, 0.0, 10.0), tuning.camera_rates);
        let mut game = GameLoop::new(tuning, machine, camera, 42);

        let mut pool = LocalPool::new();
        let mut collab = Collaborators {
            audio: Box::new(NullAudio),
            surface: Box::new(HeadlessSurface::default()),
            score: Box::new(ScoreBoard::new(HighScores::load())),
            levels: Box::new(LevelProgress::new(vec![40, 60])),
            session: Rc::new(OfflineSession),
            tasks: Box::new(pool.spawner()),
        };

        if let Err(e) = game.start(StateId::Menu, &mut collab.context()) {
            log::error!("Failed to start: {}", e);
            return;
        }
        game.push_action(Action::Start);
        game.push_action(Action::SelectLevel(0));

        let mut player = PlayerView {
            center: Vec2::new(120.0, 300.0),
            turbo: false,
        };
        let mut next_index = 0u32;
        let mut collected = 0usize;

        for frame in 0..1200u32 {
            if game.machine().is_playing() {
                spawn_wave(&mut game, frame, &mut next_index, player.center);
            }
            player.turbo = (frame / 120) % 2 == 1;
            player.center.y = 300.0 + (frame as f32 * 0.05).sin() * 40.0;

            match frame {
                500 => game.push_action(Action::LevelComplete),
                600 => game.push_action(Action::Continue),
                900 => game.on_focus_lost(),
                960 => game.push_action(Action::Resume),
                1100 => game.push_action(Action::PlayerDied),
                _ => {}
            }

            let input = FrameInput {
                player,
                camera_goal: Vec3::new(player.center.x, player.center.y, 0.0),
                scroll_speed: if player.turbo { SCROLL_SPEED * 2.0 } else { SCROLL_SPEED },
            };
            let events = game.frame(FRAME_DT, &input, &mut collab.context());
            collected += events
                .iter()
                .filter(|e| matches!(e, arcade_sim::GameEvent::Collected { .. }))
                .count();
            pool.run_until_stalled();
        }

        let store = game.engine().store();
        log::info!(
            "Finished in state {:?} after {} frames: {} collected, {} entities live",
            game.machine().current(),
            game.frames(),
            collected,
            store.total()
        );
    }

    fn spawn_wave(game: &mut GameLoop, frame: u32, next_index: &mut u32, player: Vec2) {
        let engine = game.engine_mut();
        if frame % 20 == 0 {
            let y = 280.0 + engine.rng_mut().random_range(-60.0..60.0);
            let kind = match *next_index % 4 {
                0 => PlatformKind::Solid,
                1 => PlatformKind::Bouncing {
                    phase: 0.0,
                    amplitude: 12.0,
                    frequency: 1.5,
                    base_y: y,
                },
                2 => PlatformKind::Dissolving {
                    elapsed: 0.0,
                    duration: 2.0,
                },
                _ => PlatformKind::Icy { shimmer: 0.0 },
            };
            let platform = Platform::new(Vec2::new(900.0, y), Vec2::new(120.0, 16.0), Some(*next_index), kind);
            engine.store_mut().insert(EntityKind::Platforms, Entity::Platform(platform));
            *next_index += 1;
        }
        if frame % 45 == 0 {
            let mut coin = Collectible::new(Vec2::new(880.0, player.y), Vec2::new(16.0, 16.0), 10);
            coin.magnet_timer = if frame % 90 == 0 { 3.0 } else { 0.0 };
            engine.store_mut().insert(EntityKind::Collectibles, Entity::Collectible(coin));
        }
        if frame % 60 == 30 {
            // Particle storm: more than the pool holds in one frame
            let origin = player;
            engine.emit_burst(EntityKind::PowerupParticles, origin, 40, 220.0);
            engine.store_mut().insert(
                EntityKind::Trails,
                Entity::Trail(TrailEmitter::new(origin, TrailKind::Boost, 1.0)),
            );
            game.push_action(Action::PowerUp);
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Arcade Sim (native) starting...");
    log::info!("Running headless demo - run with `trunk serve` for the web version");
    native_demo::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
