//! It's Alive! entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::KeyboardEvent;

    use its_alive::audio::AudioManager;
    use its_alive::sim::GamePhase;
    use its_alive::{FeedbackCue, FeedbackDispatcher, FeedbackSink, Game, MeshHit, RawInput, Settings};

    thread_local! {
        static GAME: RefCell<Option<Rc<RefCell<WebGame>>>> = const { RefCell::new(None) };
    }

    /// Browser-side wrapper holding the session and frame timing
    pub struct WebGame {
        game: Game,
        last_time: f64,
    }

    impl WebGame {
        fn new(seed: u64, settings: &Settings) -> Self {
            Self {
                game: Game::new(seed, settings),
                last_time: 0.0,
            }
        }

        /// Update HUD elements in DOM
        fn update_hud(&self) {
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };
            let data = self.game.machine().data();

            if let Some(el) = document.get_element_by_id("hud-level") {
                el.set_text_content(Some(&data.level.to_string()));
            }
            if let Some(el) = document.get_element_by_id("hud-timer") {
                el.set_text_content(Some(&format!("{:.1}", data.time_remaining)));
            }
            if let Some(el) = document.get_element_by_id("hud-timer-bar") {
                let _ = el.set_attribute(
                    "style",
                    &format!("width: {:.1}%", data.time_fraction() * 100.0),
                );
            }
            if let Some(el) = document.get_element_by_id("hud-steps") {
                el.set_text_content(Some(&data.steps_remaining().to_string()));
            }
            if let Some(el) = document.get_element_by_id("hud-monster") {
                el.set_text_content(Some(data.monster_state.as_str()));
            }
            if let Some(el) = document.get_element_by_id("hud-prompt") {
                let text = match data.phase {
                    GamePhase::Idle => "PRESS START",
                    GamePhase::RitualStep => data.current_step().map_or("", |s| s.prompt()),
                    GamePhase::MonsterMad => "THE MONSTER IS MAD! PRESS START",
                    GamePhase::ItsAlive => "IT'S ALIVE! PRESS START",
                };
                el.set_text_content(Some(text));
            }
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        let _ = console_log::init_with_level(log::Level::Info);

        log::info!("It's Alive! starting...");

        let settings = Settings::load();
        let seed = its_alive::platform::session_seed();
        let web_game = Rc::new(RefCell::new(WebGame::new(seed, &settings)));

        // Accessibility flag for the CSS/3D layer
        if settings.reduced_motion {
            if let Some(root) = web_sys::window()
                .and_then(|w| w.document())
                .and_then(|d| d.document_element())
            {
                let _ = root.set_attribute("data-reduced-motion", "true");
            }
        }

        // Feedback: audio plus console logging
        let audio = Rc::new(RefCell::new(AudioManager::from_settings(&settings)));
        let dispatcher = Rc::new(RefCell::new(FeedbackDispatcher::new()));
        {
            let mut d = dispatcher.borrow_mut();
            let audio_sink = audio.clone();
            d.add_sink(move |cue: &FeedbackCue| audio_sink.borrow_mut().deliver(cue));
            d.add_sink(|cue: &FeedbackCue| {
                if let Ok(json) = serde_json::to_string(cue) {
                    log::debug!("cue {}", json);
                }
            });
        }
        web_game.borrow_mut().game.attach_feedback(dispatcher);

        GAME.with(|g| *g.borrow_mut() = Some(web_game.clone()));

        setup_input_handlers(web_game.clone());
        setup_visibility_handler(web_game.clone(), audio, settings);
        request_animation_frame(web_game);

        log::info!("It's Alive! running (seed {})", seed);
    }

    fn setup_input_handlers(web_game: Rc<RefCell<WebGame>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
            if event.repeat() {
                return;
            }
            let code = event.code();
            if code == "Escape" {
                web_game.borrow_mut().game.reset();
                return;
            }
            let raw = RawInput::Key(code);
            if web_game
                .borrow_mut()
                .game
                .submit_raw(&raw, event.time_stamp())
                .is_some()
            {
                // Keep arrows/space from scrolling the page
                event.prevent_default();
            }
        });
        let _ = window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    /// Restart frame timing while hidden so the step timer doesn't jump on
    /// return, and mute while away if the player asked for it
    fn setup_visibility_handler(
        web_game: Rc<RefCell<WebGame>>,
        audio: Rc<RefCell<AudioManager>>,
        settings: Settings,
    ) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };
        let document_clone = document.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let hidden = document_clone.visibility_state() == web_sys::VisibilityState::Hidden;
            if settings.mute_on_blur {
                audio.borrow_mut().set_muted(hidden || settings.muted);
            }
            if hidden {
                let mut g = web_game.borrow_mut();
                g.last_time = 0.0;
                log::info!("Tab hidden at {}", g.game.current_state().as_str());
            } else {
                audio.borrow().resume();
            }
        });
        let _ = document
            .add_event_listener_with_callback("visibilitychange", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame(web_game: Rc<RefCell<WebGame>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(web_game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(web_game: Rc<RefCell<WebGame>>, time: f64) {
        {
            let mut g = web_game.borrow_mut();

            // Calculate delta time
            let dt = if g.last_time > 0.0 {
                ((time - g.last_time) / 1000.0) as f32
            } else {
                0.0
            };
            g.last_time = time;

            // Game::frame caps dt at the configured max_frame_delta
            g.game.frame(dt);
            g.update_hud();
        }

        request_animation_frame(web_game);
    }

    /// Raycast hit reported by the 3D scene (mesh-local coordinates, y up)
    pub fn mesh_hit(name: &str, px: f32, py: f32, cx: f32, cy: f32) -> bool {
        let hit = MeshHit::new(name, glam::Vec2::new(px, py), glam::Vec2::new(cx, cy));
        let now = its_alive::platform::now_ms();
        with_game(|g| g.game.submit_raw(&RawInput::Mesh(hit), now).is_some())
            .unwrap_or(false)
    }

    pub fn mesh_miss() {
        let now = its_alive::platform::now_ms();
        with_game(|g| g.game.submit_raw(&RawInput::Miss, now));
    }

    /// Current state for the JS renderers
    pub fn snapshot_json() -> String {
        with_game(|g| serde_json::to_string(g.game.machine().data()).ok())
            .flatten()
            .unwrap_or_default()
    }

    fn with_game<R>(f: impl FnOnce(&mut WebGame) -> R) -> Option<R> {
        GAME.with(|cell| {
            let game = cell.borrow().clone()?;
            let mut g = game.borrow_mut();
            Some(f(&mut g))
        })
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn mesh_hit(name: &str, px: f32, py: f32, cx: f32, cy: f32) -> bool {
    wasm_game::mesh_hit(name, px, py, cx, cy)
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn mesh_miss() {
    wasm_game::mesh_miss();
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn snapshot_json() -> String {
    wasm_game::snapshot_json()
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("It's Alive! (native) starting...");
    log::info!("Native mode runs a headless demo - use `trunk serve` for the console");

    demo_session();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Scripted session: clear level 1, botch level 2, retry, then let it time out
#[cfg(not(target_arch = "wasm32"))]
fn demo_session() {
    use std::cell::RefCell;
    use std::rc::Rc;

    use its_alive::sim::{GamePhase, InputAction};
    use its_alive::{FeedbackCue, FeedbackDispatcher, Game, RawInput, Settings};

    let settings = Settings::load();
    let seed = its_alive::platform::session_seed();
    let mut game = Game::new(seed, &settings);

    let dispatcher = Rc::new(RefCell::new(FeedbackDispatcher::new()));
    dispatcher.borrow_mut().add_sink(|cue: &FeedbackCue| match cue {
        FeedbackCue::StepPrompt { name, prompt, .. } => log::info!("[{}] {}", name, prompt),
        other => log::info!("{:?}", other),
    });
    game.attach_feedback(dispatcher);

    let dt = 1.0 / 60.0;
    let mut now_ms = 0.0;
    let mut press = |game: &mut Game, code: &str| {
        now_ms += 250.0;
        game.submit_raw(&RawInput::Key(code.to_string()), now_ms);
        game.frame(dt);
    };

    press(&mut game, "Enter");
    while game.current_state() == GamePhase::RitualStep {
        let key = match game.current_step().map(|s| s.action()) {
            Some(InputAction::Up) => "ArrowUp",
            Some(InputAction::Down) => "ArrowDown",
            Some(InputAction::Left) => "ArrowLeft",
            Some(InputAction::Right) => "ArrowRight",
            Some(InputAction::ButtonA) => "KeyZ",
            Some(InputAction::ButtonB) => "KeyX",
            Some(InputAction::Start) | None => "Enter",
        };
        press(&mut game, key);
    }

    // Level 2: press the wrong thing, then retry
    press(&mut game, "Enter");
    let wrong = match game.current_step().map(|s| s.action()) {
        Some(InputAction::ButtonB) => "KeyZ",
        _ => "KeyX",
    };
    press(&mut game, wrong);
    press(&mut game, "Enter");

    // Let the clock run out
    while game.current_state() == GamePhase::RitualStep {
        game.frame(dt);
    }

    let data = game.state_data();
    log::info!(
        "Demo finished: {} on level {} (mistakes {}, monster {})",
        data.phase.as_str(),
        data.level,
        data.mistake_count,
        data.monster_state.as_str()
    );
    game.reset();
}
