//! Face Dodge entry point
//!
//! In the browser this wires the page (buttons, keys, camera bridge) to a
//! [`GameLoopDriver`](face_dodge::GameLoopDriver) and runs it from
//! `requestAnimationFrame`. Natively it plays a short scripted session
//! headlessly and logs what happens.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen_futures::JsFuture;
    use web_sys::{Document, HtmlCanvasElement, HtmlInputElement, HtmlSelectElement};

    use face_dodge::perception::{
        Detection, FaceSensor, SampleOutcome, SampleReply, SensorReadiness,
    };
    use face_dodge::platform::DeviceProfile;
    use face_dodge::session::SessionPhase;
    use face_dodge::{GameLoopDriver, GameMode, InputEvent, PlayArea, SensorError, Settings};

    // The page owns the camera and the detector models and exposes them on
    // `window.faceDodge`; the game only sees JSON detections.
    #[wasm_bindgen(inline_js = "
        export function sensor_state() {
            const b = window.faceDodge;
            if (!b || !b.cameraOn) return 'off';
            return b.modelReady ? 'ready' : 'loading';
        }

        export function detect_faces() {
            return window.faceDodge.detect().then((r) => JSON.stringify(r));
        }

        export function draw_frame(json) {
            const b = window.faceDodge;
            if (b && typeof b.render === 'function') b.render(json);
        }
    ")]
    extern "C" {
        fn sensor_state() -> String;
        #[wasm_bindgen(catch)]
        fn detect_faces() -> Result<js_sys::Promise, JsValue>;
        fn draw_frame(json: &str);
    }

    fn js_error_text(err: &JsValue) -> String {
        err.as_string().unwrap_or_else(|| format!("{:?}", err))
    }

    async fn run_detection() -> SampleOutcome {
        let promise = detect_faces().map_err(|e| SensorError::Detection(js_error_text(&e)))?;
        let value = JsFuture::from(promise)
            .await
            .map_err(|e| SensorError::Detection(js_error_text(&e)))?;
        let json = value
            .as_string()
            .ok_or_else(|| SensorError::Detection("detector returned no data".to_string()))?;
        Ok(serde_json::from_str::<Detection>(&json)?)
    }

    /// Face sensor backed by the page's detector bridge
    struct BrowserSensor;

    impl FaceSensor for BrowserSensor {
        fn readiness(&self) -> SensorReadiness {
            match sensor_state().as_str() {
                "ready" => SensorReadiness::Ready,
                "loading" => SensorReadiness::ModelLoading,
                _ => SensorReadiness::CameraOff,
            }
        }

        fn begin_detect(&mut self, reply: SampleReply) {
            wasm_bindgen_futures::spawn_local(async move {
                reply.complete(run_detection().await);
            });
        }
    }

    /// Game instance holding all state
    struct Game {
        driver: GameLoopDriver,
        sensor: BrowserSensor,
        last_phase: &'static str,
    }

    impl Game {
        fn handle(&mut self, event: InputEvent) {
            let now = face_dodge::platform::now_ms();
            let changed = self.driver.handle(event, now);
            if changed
                && matches!(
                    event,
                    InputEvent::SelectMode { .. } | InputEvent::SetMirror { .. }
                )
            {
                self.driver.settings().save();
            }
        }

        /// Sync buttons and selects with the session phase
        fn update_controls(&mut self, document: &Document) {
            let phase = self.driver.session().phase();
            let in_run = self.driver.session().in_run();
            let name = phase.name();
            if name == self.last_phase {
                return;
            }
            self.last_phase = name;

            if let Some(btn) = document.get_element_by_id("start-btn") {
                let _ = btn.class_list().toggle_with_force("disabled", in_run);
            }
            if let Some(btn) = document.get_element_by_id("pause-btn") {
                let label = if phase == SessionPhase::Paused { "Resume" } else { "Pause" };
                btn.set_text_content(Some(label));
            }
            if let Some(select) = document
                .get_element_by_id("mode-select")
                .and_then(|el| el.dyn_into::<HtmlSelectElement>().ok())
            {
                select.set_disabled(in_run);
            }
        }
    }

    fn play_area(canvas: &HtmlCanvasElement) -> PlayArea {
        let rect = canvas.get_bounding_client_rect();
        PlayArea::new(rect.width() as f32, rect.height() as f32)
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Face Dodge starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .expect("no canvas")
            .dyn_into()
            .expect("not a canvas");

        let settings = Settings::load();
        let device = DeviceProfile::detect();
        let seed = rand::random::<u64>();
        let driver = GameLoopDriver::new(&settings, device, play_area(&canvas), seed);

        // Reflect stored preferences in the page
        if let Some(select) = document
            .get_element_by_id("mode-select")
            .and_then(|el| el.dyn_into::<HtmlSelectElement>().ok())
        {
            select.set_value(settings.mode.as_str());
        }
        if let Some(toggle) = document
            .get_element_by_id("mirror-toggle")
            .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
        {
            toggle.set_checked(settings.mirror);
        }

        let game = Rc::new(RefCell::new(Game {
            driver,
            sensor: BrowserSensor,
            last_phase: "",
        }));

        setup_buttons(&document, game.clone());
        setup_preferences(&document, game.clone());
        setup_keyboard(game.clone());
        setup_resize(canvas, game.clone());
        setup_auto_pause(game.clone());

        request_animation_frame(game);

        log::info!("Face Dodge running!");
    }

    fn on_click(document: &Document, id: &str, game: Rc<RefCell<Game>>, event: InputEvent) {
        let Some(btn) = document.get_element_by_id(id) else {
            log::warn!("Missing #{} in page", id);
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
            game.borrow_mut().handle(event);
        });
        let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_buttons(document: &Document, game: Rc<RefCell<Game>>) {
        on_click(document, "start-btn", game.clone(), InputEvent::Start);
        on_click(document, "pause-btn", game.clone(), InputEvent::TogglePause);
        on_click(document, "reset-btn", game.clone(), InputEvent::Reset);
        on_click(document, "restart-btn", game.clone(), InputEvent::Restart);
        on_click(document, "help-btn", game.clone(), InputEvent::OpenOverlay);
        on_click(document, "help-close-btn", game, InputEvent::CloseOverlay);
    }

    fn setup_preferences(document: &Document, game: Rc<RefCell<Game>>) {
        if let Some(select) = document
            .get_element_by_id("mode-select")
            .and_then(|el| el.dyn_into::<HtmlSelectElement>().ok())
        {
            let game = game.clone();
            let target = select.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                let mode = GameMode::from_str(&target.value()).unwrap_or_default();
                let mut g = game.borrow_mut();
                g.handle(InputEvent::SelectMode { mode });
                // A refused change snaps the select back
                target.set_value(g.driver.mode().as_str());
            });
            let _ = select
                .add_event_listener_with_callback("change", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        if let Some(toggle) = document
            .get_element_by_id("mirror-toggle")
            .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
        {
            let target = toggle.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                game.borrow_mut().handle(InputEvent::SetMirror {
                    enabled: target.checked(),
                });
            });
            let _ = toggle
                .add_event_listener_with_callback("change", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_keyboard(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().expect("no window");
        let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
            let mut g = game.borrow_mut();
            match event.key().as_str() {
                " " => {
                    event.prevent_default();
                    g.handle(InputEvent::TogglePause);
                }
                "Enter" => g.handle(InputEvent::Start),
                "Escape" => g.handle(InputEvent::CloseOverlay),
                _ => {}
            }
        });
        let _ = window
            .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_resize(canvas: HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        let window = web_sys::window().expect("no window");
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let area = play_area(&canvas);
            game.borrow_mut().handle(InputEvent::Resize {
                width: area.width,
                height: area.height,
            });
        });
        let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        {
            let mut g = game.borrow_mut();
            let Game { driver, sensor, .. } = &mut *g;
            let snapshot = driver.frame(time, sensor);
            match serde_json::to_string(&snapshot) {
                Ok(json) => draw_frame(&json),
                Err(e) => log::warn!("Snapshot encode failed: {}", e),
            }
            if let Some(document) = web_sys::window().and_then(|w| w.document()) {
                g.update_controls(&document);
            }
        }

        request_animation_frame(game);
    }

    fn setup_auto_pause(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        // Visibility change (tab switch, minimize)
        {
            let game = game.clone();
            let document_clone = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                    let mut g = game.borrow_mut();
                    if g.driver.session().is_running() {
                        g.handle(InputEvent::Pause);
                        log::info!("Auto-paused (tab hidden)");
                    }
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
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                let mut g = game.borrow_mut();
                if g.driver.session().is_running() {
                    g.handle(InputEvent::Pause);
                    log::info!("Auto-paused (window blur)");
                }
            });
            let _ = window
                .add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Face Dodge (native) starting...");
    log::info!("The camera game runs in the browser; playing a scripted session instead");

    demo::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use face_dodge::perception::{
        DetectorKind, Detection, Face, FaceSensor, SampleReply, SensorReadiness,
    };
    use face_dodge::platform::DeviceProfile;
    use face_dodge::session::SessionPhase;
    use face_dodge::{GameLoopDriver, InputEvent, PlayArea, Settings};
    use glam::Vec2;

    const FRAME_MS: f64 = 1000.0 / 60.0;
    /// Give up after this much simulated wall time (ms)
    const DEMO_LIMIT_MS: f64 = 120_000.0;

    /// A face drifting left and right across a 640x480 camera frame
    fn swaying_face(t_secs: f64) -> Detection {
        let x = 320.0 + 220.0 * (t_secs * 0.7).sin() as f32;
        let y = 260.0 + 60.0 * (t_secs * 1.3).cos() as f32;
        Detection {
            faces: vec![Face::from_box(x - 60.0, y - 80.0, x + 60.0, y + 80.0)],
            frame_width: 640.0,
            frame_height: 480.0,
            detector: DetectorKind::Box,
        }
    }

    /// Answers every sample immediately with the face at the current time
    struct SwayingSensor {
        now_ms: f64,
    }

    impl FaceSensor for SwayingSensor {
        fn readiness(&self) -> SensorReadiness {
            SensorReadiness::Ready
        }

        fn begin_detect(&mut self, reply: SampleReply) {
            reply.complete(Ok(swaying_face(self.now_ms / 1000.0)));
        }
    }

    pub fn run() {
        let settings = Settings::load();
        let seed = std::env::args()
            .nth(1)
            .and_then(|s| s.parse().ok())
            .unwrap_or(7);
        let mut driver = GameLoopDriver::new(
            &settings,
            DeviceProfile::detect(),
            PlayArea::new(960.0, 640.0),
            seed,
        );
        let mut sensor = SwayingSensor { now_ms: 0.0 };

        let mut now = 0.0;
        driver.handle(InputEvent::Start, now);
        let mut next_report = 0.0;

        while now < DEMO_LIMIT_MS {
            sensor.now_ms = now;
            let snapshot = driver.frame(now, &mut sensor);

            if now >= next_report {
                next_report += 1000.0;
                log::info!(
                    "{:>5.1}s {:<9} lvl {} enemies {:>2} items {} score {:?}",
                    snapshot.elapsed_secs,
                    snapshot.phase.name(),
                    snapshot.level,
                    snapshot.enemies.len(),
                    snapshot.items.len(),
                    snapshot.score
                );
            }

            if let SessionPhase::Ended { .. } = snapshot.phase {
                if let Some(result) = snapshot.result {
                    println!(
                        "{} {}: {}",
                        result.title, result.final_label, result.final_value
                    );
                }
                let player = Vec2::new(snapshot.player.x, snapshot.player.y);
                log::info!("Player finished at {:?}", player);
                return;
            }
            now += FRAME_MS;
        }
        println!("Demo stopped after {:.0}s without a result", DEMO_LIMIT_MS / 1000.0);
    }
}
