//! Per-frame game loop
//!
//! [`GameLoopDriver`] owns everything a session needs (state machine, clock,
//! simulation state, face sampler, tuning) and is advanced once per display
//! frame by the host. Input arrives as [`InputEvent`]s between frames.
//!
//! Frame order:
//! 1. Unless paused: apply any finished face sample, maybe start a new one.
//!    While paused the outstanding sample's timeout stands still.
//! 2. Finish the countdown if due (stamps the clock)
//! 3. Running: read active time, end on the time limit, otherwise `advance`
//!    the simulation and end on an unshielded hit
//! 4. Outside a run (and not paused) the player still follows the face
//! 5. Publish a [`RenderSnapshot`]

use serde::{Deserialize, Serialize};

use crate::PlayArea;
use crate::consts::MAX_FRAME_DT;
use crate::mode::{GameMode, ModeConfig};
use crate::perception::{FaceSensor, PerceptionSampler};
use crate::platform::DeviceProfile;
use crate::session::{Session, SessionOutcome, SessionPhase};
use crate::settings::Settings;
use crate::sim::{GameState, SimEvent, advance};
use crate::snapshot::{FaceView, RenderSnapshot, SnapshotContext};

/// Discrete requests from the page (buttons, keys, window events)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputEvent {
    Start,
    /// Reset and immediately start a new countdown
    Restart,
    TogglePause,
    Pause,
    Resume,
    /// Back to Idle without starting
    Reset,
    SelectMode { mode: GameMode },
    SetMirror { enabled: bool },
    OpenOverlay,
    CloseOverlay,
    Resize { width: f32, height: f32 },
}

pub struct GameLoopDriver {
    session: Session,
    state: GameState,
    sampler: PerceptionSampler,
    device: DeviceProfile,
    mode: GameMode,
    config: ModeConfig,
    custom_config: Option<ModeConfig>,
    mirror: bool,
    base_seed: u64,
    runs: u64,
    last_frame_ms: Option<f64>,
    /// Active ms reached by the previous simulation step
    last_active_ms: f64,
    /// Active seconds shown on the HUD (clamped to the limit in timed modes)
    elapsed_secs: f64,
    last_events: Vec<SimEvent>,
}

impl GameLoopDriver {
    pub fn new(settings: &Settings, device: DeviceProfile, area: PlayArea, seed: u64) -> Self {
        log::info!(
            "Face Dodge driver: mode={}, mirror={}, mobile-like={}",
            settings.mode.as_str(),
            settings.mirror,
            device.is_mobile_like()
        );
        Self {
            session: Session::new(),
            state: GameState::new(seed, area),
            sampler: PerceptionSampler::new(),
            device,
            mode: settings.mode,
            config: ModeConfig::resolve(settings.mode, &device),
            custom_config: None,
            mirror: settings.mirror,
            base_seed: seed,
            runs: 0,
            last_frame_ms: None,
            last_active_ms: 0.0,
            elapsed_secs: 0.0,
            last_events: Vec::new(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Direct access to the simulation, for hosts that script a session
    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn sampler(&self) -> &PerceptionSampler {
        &self.sampler
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    /// Tuning of the current (or next) run
    pub fn config(&self) -> &ModeConfig {
        &self.config
    }

    pub fn mirror(&self) -> bool {
        self.mirror
    }

    pub fn settings(&self) -> Settings {
        Settings {
            mode: self.mode,
            mirror: self.mirror,
        }
    }

    /// Events produced by the last simulation step
    pub fn last_events(&self) -> &[SimEvent] {
        &self.last_events
    }

    /// Use `config` instead of the mode preset for subsequent runs.
    /// Refused during a run.
    pub fn set_custom_config(&mut self, config: ModeConfig) -> bool {
        if self.session.in_run() {
            return false;
        }
        self.custom_config = Some(config);
        self.config = config;
        true
    }

    /// Apply one input event. Returns whether it changed anything.
    pub fn handle(&mut self, event: InputEvent, now: f64) -> bool {
        log::debug!("Input {:?} in {}", event, self.session.phase().name());
        match event {
            InputEvent::Start => self.start(now),
            InputEvent::Restart => {
                self.reset(now);
                self.start(now)
            }
            InputEvent::TogglePause => self.session.toggle_pause(now),
            InputEvent::Pause => self.session.pause(now),
            InputEvent::Resume => self.session.resume(now),
            InputEvent::Reset => self.reset(now),
            InputEvent::SelectMode { mode } => self.select_mode(mode),
            InputEvent::SetMirror { enabled } => {
                let changed = self.mirror != enabled;
                self.mirror = enabled;
                changed
            }
            InputEvent::OpenOverlay => self.session.open_overlay(now),
            InputEvent::CloseOverlay => self.session.close_overlay(now),
            InputEvent::Resize { width, height } => {
                let area = PlayArea::new(width, height);
                let changed = area != self.state.area;
                self.state.resize(area, !self.session.in_run());
                changed
            }
        }
    }

    fn start(&mut self, now: f64) -> bool {
        if !self.session.start(now) {
            return false;
        }
        // Tuning is fixed for the whole run
        self.config = self
            .custom_config
            .unwrap_or_else(|| ModeConfig::resolve(self.mode, &self.device));
        self.runs += 1;
        self.state.reset(self.base_seed.wrapping_add(self.runs));
        self.last_active_ms = 0.0;
        self.elapsed_secs = 0.0;
        self.last_events.clear();
        log::info!(
            "Run #{} ({}) seed={}",
            self.runs,
            self.mode.as_str(),
            self.state.seed
        );
        true
    }

    fn reset(&mut self, now: f64) -> bool {
        if !self.session.reset(now) {
            return false;
        }
        self.sampler.cancel();
        let seed = self.state.seed;
        self.state.reset(seed);
        self.last_active_ms = 0.0;
        self.elapsed_secs = 0.0;
        self.last_events.clear();
        true
    }

    fn select_mode(&mut self, mode: GameMode) -> bool {
        if self.session.in_run() {
            log::debug!("Mode change refused during a run");
            return false;
        }
        self.mode = mode;
        self.custom_config = None;
        self.config = ModeConfig::resolve(mode, &self.device);
        true
    }

    fn finish(&mut self, now: f64, outcome: SessionOutcome) {
        if !self.session.end(now, outcome) {
            return;
        }
        self.sampler.cancel();
        log::info!(
            "Run over: {:?} after {:.1}s, score {}, level {}",
            outcome,
            self.elapsed_secs,
            self.state.display_score(),
            self.state.level()
        );
    }

    /// Advance one display frame at wall time `now` (ms)
    pub fn frame(&mut self, now: f64, sensor: &mut dyn FaceSensor) -> RenderSnapshot {
        let wall_dt = self
            .last_frame_ms
            .map(|t| ((now - t) / 1000.0).max(0.0) as f32)
            .unwrap_or(0.0);
        self.last_frame_ms = Some(now);

        let paused = self.session.is_paused();
        if !paused {
            if let Some(target) = self.sampler.collect(now, self.mirror, &self.state.area) {
                self.state.player.pursuit_target = target;
            }
            self.sampler.sample(now, sensor);
        } else {
            self.sampler.hold(now);
        }

        if self.session.update_countdown(now) {
            self.last_active_ms = 0.0;
        }

        if self.session.is_running() {
            self.step(now);
        } else if !paused {
            self.last_events.clear();
            self.state.player.pursue(wall_dt.min(MAX_FRAME_DT));
        }

        self.snapshot(now)
    }

    fn step(&mut self, now: f64) {
        let active_ms = self.session.clock().elapsed_active_ms(now);

        if self.config.is_timed() {
            let limit_secs = self.config.session_time_limit_secs;
            if active_ms >= limit_secs * 1000.0 {
                self.elapsed_secs = limit_secs;
                self.last_events.clear();
                self.finish(now, SessionOutcome::Clear);
                return;
            }
        }

        let dt = ((active_ms - self.last_active_ms) / 1000.0).max(0.0) as f32;
        self.last_active_ms = active_ms;
        self.elapsed_secs = active_ms / 1000.0;

        let report = advance(&mut self.state, &self.config, dt, active_ms);
        for event in &report.events {
            match event {
                SimEvent::Praise { message } => log::debug!("Praise: {}", message),
                SimEvent::ShieldBlocked { enemy_id } => {
                    log::debug!("Shield blocked enemy {}", enemy_id)
                }
                _ => {}
            }
        }
        let hit = report.hit_by;
        self.last_events = report.events;

        if let Some(enemy_id) = hit {
            log::debug!("Hit by enemy {}", enemy_id);
            self.finish(now, SessionOutcome::Loss);
        }
    }

    /// Snapshot of the current frame without advancing anything
    pub fn snapshot(&self, now: f64) -> RenderSnapshot {
        let status = self.sampler.status();
        let diagnostic = status.diagnostic(now);
        let face = FaceView {
            message: diagnostic.as_ref().map(|d| d.message()),
            diagnostic,
            detector: status.detector(),
        };
        let phase = self.session.phase();
        let elapsed_secs = match phase {
            SessionPhase::Idle | SessionPhase::Countdown { .. } => 0.0,
            _ => self.elapsed_secs,
        };
        RenderSnapshot::capture(
            &self.state,
            SnapshotContext {
                phase,
                mode: self.mode,
                config: &self.config,
                mirror: self.mirror,
                overlay_open: self.session.overlay_open(),
                elapsed_secs,
                countdown: self.session.countdown_remaining(now),
                face,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::COUNTDOWN_MS;
    use crate::perception::{DetectorKind, Detection, Face, ScriptedSensor};
    use glam::Vec2;

    fn driver() -> GameLoopDriver {
        GameLoopDriver::new(
            &Settings::default(),
            DeviceProfile::default(),
            PlayArea::new(800.0, 600.0),
            99,
        )
    }

    fn face_at(x: f32, y: f32) -> Detection {
        Detection {
            faces: vec![Face::from_keypoints(vec![Vec2::new(x, y)])],
            frame_width: 640.0,
            frame_height: 480.0,
            detector: DetectorKind::Mesh,
        }
    }

    fn run_frames(d: &mut GameLoopDriver, sensor: &mut ScriptedSensor, from: f64, to: f64) -> f64 {
        let mut now = from;
        while now < to {
            d.frame(now, sensor);
            now += 16.0;
        }
        now
    }

    #[test]
    fn test_start_countdown_then_run() {
        let mut d = driver();
        let mut sensor = ScriptedSensor::new();
        assert!(d.handle(InputEvent::Start, 0.0));
        let snap = d.frame(0.0, &mut sensor);
        assert_eq!(snap.countdown, Some(3));
        assert!(matches!(snap.phase, SessionPhase::Countdown { .. }));

        let snap = d.frame(COUNTDOWN_MS, &mut sensor);
        assert_eq!(snap.phase, SessionPhase::Running);
        assert_eq!(snap.countdown, None);
        assert_eq!(snap.elapsed_secs, 0.0);

        d.frame(COUNTDOWN_MS + 500.0, &mut sensor);
        assert!((d.snapshot(COUNTDOWN_MS + 500.0).elapsed_secs - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_mode_locked_during_run() {
        let mut d = driver();
        assert!(d.handle(InputEvent::SelectMode { mode: GameMode::Easy }, 0.0));
        d.handle(InputEvent::Start, 0.0);
        assert!(!d.handle(InputEvent::SelectMode { mode: GameMode::Challenge }, 10.0));
        assert_eq!(d.mode(), GameMode::Easy);
        assert_eq!(d.config(), &ModeConfig::preset(GameMode::Easy));
    }

    #[test]
    fn test_player_follows_face_before_start() {
        let mut d = driver();
        let mut sensor = ScriptedSensor::auto(vec![Ok(face_at(160.0, 240.0))]);
        run_frames(&mut d, &mut sensor, 0.0, 2000.0);
        let p = d.state().player.pos;
        assert!((p.x - 200.0).abs() < 1.0, "x = {}", p.x);
        assert!((p.y - 300.0).abs() < 1.0);

        d.handle(InputEvent::SetMirror { enabled: true }, 2000.0);
        run_frames(&mut d, &mut sensor, 2000.0, 4000.0);
        assert!((d.state().player.pos.x - 600.0).abs() < 1.0);
    }

    #[test]
    fn test_pause_freezes_player_and_sampling() {
        let mut d = driver();
        let mut sensor = ScriptedSensor::new();
        d.handle(InputEvent::Start, 0.0);
        let mut now = 0.0;
        while now < 4000.0 || !d.sampler().is_in_flight() {
            sensor.resolve_next(Ok(face_at(320.0, 240.0)));
            d.frame(now, &mut sensor);
            now += 16.0;
        }
        let calls = sensor.calls();
        assert!(d.handle(InputEvent::Pause, now));

        sensor.resolve_next(Ok(face_at(0.0, 0.0)));
        let before = d.state().player.clone();
        now = run_frames(&mut d, &mut sensor, now, now + 3000.0);
        assert_eq!(sensor.calls(), calls);
        assert_eq!(sensor.pending(), 0);
        assert_eq!(d.state().player.pos, before.pos);
        assert_eq!(d.state().player.pursuit_target, before.pursuit_target);

        // A pause longer than the timeout is not a detector timeout; the
        // result that arrived meanwhile lands on the next running frame
        assert!(d.handle(InputEvent::Resume, now));
        let snap = d.frame(now + 16.0, &mut sensor);
        assert_eq!(d.state().player.pursuit_target, Vec2::ZERO);
        assert_eq!(d.sampler().status().last_error(), None);
        assert_eq!(snap.face.diagnostic, None);
    }

    #[test]
    fn test_overlay_blocks_start_and_pauses() {
        let mut d = driver();
        let mut sensor = ScriptedSensor::new();
        d.handle(InputEvent::OpenOverlay, 0.0);
        assert!(!d.handle(InputEvent::Start, 10.0));
        d.handle(InputEvent::CloseOverlay, 20.0);
        assert!(d.handle(InputEvent::Start, 30.0));
        let now = run_frames(&mut d, &mut sensor, 30.0, 4000.0);
        assert!(d.handle(InputEvent::OpenOverlay, now));
        assert!(d.snapshot(now).overlay_open);
        assert_eq!(d.session().phase(), SessionPhase::Paused);
        d.handle(InputEvent::CloseOverlay, now + 100.0);
        assert_eq!(d.session().phase(), SessionPhase::Running);
    }

    #[test]
    fn test_reset_clears_run() {
        let mut d = driver();
        let mut sensor = ScriptedSensor::new();
        d.handle(InputEvent::Start, 0.0);
        let now = run_frames(&mut d, &mut sensor, 0.0, 7000.0);
        assert!(!d.state().enemies.is_empty() || d.session().outcome().is_some());
        assert!(d.handle(InputEvent::Reset, now));
        let snap = d.frame(now + 16.0, &mut sensor);
        assert_eq!(snap.phase, SessionPhase::Idle);
        assert!(snap.enemies.is_empty());
        assert_eq!(snap.score, Some(0));
        assert_eq!(snap.elapsed_secs, 0.0);
    }

    #[test]
    fn test_resize_recenters_only_outside_run() {
        let mut d = driver();
        d.handle(InputEvent::Resize { width: 400.0, height: 200.0 }, 0.0);
        assert_eq!(d.state().player.pos, Vec2::new(200.0, 100.0));

        d.handle(InputEvent::Start, 0.0);
        d.state_mut().player.pos = Vec2::new(390.0, 190.0);
        d.handle(InputEvent::Resize { width: 300.0, height: 150.0 }, 10.0);
        assert_eq!(d.state().player.pos, Vec2::new(300.0, 150.0));
    }
}
