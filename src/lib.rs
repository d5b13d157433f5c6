//! Face Dodge - a webcam face-tracking dodge game
//!
//! Core modules:
//! - `sim`: Simulation (active-time clock, entities, spawning, collisions)
//! - `session`: Idle / Countdown / Running / Paused / Ended state machine
//! - `perception`: Rate-limited face sampling fused into the pursuit target
//! - `driver`: Per-frame loop tying the above together
//! - `platform`: Browser/native environment probing
//! - `settings`: Persisted player preferences

pub mod driver;
pub mod error;
pub mod mode;
pub mod perception;
pub mod platform;
pub mod session;
pub mod settings;
pub mod sim;
pub mod snapshot;

pub use driver::{GameLoopDriver, InputEvent};
pub use error::SensorError;
pub use mode::{GameMode, ModeConfig};
pub use settings::Settings;
pub use snapshot::RenderSnapshot;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Largest frame delta fed to the simulation (seconds)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Player circle diameter (px)
    pub const PLAYER_SIZE: f32 = 40.0;
    /// Fraction of distance to target left after one second of pursuit
    pub const PURSUIT_DECAY: f32 = 0.001;

    /// Normal enemy diameter before the per-enemy size roll (px)
    pub const BASE_ENEMY_SIZE: f32 = 30.0;
    /// Enemy speed at level 0 (px/s)
    pub const ENEMY_SPEED_FLOOR: f32 = 60.0;
    /// Enemy speed added per level (px/s)
    pub const ENEMY_SPEED_SLOPE: f32 = 10.0;
    /// Horizontal spawn margin on each side (px)
    pub const ENEMY_SPAWN_MARGIN: f32 = 30.0;

    /// Spawn interval at level 1 before the mode multiplier (ms)
    pub const BASE_SPAWN_INTERVAL_MS: f64 = 2000.0;
    /// Spawn interval shrink per level (ms)
    pub const SPAWN_INTERVAL_STEP_MS: f64 = 150.0;

    /// Item drop timer (ms), plus up to `ITEM_SPAWN_JITTER_MS`
    pub const ITEM_SPAWN_INTERVAL_MS: f64 = 7000.0;
    pub const ITEM_SPAWN_JITTER_MS: f64 = 1000.0;
    /// Uncollected items vanish after this long (ms)
    pub const ITEM_LIFETIME_MS: f64 = 5000.0;
    /// Items are kept this far from the play-area edge (px)
    pub const ITEM_SPAWN_PADDING: f32 = 60.0;

    /// Shield / slow / speed-up window length (ms)
    pub const EFFECT_DURATION_MS: f64 = 5000.0;
    pub const BONUS_SCORE: f64 = 100.0;

    /// Banner / flash durations (ms of active time)
    pub const CLEAR_FLASH_MS: f64 = 550.0;
    pub const BONUS_FLASH_MS: f64 = 800.0;
    pub const LEVEL_UP_BANNER_MS: f64 = 1500.0;
    pub const PRAISE_BANNER_MS: f64 = 1200.0;
    /// A praise message is shown every this many seconds of play
    pub const PRAISE_INTERVAL_SECS: f64 = 10.0;

    /// Seconds of active time per difficulty level
    pub const LEVEL_LENGTH_SECS: f64 = 15.0;

    /// Countdown before a run starts (ms)
    pub const COUNTDOWN_MS: f64 = 3000.0;

    /// Minimum gap between face samples (ms)
    pub const FACE_SAMPLE_INTERVAL_MS: f64 = 120.0;
    /// An outstanding sample older than this is abandoned (ms)
    pub const FACE_SAMPLE_TIMEOUT_MS: f64 = 1500.0;
    /// "Face not found" is reported after this long without a face (ms)
    pub const FACE_SEEN_WINDOW_MS: f64 = 1500.0;
    /// Box detectors report the centre a bit above the middle of the box
    pub const FACE_BOX_VERTICAL_BIAS: f32 = 0.45;
}

/// Rectangular play area in logical pixels, origin top-left
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PlayArea {
    pub width: f32,
    pub height: f32,
}

impl PlayArea {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: width.max(1.0),
            height: height.max(1.0),
        }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width * 0.5, self.height * 0.5)
    }

    /// Clamp a point into the play area
    pub fn clamp(&self, p: Vec2) -> Vec2 {
        Vec2::new(p.x.clamp(0.0, self.width), p.y.clamp(0.0, self.height))
    }

    /// Map a normalized [0,1]x[0,1] point to play-area pixels
    pub fn from_normalized(&self, n: Vec2) -> Vec2 {
        self.clamp(Vec2::new(n.x * self.width, n.y * self.height))
    }
}

impl Default for PlayArea {
    fn default() -> Self {
        Self::new(640.0, 480.0)
    }
}

/// Frame-rate independent smoothing factor: the share of the remaining
/// distance covered in `dt` seconds when `decay` of it is left after one second.
#[inline]
pub fn follow_factor(decay: f32, dt: f32) -> f32 {
    1.0 - decay.powf(dt.max(0.0))
}
