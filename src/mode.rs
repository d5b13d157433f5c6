//! Game modes and their per-session tuning
//!
//! A `ModeConfig` is resolved once when a session starts and never changes
//! during the run.

use serde::{Deserialize, Serialize};

use crate::platform::DeviceProfile;

/// Selectable difficulty mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum GameMode {
    Easy,
    #[default]
    Normal,
    /// Timed survival run with many fast enemies and no score
    Challenge,
}

impl GameMode {
    pub const ALL: [GameMode; 3] = [GameMode::Easy, GameMode::Normal, GameMode::Challenge];

    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::Easy => "easy",
            GameMode::Normal => "normal",
            GameMode::Challenge => "challenge",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Some(GameMode::Easy),
            "normal" => Some(GameMode::Normal),
            "challenge" | "oni" => Some(GameMode::Challenge),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            GameMode::Easy => "Easy",
            GameMode::Normal => "Normal",
            GameMode::Challenge => "Challenge",
        }
    }
}

/// Immutable per-session tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModeConfig {
    /// Multiplies the level-based spawn interval
    pub spawn_interval_multiplier: f64,
    /// Multiplies enemy speed
    pub enemy_speed_multiplier: f32,
    /// Probability that a spawned enemy is big
    pub big_enemy_chance: f64,
    /// Session length in seconds, 0 = untimed
    pub session_time_limit_secs: f64,
    /// Enemies per spawn wave
    pub spawn_count_per_wave: u32,
    pub scoring_enabled: bool,
    /// Lower bound for the spawn interval (ms)
    pub min_spawn_interval_ms: f64,
}

impl ModeConfig {
    /// Resolve the tuning for `mode` on the given device.
    ///
    /// Touch devices and narrow viewports get a gentler Challenge mode; other
    /// modes are the same everywhere.
    pub fn resolve(mode: GameMode, device: &DeviceProfile) -> Self {
        match mode {
            GameMode::Challenge if device.is_mobile_like() => Self {
                spawn_interval_multiplier: 0.55,
                enemy_speed_multiplier: 1.8,
                big_enemy_chance: 0.45,
                spawn_count_per_wave: 3,
                min_spawn_interval_ms: 520.0,
                ..Self::preset(mode)
            },
            _ => Self::preset(mode),
        }
    }

    /// Desktop tuning for `mode`
    pub fn preset(mode: GameMode) -> Self {
        match mode {
            GameMode::Easy => Self {
                spawn_interval_multiplier: 1.35,
                enemy_speed_multiplier: 0.85,
                big_enemy_chance: 0.10,
                session_time_limit_secs: 0.0,
                spawn_count_per_wave: 1,
                scoring_enabled: true,
                min_spawn_interval_ms: 650.0,
            },
            GameMode::Normal => Self {
                spawn_interval_multiplier: 1.0,
                enemy_speed_multiplier: 1.0,
                big_enemy_chance: 0.18,
                session_time_limit_secs: 0.0,
                spawn_count_per_wave: 1,
                scoring_enabled: true,
                min_spawn_interval_ms: 650.0,
            },
            GameMode::Challenge => Self {
                spawn_interval_multiplier: 0.42,
                enemy_speed_multiplier: 2.2,
                big_enemy_chance: 0.55,
                session_time_limit_secs: 30.0,
                spawn_count_per_wave: 5,
                scoring_enabled: false,
                min_spawn_interval_ms: 420.0,
            },
        }
    }

    pub fn is_timed(&self) -> bool {
        self.session_time_limit_secs > 0.0
    }

    /// Enemies per wave, never less than one
    pub fn wave_size(&self) -> u32 {
        self.spawn_count_per_wave.max(1)
    }
}

impl Default for ModeConfig {
    fn default() -> Self {
        Self::preset(GameMode::Normal)
    }
}
