//! Difficulty curve
//!
//! Pure functions of (level, mode) so the whole curve can be checked without
//! running a session.

use std::f32::consts::TAU;

use serde::{Deserialize, Serialize};

use super::state::{MAX_OSCILLATIONS, Oscillation};
use crate::consts::*;
use crate::mode::ModeConfig;

/// Difficulty level for the given active time: 1 for the first 15 s, then +1 every 15 s
pub fn level_for(elapsed_active_secs: f64) -> u32 {
    if !elapsed_active_secs.is_finite() || elapsed_active_secs <= 0.0 {
        return 1;
    }
    ((elapsed_active_secs / LEVEL_LENGTH_SECS).floor() as u32).saturating_add(1)
}

/// Spawn interval before the mode multiplier (ms)
pub fn base_spawn_interval_ms(level: u32) -> f64 {
    BASE_SPAWN_INTERVAL_MS - f64::from(level.saturating_sub(1)) * SPAWN_INTERVAL_STEP_MS
}

/// Gap between enemy waves for this level and mode (ms)
pub fn spawn_interval_ms(level: u32, mode: &ModeConfig) -> f64 {
    (base_spawn_interval_ms(level) * mode.spawn_interval_multiplier).max(mode.min_spawn_interval_ms)
}

/// Enemy speed before the per-enemy random roll (px/s)
pub fn enemy_base_speed(level: u32, mode: &ModeConfig) -> f32 {
    (ENEMY_SPEED_FLOOR + level as f32 * ENEMY_SPEED_SLOPE) * mode.enemy_speed_multiplier
}

/// Number of sway terms: none below level 3, one more every two levels, three from level 7
pub fn oscillation_count(level: u32) -> usize {
    (level.saturating_sub(1) / 2).min(MAX_OSCILLATIONS as u32) as usize
}

/// Amplitude and frequency of sway term `index` (0-based) at `level`
pub fn oscillation_shape(index: usize, level: u32) -> (f32, f32) {
    let l = level as f32;
    match index {
        0 => (10.0 + l * 2.0, 1.2 + l * 0.15),
        1 => (6.0 + l * 1.2, 2.2 + l * 0.2),
        _ => (4.0 + l * 0.8, 3.3 + l * 0.25),
    }
}

/// Build the sway terms for a new enemy; `phase_roll` yields values in [0, 1)
pub fn oscillations_for(level: u32, mut phase_roll: impl FnMut() -> f32) -> Vec<Oscillation> {
    (0..oscillation_count(level))
        .map(|i| {
            let (amplitude, frequency) = oscillation_shape(i, level);
            Oscillation {
                amplitude,
                frequency,
                phase: phase_roll() * TAU,
            }
        })
        .collect()
}

/// Everything the spawner needs for one level of one mode
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyParams {
    pub level: u32,
    pub spawn_interval_ms: f64,
    pub enemy_base_speed: f32,
    pub oscillation_count: usize,
    pub wave_size: u32,
    pub big_enemy_chance: f64,
}

impl DifficultyParams {
    pub fn for_level(level: u32, mode: &ModeConfig) -> Self {
        let level = level.max(1);
        Self {
            level,
            spawn_interval_ms: spawn_interval_ms(level, mode),
            enemy_base_speed: enemy_base_speed(level, mode),
            oscillation_count: oscillation_count(level),
            wave_size: mode.wave_size(),
            big_enemy_chance: mode.big_enemy_chance.clamp(0.0, 1.0),
        }
    }
}

/// Points earned per second of survival at `level`
pub fn score_rate(level: u32) -> f64 {
    5.0 + f64::from(level) * 2.0
}

/// Tracks level transitions so each one is celebrated exactly once
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelTracker {
    level: u32,
}

impl Default for LevelTracker {
    fn default() -> Self {
        Self { level: 1 }
    }
}

impl LevelTracker {
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Update from active time; returns the new level if it went up.
    /// The level never goes down within a run.
    pub fn update(&mut self, elapsed_active_secs: f64) -> Option<u32> {
        let new_level = level_for(elapsed_active_secs);
        if new_level > self.level {
            self.level = new_level;
            Some(new_level)
        } else {
            None
        }
    }
}
