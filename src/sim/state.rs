//! Game state and core simulation types
//!
//! All timestamps in here are active-time milliseconds (see [`super::Clock`]),
//! so timers and effect windows freeze while the game is paused.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::difficulty::LevelTracker;
use crate::PlayArea;
use crate::consts::*;
use crate::follow_factor;

/// The face-controlled player circle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    /// Latest mapped face position; written only by perception fusion
    pub pursuit_target: Vec2,
    pub radius: f32,
}

impl Player {
    pub fn new(pos: Vec2) -> Self {
        Self {
            pos,
            pursuit_target: pos,
            radius: PLAYER_SIZE * 0.5,
        }
    }

    /// Exponential pursuit of the target, independent of frame rate
    pub fn pursue(&mut self, dt: f32) {
        let follow = follow_factor(PURSUIT_DECAY, dt);
        self.pos += (self.pursuit_target - self.pos) * follow;
    }
}

/// Enemy size class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SizeClass {
    Normal,
    Big,
}

/// One sinusoidal horizontal sway component
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Oscillation {
    /// Peak offset (px)
    pub amplitude: f32,
    /// Angular frequency (rad/s)
    pub frequency: f32,
    pub phase: f32,
}

impl Oscillation {
    #[inline]
    pub fn offset_at(&self, t_secs: f32) -> f32 {
        self.amplitude * (self.frequency * t_secs + self.phase).sin()
    }
}

/// Maximum number of sway terms per enemy
pub const MAX_OSCILLATIONS: usize = 3;

/// A falling or rising enemy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub id: u32,
    /// Horizontal centre the sway is applied around; `y` is the spawn height
    pub base_pos: Vec2,
    pub pos: Vec2,
    pub radius: f32,
    pub size_class: SizeClass,
    /// +1 moves down (spawned at the top), -1 moves up
    pub direction: f32,
    /// Vertical speed (px/s)
    pub speed: f32,
    pub spawn_time: f64,
    pub oscillations: Vec<Oscillation>,
}

impl Enemy {
    /// Sum of all sway terms `t_secs` after spawning
    pub fn sway_at(&self, t_secs: f32) -> f32 {
        self.oscillations.iter().map(|o| o.offset_at(t_secs)).sum()
    }

    /// Whether the enemy has left the play area by more than twice its radius
    pub fn is_out_of_bounds(&self, area: &PlayArea) -> bool {
        let margin = self.radius * 2.0;
        self.pos.y < -margin || self.pos.y > area.height + margin
    }
}

/// Item kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    /// Removes every enemy on screen
    Clear,
    /// Collisions are ignored for a while
    Shield,
    /// Enemies move slower for a while
    Slow,
    /// Flat score bonus (scoring modes only)
    Bonus,
    /// Enemies move faster for a while
    SpeedUp,
}

impl ItemKind {
    /// Display diameter (px)
    pub fn size(&self) -> f32 {
        match self {
            ItemKind::Clear => 34.0,
            ItemKind::Shield | ItemKind::Slow => 32.0,
            ItemKind::Bonus => 30.0,
            ItemKind::SpeedUp => 28.0,
        }
    }

    /// Whether picking it up helps the player
    pub fn is_positive(&self) -> bool {
        !matches!(self, ItemKind::SpeedUp)
    }
}

/// A collectible item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: u32,
    pub kind: ItemKind,
    pub pos: Vec2,
    pub radius: f32,
    pub spawn_time: f64,
    pub expire_time: f64,
}

impl Item {
    pub fn is_expired(&self, now: f64) -> bool {
        now > self.expire_time
    }
}

/// Timed effects that change enemy speed, in evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpeedEffect {
    SpeedUp,
    Slow,
}

/// Enemy speed modifiers; when several are active the LAST active entry wins.
pub const SPEED_EFFECT_PRIORITY: [(SpeedEffect, f32); 2] =
    [(SpeedEffect::SpeedUp, 2.0), (SpeedEffect::Slow, 0.4)];

/// Active power-up effects, as expiry timestamps (active while `now < until`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActiveEffects {
    pub shield_until: f64,
    pub slow_until: f64,
    pub speed_boost_until: f64,
    /// When the last clear item fired (screen flash)
    pub clear_flash_at: Option<f64>,
    /// When the last bonus item was collected
    pub bonus_flash_at: Option<f64>,
}

impl ActiveEffects {
    /// Extend an expiry to at least `until` (max, never summed)
    fn extend(slot: &mut f64, until: f64) {
        *slot = slot.max(until);
    }

    pub fn extend_shield(&mut self, now: f64) {
        Self::extend(&mut self.shield_until, now + EFFECT_DURATION_MS);
    }

    pub fn extend_slow(&mut self, now: f64) {
        Self::extend(&mut self.slow_until, now + EFFECT_DURATION_MS);
    }

    pub fn extend_speed_boost(&mut self, now: f64) {
        Self::extend(&mut self.speed_boost_until, now + EFFECT_DURATION_MS);
    }

    pub fn shield_active(&self, now: f64) -> bool {
        now < self.shield_until
    }

    pub fn slow_active(&self, now: f64) -> bool {
        now < self.slow_until
    }

    pub fn speed_boost_active(&self, now: f64) -> bool {
        now < self.speed_boost_until
    }

    pub fn is_active(&self, effect: SpeedEffect, now: f64) -> bool {
        match effect {
            SpeedEffect::SpeedUp => self.speed_boost_active(now),
            SpeedEffect::Slow => self.slow_active(now),
        }
    }

    /// Enemy speed multiplier at `now`, following `SPEED_EFFECT_PRIORITY`
    pub fn enemy_speed_multiplier(&self, now: f64) -> f32 {
        SPEED_EFFECT_PRIORITY
            .iter()
            .filter(|(effect, _)| self.is_active(*effect, now))
            .map(|(_, mul)| *mul)
            .last()
            .unwrap_or(1.0)
    }

    pub fn clear_flash_active(&self, now: f64) -> bool {
        self.clear_flash_at.is_some_and(|t| now - t < CLEAR_FLASH_MS)
    }

    pub fn bonus_flash_active(&self, now: f64) -> bool {
        self.bonus_flash_at.is_some_and(|t| now - t < BONUS_FLASH_MS)
    }
}

/// A short-lived message banner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Banner {
    pub shown_at: f64,
    pub duration_ms: f64,
}

impl Banner {
    pub fn new(shown_at: f64, duration_ms: f64) -> Self {
        Self {
            shown_at,
            duration_ms,
        }
    }

    pub fn is_visible(&self, now: f64) -> bool {
        now >= self.shown_at && now - self.shown_at < self.duration_ms
    }
}

/// Encouragement shown periodically during a run
pub const PRAISE_MESSAGES: [&str; 6] = [
    "Amazing!",
    "You're doing great!",
    "Nice!",
    "Awesome!",
    "Nice dodge!",
    "So cool!",
];

/// Complete per-session simulation state
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    pub area: PlayArea,
    pub player: Player,
    /// Active enemies (ascending id)
    pub enemies: Vec<Enemy>,
    /// Active items (ascending id)
    pub items: Vec<Item>,
    pub effects: ActiveEffects,
    pub score: f64,
    pub levels: LevelTracker,
    /// Active time reached by the last `advance` (ms)
    pub time_ms: f64,
    /// Last enemy wave (ms); `None` until the first tick of the run
    pub last_enemy_spawn: Option<f64>,
    /// When the next item drops (ms); `None` until the first tick of the run
    pub next_item_due: Option<f64>,
    pub level_up: Option<Banner>,
    pub praise: Option<(Banner, usize)>,
    /// Number of praise intervals already celebrated
    pub praise_count: u32,
    next_enemy_id: u32,
    next_item_id: u32,
}

impl GameState {
    /// Create an empty session state with the player centred in `area`
    pub fn new(seed: u64, area: PlayArea) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            area,
            player: Player::new(area.center()),
            enemies: Vec::new(),
            items: Vec::new(),
            effects: ActiveEffects::default(),
            score: 0.0,
            levels: LevelTracker::default(),
            time_ms: 0.0,
            last_enemy_spawn: None,
            next_item_due: None,
            level_up: None,
            praise: None,
            praise_count: 0,
            next_enemy_id: 1,
            next_item_id: 1,
        }
    }

    /// Reset all run state, keeping the player where it currently is
    pub fn reset(&mut self, seed: u64) {
        let player = self.player.clone();
        *self = Self::new(seed, self.area);
        self.player = player;
    }

    /// Resize the play area; the player is re-centred when `recenter` is set
    pub fn resize(&mut self, area: PlayArea, recenter: bool) {
        self.area = area;
        if recenter {
            self.player = Player::new(area.center());
        } else {
            self.player.pos = area.clamp(self.player.pos);
            self.player.pursuit_target = area.clamp(self.player.pursuit_target);
        }
    }

    pub fn next_enemy_id(&mut self) -> u32 {
        let id = self.next_enemy_id;
        self.next_enemy_id += 1;
        id
    }

    pub fn next_item_id(&mut self) -> u32 {
        let id = self.next_item_id;
        self.next_item_id += 1;
        id
    }

    pub fn level(&self) -> u32 {
        self.levels.level()
    }

    /// Score shown to the player (whole points)
    pub fn display_score(&self) -> u64 {
        self.score.max(0.0).floor() as u64
    }
}
