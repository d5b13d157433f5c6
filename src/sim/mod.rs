//! Simulation module
//!
//! All gameplay logic lives here. This module must stay free of rendering
//! and platform dependencies:
//! - Time comes in as active-time milliseconds from the `Clock`
//! - Seeded RNG only
//! - Entity collections are rebuilt each step, ordered by id

pub mod clock;
pub mod collision;
pub mod difficulty;
pub mod spawn;
pub mod state;
pub mod tick;

pub use clock::Clock;
pub use collision::{circles_overlap, first_enemy_hit};
pub use difficulty::{DifficultyParams, LevelTracker, level_for, spawn_interval_ms};
pub use state::{
    ActiveEffects, Banner, Enemy, GameState, Item, ItemKind, Oscillation, Player, SizeClass,
    SpeedEffect, PRAISE_MESSAGES, SPEED_EFFECT_PRIORITY,
};
pub use tick::{SimEvent, StepReport, advance};
