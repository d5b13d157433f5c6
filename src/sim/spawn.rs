//! Enemy waves and item drops
//!
//! All randomness comes from the session's seeded RNG.

use glam::Vec2;
use rand::Rng;

use super::difficulty::{DifficultyParams, oscillations_for};
use super::state::{Enemy, GameState, Item, ItemKind, SizeClass};
use crate::consts::*;

/// Item kind weights when scoring is on
pub const SCORING_ITEM_TABLE: [(ItemKind, f32); 5] = [
    (ItemKind::Clear, 0.30),
    (ItemKind::Shield, 0.25),
    (ItemKind::Slow, 0.20),
    (ItemKind::Bonus, 0.15),
    (ItemKind::SpeedUp, 0.10),
];

/// Item kind weights without scoring: no bonus, mostly speed-ups
pub const SURVIVAL_ITEM_TABLE: [(ItemKind, f32); 4] = [
    (ItemKind::Clear, 0.10),
    (ItemKind::Shield, 0.08),
    (ItemKind::Slow, 0.12),
    (ItemKind::SpeedUp, 0.70),
];

pub fn item_table(scoring_enabled: bool) -> &'static [(ItemKind, f32)] {
    if scoring_enabled {
        &SCORING_ITEM_TABLE
    } else {
        &SURVIVAL_ITEM_TABLE
    }
}

/// Weighted pick; `roll` is in [0, 1). Rolls past the total fall to the last entry.
pub fn pick_weighted(table: &[(ItemKind, f32)], roll: f32) -> ItemKind {
    let total: f32 = table.iter().map(|(_, w)| w).sum();
    let mut threshold = roll * total;
    for &(kind, weight) in table {
        if threshold < weight {
            return kind;
        }
        threshold -= weight;
    }
    table.last().map(|(k, _)| *k).unwrap_or(ItemKind::Clear)
}

/// Spawn one enemy wave at `now`
pub fn spawn_wave(state: &mut GameState, params: &DifficultyParams, now: f64) {
    for _ in 0..params.wave_size {
        let enemy = roll_enemy(state, params, now);
        state.enemies.push(enemy);
    }
    log::debug!(
        "Wave at {:.0}ms: {} enemies (level {}, {} on screen)",
        now,
        params.wave_size,
        params.level,
        state.enemies.len()
    );
}

fn roll_enemy(state: &mut GameState, params: &DifficultyParams, now: f64) -> Enemy {
    let id = state.next_enemy_id();
    let area = state.area;
    let rng = &mut state.rng;

    let from_top = rng.random_bool(0.5);
    let span = (area.width - ENEMY_SPAWN_MARGIN * 2.0).max(1.0);
    let base_x = ENEMY_SPAWN_MARGIN + rng.random::<f32>() * span;

    let big = rng.random_bool(params.big_enemy_chance);
    let size_factor = if big {
        rng.random_range(1.55..1.70)
    } else {
        rng.random_range(0.95..1.05)
    };
    let size_class = if big { SizeClass::Big } else { SizeClass::Normal };
    let diameter = (BASE_ENEMY_SIZE * size_factor).round();
    let radius = diameter * 0.5;

    let speed = params.enemy_base_speed * rng.random_range(0.9..1.15);
    let oscillations = oscillations_for(params.level, || rng.random::<f32>());

    // Start just outside the play area, at exactly the removal margin
    let (y, direction) = if from_top {
        (-diameter, 1.0)
    } else {
        (area.height + diameter, -1.0)
    };
    let pos = Vec2::new(base_x, y);

    Enemy {
        id,
        base_pos: pos,
        pos,
        radius,
        size_class,
        direction,
        speed,
        spawn_time: now,
        oscillations,
    }
}

/// Drop a random item at an interior point
pub fn spawn_item(state: &mut GameState, scoring_enabled: bool, now: f64) {
    let id = state.next_item_id();
    let area = state.area;
    let rng = &mut state.rng;

    let pad = ITEM_SPAWN_PADDING;
    let x = pad + rng.random::<f32>() * (area.width - pad * 2.0).max(1.0);
    let y = pad + rng.random::<f32>() * (area.height - pad * 2.0).max(1.0);
    let kind = pick_weighted(item_table(scoring_enabled), rng.random::<f32>());

    log::debug!("Item {:?} dropped at ({:.0}, {:.0})", kind, x, y);
    state.items.push(Item {
        id,
        kind,
        pos: Vec2::new(x, y),
        radius: kind.size() * 0.5,
        spawn_time: now,
        expire_time: now + ITEM_LIFETIME_MS,
    });
}

/// Delay until the next item drop: the base interval plus a fresh jitter roll
pub fn roll_item_delay(state: &mut GameState) -> f64 {
    ITEM_SPAWN_INTERVAL_MS + state.rng.random::<f64>() * ITEM_SPAWN_JITTER_MS
}
