//! Entity simulation step
//!
//! Advances the player, enemies and items by one frame of active time.

use rand::Rng;

use super::collision::{first_enemy_hit, player_touches_item};
use super::difficulty::{DifficultyParams, score_rate};
use super::spawn::{roll_item_delay, spawn_item, spawn_wave};
use super::state::{Banner, Enemy, GameState, Item, ItemKind, PRAISE_MESSAGES};
use crate::consts::*;
use crate::mode::ModeConfig;

/// Something noteworthy that happened during a step
#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    /// Difficulty went up (fires once per transition)
    LevelUp { level: u32 },
    /// Periodic encouragement
    Praise { message: &'static str },
    WaveSpawned { count: u32 },
    ItemSpawned { kind: ItemKind },
    ItemCollected { kind: ItemKind },
    /// A clear item removed this many enemies
    EnemiesCleared { count: usize },
    /// The player touched an enemy while shielded
    ShieldBlocked { enemy_id: u32 },
}

/// Result of one `advance` call
#[derive(Debug, Clone, Default)]
pub struct StepReport {
    pub events: Vec<SimEvent>,
    /// Enemy that touched an unshielded player; ends the run
    pub hit_by: Option<u32>,
}

impl StepReport {
    pub fn player_hit(&self) -> bool {
        self.hit_by.is_some()
    }
}

/// Advance the simulation to active time `now` (ms), `dt` seconds after the previous step
pub fn advance(state: &mut GameState, mode: &ModeConfig, dt: f32, now: f64) -> StepReport {
    let mut report = StepReport::default();
    let dt = dt.clamp(0.0, MAX_FRAME_DT);
    state.time_ms = now;

    update_progress(state, mode, dt, now, &mut report);
    let params = DifficultyParams::for_level(state.level(), mode);

    state.player.pursue(dt);

    // Enemy waves: the timer starts on the first step of the run
    match state.last_enemy_spawn {
        None => state.last_enemy_spawn = Some(now),
        Some(last) if now - last >= params.spawn_interval_ms => {
            spawn_wave(state, &params, now);
            state.last_enemy_spawn = Some(now);
            report.events.push(SimEvent::WaveSpawned {
                count: params.wave_size,
            });
        }
        Some(_) => {}
    }

    // Item drops on an independent jittered timer
    match state.next_item_due {
        None => {
            let delay = roll_item_delay(state);
            state.next_item_due = Some(now + delay);
        }
        Some(due) if now >= due => {
            spawn_item(state, mode.scoring_enabled, now);
            if let Some(item) = state.items.last() {
                report.events.push(SimEvent::ItemSpawned { kind: item.kind });
            }
            let delay = roll_item_delay(state);
            state.next_item_due = Some(now + delay);
        }
        Some(_) => {}
    }

    move_enemies(state, dt, now);
    expire_items(state, now);
    collect_items(state, mode, now, &mut report);

    // Contact with an enemy ends the run unless shielded
    if let Some(enemy) = first_enemy_hit(&state.player, &state.enemies) {
        if state.effects.shield_active(now) {
            report.events.push(SimEvent::ShieldBlocked { enemy_id: enemy.id });
        } else {
            report.hit_by = Some(enemy.id);
        }
    }

    report
}

/// Level, praise and score bookkeeping
fn update_progress(
    state: &mut GameState,
    mode: &ModeConfig,
    dt: f32,
    now: f64,
    report: &mut StepReport,
) {
    let elapsed_secs = now / 1000.0;

    if let Some(level) = state.levels.update(elapsed_secs) {
        log::info!("Level up! Now level {} at {:.1}s", level, elapsed_secs);
        state.level_up = Some(Banner::new(now, LEVEL_UP_BANNER_MS));
        report.events.push(SimEvent::LevelUp { level });
    }

    let praise_due = (elapsed_secs / PRAISE_INTERVAL_SECS).floor().max(0.0) as u32;
    if praise_due > state.praise_count {
        state.praise_count = praise_due;
        let idx = state.rng.random_range(0..PRAISE_MESSAGES.len());
        state.praise = Some((Banner::new(now, PRAISE_BANNER_MS), idx));
        report.events.push(SimEvent::Praise {
            message: PRAISE_MESSAGES[idx],
        });
    }

    if mode.scoring_enabled {
        state.score += f64::from(dt) * score_rate(state.level());
    }
}

/// Vertical travel plus horizontal sway; drops enemies that left the area
fn move_enemies(state: &mut GameState, dt: f32, now: f64) {
    let speed_mul = state.effects.enemy_speed_multiplier(now);
    let area = state.area;

    state.enemies = std::mem::take(&mut state.enemies)
        .into_iter()
        .filter_map(|mut e: Enemy| {
            let t = ((now - e.spawn_time) / 1000.0) as f32;
            e.pos.x = e.base_pos.x + e.sway_at(t);
            e.pos.y += e.direction * e.speed * dt * speed_mul;
            (!e.is_out_of_bounds(&area)).then_some(e)
        })
        .collect();
}

fn expire_items(state: &mut GameState, now: f64) {
    state.items = std::mem::take(&mut state.items)
        .into_iter()
        .filter(|it| !it.is_expired(now))
        .collect();
}

/// Pick up every item the player touches and apply its effect
fn collect_items(state: &mut GameState, mode: &ModeConfig, now: f64, report: &mut StepReport) {
    let (picked, kept): (Vec<Item>, Vec<Item>) = std::mem::take(&mut state.items)
        .into_iter()
        .partition(|it| player_touches_item(&state.player, it));
    state.items = kept;

    for item in picked {
        apply_item(state, mode, item.kind, now, report);
        report.events.push(SimEvent::ItemCollected { kind: item.kind });
    }
}

fn apply_item(
    state: &mut GameState,
    mode: &ModeConfig,
    kind: ItemKind,
    now: f64,
    report: &mut StepReport,
) {
    log::debug!("Collected {:?} at {:.0}ms", kind, now);
    match kind {
        ItemKind::Clear => {
            let count = state.enemies.len();
            state.enemies.clear();
            state.effects.clear_flash_at = Some(now);
            report.events.push(SimEvent::EnemiesCleared { count });
        }
        ItemKind::Shield => state.effects.extend_shield(now),
        ItemKind::Slow => state.effects.extend_slow(now),
        ItemKind::Bonus => {
            if mode.scoring_enabled {
                state.score += BONUS_SCORE;
                state.effects.bonus_flash_at = Some(now);
            }
        }
        ItemKind::SpeedUp => state.effects.extend_speed_boost(now),
    }
}
