//! Read-only frame snapshot for the renderer
//!
//! Built once per frame by the driver and handed to whatever draws the game
//! (the browser page, or a log line in headless runs). Nothing in here points
//! back into live state.

use serde::Serialize;

use crate::PlayArea;
use crate::mode::{GameMode, ModeConfig};
use crate::perception::{DetectorKind, Diagnostic};
use crate::session::{SessionOutcome, SessionPhase};
use crate::sim::{ActiveEffects, Enemy, GameState, Item, ItemKind, PRAISE_MESSAGES, SizeClass};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CircleView {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnemyView {
    pub id: u32,
    #[serde(flatten)]
    pub circle: CircleView,
    pub big: bool,
}

impl From<&Enemy> for EnemyView {
    fn from(e: &Enemy) -> Self {
        Self {
            id: e.id,
            circle: CircleView {
                x: e.pos.x,
                y: e.pos.y,
                radius: e.radius,
            },
            big: e.size_class == SizeClass::Big,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemView {
    pub id: u32,
    pub kind: ItemKind,
    #[serde(flatten)]
    pub circle: CircleView,
    /// Active ms until the item vanishes
    pub remaining_ms: f64,
}

impl ItemView {
    fn capture(item: &Item, now: f64) -> Self {
        Self {
            id: item.id,
            kind: item.kind,
            circle: CircleView {
                x: item.pos.x,
                y: item.pos.y,
                radius: item.radius,
            },
            remaining_ms: (item.expire_time - now).max(0.0),
        }
    }
}

/// Remaining time of each effect window (ms, 0 when inactive) plus flashes
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct EffectsView {
    pub shield_ms: f64,
    pub slow_ms: f64,
    pub speed_up_ms: f64,
    pub clear_flash: bool,
    pub bonus_flash: bool,
}

impl EffectsView {
    pub fn capture(fx: &ActiveEffects, now: f64) -> Self {
        Self {
            shield_ms: (fx.shield_until - now).max(0.0),
            slow_ms: (fx.slow_until - now).max(0.0),
            speed_up_ms: (fx.speed_boost_until - now).max(0.0),
            clear_flash: fx.clear_flash_active(now),
            bonus_flash: fx.bonus_flash_active(now),
        }
    }
}

/// Game-over screen contents
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionResult {
    pub outcome: SessionOutcome,
    pub title: String,
    pub final_label: &'static str,
    pub final_value: String,
}

impl SessionResult {
    pub fn new(outcome: SessionOutcome, mode: &ModeConfig, score: u64, elapsed_secs: f64) -> Self {
        let title = match outcome {
            SessionOutcome::Clear => format!("{:.0}s clear!", mode.session_time_limit_secs),
            SessionOutcome::Loss => "Game over!".to_string(),
        };
        let (final_label, final_value) = if mode.scoring_enabled {
            ("Final score", score.to_string())
        } else {
            ("Record", format!("{}s", elapsed_secs.max(0.0).floor() as u64))
        };
        Self {
            outcome,
            title,
            final_label,
            final_value,
        }
    }
}

/// Face tracking line for the HUD
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FaceView {
    pub diagnostic: Option<Diagnostic>,
    pub message: Option<String>,
    pub detector: Option<DetectorKind>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderSnapshot {
    pub phase: SessionPhase,
    pub mode: GameMode,
    pub area: PlayArea,
    pub mirror: bool,
    pub overlay_open: bool,
    pub player: CircleView,
    pub enemies: Vec<EnemyView>,
    pub items: Vec<ItemView>,
    pub effects: EffectsView,
    pub level: u32,
    /// Active seconds, clamped to the time limit in timed modes
    pub elapsed_secs: f64,
    pub time_left_secs: Option<f64>,
    /// `None` in modes without scoring
    pub score: Option<u64>,
    /// Whole seconds left before the run starts
    pub countdown: Option<u32>,
    pub level_up: Option<u32>,
    pub praise: Option<&'static str>,
    pub face: FaceView,
    pub result: Option<SessionResult>,
}

/// Everything outside `GameState` that goes into a snapshot
pub struct SnapshotContext<'a> {
    pub phase: SessionPhase,
    pub mode: GameMode,
    pub config: &'a ModeConfig,
    pub mirror: bool,
    pub overlay_open: bool,
    pub elapsed_secs: f64,
    pub countdown: Option<u32>,
    pub face: FaceView,
}

impl RenderSnapshot {
    pub fn capture(state: &GameState, ctx: SnapshotContext<'_>) -> Self {
        let now = state.time_ms;
        let cfg = ctx.config;
        let score = cfg.scoring_enabled.then(|| state.display_score());
        let result = match ctx.phase {
            SessionPhase::Ended { outcome } => Some(SessionResult::new(
                outcome,
                cfg,
                state.display_score(),
                ctx.elapsed_secs,
            )),
            _ => None,
        };

        Self {
            phase: ctx.phase,
            mode: ctx.mode,
            area: state.area,
            mirror: ctx.mirror,
            overlay_open: ctx.overlay_open,
            player: CircleView {
                x: state.player.pos.x,
                y: state.player.pos.y,
                radius: state.player.radius,
            },
            enemies: state.enemies.iter().map(EnemyView::from).collect(),
            items: state.items.iter().map(|it| ItemView::capture(it, now)).collect(),
            effects: EffectsView::capture(&state.effects, now),
            level: state.level(),
            elapsed_secs: ctx.elapsed_secs,
            time_left_secs: cfg
                .is_timed()
                .then(|| (cfg.session_time_limit_secs - ctx.elapsed_secs).max(0.0)),
            score,
            countdown: ctx.countdown,
            level_up: state
                .level_up
                .filter(|b| b.is_visible(now))
                .map(|_| state.level()),
            praise: state
                .praise
                .filter(|(b, _)| b.is_visible(now))
                .and_then(|(_, idx)| PRAISE_MESSAGES.get(idx).copied()),
            face: ctx.face,
            result,
        }
    }
}
