//! Invariants of the clock, effects, difficulty and enemy bookkeeping

use face_dodge::PlayArea;
use face_dodge::mode::{GameMode, ModeConfig};
use face_dodge::sim::{
    ActiveEffects, Clock, Enemy, GameState, LevelTracker, SizeClass, advance, level_for,
};
use glam::Vec2;
use proptest::prelude::*;

fn enemy(id: u32, pos: Vec2, radius: f32, direction: f32, speed: f32) -> Enemy {
    Enemy {
        id,
        base_pos: pos,
        pos,
        radius,
        size_class: SizeClass::Normal,
        direction,
        speed,
        spawn_time: 0.0,
        oscillations: Vec::new(),
    }
}

proptest! {
    /// Active time is the sum of the running stretches, however often the
    /// game is paused
    #[test]
    fn active_time_excludes_every_pause(
        start in 0.0f64..10_000.0,
        spans in prop::collection::vec((0.0f64..5_000.0, 0.0f64..5_000.0), 0..20),
        tail in 0.0f64..5_000.0,
    ) {
        let mut clock = Clock::new();
        clock.start(start);
        let mut now = start;
        let mut active = 0.0;
        for (run, pause) in &spans {
            now += run;
            active += run;
            prop_assert!(clock.pause(now));
            now += pause;
            // Frozen for the whole pause
            prop_assert!((clock.elapsed_active_ms(now) - active).abs() < 1e-6);
            prop_assert!(clock.resume(now));
        }
        now += tail;
        active += tail;
        prop_assert!((clock.elapsed_active_ms(now) - active).abs() < 1e-6);
    }

    /// Repeated pickups extend an effect to the latest expiry, never the sum
    #[test]
    fn effect_windows_take_max(times in prop::collection::vec(0.0f64..60_000.0, 1..12)) {
        let mut fx = ActiveEffects::default();
        for &t in &times {
            fx.extend_shield(t);
            fx.extend_slow(t);
        }
        let latest = times.iter().copied().fold(f64::MIN, f64::max);
        prop_assert_eq!(fx.shield_until, latest + 5000.0);
        prop_assert_eq!(fx.slow_until, latest + 5000.0);
    }

    /// Level never drops and changes exactly at multiples of 15 s
    #[test]
    fn level_is_monotonic(mut times in prop::collection::vec(0.0f64..300.0, 1..50)) {
        times.sort_by(|a, b| a.total_cmp(b));
        let mut tracker = LevelTracker::default();
        let mut last = tracker.level();
        for t in times {
            let changed = tracker.update(t);
            let level = tracker.level();
            prop_assert!(level >= last);
            prop_assert_eq!(level, (t / 15.0).floor() as u32 + 1);
            prop_assert_eq!(changed.is_some(), level != last);
            last = level;
        }
    }

    #[test]
    fn level_for_matches_fifteen_second_steps(k in 0u32..40, frac in 0.0f64..0.999) {
        let secs = (f64::from(k) + frac) * 15.0;
        prop_assert_eq!(level_for(secs), k + 1);
    }

    /// No enemy past the 2x radius margin survives a step
    #[test]
    fn out_of_bounds_enemies_are_removed(
        ys in prop::collection::vec(-200.0f32..800.0, 1..30),
        radius in 10.0f32..30.0,
        speed in 0.0f32..400.0,
        dt in 0.0f32..0.1,
    ) {
        let area = PlayArea::new(800.0, 600.0);
        let mut state = GameState::new(1, area);
        // Keep the player out of the way
        state.player.pos = Vec2::new(-1000.0, -1000.0);
        state.player.pursuit_target = state.player.pos;
        state.enemies = ys
            .iter()
            .enumerate()
            .map(|(i, &y)| {
                let dir = if i % 2 == 0 { 1.0 } else { -1.0 };
                enemy(i as u32 + 1, Vec2::new(400.0, y), radius, dir, speed)
            })
            .collect();

        advance(&mut state, &ModeConfig::preset(GameMode::Normal), dt, 100.0);
        for e in &state.enemies {
            prop_assert!(!e.is_out_of_bounds(&area), "kept enemy at y={}", e.pos.y);
        }
        let expected = ys
            .iter()
            .enumerate()
            .filter(|&(i, &y)| {
                let dir = if i % 2 == 0 { 1.0 } else { -1.0 };
                let ny = y + dir * speed * dt;
                ny >= -radius * 2.0 && ny <= 600.0 + radius * 2.0
            })
            .count();
        prop_assert_eq!(state.enemies.len(), expected);
    }

    /// A shielded player is never hit, whatever the overlap
    #[test]
    fn shield_prevents_loss(
        offset_x in -15.0f32..15.0,
        offset_y in -15.0f32..15.0,
        radius in 10.0f32..40.0,
        now in 1000.0f64..60_000.0,
    ) {
        let mut state = GameState::new(3, PlayArea::new(800.0, 600.0));
        let center = state.player.pos;
        state.enemies = vec![enemy(1, center + Vec2::new(offset_x, offset_y), radius, 1.0, 0.0)];
        state.effects.extend_shield(now);

        let report = advance(&mut state, &ModeConfig::preset(GameMode::Challenge), 0.016, now);
        prop_assert!(!report.player_hit());

        state.effects.shield_until = 0.0;
        let report = advance(&mut state, &ModeConfig::preset(GameMode::Challenge), 0.0, now);
        prop_assert!(report.player_hit());
    }
}
