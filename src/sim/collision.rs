//! Circle overlap tests
//!
//! Everything in the game is a circle, so a sum-of-radii test covers
//! player/item and player/enemy contact alike.

use glam::Vec2;

use super::state::{Enemy, Item, Player};

/// Circles touch or overlap (squared distance <= squared radius sum)
#[inline]
pub fn circles_overlap(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    let r = ra + rb;
    a.distance_squared(b) <= r * r
}

pub fn player_touches_item(player: &Player, item: &Item) -> bool {
    circles_overlap(player.pos, player.radius, item.pos, item.radius)
}

pub fn player_touches_enemy(player: &Player, enemy: &Enemy) -> bool {
    circles_overlap(player.pos, player.radius, enemy.pos, enemy.radius)
}

/// First enemy the player overlaps, if any
pub fn first_enemy_hit<'a>(player: &Player, enemies: &'a [Enemy]) -> Option<&'a Enemy> {
    enemies.iter().find(|e| player_touches_enemy(player, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::SizeClass;

    fn enemy_at(pos: Vec2, radius: f32) -> Enemy {
        Enemy {
            id: 7,
            base_pos: pos,
            pos,
            radius,
            size_class: SizeClass::Normal,
            direction: 1.0,
            speed: 0.0,
            spawn_time: 0.0,
            oscillations: Vec::new(),
        }
    }

    #[test]
    fn test_touching_counts_as_overlap() {
        assert!(circles_overlap(Vec2::ZERO, 10.0, Vec2::new(20.0, 0.0), 10.0));
        assert!(!circles_overlap(Vec2::ZERO, 10.0, Vec2::new(20.1, 0.0), 10.0));
    }

    #[test]
    fn test_diagonal_overlap() {
        // 3-4-5 triangle: distance 50, radii sum 50
        assert!(circles_overlap(Vec2::ZERO, 20.0, Vec2::new(30.0, 40.0), 30.0));
        assert!(!circles_overlap(Vec2::ZERO, 20.0, Vec2::new(30.0, 40.0), 29.0));
    }

    #[test]
    fn test_first_enemy_hit() {
        let player = Player::new(Vec2::new(100.0, 100.0));
        let enemies = vec![
            enemy_at(Vec2::new(300.0, 100.0), 15.0),
            enemy_at(Vec2::new(130.0, 100.0), 15.0),
        ];
        let hit = first_enemy_hit(&player, &enemies);
        assert_eq!(hit.map(|e| e.pos.x), Some(130.0));
        assert!(first_enemy_hit(&player, &enemies[..1]).is_none());
    }
}
