//! Arena Map
//!
//! Wall placement and spawn geometry. The wall set is immutable for the
//! lifetime of a round and regenerated wholesale on every round reset;
//! spawn points are fixed inset corners derived from the player id.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::game::collision::circle_rect_overlap;
use crate::game::state::{ArenaConfig, PlayerId};

/// Offset of each spawn corner from the nearest arena edges.
const SPAWN_INSET: f32 = 50.0;

/// An axis-aligned square obstacle.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Wall {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Side length.
    pub size: f32,
}

/// Generate a fresh wall layout: `wall_count` squares placed uniformly at
/// random, each fully inside the arena. Walls may overlap each other and
/// may cover spawn points; revival handles the latter by retrying.
pub fn generate_walls<R: Rng>(config: &ArenaConfig, rng: &mut R) -> Vec<Wall> {
    (0..config.wall_count)
        .map(|_| Wall {
            x: rng.gen_range(0.0..=config.width - config.wall_size),
            y: rng.gen_range(0.0..=config.height - config.wall_size),
            size: config.wall_size,
        })
        .collect()
}

/// Canonical spawn point for a player id: one of four inset corners,
/// chosen by `id` modulo the corner count.
pub fn spawn_point(config: &ArenaConfig, id: PlayerId) -> (f32, f32) {
    let corners = [
        (SPAWN_INSET, SPAWN_INSET),
        (config.width - SPAWN_INSET, SPAWN_INSET),
        (SPAWN_INSET, config.height - SPAWN_INSET),
        (config.width - SPAWN_INSET, config.height - SPAWN_INSET),
    ];
    corners[id as usize % corners.len()]
}

/// True if a player-sized circle at `(x, y)` would intersect any wall.
pub fn spawn_blocked(walls: &[Wall], x: f32, y: f32, radius: f32) -> bool {
    walls
        .iter()
        .any(|w| circle_rect_overlap(x, y, radius, w.x, w.y, w.size))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_walls_fit_inside_arena() {
        let config = ArenaConfig::default();
        let mut rng = rand::thread_rng();

        for _ in 0..20 {
            let walls = generate_walls(&config, &mut rng);
            assert_eq!(walls.len(), config.wall_count);
            for wall in &walls {
                assert!(wall.x >= 0.0 && wall.x + wall.size <= config.width);
                assert!(wall.y >= 0.0 && wall.y + wall.size <= config.height);
                assert_eq!(wall.size, config.wall_size);
            }
        }
    }

    #[test]
    fn test_spawn_points_cycle_by_id() {
        let config = ArenaConfig::default();

        assert_eq!(spawn_point(&config, 0), (50.0, 50.0));
        assert_eq!(spawn_point(&config, 1), (750.0, 50.0));
        assert_eq!(spawn_point(&config, 2), (50.0, 550.0));
        assert_eq!(spawn_point(&config, 3), (750.0, 550.0));
        // Ids wrap around the four corners.
        assert_eq!(spawn_point(&config, 4), spawn_point(&config, 0));
        assert_eq!(spawn_point(&config, 7), spawn_point(&config, 3));
    }

    #[test]
    fn test_spawn_blocked_detects_covering_wall() {
        let walls = vec![Wall {
            x: 40.0,
            y: 40.0,
            size: 50.0,
        }];

        assert!(spawn_blocked(&walls, 50.0, 50.0, 20.0));
        assert!(!spawn_blocked(&walls, 300.0, 300.0, 20.0));
        assert!(!spawn_blocked(&[], 50.0, 50.0, 20.0));
    }
}
