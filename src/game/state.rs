//! World State
//!
//! Entity types and the single shared aggregate every part of the server
//! mutates. All mutation goes through [`World`] methods while the caller
//! holds the one world lock; the lock itself lives in the network layer.
//! Uses BTreeMap so iteration order, and with it hit resolution and
//! snapshot layout, is stable.

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::game::collision::circle_rect_overlap;
use crate::game::map::{self, Wall};

/// Unique player identifier. Assigned at admission, strictly increasing,
/// never reused while the process lives.
pub type PlayerId = u32;

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Arena tuning. `Default` carries the canonical values; tests shrink them.
#[derive(Clone, Copy, Debug)]
pub struct ArenaConfig {
    /// Arena width in logical units.
    pub width: f32,
    /// Arena height in logical units.
    pub height: f32,
    /// Player collision radius.
    pub player_radius: f32,
    /// Side length of a wall square.
    pub wall_size: f32,
    /// Number of walls per round.
    pub wall_count: usize,
    /// Ricochets a bullet survives; exceeding this destroys it.
    pub max_bounces: u32,
    /// Hit points at spawn and revival.
    pub max_hp: i32,
    /// Round length in seconds.
    pub round_duration: f32,
    /// Seconds between death and revival.
    pub respawn_delay: f32,
    /// Bullet travel per tick.
    pub bullet_speed: f32,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            player_radius: 20.0,
            wall_size: 50.0,
            wall_count: 20,
            max_bounces: 5,
            max_hp: 5,
            round_duration: 120.0,
            respawn_delay: 5.0,
            bullet_speed: 10.0,
        }
    }
}

// =============================================================================
// ENTITIES
// =============================================================================

/// Fixed display palette; a player's color is `id` modulo the palette size.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerColor {
    /// First palette slot.
    Red,
    /// Second palette slot.
    Green,
    /// Third palette slot.
    Blue,
    /// Fourth palette slot.
    Yellow,
}

impl PlayerColor {
    const ALL: [PlayerColor; 4] = [
        PlayerColor::Red,
        PlayerColor::Green,
        PlayerColor::Blue,
        PlayerColor::Yellow,
    ];

    /// Color assigned to a player id.
    #[inline]
    pub fn for_id(id: PlayerId) -> Self {
        Self::ALL[id as usize % Self::ALL.len()]
    }
}

/// State of one connected player.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Player {
    /// Stable identifier, also the key in [`World::players`].
    pub id: PlayerId,
    /// Horizontal position. Committed positions always sit inside the
    /// arena inflated inward by the player radius and outside every wall.
    pub x: f32,
    /// Vertical position.
    pub y: f32,
    /// Display color.
    pub color: PlayerColor,
    /// Remaining hit points.
    pub hp: i32,
    /// Kills credited this round.
    pub score: u32,
    /// Seconds until revival; meaningful only while not alive.
    pub respawn_timer: f32,
    /// Dead players ignore commands and bullets until revived.
    pub alive: bool,
}

/// A live projectile.
///
/// Owned by the world, not by any connection: the owner id may dangle
/// after a disconnect, in which case it is used only for score attribution
/// and the credit is skipped.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Bullet {
    /// Horizontal position.
    pub x: f32,
    /// Vertical position.
    pub y: f32,
    /// Unit direction, x component. Normalized by the client at fire time;
    /// reflection only negates components, so the length never drifts.
    pub dir_x: f32,
    /// Unit direction, y component.
    pub dir_y: f32,
    /// Shooter's id at fire time.
    pub owner: PlayerId,
    /// Ricochets survived so far; monotonically non-decreasing.
    pub bounces: u32,
}

// =============================================================================
// WORLD AGGREGATE
// =============================================================================

/// The authoritative aggregate: players, walls, bullets, round clock.
#[derive(Debug)]
pub struct World {
    /// Arena tuning, fixed for the process lifetime.
    pub config: ArenaConfig,
    /// Connected players keyed by id.
    pub players: BTreeMap<PlayerId, Player>,
    /// Current round's obstacles.
    pub walls: Vec<Wall>,
    /// Live projectiles.
    pub bullets: Vec<Bullet>,
    /// Seconds since the round started.
    pub round_elapsed: f32,
}

impl World {
    /// Create a world with a freshly generated wall layout.
    pub fn new<R: Rng>(config: ArenaConfig, rng: &mut R) -> Self {
        Self {
            config,
            players: BTreeMap::new(),
            walls: map::generate_walls(&config, rng),
            bullets: Vec::new(),
            round_elapsed: 0.0,
        }
    }

    /// Admit a player at their canonical spawn point with full state.
    pub fn add_player(&mut self, id: PlayerId) {
        let (x, y) = map::spawn_point(&self.config, id);
        self.players.insert(
            id,
            Player {
                id,
                x,
                y,
                color: PlayerColor::for_id(id),
                hp: self.config.max_hp,
                score: 0,
                respawn_timer: 0.0,
                alive: true,
            },
        );
    }

    /// Remove a player. Idempotent; bullets owned by the id stay live.
    pub fn remove_player(&mut self, id: PlayerId) {
        self.players.remove(&id);
    }

    /// Apply a movement command.
    ///
    /// The displacement is the client's full per-tick delta; the server
    /// applies no scaling. Rejected without any state change if the player
    /// is missing or dead, or if the candidate position overlaps a wall.
    /// Otherwise the candidate is clamped into the radius-inflated arena
    /// bounds and committed. Returns whether the move was committed.
    pub fn apply_move(&mut self, id: PlayerId, dx: f32, dy: f32) -> bool {
        let config = self.config;
        let walls = &self.walls;
        let Some(player) = self.players.get_mut(&id) else {
            return false;
        };
        if !player.alive {
            return false;
        }

        let nx = player.x + dx;
        let ny = player.y + dy;

        if walls
            .iter()
            .any(|w| circle_rect_overlap(nx, ny, config.player_radius, w.x, w.y, w.size))
        {
            return false;
        }

        player.x = nx.clamp(config.player_radius, config.width - config.player_radius);
        player.y = ny.clamp(config.player_radius, config.height - config.player_radius);
        true
    }

    /// Apply a shoot command: a living player fires a bullet from their
    /// current position in the client-normalized direction. Returns whether
    /// a bullet was spawned.
    pub fn apply_shoot(&mut self, id: PlayerId, dir_x: f32, dir_y: f32) -> bool {
        let Some(player) = self.players.get(&id) else {
            return false;
        };
        if !player.alive {
            return false;
        }

        self.bullets.push(Bullet {
            x: player.x,
            y: player.y,
            dir_x,
            dir_y,
            owner: id,
            bounces: 0,
        });
        true
    }

    /// Hard round cut: fresh walls, no bullets, every player restored to
    /// full hp, alive, zero score, and the clock restarted. Positions and
    /// respawn timers are left as they are.
    pub fn reset_round<R: Rng>(&mut self, rng: &mut R) {
        self.walls = map::generate_walls(&self.config, rng);
        self.bullets.clear();
        for player in self.players.values_mut() {
            player.hp = self.config.max_hp;
            player.score = 0;
            player.alive = true;
        }
        self.round_elapsed = 0.0;
    }

    /// Whole seconds left in the round: duration minus the floored elapsed
    /// time, never negative.
    pub fn time_left(&self) -> u32 {
        (self.config.round_duration - self.round_elapsed.floor()).max(0.0) as u32
    }
}
