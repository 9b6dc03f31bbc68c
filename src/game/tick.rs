//! Simulation Tick
//!
//! The fixed-rate authority over bullets, respawn timers, and the round
//! clock. Everything here runs under the world lock held by the caller;
//! command intake only ever writes between ticks, never during one.

use rand::Rng;

use crate::game::collision::point_in_rect;
use crate::game::map::{self, Wall};
use crate::game::state::{Bullet, PlayerId, World};

/// What a tick did, for the caller to log and act on.
#[derive(Debug, Default)]
pub struct TickResult {
    /// `(victim, owner)` pairs for lethal hits this tick. The owner id may
    /// no longer be connected.
    pub kills: Vec<(PlayerId, PlayerId)>,
    /// Whether the round clock expired and the world was reset.
    pub round_reset: bool,
}

/// Advance the world by one tick.
///
/// `dt` is the wall-clock delta since the previous tick and drives respawn
/// aging and the round clock only; bullet motion always steps by the fixed
/// per-tick amount, so a late tick never stretches trajectories.
pub fn tick<R: Rng>(world: &mut World, dt: f32, rng: &mut R) -> TickResult {
    let mut result = TickResult::default();

    world.round_elapsed += dt;

    // 1. Respawn aging and revival.
    age_respawns(world, dt);

    // 2. Bullet physics: border bounce, wall ricochet, player hits.
    advance_bullets(world, &mut result);

    // 3. Round lifecycle. A hard cut, not a transition.
    if world.round_elapsed > world.config.round_duration {
        world.reset_round(rng);
        result.round_reset = true;
    }

    result
}

/// Count down dead players and revive them at their canonical spawn point
/// once the timer runs out. Revival is skipped while a wall covers the
/// spawn; the timer stays expired and the attempt repeats next tick.
fn age_respawns(world: &mut World, dt: f32) {
    let config = world.config;
    let walls = &world.walls;

    for player in world.players.values_mut() {
        if player.alive {
            continue;
        }
        player.respawn_timer -= dt;
        if player.respawn_timer > 0.0 {
            continue;
        }

        let (sx, sy) = map::spawn_point(&config, player.id);
        if map::spawn_blocked(walls, sx, sy, config.player_radius) {
            continue;
        }

        player.x = sx;
        player.y = sy;
        player.hp = config.max_hp;
        player.alive = true;
    }
}

/// Step every bullet once. Walks by index and removes in place, so a
/// destroyed bullet never survives into a later pass.
fn advance_bullets(world: &mut World, result: &mut TickResult) {
    let config = world.config;
    let mut i = 0;

    while i < world.bullets.len() {
        let mut bullet = world.bullets[i];
        bullet.x += bullet.dir_x * config.bullet_speed;
        bullet.y += bullet.dir_y * config.bullet_speed;

        // Border ricochet. Both axes can flip in one step in a corner.
        if bullet.x < 0.0 || bullet.x > config.width || bullet.y < 0.0 || bullet.y > config.height
        {
            if bullet.x < 0.0 || bullet.x > config.width {
                bullet.dir_x = -bullet.dir_x;
            }
            if bullet.y < 0.0 || bullet.y > config.height {
                bullet.dir_y = -bullet.dir_y;
            }
            bullet.bounces += 1;
            if bullet.bounces > config.max_bounces {
                world.bullets.remove(i);
                continue;
            }
            bullet.x = bullet.x.clamp(0.0, config.width);
            bullet.y = bullet.y.clamp(0.0, config.height);
        }

        // Wall ricochet. A bullet that touched a wall cannot also hit a
        // player in the same tick.
        let hit_wall = world
            .walls
            .iter()
            .copied()
            .find(|w| point_in_rect(bullet.x, bullet.y, w.x, w.y, w.size));
        if let Some(wall) = hit_wall {
            if bullet.bounces < config.max_bounces {
                reflect(&mut bullet, wall, config.bullet_speed);
                bullet.bounces += 1;
                world.bullets[i] = bullet;
                i += 1;
            } else {
                world.bullets.remove(i);
            }
            continue;
        }

        // Player hit: first living non-owner within the collision radius.
        let victim_id = world
            .players
            .values()
            .find(|p| {
                p.id != bullet.owner && p.alive && (p.x - bullet.x).hypot(p.y - bullet.y) < config.player_radius
            })
            .map(|p| p.id);

        if let Some(victim_id) = victim_id {
            let mut lethal = false;
            if let Some(victim) = world.players.get_mut(&victim_id) {
                victim.hp -= 1;
                if victim.hp <= 0 {
                    victim.alive = false;
                    victim.respawn_timer = config.respawn_delay;
                    lethal = true;
                }
            }
            if lethal {
                // Credit the shooter only if still connected; a dangling
                // owner id deals damage but earns nothing.
                if let Some(owner) = world.players.get_mut(&bullet.owner) {
                    owner.score += 1;
                }
                result.kills.push((victim_id, bullet.owner));
            }
            world.bullets.remove(i);
            continue;
        }

        world.bullets[i] = bullet;
        i += 1;
    }
}

/// Flip the direction components whose wall face the bullet crossed this
/// step. The pre-move position is reconstructed from the current direction
/// and speed, so a corner crossing flips both axes in one event. This is a
/// deliberate approximation, not a continuous-time solve.
fn reflect(bullet: &mut Bullet, wall: Wall, speed: f32) {
    let prev_x = bullet.x - bullet.dir_x * speed;
    let prev_y = bullet.y - bullet.dir_y * speed;

    if (prev_x < wall.x && bullet.x >= wall.x)
        || (prev_x > wall.x + wall.size && bullet.x <= wall.x + wall.size)
    {
        bullet.dir_x = -bullet.dir_x;
    }
    if (prev_y < wall.y && bullet.y >= wall.y)
        || (prev_y > wall.y + wall.size && bullet.y <= wall.y + wall.size)
    {
        bullet.dir_y = -bullet.dir_y;
    }
}
