//! Protocol Messages
//!
//! Wire format for client-server communication: one self-describing JSON
//! record per newline-terminated line, each tagged with a `type`
//! discriminator. Entity types serialize directly, so a snapshot is a
//! plain copy of world state.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::game::map::Wall;
use crate::game::state::{Bullet, Player, PlayerId};

// =============================================================================
// CLIENT -> SERVER MESSAGES
// =============================================================================

/// Messages sent from client to server.
///
/// Records that fail to decode into one of these variants terminate the
/// connection; see the command intake loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// One tick's displacement request. The delta is applied as sent;
    /// missing components default to zero.
    Move {
        /// Horizontal displacement.
        #[serde(default)]
        dx: f32,
        /// Vertical displacement.
        #[serde(default)]
        dy: f32,
    },

    /// Fire a bullet. The direction is unit-normalized by the sender and
    /// trusted as-is.
    Shoot {
        /// Direction x component.
        dir_x: f32,
        /// Direction y component.
        dir_y: f32,
    },
}

// =============================================================================
// SERVER -> CLIENT MESSAGES
// =============================================================================

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Sent once on admission: the assigned id plus everything needed to
    /// draw the arena before the first update arrives.
    Init {
        /// The id assigned to this session.
        player_id: PlayerId,
        /// Full player map at admission time.
        players: BTreeMap<PlayerId, Player>,
        /// Current wall layout.
        walls: Vec<Wall>,
        /// Round length in seconds.
        game_duration: u32,
        /// Arena width.
        window_width: u32,
        /// Arena height.
        window_height: u32,
    },

    /// Sent once when the server is at capacity; the connection closes
    /// immediately after.
    Full,

    /// Per-tick snapshot of one atomically-consistent instant of the world.
    Update {
        /// Full player map.
        players: BTreeMap<PlayerId, Player>,
        /// Current wall layout.
        walls: Vec<Wall>,
        /// Live bullets.
        bullets: Vec<Bullet>,
        /// Whole seconds left in the round, floored, never negative.
        time_left: u32,
        /// Arena width.
        window_width: u32,
        /// Arena height.
        window_height: u32,
    },
}

// =============================================================================
// SERIALIZATION HELPERS
// =============================================================================

impl ClientMessage {
    /// Serialize to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from a JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ServerMessage {
    /// Serialize to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from a JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::PlayerColor;

    #[test]
    fn test_move_json_roundtrip() {
        let msg = ClientMessage::Move { dx: 5.0, dy: -5.0 };

        let json = msg.to_json().unwrap();
        assert!(json.contains("\"type\":\"move\""));

        let parsed = ClientMessage::from_json(&json).unwrap();
        assert_eq!(parsed, msg);
    }

    #[test]
    fn test_move_components_default_to_zero() {
        let parsed = ClientMessage::from_json(r#"{"type":"move","dx":3.5}"#).unwrap();
        assert_eq!(parsed, ClientMessage::Move { dx: 3.5, dy: 0.0 });

        let parsed = ClientMessage::from_json(r#"{"type":"move"}"#).unwrap();
        assert_eq!(parsed, ClientMessage::Move { dx: 0.0, dy: 0.0 });
    }

    #[test]
    fn test_shoot_requires_direction() {
        let parsed =
            ClientMessage::from_json(r#"{"type":"shoot","dir_x":0.6,"dir_y":0.8}"#).unwrap();
        assert_eq!(
            parsed,
            ClientMessage::Shoot {
                dir_x: 0.6,
                dir_y: 0.8
            }
        );

        assert!(ClientMessage::from_json(r#"{"type":"shoot","dir_x":0.6}"#).is_err());
    }

    #[test]
    fn test_unknown_tag_fails_to_decode() {
        assert!(ClientMessage::from_json(r#"{"type":"teleport","x":1}"#).is_err());
        assert!(ClientMessage::from_json("not json at all").is_err());
    }

    #[test]
    fn test_full_notice_shape() {
        let json = ServerMessage::Full.to_json().unwrap();
        assert_eq!(json, r#"{"type":"full"}"#);
    }

    #[test]
    fn test_init_json_roundtrip() {
        let mut players = BTreeMap::new();
        players.insert(
            0,
            Player {
                id: 0,
                x: 50.0,
                y: 50.0,
                color: PlayerColor::Red,
                hp: 5,
                score: 0,
                respawn_timer: 0.0,
                alive: true,
            },
        );

        let msg = ServerMessage::Init {
            player_id: 0,
            players,
            walls: vec![Wall {
                x: 100.0,
                y: 200.0,
                size: 50.0,
            }],
            game_duration: 120,
            window_width: 800,
            window_height: 600,
        };

        let json = msg.to_json().unwrap();
        assert!(json.contains("\"type\":\"init\""));
        assert!(json.contains("\"color\":\"red\""));

        match ServerMessage::from_json(&json).unwrap() {
            ServerMessage::Init {
                player_id,
                players,
                walls,
                game_duration,
                ..
            } => {
                assert_eq!(player_id, 0);
                assert_eq!(players.len(), 1);
                assert_eq!(walls.len(), 1);
                assert_eq!(game_duration, 120);
            }
            other => panic!("wrong message type: {other:?}"),
        }
    }

    #[test]
    fn test_update_json_roundtrip() {
        let msg = ServerMessage::Update {
            players: BTreeMap::new(),
            walls: Vec::new(),
            bullets: vec![Bullet {
                x: 10.0,
                y: 20.0,
                dir_x: 1.0,
                dir_y: 0.0,
                owner: 3,
                bounces: 2,
            }],
            time_left: 42,
            window_width: 800,
            window_height: 600,
        };

        let json = msg.to_json().unwrap();
        assert!(json.contains("\"type\":\"update\""));
        assert!(json.contains("\"time_left\":42"));

        match ServerMessage::from_json(&json).unwrap() {
            ServerMessage::Update {
                bullets, time_left, ..
            } => {
                assert_eq!(bullets.len(), 1);
                assert_eq!(bullets[0].owner, 3);
                assert_eq!(time_left, 42);
            }
            other => panic!("wrong message type: {other:?}"),
        }
    }

    #[test]
    fn test_player_map_keys_serialize_as_strings() {
        // JSON objects only have string keys; clients index the player map
        // by the stringified id.
        let mut players = BTreeMap::new();
        players.insert(
            7,
            Player {
                id: 7,
                x: 0.0,
                y: 0.0,
                color: PlayerColor::Yellow,
                hp: 5,
                score: 0,
                respawn_timer: 0.0,
                alive: true,
            },
        );
        let msg = ServerMessage::Update {
            players,
            walls: Vec::new(),
            bullets: Vec::new(),
            time_left: 0,
            window_width: 800,
            window_height: 600,
        };

        let json = msg.to_json().unwrap();
        assert!(json.contains(r#""7":{"#));
    }
}
