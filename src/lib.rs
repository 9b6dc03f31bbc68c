//! # Ricochet Arena Server
//!
//! Authoritative simulation server for a real-time top-down multiplayer
//! arena shooter. Clients send movement and fire intents; the server owns
//! the single shared truth of positions, health, and bullet trajectories
//! and broadcasts consistent snapshots at a fixed rate.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                   RICOCHET ARENA SERVER                     │
//! ├────────────────────────────────────────────────────────────┤
//! │  game/            - Simulation (runs under the world lock)  │
//! │  ├── collision.rs - Circle/rect overlap predicates          │
//! │  ├── map.rs       - Walls, spawn corners, regeneration      │
//! │  ├── state.rs     - Players, bullets, the World aggregate   │
//! │  └── tick.rs      - Fixed-rate physics + round lifecycle    │
//! │                                                             │
//! │  network/         - I/O                                     │
//! │  ├── protocol.rs  - Tagged JSON line messages               │
//! │  ├── session.rs   - Id assignment + snapshot fan-out        │
//! │  └── server.rs    - Accept loop, intake workers, tick task  │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency
//!
//! One task runs the fixed-rate simulation tick; one task accepts
//! connections; each connection gets a reader task (command intake) and a
//! writer task (snapshot delivery). The world is a single aggregate behind
//! one exclusive lock, and every read-modify-write sequence holds it end
//! to end: no client ever observes a partially updated tick, and a round
//! reset is atomic from any observer's perspective.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod game;
pub mod network;

pub use game::state::{ArenaConfig, Player, PlayerId, World};
pub use network::server::{GameServer, ServerConfig};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Simulation tick rate (Hz).
pub const TICK_RATE: u32 = 60;
