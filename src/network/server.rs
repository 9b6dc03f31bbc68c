//! Game Server
//!
//! TCP accept loop, per-connection command intake, and the fixed-rate
//! simulation/broadcast task. All world mutation funnels through the one
//! world lock. The session registry has its own lock; admission nests
//! registry → world so the init snapshot is queued ahead of any update
//! broadcast, and no other path nests the two, so the order is acyclic.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc, Mutex};
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::game::state::{ArenaConfig, PlayerId, World};
use crate::game::tick::tick;
use crate::network::protocol::{ClientMessage, ServerMessage};
use crate::network::session::{SessionError, SessionRegistry, SESSION_QUEUE_DEPTH};
use crate::TICK_RATE;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address.
    pub bind_addr: SocketAddr,
    /// Admission cap; connections beyond it get a `full` notice.
    pub max_players: usize,
    /// Simulation rate (Hz).
    pub tick_rate: u32,
    /// Arena tuning.
    pub arena: ArenaConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:21491".parse().unwrap(),
            max_players: 4,
            tick_rate: TICK_RATE,
            arena: ArenaConfig::default(),
        }
    }
}

/// Game server errors.
#[derive(Debug, thiserror::Error)]
pub enum GameServerError {
    /// Failed to bind the listening socket.
    #[error("failed to bind: {0}")]
    BindFailed(#[from] std::io::Error),
}

/// The authoritative arena server.
pub struct GameServer {
    /// Server configuration.
    config: ServerConfig,
    /// The world, behind the single exclusive lock.
    world: Arc<Mutex<World>>,
    /// Connected sessions.
    registry: Arc<Mutex<SessionRegistry>>,
    /// Shutdown signal.
    shutdown_tx: broadcast::Sender<()>,
}

impl GameServer {
    /// Create a server with a freshly generated arena.
    pub fn new(config: ServerConfig) -> Self {
        let world = World::new(config.arena, &mut rand::thread_rng());
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            world: Arc::new(Mutex::new(world)),
            registry: Arc::new(Mutex::new(SessionRegistry::new(config.max_players))),
            config,
            shutdown_tx,
        }
    }

    /// Run the accept loop and the simulation task until shutdown.
    pub async fn run(&self) -> Result<(), GameServerError> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        info!("arena server listening on {}", self.config.bind_addr);

        let simulation = tokio::spawn(run_simulation(
            self.world.clone(),
            self.registry.clone(),
            self.config.tick_rate,
            self.shutdown_tx.subscribe(),
        ));

        let mut shutdown_rx = self.shutdown_tx.subscribe();
        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => self.handle_connection(stream, addr),
                        Err(e) => warn!("accept error: {e}"),
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("shutdown signal received");
                    break;
                }
            }
        }

        simulation.abort();
        Ok(())
    }

    /// Signal every task to stop.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Number of connected players.
    pub async fn player_count(&self) -> usize {
        self.registry.lock().await.len()
    }

    /// Spawn the per-connection worker.
    fn handle_connection(&self, stream: TcpStream, addr: SocketAddr) {
        let world = self.world.clone();
        let registry = self.registry.clone();

        tokio::spawn(async move {
            if let Err(e) = serve_connection(stream, addr, world, registry).await {
                debug!("connection {addr} ended: {e}");
            }
        });
    }
}

/// Drive one client connection from admission to cleanup.
async fn serve_connection(
    stream: TcpStream,
    addr: SocketAddr,
    world: Arc<Mutex<World>>,
    registry: Arc<Mutex<SessionRegistry>>,
) -> std::io::Result<()> {
    let (read_half, mut write_half) = stream.into_split();
    let (msg_tx, msg_rx) = mpsc::channel::<ServerMessage>(SESSION_QUEUE_DEPTH);

    // Admission. The registry lock is held across player creation so the
    // init snapshot lands on the channel before any tick broadcast can.
    let player_id = {
        let mut registry = registry.lock().await;
        match registry.admit(msg_tx.clone()) {
            Ok(id) => {
                let mut world = world.lock().await;
                world.add_player(id);
                let init = ServerMessage::Init {
                    player_id: id,
                    players: world.players.clone(),
                    walls: world.walls.clone(),
                    game_duration: world.config.round_duration as u32,
                    window_width: world.config.width as u32,
                    window_height: world.config.height as u32,
                };
                // A fresh queue always has room for one message.
                let _ = msg_tx.try_send(init);
                id
            }
            Err(SessionError::ServerFull) => {
                drop(registry);
                info!("rejecting {addr}: server full");
                send_line(&mut write_half, &ServerMessage::Full).await?;
                return Ok(());
            }
        }
    };
    info!("player {player_id} connected from {addr}");

    let writer = tokio::spawn(write_session(write_half, msg_rx));

    read_commands(read_half, player_id, &world).await;

    // Cleanup: removal is a single locked step per resource, and both are
    // idempotent against the eviction path in the tick task.
    world.lock().await.remove_player(player_id);
    registry.lock().await.remove(player_id);
    writer.abort();
    info!("player {player_id} disconnected");
    Ok(())
}

/// Command intake: decode newline-framed commands and apply each one under
/// the world lock. Returns on connection close, transport error, or the
/// first undecodable line; the decode-failure policy is to terminate.
async fn read_commands(read_half: OwnedReadHalf, player_id: PlayerId, world: &Mutex<World>) {
    let mut lines = BufReader::new(read_half).lines();

    while let Ok(Some(line)) = lines.next_line().await {
        if line.is_empty() {
            continue;
        }

        let message = match ClientMessage::from_json(&line) {
            Ok(m) => m,
            Err(e) => {
                warn!("player {player_id} sent undecodable command: {e}");
                return;
            }
        };

        let mut world = world.lock().await;
        match message {
            ClientMessage::Move { dx, dy } => {
                if !world.apply_move(player_id, dx, dy) {
                    debug!("player {player_id} move rejected");
                }
            }
            ClientMessage::Shoot { dir_x, dir_y } => {
                if !world.apply_shoot(player_id, dir_x, dir_y) {
                    debug!("player {player_id} shot rejected");
                }
            }
        }
    }
}

/// Drain a session's queue onto the socket, one JSON line per message.
/// Exits on the first write failure, which closes the channel and marks
/// the session for eviction at the next broadcast.
async fn write_session(mut write_half: OwnedWriteHalf, mut rx: mpsc::Receiver<ServerMessage>) {
    while let Some(message) = rx.recv().await {
        match message.to_json() {
            Ok(mut line) => {
                line.push('\n');
                if write_half.write_all(line.as_bytes()).await.is_err() {
                    break;
                }
            }
            Err(e) => warn!("failed to serialize message: {e}"),
        }
    }
}

/// Write one message as a JSON line directly to a socket half, outside any
/// session queue. Used only for the pre-admission `full` notice.
async fn send_line(
    write_half: &mut OwnedWriteHalf,
    message: &ServerMessage,
) -> std::io::Result<()> {
    let mut line = message.to_json()?;
    line.push('\n');
    write_half.write_all(line.as_bytes()).await
}

/// Fixed-rate simulation and broadcast loop.
///
/// Bullet physics always steps by the fixed per-tick amount; the measured
/// wall-clock delta feeds only respawn aging and the round clock, so an
/// overrun tick ages timers faster but never stretches trajectories.
async fn run_simulation(
    world: Arc<Mutex<World>>,
    registry: Arc<Mutex<SessionRegistry>>,
    tick_rate: u32,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    let mut timer = interval(Duration::from_micros(1_000_000 / tick_rate as u64));
    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut last = Instant::now();

    // Sessions whose send failed last tick; their players go this tick,
    // deferred so the broadcast pass never mutates mid-iteration.
    let mut pending_evictions: Vec<PlayerId> = Vec::new();

    loop {
        tokio::select! {
            _ = timer.tick() => {}
            _ = shutdown_rx.recv() => break,
        }

        let now = Instant::now();
        let dt = (now - last).as_secs_f32();
        last = now;

        let update = {
            let mut world = world.lock().await;

            for id in pending_evictions.drain(..) {
                world.remove_player(id);
            }

            let result = tick(&mut world, dt, &mut rand::thread_rng());
            for (victim, owner) in &result.kills {
                info!("player {owner} killed player {victim}");
            }
            if result.round_reset {
                info!("round over: walls regenerated, players restored");
            }

            ServerMessage::Update {
                players: world.players.clone(),
                walls: world.walls.clone(),
                bullets: world.bullets.clone(),
                time_left: world.time_left(),
                window_width: world.config.width as u32,
                window_height: world.config.height as u32,
            }
        };

        let mut registry = registry.lock().await;
        let dead = registry.broadcast(&update);
        for id in &dead {
            registry.remove(*id);
            debug!("session {id} send failed, player queued for eviction");
        }
        pending_evictions.extend(dead);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.tick_rate, 60);
        assert_eq!(config.max_players, 4);
        assert_eq!(config.bind_addr.port(), 21491);
    }

    #[tokio::test]
    async fn test_server_creation() {
        let server = GameServer::new(ServerConfig::default());
        assert_eq!(server.player_count().await, 0);

        let world = server.world.lock().await;
        assert_eq!(world.walls.len(), world.config.wall_count);
        assert!(world.players.is_empty());
        assert!(world.bullets.is_empty());
    }

    #[tokio::test]
    async fn test_server_shutdown() {
        let server = GameServer::new(ServerConfig::default());
        server.shutdown();
        // Should not panic with no subscribers.
    }
}
