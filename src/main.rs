//! Ricochet Arena Server
//!
//! Binary entry point: logging, configuration, and the server lifecycle.

use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use ricochet_arena::{GameServer, ServerConfig, TICK_RATE, VERSION};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = ServerConfig::default();
    info!("Ricochet Arena Server v{}", VERSION);
    info!("Tick rate: {} Hz", TICK_RATE);
    info!(
        "Arena: {}x{}, max {} players",
        config.arena.width, config.arena.height, config.max_players
    );

    let server = GameServer::new(config);

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("received ctrl-c, shutting down");
            server.shutdown();
        }
    }

    Ok(())
}
