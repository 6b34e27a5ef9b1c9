// Tombala server entry point.
//
// Startup sequence:
// 1. Initialize tracing
// 2. Load config
// 3. Create the game engine
// 4. Bind the WebSocket listener and serve until Ctrl+C

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{error, info};

use tombala_core::config;
use tombala_core::Engine;
use tombala_server::ws_server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing
    init_tracing()?;
    info!("Tombala server starting up");

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: numbers 1..={}, draw every {}s, {} players to start",
        config.game.max_number, config.game.draw_interval_secs, config.game.min_players
    );

    // 3. Create the game engine
    let engine = Engine::new(&config.game);

    // 4. Bind and serve
    let addr = config.server.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind WebSocket server on {addr}"))?;

    tokio::select! {
        result = ws_server::run(listener, engine) => {
            if let Err(e) = &result {
                error!("WebSocket server error: {}", e);
            }
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl+C received, shutting down");
        }
    }

    info!("Tombala server shut down cleanly");
    Ok(())
}

/// Initialize tracing to stdout, filtered by `RUST_LOG`.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("tombala_core=info,tombala_server=info,warn")),
        )
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
