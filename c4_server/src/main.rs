//! Connect Four WebSocket server.
//!
//! Creates one session registry for the whole process and serves the game
//! protocol until Ctrl+C.

use std::net::SocketAddr;

use anyhow::Error;
use c4_server::{api, config::ServerConfig, logging};
use pico_args::Arguments;
use tracing::info;

const HELP: &str = "\
Run a Connect Four WebSocket server

USAGE:
  c4_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:8001]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:8001)
  JOIN_CODE_LENGTH         Characters per join code, 12 to 64  [default: 16]
  SESSION_INBOX_CAPACITY   Queued commands per game  [default: 64]
  OUTBOUND_BUFFER          Queued events per connection  [default: 64]
  RATE_LIMIT_BURST         Messages per second per connection  [default: 10]
  RATE_LIMIT_SUSTAINED     Messages per minute per connection  [default: 100]
  RUST_LOG                 Log filter  [default: info]
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let bind: Option<SocketAddr> = pargs
        .opt_value_from_str("--bind")
        .map_err(|e| anyhow::anyhow!("Invalid --bind: {}", e))?;

    let remaining = pargs.finish();
    if !remaining.is_empty() {
        anyhow::bail!("Unexpected arguments: {:?}", remaining);
    }

    let config = ServerConfig::from_env(bind)?;
    config.validate()?;

    logging::init();
    info!(
        bind = %config.bind,
        join_code_length = config.session.join_code_length,
        "Starting Connect Four server"
    );

    let addr = config.bind;
    let app = api::create_router(api::AppState::new(config));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", addr, e))?;

    info!("Server is running at ws://{}. Press Ctrl+C to stop.", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    info!("Shutting down server...");

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}
