//! Boardroom - room-based tic-tac-toe and Othello server
//!
//! Loads the configuration, starts the TCP server and runs until Ctrl-C.

use boardroom_net::{Server, ServerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;

fn main() {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    tracing::info!("Starting Boardroom");

    let config = match config::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!("Failed to create tokio runtime: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(run(config)) {
        tracing::error!("Server failed: {}", e);
        std::process::exit(1);
    }
}

async fn run(config: ServerConfig) -> boardroom_net::Result<()> {
    let server = Server::start(config).await?;
    tracing::info!(addr = %server.addr(), "Listening");

    tokio::signal::ctrl_c().await?;
    server.shutdown();
    Ok(())
}
