//! Multi-room Chat Server - Entry Point
//!
//! Parses configuration, binds the listener and runs the server.

use clap::Parser;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use room_chat::{serve, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=room_chat=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("room_chat=info")),
        )
        .init();

    let config = ServerConfig::parse();
    config.validate()?;

    let listener = TcpListener::bind(&config.addr).await?;
    info!("Chat server listening on {}", config.addr);

    // Only returns on a listener failure, which is fatal.
    if let Err(e) = serve(listener, config).await {
        error!("Server stopped: {}", e);
        return Err(e.into());
    }

    Ok(())
}
