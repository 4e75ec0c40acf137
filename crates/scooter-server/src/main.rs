//! Binary TCP server for the scooter-sharing service.

use anyhow::Result;
use scooter_server::{Config, Server};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;

    info!(
        "Starting scooter-server on {}:{} (max_clients = {}, map {}x{})",
        config.bind_addr, config.port, config.max_clients, config.map_size, config.map_size
    );

    let server = Server::bind(config).await?;
    info!("Listening on {}", server.local_addr()?);
    server.run().await
}
