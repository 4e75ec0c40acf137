//! TCP listener and top-level server wiring.
//!
//! This module:
//! - Builds the domain (a populated map) and the shared registries.
//! - Starts the reward broadcaster and asks it for a first pass.
//! - Accepts TCP connections and spawns one `Worker` per connection.
//!
//! Connections beyond `max_clients` are accepted and dropped straight away.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Context;
use rand::rngs::StdRng;
use rand::SeedableRng;
use scooter_core::{DomainService, ScooterMap};
use scooter_transport::TcpConnection;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::config::Config;
use crate::handlers::HandlerTable;
use crate::reward_manager::RewardSettings;
use crate::types::ServiceContext;
use crate::worker::Worker;

pub struct Server {
    config: Config,
    listener: TcpListener,
    ctx: ServiceContext,
    handlers: Arc<HandlerTable>,
    live_clients: Arc<AtomicUsize>,
}

/// Decrements the live-client count when a connection task ends.
struct LiveClient(Arc<AtomicUsize>);

impl Drop for LiveClient {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

impl Server {
    /// Bind the listener and build a randomly populated map.
    pub async fn bind(config: Config) -> anyhow::Result<Self> {
        config.validate()?;
        let map = populated_map(&config);
        info!(
            size = config.map_size,
            scooters = map.total_scooters(),
            "scooter map ready"
        );
        Server::with_domain(config, Arc::new(DomainService::new(map))).await
    }

    /// Bind the listener around an existing domain.
    pub async fn with_domain(config: Config, domain: Arc<DomainService>) -> anyhow::Result<Self> {
        let addr = config.socket_addr_string();
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("binding {}", addr))?;

        let ctx = ServiceContext::new(
            domain,
            RewardSettings {
                empty_radius: config.empty_radius,
                reward: config.reward,
            },
        );
        let handlers = Arc::new(HandlerTable::new(&ctx));

        Ok(Server {
            config,
            listener,
            ctx,
            handlers,
            live_clients: Arc::new(AtomicUsize::new(0)),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn context(&self) -> &ServiceContext {
        &self.ctx
    }

    /// Run the accept loop. Only returns on a fatal error.
    pub async fn run(self) -> anyhow::Result<()> {
        let broadcaster = self.ctx.rewards.spawn();
        self.ctx.rewards.signal();

        let result = self.accept_loop().await;
        broadcaster.abort();
        result
    }

    async fn accept_loop(&self) -> anyhow::Result<()> {
        loop {
            let (stream, peer) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(err) => {
                    warn!("accept failed: {}", err);
                    continue;
                }
            };

            let current = self.live_clients.load(Ordering::Acquire);
            if current >= self.config.max_clients {
                warn!(
                    %peer,
                    max_clients = self.config.max_clients,
                    "rejecting connection: max_clients reached"
                );
                // Just drop the stream; the client sees the connection close.
                continue;
            }
            self.live_clients.fetch_add(1, Ordering::AcqRel);
            let live = LiveClient(Arc::clone(&self.live_clients));

            info!(%peer, "accepted connection");
            let worker = Worker::new(
                peer,
                Arc::new(TcpConnection::from_stream(stream)),
                Arc::clone(&self.handlers),
                self.ctx.clone(),
            );

            tokio::spawn(async move {
                let _live = live;
                match worker.run().await {
                    Ok(()) => info!(%peer, "client disconnected"),
                    Err(err) => warn!(%peer, "client dropped: {}", err),
                }
            });
        }
    }
}

fn populated_map(config: &Config) -> ScooterMap {
    let mut map = ScooterMap::new(config.map_size);
    match config.seed {
        Some(seed) => map.populate(config.starting_scooters, &mut StdRng::seed_from_u64(seed)),
        None => map.populate(config.starting_scooters, &mut rand::thread_rng()),
    }
    map
}
