// crates/scooter-client/src/main.rs

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Result};
use chrono::Local;
use clap::Parser;
use scooter_client::{ClientConfig, ClientError, ScooterClient};
use scooter_core::{Location, RewardPath};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[clap(name = "scooter-client")]
#[clap(about = "Scripted session against the scooter-sharing server")]
struct Cli {
    /// Server address
    #[clap(short, long)]
    server: Option<String>,

    /// Username
    #[clap(short, long)]
    user: Option<String>,

    /// Password hash sent verbatim to the server
    #[clap(short, long)]
    password: Option<String>,

    /// Starting position
    #[clap(long, allow_hyphen_values = true)]
    x: Option<i32>,

    #[clap(long, allow_hyphen_values = true)]
    y: Option<i32>,

    /// Search radius
    #[clap(short, long)]
    range: Option<i32>,

    /// Seconds to wait for reward notifications
    #[clap(short, long)]
    listen_secs: Option<u64>,

    /// TOML file with defaults for all of the above
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[clap(short, long)]
    debug: bool,
}

impl Cli {
    fn into_config(self) -> Result<ClientConfig> {
        let mut config = match &self.config {
            Some(path) => ClientConfig::load(path)?,
            None => ClientConfig::default(),
        };
        if let Some(server) = self.server {
            config.server_addr = server;
        }
        if let Some(user) = self.user {
            config.username = user;
        }
        if let Some(password) = self.password {
            config.password_hash = password;
        }
        config.x = self.x.unwrap_or(config.x);
        config.y = self.y.unwrap_or(config.y);
        config.range = self.range.unwrap_or(config.range);
        config.listen_secs = self.listen_secs.unwrap_or(config.listen_secs);
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let default_level = if cli.debug { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let config = cli.into_config()?;
    run_session(&config).await
}

async fn run_session(config: &ClientConfig) -> Result<()> {
    let user = config.username.as_str();
    let origin = Location::new(config.x, config.y);

    let client = ScooterClient::connect(&config.server_addr).await?;
    let mut pushes = client.notifications();

    if client.register(user, &config.password_hash).await? {
        println!("registered {}", user);
    }
    if !client.login(user, &config.password_hash).await? {
        bail!("login refused for {}", user);
    }
    println!("logged in as {}", user);

    // Scooter and notification services, so both calls are in flight together.
    let (free, subscribed) = futures::try_join!(
        client.list_free_scooters(config.range, origin),
        client.is_subscribed(user),
    )?;
    println!("{} free scooter(s) within {} of {}", free.len(), config.range, origin);

    let rewards = client.list_rewards(origin, config.range).await?;
    for path in &rewards {
        println!("  reward: {}", path);
    }

    match client.reserve(config.range, origin, user).await {
        Ok(ticket) => {
            println!("reserved scooter at {} (code {})", ticket.location, ticket.code);
            let destination = rewards
                .iter()
                .find(|p| p.start == ticket.location)
                .map_or(origin, |p| p.finish);
            let outcome = client.park(&ticket.code, destination, user).await?;
            match outcome.bounty {
                Some(bounty) => println!(
                    "parked at {}: price {:.2}, bounty {:.2}",
                    destination, outcome.price, bounty
                ),
                None => println!("parked at {}: price {:.2}", destination, outcome.price),
            }
        }
        Err(ClientError::Refused(code)) => println!("no scooter reserved ({:?})", code),
        Err(err) => return Err(err.into()),
    }

    if !subscribed {
        client.subscribe(user).await?;
    }
    client.watch(user, origin, config.range).await?;
    info!(secs = config.listen_secs, "waiting for reward notifications");

    let deadline = tokio::time::sleep(Duration::from_secs(config.listen_secs));
    tokio::pin!(deadline);
    loop {
        tokio::select! {
            _ = &mut deadline => break,
            push = pushes.recv() => match push {
                Some(paths) => print_push(&paths),
                None => break,
            },
        }
    }

    client.logout(user).await?;
    client.close().await;
    Ok(())
}

fn print_push(paths: &[RewardPath]) {
    let now = Local::now().format("%H:%M:%S");
    for path in paths {
        println!("[{}] reward available: {}", now, path);
    }
}
