//! Configuration for the scooter TCP server.
//!
//! Defaults, optionally replaced by a TOML file named by `SCOOTER_CONFIG`,
//! then overridden field by field from the environment:
//!
//! - `SCOOTER_BIND_ADDR`         (default: "0.0.0.0")
//! - `SCOOTER_PORT`              (default: "12345")
//! - `SCOOTER_MAX_CLIENTS`       (default: "1024")
//! - `SCOOTER_MAP_SIZE`          (default: "10")
//! - `SCOOTER_STARTING_SCOOTERS` (default: "50")
//! - `SCOOTER_EMPTY_RADIUS`      (default: "2")
//! - `SCOOTER_REWARD`            (default: "10.0")
//! - `SCOOTER_SEED`              (default: unset, random placement)
//!
//! `map_size` must lie in `1..=MAX_MAP_SIZE`.

use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use anyhow::{ensure, Context};
use serde::Deserialize;

/// Largest accepted grid side.
pub const MAX_MAP_SIZE: usize = 1024;

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// IP address / interface to bind to (e.g. "0.0.0.0" or "127.0.0.1").
    pub bind_addr: String,

    /// TCP port to listen on. `0` picks an ephemeral port.
    pub port: u16,

    /// Maximum number of simultaneously connected clients.
    pub max_clients: usize,

    /// Side of the square grid.
    pub map_size: usize,

    /// Scooters placed at random on startup.
    pub starting_scooters: usize,

    /// A reward destination has no scooter within this distance.
    pub empty_radius: i32,

    /// Reward attached to every reward path.
    pub reward: f64,

    /// Seed for initial placement; `None` draws from entropy.
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind_addr: "0.0.0.0".to_string(),
            port: 12345,
            max_clients: 1024,
            map_size: 10,
            starting_scooters: 50,
            empty_radius: 2,
            reward: 10.0,
            seed: None,
        }
    }
}

impl Config {
    /// Construct a `Config` from the environment, falling back
    /// to reasonable defaults.
    pub fn from_env() -> anyhow::Result<Self> {
        let base = match env::var("SCOOTER_CONFIG") {
            Ok(path) => Config::from_file(path)?,
            Err(_) => Config::default(),
        };

        let seed = match env::var("SCOOTER_SEED") {
            Ok(val) => Some(val.parse::<u64>().context("SCOOTER_SEED")?),
            Err(_) => base.seed,
        };

        let config = Config {
            bind_addr: read_env_or_default("SCOOTER_BIND_ADDR", base.bind_addr)?,
            port: read_env_or_default("SCOOTER_PORT", base.port)?,
            max_clients: read_env_or_default("SCOOTER_MAX_CLIENTS", base.max_clients)?,
            map_size: read_env_or_default("SCOOTER_MAP_SIZE", base.map_size)?,
            starting_scooters: read_env_or_default(
                "SCOOTER_STARTING_SCOOTERS",
                base.starting_scooters,
            )?,
            empty_radius: read_env_or_default("SCOOTER_EMPTY_RADIUS", base.empty_radius)?,
            reward: read_env_or_default("SCOOTER_REWARD", base.reward)?,
            seed,
        };
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file. Missing keys keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Config::from_toml(&text).with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn from_toml(text: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the server cannot start with.
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            (1..=MAX_MAP_SIZE).contains(&self.map_size),
            "map_size must be between 1 and {}, got {}",
            MAX_MAP_SIZE,
            self.map_size
        );
        Ok(())
    }

    /// Convenience: `addr:port` socket string.
    pub fn socket_addr_string(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

fn read_env_or_default<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(val) => val.parse::<T>().with_context(|| format!("invalid value for {}", key)),
        Err(_) => Ok(default),
    }
}
