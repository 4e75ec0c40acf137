// crates/scooter-client/src/config.rs

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Settings for the scripted client session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub server_addr: String,
    pub username: String,
    pub password_hash: String,
    /// Where the session starts looking for scooters.
    pub x: i32,
    pub y: i32,
    pub range: i32,
    /// How long to wait for reward notifications before logging out.
    pub listen_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_addr: "127.0.0.1:12345".to_string(),
            username: "guest".to_string(),
            password_hash: "guest".to_string(),
            x: 0,
            y: 0,
            range: 3,
            listen_secs: 10,
        }
    }
}

impl ClientConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config: ClientConfig = toml::from_str("username = \"bob\"\nrange = 5").unwrap();
        assert_eq!(config.username, "bob");
        assert_eq!(config.range, 5);
        assert_eq!(config.server_addr, ClientConfig::default().server_addr);
    }
}
