//! Shell configuration loaded from TOML.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{MaccoError, Result};

/// Lobby port used when `connect` is given no port.
pub const DEFAULT_LOBBY_PORT: u16 = 8777;

/// Environment variable consulted for the config path.
pub const CONFIG_ENV_VAR: &str = "MACCO_CONFIG";

/// Top-level configuration (`macco.toml`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MaccoConfig {
    pub listen: ListenSection,
    pub shell: ShellSection,
    #[serde(rename = "lobby")]
    pub lobbies: Vec<LobbyEntry>,
}

/// Where and how the shell accepts client connections.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ListenSection {
    pub address: String,
    pub port: u16,
    /// Maximum simultaneous connections.
    pub max_connections: usize,
    /// Idle connection timeout in seconds (0 = no timeout).
    pub idle_timeout_secs: u64,
    /// Sleep between main loop ticks.
    pub poll_interval_ms: u64,
}

impl Default for ListenSection {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: 9000,
            max_connections: 4,
            idle_timeout_secs: 300,
            poll_interval_ms: 10,
        }
    }
}

/// Per-session shell behaviour.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ShellSection {
    pub default_port: u16,
    /// Stop the process once the last client connection is lost.
    pub exit_on_last_disconnect: bool,
}

impl Default for ShellSection {
    fn default() -> Self {
        Self {
            default_port: DEFAULT_LOBBY_PORT,
            exit_on_last_disconnect: false,
        }
    }
}

/// A lobby server reachable through `connect`.
#[derive(Debug, Clone, Deserialize)]
pub struct LobbyEntry {
    pub name: String,
    pub address: String,
    #[serde(default = "default_lobby_port")]
    pub port: u16,
    /// File of `username:password` lines.
    #[serde(default)]
    pub password_db: Option<PathBuf>,
}

fn default_lobby_port() -> u16 {
    DEFAULT_LOBBY_PORT
}

impl MaccoConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: MaccoConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file. Relative `password_db` paths are resolved against
    /// the file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| MaccoError::Config(format!("{}: {e}", path.display())))?;
        let mut config = Self::from_toml(&text)?;
        if let Some(dir) = path.parent() {
            for lobby in &mut config.lobbies {
                if let Some(db) = lobby.password_db.as_mut()
                    && db.is_relative()
                {
                    *db = dir.join(&*db);
                }
            }
        }
        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Resolve the config from an explicit path, `MACCO_CONFIG`, or defaults.
    pub fn resolve(explicit: Option<PathBuf>) -> Result<Self> {
        let path = explicit.or_else(|| std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from));
        match path {
            Some(p) => Self::load(&p),
            None => Ok(Self::with_default_lobby()),
        }
    }

    /// Built-in defaults plus a single account-less lobby named `local`.
    pub fn with_default_lobby() -> Self {
        let mut config = Self::default();
        config.lobbies.push(LobbyEntry {
            name: "local".to_string(),
            address: "127.0.0.1".to_string(),
            port: DEFAULT_LOBBY_PORT,
            password_db: None,
        });
        config
    }

    fn validate(&self) -> Result<()> {
        if self.listen.max_connections == 0 {
            return Err(MaccoError::Config(
                "listen.max_connections must be at least 1".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for lobby in &self.lobbies {
            if !seen.insert(lobby.name.as_str()) {
                return Err(MaccoError::Config(format!(
                    "duplicate lobby name: {}",
                    lobby.name
                )));
            }
        }
        Ok(())
    }
}
