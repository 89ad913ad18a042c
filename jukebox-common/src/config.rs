//! Configuration loading and resolution
//!
//! Every setting resolves in this priority order:
//! 1. Command-line argument (applied by each binary)
//! 2. Environment variable (`JUKEBOX_*`)
//! 3. TOML config file
//! 4. Compiled default
//!
//! A missing or unreadable config file is never fatal: it logs a warning and the
//! compiled defaults are used.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Default HTTP/push port of the server
pub const DEFAULT_PORT: u16 = 5000;

/// Top-level TOML configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub client: ClientConfig,
    pub reconnect: ReconnectConfig,
    pub logging: LoggingConfig,
}

/// `[server]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
        }
    }
}

/// Which record store backs the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Remote tabular store reached over HTTP
    Sheet,
    /// Local SQLite file
    Sqlite,
}

impl std::str::FromStr for StoreBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sheet" => Ok(StoreBackend::Sheet),
            "sqlite" => Ok(StoreBackend::Sqlite),
            other => Err(Error::Config(format!("Unknown store backend: {}", other))),
        }
    }
}

/// `[store]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Base URL of the sheet API (required for the `sheet` backend)
    pub sheet_url: Option<String>,
    /// SQLite database path; `sqlite::memory:` is accepted
    pub sqlite_path: String,
    /// Timeout for each store request
    pub request_timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Sqlite,
            sheet_url: None,
            sqlite_path: default_data_dir()
                .join("queue.db")
                .to_string_lossy()
                .to_string(),
            request_timeout_secs: 15,
        }
    }
}

/// Whether this client renders media at all
///
/// Constrained/narrow displays run with `Absent`: the queue and advance logic
/// still run but no player is ever instantiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackCapability {
    Present,
    Absent,
}

impl PlaybackCapability {
    pub fn is_present(self) -> bool {
        matches!(self, PlaybackCapability::Present)
    }
}

impl std::str::FromStr for PlaybackCapability {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "present" | "on" | "true" => Ok(PlaybackCapability::Present),
            "absent" | "off" | "false" => Ok(PlaybackCapability::Absent),
            other => Err(Error::Config(format!("Unknown playback capability: {}", other))),
        }
    }
}

/// `[client]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the jukebox server HTTP API
    pub server_url: String,
    /// Push channel URL
    pub ws_url: String,
    pub playback: PlaybackCapability,
    /// Timeout for each request to the server API
    pub request_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: format!("http://127.0.0.1:{}", DEFAULT_PORT),
            ws_url: format!("ws://127.0.0.1:{}/ws", DEFAULT_PORT),
            playback: PlaybackCapability::Present,
            request_timeout_secs: 15,
        }
    }
}

/// `[reconnect]` section
///
/// Disabled by default: a dropped push connection stays down until the operator
/// reconnects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectConfig {
    pub enabled: bool,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            initial_delay_ms: 500,
            max_delay_ms: 30_000,
        }
    }
}

/// `[logging]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl TomlConfig {
    /// Parse a config file, failing on I/O or TOML errors
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| Error::Config(format!("Invalid TOML: {}", e)))
    }

    /// Load configuration with graceful degradation
    ///
    /// Uses `explicit` when given, otherwise the platform config path. Any
    /// failure falls back to compiled defaults. Environment overrides are
    /// applied on top in both cases.
    pub fn load(explicit: Option<&Path>) -> Self {
        let path = explicit.map(Path::to_path_buf).or_else(default_config_path);

        let mut config = match path {
            Some(path) if path.exists() => match Self::from_file(&path) {
                Ok(config) => {
                    info!("Loaded configuration from {}", path.display());
                    config
                }
                Err(e) => {
                    warn!("Failed to load {}: {} (using defaults)", path.display(), e);
                    Self::default()
                }
            },
            Some(path) => {
                if explicit.is_some() {
                    warn!("Config file not found: {} (using defaults)", path.display());
                }
                Self::default()
            }
            None => Self::default(),
        };

        config.apply_env_overrides();
        config
    }

    /// Apply `JUKEBOX_*` environment variables over file values
    ///
    /// Unparseable values are ignored with a warning.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(bind) = std::env::var("JUKEBOX_BIND") {
            self.server.bind = bind;
        }
        if let Ok(port) = std::env::var("JUKEBOX_PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => warn!("Ignoring invalid JUKEBOX_PORT: {}", port),
            }
        }
        if let Ok(backend) = std::env::var("JUKEBOX_STORE") {
            match backend.parse() {
                Ok(backend) => self.store.backend = backend,
                Err(e) => warn!("Ignoring JUKEBOX_STORE: {}", e),
            }
        }
        if let Ok(url) = std::env::var("JUKEBOX_SHEET_URL") {
            self.store.sheet_url = Some(url);
        }
        if let Ok(path) = std::env::var("JUKEBOX_SQLITE_PATH") {
            self.store.sqlite_path = path;
        }
        if let Some(secs) = env_number("JUKEBOX_STORE_TIMEOUT_SECS") {
            self.store.request_timeout_secs = secs;
        }
        if let Ok(url) = std::env::var("JUKEBOX_SERVER_URL") {
            self.client.server_url = url;
        }
        if let Ok(url) = std::env::var("JUKEBOX_WS_URL") {
            self.client.ws_url = url;
        }
        if let Ok(playback) = std::env::var("JUKEBOX_PLAYBACK") {
            match playback.parse() {
                Ok(playback) => self.client.playback = playback,
                Err(e) => warn!("Ignoring JUKEBOX_PLAYBACK: {}", e),
            }
        }
        if let Some(secs) = env_number("JUKEBOX_CLIENT_TIMEOUT_SECS") {
            self.client.request_timeout_secs = secs;
        }
        if let Ok(flag) = std::env::var("JUKEBOX_RECONNECT") {
            match parse_flag(&flag) {
                Some(enabled) => self.reconnect.enabled = enabled,
                None => warn!("Ignoring invalid JUKEBOX_RECONNECT: {}", flag),
            }
        }
        if let Some(ms) = env_number("JUKEBOX_RECONNECT_INITIAL_MS") {
            self.reconnect.initial_delay_ms = ms;
        }
        if let Some(ms) = env_number("JUKEBOX_RECONNECT_MAX_MS") {
            self.reconnect.max_delay_ms = ms;
        }
        if let Ok(level) = std::env::var("JUKEBOX_LOG_LEVEL") {
            self.logging.level = level;
        }
    }

    /// Check values that have no usable default
    pub fn validate(&self) -> Result<()> {
        if self.store.backend == StoreBackend::Sheet
            && self.store.sheet_url.as_deref().map_or(true, str::is_empty)
        {
            return Err(Error::Config(
                "store.backend = \"sheet\" requires store.sheet_url".to_string(),
            ));
        }
        if self.reconnect.initial_delay_ms == 0 {
            return Err(Error::Config("reconnect.initial_delay_ms must be > 0".to_string()));
        }
        Ok(())
    }
}

/// Read a numeric variable; `None` when unset or unparseable
fn env_number(key: &str) -> Option<u64> {
    let value = std::env::var(key).ok()?;
    match value.trim().parse() {
        Ok(n) => Some(n),
        Err(_) => {
            warn!("Ignoring invalid {}: {}", key, value);
            None
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "on" | "yes" => Some(true),
        "false" | "0" | "off" | "no" => Some(false),
        _ => None,
    }
}

/// Platform config file location
///
/// Linux checks the user config dir first, then `/etc/jukebox/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    let user = dirs::config_dir().map(|d| d.join("jukebox").join("config.toml"));

    if cfg!(target_os = "linux") {
        let system = PathBuf::from("/etc/jukebox/config.toml");
        match user {
            Some(path) if path.exists() => Some(path),
            _ if system.exists() => Some(system),
            other => other,
        }
    } else {
        user
    }
}

/// OS-dependent data directory for local state
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("jukebox"))
        .unwrap_or_else(|| PathBuf::from("./jukebox_data"))
}
