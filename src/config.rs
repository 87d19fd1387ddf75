//! Node configuration.
//!
//! Loaded once at startup from JSON or TOML and never reloaded. The JSON
//! layout accepts the historical `servers` / `port` keys:
//!
//! ```json
//! { "servers": ["http://10.0.0.2:8080"], "port": ":8080" }
//! ```

use crate::error::{Result, SyncError};
use crate::store::StoreKind;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Default sync interval in seconds
pub const DEFAULT_INTERVAL_SECS: u64 = 5;

/// Default per-request timeout for peer calls in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Default listen address (all interfaces)
pub const DEFAULT_LISTEN: &str = ":8080";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Peer base URLs, in file order. Duplicates are kept.
    pub peers: Vec<String>,
    /// Listen address, `host:port` or `:port`
    pub listen: String,
    /// Pause between sync iterations
    pub interval: Duration,
    /// Timeout applied to every outbound peer request
    pub request_timeout: Duration,
    /// Which clipboard backend to mirror into
    pub store: StoreKind,
}

/// On-disk representation, before validation.
#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default, alias = "servers")]
    peers: Vec<String>,

    #[serde(default = "default_listen", alias = "port")]
    listen: String,

    #[serde(default = "default_interval")]
    interval_secs: u64,

    #[serde(default = "default_request_timeout")]
    request_timeout_secs: u64,

    #[serde(default)]
    store: StoreKind,
}

fn default_listen() -> String {
    DEFAULT_LISTEN.to_string()
}

fn default_interval() -> u64 {
    DEFAULT_INTERVAL_SECS
}

fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

impl From<RawConfig> for Config {
    fn from(raw: RawConfig) -> Self {
        Self {
            peers: raw.peers,
            listen: raw.listen,
            interval: Duration::from_secs(raw.interval_secs),
            request_timeout: Duration::from_secs(raw.request_timeout_secs),
            store: raw.store,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            peers: Vec::new(),
            listen: default_listen(),
            interval: Duration::from_secs(DEFAULT_INTERVAL_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            store: StoreKind::default(),
        }
    }
}

impl Config {
    /// Load and validate a config file. `.toml` files are parsed as TOML,
    /// everything else as JSON.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SyncError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let is_toml = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("toml"))
            .unwrap_or(false);

        if is_toml {
            Self::from_toml_str(&content)
        } else {
            Self::from_json_str(&content)
        }
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let raw: RawConfig = serde_json::from_str(content)
            .map_err(|e| SyncError::Config(format!("Invalid JSON config: {}", e)))?;
        let config = Config::from(raw);
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let raw: RawConfig = toml::from_str(content)
            .map_err(|e| SyncError::Config(format!("Invalid TOML config: {}", e)))?;
        let config = Config::from(raw);
        config.validate()?;
        Ok(config)
    }

    /// Check every field. Called after loading and again after CLI overrides.
    pub fn validate(&self) -> Result<()> {
        validate_listen(&self.listen)?;

        for peer in &self.peers {
            validate_peer(peer)?;
        }

        if self.interval.is_zero() {
            return Err(SyncError::Config(
                "interval_secs must be greater than zero".to_string(),
            ));
        }

        if self.request_timeout.is_zero() {
            return Err(SyncError::Config(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Listen address in a form `TcpListener::bind` accepts.
    ///
    /// `":8080"` binds all interfaces.
    pub fn listen_addr(&self) -> String {
        normalize_listen(&self.listen)
    }
}

fn normalize_listen(listen: &str) -> String {
    let listen = listen.trim();
    if listen.starts_with(':') {
        format!("0.0.0.0{}", listen)
    } else {
        listen.to_string()
    }
}

fn validate_listen(listen: &str) -> Result<()> {
    let normalized = normalize_listen(listen);

    let (host, port) = normalized.rsplit_once(':').ok_or_else(|| {
        SyncError::Config(format!(
            "Listen address '{}' must be host:port or :port",
            listen
        ))
    })?;

    if host.is_empty() {
        return Err(SyncError::Config(format!(
            "Listen address '{}' has no host",
            listen
        )));
    }

    port.parse::<u16>().map_err(|_| {
        SyncError::Config(format!(
            "Listen address '{}' has invalid port '{}'",
            listen, port
        ))
    })?;

    Ok(())
}

fn validate_peer(peer: &str) -> Result<()> {
    let url = reqwest::Url::parse(peer)
        .map_err(|e| SyncError::Config(format!("Invalid peer URL '{}': {}", peer, e)))?;

    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(SyncError::Config(format!(
                "Peer URL '{}' has unsupported scheme '{}'",
                peer, other
            )))
        }
    }

    if url.host_str().is_none() {
        return Err(SyncError::Config(format!("Peer URL '{}' has no host", peer)));
    }

    Ok(())
}
