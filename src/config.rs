//! Client configuration loading.
//!
//! Configuration is read from `config.json` in the config directory, then
//! environment variables override individual fields. Everything has a
//! default, so a missing file is not an error.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::fs;

use crate::constants;

/// Configuration for a hub client.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct ClientConfig {
    /// Host (and optional port) of the hub server, without scheme.
    pub host: String,
    /// Client protocol version sent on every request.
    pub protocol_version: String,
    /// Connection data, usually a JSON list of hubs. Sent percent-encoded.
    pub connection_data: String,
    /// Path the hub endpoints are mounted under.
    pub root_path: String,
    /// Use `https`/`wss` (true) or `http`/`ws` (false).
    pub secure: bool,
    /// Number of negotiate requests before giving up.
    pub negotiate_attempts: u32,
    /// Seconds to wait between negotiate attempts.
    pub negotiate_retry_delay_secs: u64,
    /// HTTP request timeout in seconds.
    pub http_timeout_secs: u64,
    /// Capacity of the message queue between reader and consumer.
    pub message_queue_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            protocol_version: constants::DEFAULT_PROTOCOL_VERSION.to_string(),
            connection_data: String::new(),
            root_path: constants::DEFAULT_ROOT_PATH.to_string(),
            secure: true,
            negotiate_attempts: constants::NEGOTIATE_MAX_ATTEMPTS,
            negotiate_retry_delay_secs: constants::NEGOTIATE_RETRY_DELAY.as_secs(),
            http_timeout_secs: constants::HTTP_REQUEST_TIMEOUT.as_secs(),
            message_queue_capacity: constants::MESSAGE_QUEUE_CAPACITY,
        }
    }
}

impl ClientConfig {
    /// Configuration for `host` with every other field at its default.
    pub fn new(
        host: impl Into<String>,
        protocol_version: impl Into<String>,
        connection_data: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            protocol_version: protocol_version.into(),
            connection_data: connection_data.into(),
            ..Self::default()
        }
    }

    /// Returns the configuration directory path.
    ///
    /// `SIGNALR_CONFIG_DIR` overrides the platform config directory.
    pub fn config_dir() -> Result<PathBuf> {
        if let Ok(dir) = std::env::var("SIGNALR_CONFIG_DIR") {
            return Ok(PathBuf::from(dir));
        }
        Ok(dirs::config_dir()
            .context("Could not determine config directory")?
            .join("signalr-client"))
    }

    /// Loads configuration from file, with environment variable overrides.
    pub fn load() -> Result<Self> {
        let path = Self::config_dir()?.join("config.json");
        let mut config = if path.exists() {
            Self::load_from_file(&path)?
        } else {
            log::debug!("No config file at {}, using defaults", path.display());
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Reads a configuration file. Missing fields take their defaults.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Persists the configuration as pretty JSON.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)
            .with_context(|| format!("Failed to write config file {}", path.display()))
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from a key lookup. Unparseable numbers are ignored.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(host) = lookup("SIGNALR_HOST") {
            self.host = host;
        }
        if let Some(protocol) = lookup("SIGNALR_PROTOCOL") {
            self.protocol_version = protocol;
        }
        if let Some(data) = lookup("SIGNALR_CONNECTION_DATA") {
            self.connection_data = data;
        }
        if let Some(root) = lookup("SIGNALR_ROOT_PATH") {
            self.root_path = root;
        }
        if let Some(insecure) = lookup("SIGNALR_INSECURE") {
            self.secure = !matches!(insecure.as_str(), "1" | "true" | "yes");
        }
        if let Some(attempts) = lookup("SIGNALR_NEGOTIATE_ATTEMPTS") {
            if let Ok(n) = attempts.parse::<u32>() {
                self.negotiate_attempts = n;
            }
        }
        if let Some(delay) = lookup("SIGNALR_NEGOTIATE_RETRY_DELAY") {
            if let Ok(secs) = delay.parse::<u64>() {
                self.negotiate_retry_delay_secs = secs;
            }
        }
        if let Some(capacity) = lookup("SIGNALR_QUEUE_CAPACITY") {
            if let Ok(n) = capacity.parse::<usize>() {
                self.message_queue_capacity = n;
            }
        }
    }

    /// Wait between negotiate attempts.
    #[must_use]
    pub fn negotiate_retry_delay(&self) -> Duration {
        Duration::from_secs(self.negotiate_retry_delay_secs)
    }

    /// HTTP request timeout.
    #[must_use]
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Queue capacity, never below one.
    #[must_use]
    pub fn queue_capacity(&self) -> usize {
        self.message_queue_capacity.max(1)
    }

    /// Scheme for negotiate and start requests.
    #[must_use]
    pub fn http_scheme(&self) -> &'static str {
        if self.secure {
            "https"
        } else {
            "http"
        }
    }

    /// Scheme for the WebSocket connect URL.
    #[must_use]
    pub fn ws_scheme(&self) -> &'static str {
        if self.secure {
            "wss"
        } else {
            "ws"
        }
    }
}
