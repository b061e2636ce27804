//! Exporter configuration

use anyhow::{Context, Result};
use rflink_prom_core::{sweep_period, DEFAULT_TIMEOUT};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default serial device the RFLink bridge is attached to
pub const DEFAULT_PORT: &str = "/dev/ttyUSB0";

/// Default RFLink baud rate
pub const DEFAULT_BAUD: u32 = 57600;

/// Default address of the `/metrics` endpoint
pub const DEFAULT_LISTEN: &str = "0.0.0.0:8080";

/// Invalid configuration values
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("timeout must be at least 1 second")]
    ZeroTimeout,
    #[error("baud rate must be non-zero")]
    ZeroBaud,
    #[error("invalid listen address '{0}'")]
    InvalidListen(String),
}

/// Configuration as stored on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Serial device of the RFLink bridge
    pub port: String,
    pub baud: u32,
    /// Address the Prometheus endpoint listens on
    pub listen: String,
    /// JSON file mapping sensor ids to friendly names
    pub namemap: Option<PathBuf>,
    /// Seconds without a reading before a sensor is considered gone
    pub timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT.to_string(),
            baud: DEFAULT_BAUD,
            listen: DEFAULT_LISTEN.to_string(),
            namemap: None,
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

/// Values given on the command line, overriding the file
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub port: Option<String>,
    pub baud: Option<u32>,
    pub listen: Option<String>,
    pub namemap: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
}

impl AppConfig {
    /// Load configuration from the default location, or defaults if there is no file
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            return Ok(Self::default());
        }

        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific file path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read config file {}", path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("Cannot parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Directory holding `config.json` and the default `mapping.json`
    pub fn config_dir() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("org", "rflink", "rflink-prom")
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        Ok(dirs.config_dir().to_path_buf())
    }

    fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Apply command line overrides
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(port) = overrides.port {
            self.port = port;
        }
        if let Some(baud) = overrides.baud {
            self.baud = baud;
        }
        if let Some(listen) = overrides.listen {
            self.listen = listen;
        }
        if let Some(namemap) = overrides.namemap {
            self.namemap = Some(namemap);
        }
        if let Some(timeout_secs) = overrides.timeout_secs {
            self.timeout_secs = timeout_secs;
        }
        self
    }

    /// Check the values and turn them into runtime settings
    pub fn validate(self) -> Result<Settings, ConfigError> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.baud == 0 {
            return Err(ConfigError::ZeroBaud);
        }
        let listen = self
            .listen
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidListen(self.listen.clone()))?;

        Ok(Settings {
            port: self.port,
            baud: self.baud,
            listen,
            namemap: self.namemap,
            timeout: Duration::from_secs(self.timeout_secs),
        })
    }
}

/// Validated configuration used by the running service
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub port: String,
    pub baud: u32,
    pub listen: SocketAddr,
    pub namemap: Option<PathBuf>,
    /// Idle time before a metric is withdrawn
    pub timeout: Duration,
}

impl Settings {
    /// How often the expiration sweep runs (a quarter of the timeout)
    pub fn sweep_period(&self) -> Duration {
        sweep_period(self.timeout)
    }
}
