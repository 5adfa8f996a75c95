//! Configuration management for the price feed
//!
//! Loads configuration from config.toml at startup.
//! Every section and field is optional; missing values fall back to defaults.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Price feed configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Publisher settings
    #[serde(default)]
    pub feed: FeedConfig,

    /// HTTP / WebSocket server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Publisher configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeedConfig {
    /// Tick cadence in milliseconds
    #[serde(default = "default_update_interval_ms", alias = "updateIntervalMs")]
    pub update_interval_ms: u64,

    /// Lowest price the random walk may reach
    #[serde(default = "default_price_floor")]
    pub price_floor: f64,

    /// Fixed seed for a replayable walk; OS entropy when absent
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Bind address
    #[serde(default = "default_host")]
    pub host: String,

    /// Port for the HTTP API and the `/ws` endpoint
    #[serde(default = "default_port")]
    pub port: u16,

    /// Outbound frames queued per client before new ones are dropped
    #[serde(default = "default_client_buffer")]
    pub client_buffer: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Root directory for rolling log files
    #[serde(default = "default_log_directory")]
    pub directory: PathBuf,

    /// Write rolling files in addition to the console
    #[serde(default = "default_file_logging")]
    pub file_logging: bool,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            update_interval_ms: default_update_interval_ms(),
            price_floor: default_price_floor(),
            seed: None,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            client_buffer: default_client_buffer(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: default_log_directory(),
            file_logging: default_file_logging(),
        }
    }
}

fn default_update_interval_ms() -> u64 {
    2000
}

fn default_price_floor() -> f64 {
    0.01 // one unit of display precision
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3001
}

fn default_client_buffer() -> usize {
    64
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_directory() -> PathBuf {
    PathBuf::from("logs")
}

fn default_file_logging() -> bool {
    true
}

impl Config {
    /// Load configuration from the file named by CONFIG_PATH (default config.toml)
    ///
    /// If the file doesn't exist, returns default configuration.
    /// # Errors
    /// Returns error if file exists but cannot be read, parsed or validated.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());

        match std::fs::read_to_string(&config_path) {
            Ok(contents) => Self::from_toml(&contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // File not found - use defaults
                Ok(Config::default())
            }
            Err(e) => Err(ConfigError::IoError(e)),
        }
    }

    /// Parse and validate a TOML document
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: Config =
            toml::from_str(contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the feed cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.feed.update_interval_ms == 0 {
            return Err(ConfigError::Invalid("feed.update_interval_ms must be > 0".into()));
        }
        if !self.feed.price_floor.is_finite() || self.feed.price_floor <= 0.0 {
            return Err(ConfigError::Invalid("feed.price_floor must be a positive number".into()));
        }
        if self.server.client_buffer == 0 {
            return Err(ConfigError::Invalid("server.client_buffer must be > 0".into()));
        }
        Ok(())
    }

    /// Tick cadence
    #[inline]
    pub fn update_interval(&self) -> Duration {
        Duration::from_millis(self.feed.update_interval_ms)
    }

    /// Socket address the server binds
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server.bind_addr()
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ConfigError::Invalid(format!("server address: {}", e)))
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error reading file
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    /// Parse error (invalid TOML)
    #[error("Failed to parse config: {0}")]
    ParseError(String),
    /// Value out of range
    #[error("Invalid config: {0}")]
    Invalid(String),
}
