//! Mock market price feed
//!
//! A random-walk publisher over a fixed set of instruments, broadcast to
//! WebSocket subscribers on every tick.

pub mod core;
pub mod engine;
pub mod feed;
pub mod gateway;
pub mod infrastructure;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types
pub use infrastructure::config::{Config, ConfigError};

use thiserror::Error;

/// Main error type for the price feed
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, FeedError>;
