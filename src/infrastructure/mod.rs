//! Infrastructure - everything around the feed itself
//!
//! - Configuration management
//! - Logging and metrics
//! - HTTP status API hosting the WebSocket endpoint

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;

pub use api::{router, serve, start_server, AppState};
pub use metrics::{MetricsCollector, MetricsSnapshot};
