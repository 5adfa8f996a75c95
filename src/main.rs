//! Mock market price feed server
//!
//! # Architecture
//! - **core**: Instrument records and the baseline catalog
//! - **feed**: Random-walk publisher (single writer of prices)
//! - **gateway**: WebSocket subscription group and broadcast fan-out
//! - **engine**: Tick loop driving feed -> gateway
//! - **infrastructure**: Config, logging, metrics, HTTP status API

use anyhow::Context;
use price_feed::core::{baseline_instruments, now_millis};
use price_feed::engine::FeedEngine;
use price_feed::feed::{PriceFeed, RandomSource, RngSource};
use price_feed::gateway::Gateway;
use price_feed::infrastructure::{metrics::MetricsCollector, start_server, AppState};
use price_feed::{log_main, Config};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::Level;

/// Main application state
pub struct FeedApp {
    config: Config,
}

impl FeedApp {
    /// Create new application instance
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run until Ctrl-C / SIGTERM
    pub async fn run(self) -> anyhow::Result<()> {
        match self.config.feed.seed {
            Some(seed) => {
                log_main!(Level::INFO, "Random walk seeded with {}", seed);
                self.run_with(RngSource::seeded(seed)).await
            }
            None => self.run_with(RngSource::from_entropy()).await,
        }
    }

    async fn run_with<R>(self, source: R) -> anyhow::Result<()>
    where
        R: RandomSource + Send + 'static,
    {
        log_main!(Level::INFO, "Starting price feed...");

        // 1. Core components
        let metrics = Arc::new(MetricsCollector::new());
        let feed = PriceFeed::new(
            baseline_instruments(now_millis()),
            source,
            self.config.feed.price_floor,
        );
        let gateway = Gateway::new(feed.book(), self.config.server.client_buffer, metrics.clone());

        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        // 2. API server with the /ws endpoint
        let state = AppState::new(
            gateway.clone(),
            metrics.clone(),
            self.config.feed.update_interval_ms,
        );
        let server_config = self.config.server.clone();
        let server_stop = wait_for(shutdown_rx.clone());
        let mut server = tokio::spawn(async move {
            start_server(state, &server_config, server_stop).await
        });

        // 3. Tick loop
        let engine = FeedEngine::new(feed, gateway, metrics, self.config.update_interval());
        let ticker = tokio::spawn(engine.run(wait_for(shutdown_rx)));

        // A server that fails to start ends the process instead of waiting for a signal
        let early_exit = tokio::select! {
            _ = shutdown_signal() => {
                log_main!(Level::INFO, "Shutdown signal received, stopping...");
                None
            }
            joined = &mut server => Some(joined),
        };
        let _ = shutdown_tx.send(true);

        ticker.await.context("feed engine task panicked")?;
        let joined = match early_exit {
            Some(joined) => joined,
            None => server.await,
        };
        joined
            .context("API server task panicked")?
            .context("API server failed")?;

        log_main!(Level::INFO, "Price feed stopped");
        Ok(())
    }
}

/// Resolve once the shutdown flag flips (or its sender is gone)
async fn wait_for(mut rx: watch::Receiver<bool>) {
    let _ = rx.wait_for(|stop| *stop).await;
}

/// Ctrl-C everywhere, SIGTERM on unix
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log_main!(Level::ERROR, "Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                log_main!(Level::ERROR, "Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;

    // Guards flush file appenders on drop
    let _guards = price_feed::infrastructure::logging::init_logging(&config.logging)
        .context("failed to initialize logging")?;

    FeedApp::new(config).run().await
}
