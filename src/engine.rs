//! Feed Engine
//!
//! Drives the publisher on a fixed cadence and hands every committed set to
//! the gateway for broadcast. The publisher's write always finishes before
//! the broadcast starts, so the two never hold each other's locks.

use crate::feed::{PriceFeed, RandomSource, TickReport};
use crate::gateway::Gateway;
use crate::infrastructure::metrics::MetricsCollector;
use crate::log_feed;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::Level;

/// Owns the tick loop
pub struct FeedEngine<R> {
    feed: PriceFeed<R>,
    gateway: Gateway,
    metrics: Arc<MetricsCollector>,
    interval: Duration,
}

impl<R: RandomSource> FeedEngine<R> {
    pub fn new(
        feed: PriceFeed<R>,
        gateway: Gateway,
        metrics: Arc<MetricsCollector>,
        interval: Duration,
    ) -> Self {
        Self {
            feed,
            gateway,
            metrics,
            interval,
        }
    }

    /// Get metrics collector reference
    pub fn metrics(&self) -> &Arc<MetricsCollector> {
        &self.metrics
    }

    /// One tick: advance prices, then broadcast the new set
    pub fn tick_once(&mut self) -> TickReport {
        let report = self.feed.tick();

        // A failed broadcast loses this update only; the next tick carries full state
        if let Err(e) = self.gateway.broadcast(&report.instruments) {
            log_feed!(Level::ERROR, "Broadcast failed: {}", e);
        }
        self.metrics.record_tick(report.skipped);

        report
    }

    /// Tick until `shutdown` resolves
    ///
    /// The first tick fires one interval after start. A tick that overruns
    /// delays the schedule rather than bursting to catch up.
    pub async fn run<F>(mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval_at(
            tokio::time::Instant::now() + self.interval,
            self.interval,
        );
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        log_feed!(
            Level::INFO,
            "Feed engine running: {} instruments every {:?}",
            self.gateway.book().len(),
            self.interval
        );

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => {
                    let report = self.tick_once();
                    log_feed!(
                        Level::DEBUG,
                        "Tick: {} updated, {} skipped, {} subscribers",
                        report.updated,
                        report.skipped,
                        self.gateway.subscriber_count()
                    );
                }
            }
        }

        log_feed!(Level::INFO, "Feed engine stopped");
    }
}
