//! Metrics collection for feed monitoring
//!
//! Lock-free counters using atomic operations.
//! Updated from the tick loop and gateway sessions, exported via the API.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crate::core::now_millis;

/// Feed metrics collector
///
/// Thread-safe counters updated from the engine and the gateway.
/// Snapshots taken for API export.
pub struct MetricsCollector {
    /// Ticks applied
    ticks: AtomicU64,
    /// Instruments left unchanged because their step failed
    skipped_instruments: AtomicU64,
    /// Broadcast frames queued to subscribers
    frames_delivered: AtomicU64,
    /// Broadcast frames dropped on full client queues
    frames_dropped: AtomicU64,
    /// Broadcast frames skipped for clients already gone
    frames_closed: AtomicU64,
    /// WebSocket connections accepted
    connections: AtomicU64,
    /// Subscribe requests handled
    subscribes: AtomicU64,
    /// Connections terminated
    disconnects: AtomicU64,
    /// Last tick timestamp (Unix millis)
    last_tick_time: AtomicU64,
    /// Start time for uptime calculation
    start_time: Instant,
}

/// Metrics snapshot for API export
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricsSnapshot {
    pub ticks: u64,
    pub skipped_instruments: u64,
    pub frames_delivered: u64,
    pub frames_dropped: u64,
    pub frames_closed: u64,
    pub connections: u64,
    pub subscribes: u64,
    pub disconnects: u64,
    pub last_tick_time: u64,
    pub tick_rate: f64, // ticks per second
    pub uptime_seconds: u64,
}

impl MetricsCollector {
    /// Create new metrics collector
    pub fn new() -> Self {
        Self {
            ticks: AtomicU64::new(0),
            skipped_instruments: AtomicU64::new(0),
            frames_delivered: AtomicU64::new(0),
            frames_dropped: AtomicU64::new(0),
            frames_closed: AtomicU64::new(0),
            connections: AtomicU64::new(0),
            subscribes: AtomicU64::new(0),
            disconnects: AtomicU64::new(0),
            last_tick_time: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record an applied tick
    #[inline]
    pub fn record_tick(&self, skipped: usize) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
        self.skipped_instruments
            .fetch_add(skipped as u64, Ordering::Relaxed);
        self.last_tick_time.store(now_millis(), Ordering::Relaxed);
    }

    /// Record one broadcast fan-out
    #[inline]
    pub fn record_broadcast(&self, delivered: usize, dropped: usize, closed: usize) {
        self.frames_delivered
            .fetch_add(delivered as u64, Ordering::Relaxed);
        self.frames_dropped.fetch_add(dropped as u64, Ordering::Relaxed);
        self.frames_closed.fetch_add(closed as u64, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_connection(&self) {
        self.connections.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_subscribe(&self) {
        self.subscribes.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_disconnect(&self) {
        self.disconnects.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current snapshot of metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        let ticks = self.ticks.load(Ordering::Relaxed);
        let uptime = self.uptime_seconds();
        let rate = if uptime > 0 {
            ticks as f64 / uptime as f64
        } else {
            0.0
        };

        MetricsSnapshot {
            ticks,
            skipped_instruments: self.skipped_instruments.load(Ordering::Relaxed),
            frames_delivered: self.frames_delivered.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
            frames_closed: self.frames_closed.load(Ordering::Relaxed),
            connections: self.connections.load(Ordering::Relaxed),
            subscribes: self.subscribes.load(Ordering::Relaxed),
            disconnects: self.disconnects.load(Ordering::Relaxed),
            last_tick_time: self.last_tick_time.load(Ordering::Relaxed),
            tick_rate: rate,
            uptime_seconds: uptime,
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}
