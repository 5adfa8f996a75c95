//! API Server
//!
//! Hosts the `/ws` gateway endpoint and the status API on one listener:
//! - GET /api/health
//! - GET /api/feed/stats

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tower_http::cors::CorsLayer;
use tracing::Level;

use crate::gateway::session::ws_handler;
use crate::gateway::Gateway;
use crate::infrastructure::config::ServerConfig;
use crate::infrastructure::metrics::MetricsCollector;
use crate::{log_api, FeedError};

/// Health response DTO
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthDto {
    pub status: &'static str,
    pub started_at: String,
    pub uptime_seconds: u64,
}

/// Feed statistics DTO
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedStatsDto {
    pub instruments: usize,
    pub update_interval_ms: u64,
    pub connections: usize,
    pub subscribers: usize,
    pub ticks: u64,
    pub skipped_instruments: u64,
    pub frames_delivered: u64,
    pub frames_dropped: u64,
    pub frames_closed: u64,
    pub connections_total: u64,
    pub subscribes_total: u64,
    pub disconnects_total: u64,
    pub last_tick_time: u64,
    pub tick_rate: f64,
    pub uptime_seconds: u64,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub gateway: Gateway,
    pub metrics: Arc<MetricsCollector>,
    pub update_interval_ms: u64,
    pub started_at: OffsetDateTime,
}

impl AppState {
    pub fn new(gateway: Gateway, metrics: Arc<MetricsCollector>, update_interval_ms: u64) -> Self {
        Self {
            gateway,
            metrics,
            update_interval_ms,
            started_at: OffsetDateTime::now_utc(),
        }
    }
}

/// Build the router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/api/health", get(get_health))
        .route("/api/feed/stats", get(get_feed_stats))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind the configured address and serve until `shutdown` resolves
pub async fn start_server<F>(
    state: AppState,
    config: &ServerConfig,
    shutdown: F,
) -> Result<(), FeedError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = config.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log_api!(Level::INFO, "API Server listening on {}", listener.local_addr()?);

    serve(listener, state, shutdown).await
}

/// Serve on an already bound listener
pub async fn serve<F>(
    listener: tokio::net::TcpListener,
    state: AppState,
    shutdown: F,
) -> Result<(), FeedError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = router(state).into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    log_api!(Level::INFO, "API Server stopped");
    Ok(())
}

/// Handler for /api/health
async fn get_health(State(state): State<AppState>) -> Json<HealthDto> {
    Json(HealthDto {
        status: "ok",
        started_at: state.started_at.format(&Rfc3339).unwrap_or_default(),
        uptime_seconds: state.metrics.uptime_seconds(),
    })
}

/// Handler for /api/feed/stats
async fn get_feed_stats(State(state): State<AppState>) -> Json<FeedStatsDto> {
    let metrics = state.metrics.snapshot();

    Json(FeedStatsDto {
        instruments: state.gateway.book().len(),
        update_interval_ms: state.update_interval_ms,
        connections: state.gateway.connection_count(),
        subscribers: state.gateway.subscriber_count(),
        ticks: metrics.ticks,
        skipped_instruments: metrics.skipped_instruments,
        frames_delivered: metrics.frames_delivered,
        frames_dropped: metrics.frames_dropped,
        frames_closed: metrics.frames_closed,
        connections_total: metrics.connections,
        subscribes_total: metrics.subscribes,
        disconnects_total: metrics.disconnects,
        last_tick_time: metrics.last_tick_time,
        tick_rate: metrics.tick_rate,
        uptime_seconds: metrics.uptime_seconds,
    })
}
