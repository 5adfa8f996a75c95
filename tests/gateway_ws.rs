//! End-to-end gateway tests against a real listener

use futures_util::{SinkExt, StreamExt};
use price_feed::core::baseline_instruments;
use price_feed::engine::FeedEngine;
use price_feed::feed::{PriceFeed, RngSource};
use price_feed::gateway::Gateway;
use price_feed::infrastructure::{serve, AppState, MetricsCollector};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const TICK: Duration = Duration::from_millis(40);

/// Start server and tick loop on an ephemeral port
async fn start_feed() -> (SocketAddr, Gateway) {
    let metrics = Arc::new(MetricsCollector::new());
    let feed = PriceFeed::new(baseline_instruments(0), RngSource::seeded(11), 0.01);
    let gateway = Gateway::new(feed.book(), 64, metrics.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let state = AppState::new(gateway.clone(), metrics.clone(), TICK.as_millis() as u64);
    tokio::spawn(serve(listener, state, std::future::pending::<()>()));

    let engine = FeedEngine::new(feed, gateway.clone(), metrics, TICK);
    tokio::spawn(engine.run(std::future::pending::<()>()));

    (addr, gateway)
}

async fn connect(addr: SocketAddr) -> Client {
    let (ws, _) = connect_async(format!("ws://{}/ws", addr)).await.unwrap();
    ws
}

async fn next_json(ws: &mut Client) -> Value {
    loop {
        let msg = timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("frame within timeout")
            .expect("stream open")
            .expect("valid frame");
        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

async fn send_text(ws: &mut Client, text: &str) {
    ws.send(Message::Text(text.to_string().into())).await.unwrap();
}

async fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}

#[tokio::test]
async fn test_snapshot_then_updates() {
    let (addr, _gateway) = start_feed().await;
    let mut ws = connect(addr).await;

    send_text(&mut ws, r#"{"event":"subscribe","data":{"symbols":["BTC"]}}"#).await;

    let connected = next_json(&mut ws).await;
    assert_eq!(connected["event"], "connected");
    assert_eq!(connected["data"]["message"], "Subscribed to market updates");
    let assets = connected["data"]["assets"].as_array().unwrap();
    assert_eq!(assets.len(), 8);
    assert!(assets[0].get("volume").is_none());
    assert!(assets[0].get("timestamp").is_none());
    assert!(assets[0].get("changePercent").is_some());

    let update = next_json(&mut ws).await;
    assert_eq!(update["event"], "price-update");
    let instruments = update["data"].as_array().unwrap();
    assert_eq!(instruments.len(), 8);
    for instrument in instruments {
        assert!(instrument["price"].as_f64().unwrap() > 0.0);
        assert!(instrument["volume"].as_f64().is_some());
        assert!(instrument["timestamp"].as_u64().unwrap() > 0);
    }
}

#[tokio::test]
async fn test_nothing_sent_before_subscribe() {
    let (addr, gateway) = start_feed().await;
    let mut ws = connect(addr).await;

    assert!(wait_until(|| gateway.connection_count() == 1).await);
    assert!(timeout(TICK * 4, ws.next()).await.is_err());
    assert_eq!(gateway.subscriber_count(), 0);
}

#[tokio::test]
async fn test_malformed_subscribe_still_gets_snapshot() {
    let (addr, _gateway) = start_feed().await;
    let mut ws = connect(addr).await;

    send_text(&mut ws, "subscribe please").await;

    let connected = next_json(&mut ws).await;
    assert_eq!(connected["event"], "connected");
    assert_eq!(connected["data"]["assets"].as_array().unwrap().len(), 8);
}

#[tokio::test]
async fn test_unknown_event_ignored() {
    let (addr, gateway) = start_feed().await;
    let mut ws = connect(addr).await;

    send_text(&mut ws, r#"{"event":"ping","data":{}}"#).await;
    assert!(timeout(TICK * 4, ws.next()).await.is_err());
    assert_eq!(gateway.subscriber_count(), 0);

    send_text(&mut ws, r#"{"event":"subscribe"}"#).await;
    assert_eq!(next_json(&mut ws).await["event"], "connected");
}

#[tokio::test]
async fn test_disconnect_leaves_group() {
    let (addr, gateway) = start_feed().await;
    let mut ws = connect(addr).await;

    send_text(&mut ws, r#"{"event":"subscribe"}"#).await;
    next_json(&mut ws).await;
    assert!(wait_until(|| gateway.subscriber_count() == 1).await);

    ws.close(None).await.unwrap();
    drop(ws);

    assert!(wait_until(|| gateway.connection_count() == 0).await);
    assert_eq!(gateway.subscriber_count(), 0);
}

#[tokio::test]
async fn test_every_subscriber_sees_same_update() {
    let (addr, _gateway) = start_feed().await;
    let mut a = connect(addr).await;
    let mut b = connect(addr).await;

    send_text(&mut a, r#"{"event":"subscribe"}"#).await;
    send_text(&mut b, r#"{"event":"subscribe"}"#).await;
    next_json(&mut a).await;
    next_json(&mut b).await;

    // Align both on the same tick by timestamp
    let mut ua = next_json(&mut a).await;
    let mut ub = next_json(&mut b).await;
    while ua["data"][0]["timestamp"] != ub["data"][0]["timestamp"] {
        if ua["data"][0]["timestamp"].as_u64() < ub["data"][0]["timestamp"].as_u64() {
            ua = next_json(&mut a).await;
        } else {
            ub = next_json(&mut b).await;
        }
    }
    assert_eq!(ua, ub);
}
