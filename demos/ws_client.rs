//! Minimal subscriber: prints the snapshot, then one line per price update
//!
//! Usage: cargo run --example ws_client [ws://127.0.0.1:3001/ws]

use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};

#[tokio::main]
async fn main() {
    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "ws://127.0.0.1:3001/ws".to_string());
    println!("Connecting to {}...", url);

    let (mut ws_stream, _) = connect_async(url.as_str()).await.expect("Failed to connect");
    println!("Connected!");

    let subscribe = serde_json::json!({
        "event": "subscribe",
        "data": { "symbols": ["BTC", "ETH"] }
    });

    ws_stream.send(Message::Text(subscribe.to_string().into())).await.expect("Failed to send");
    println!("Subscribed!");

    while let Some(msg) = ws_stream.next().await {
        let text = match msg {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                println!("Error: {}", e);
                break;
            }
        };

        let value: serde_json::Value = match serde_json::from_str(&text) {
            Ok(v) => v,
            Err(e) => {
                println!("Unparseable frame: {}", e);
                continue;
            }
        };

        match value["event"].as_str() {
            Some("connected") => {
                println!("{}", value["data"]["message"]);
                for asset in value["data"]["assets"].as_array().into_iter().flatten() {
                    println!("  {:<8} {:>12}", asset["symbol"].as_str().unwrap_or("?"), asset["price"]);
                }
            }
            Some("price-update") => {
                let line: Vec<String> = value["data"]
                    .as_array()
                    .into_iter()
                    .flatten()
                    .map(|a| format!("{}={} ({}%)", a["symbol"].as_str().unwrap_or("?"), a["price"], a["changePercent"]))
                    .collect();
                println!("{}", line.join("  "));
            }
            other => println!("Received: {:?}", other),
        }
    }

    println!("Connection closed");
}
