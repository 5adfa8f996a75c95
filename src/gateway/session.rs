//! WebSocket session (one per client connection)
//!
//! Splits the socket into a writer draining the connection's outbound
//! queue and a reader handling `subscribe` frames. Whichever side finishes
//! first ends the session, and the connection is removed from the group.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, State};
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use tracing::Level;

use crate::gateway::hub::Gateway;
use crate::gateway::protocol::{parse_client_message, ClientMessage};
use crate::infrastructure::api::AppState;
use crate::log_gateway;

/// Handler for `GET /ws`
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    State(state): State<AppState>,
) -> Response {
    let gateway = state.gateway.clone();
    ws.on_upgrade(move |socket| run_session(socket, peer, gateway))
}

/// Drive one client connection until either side closes
pub async fn run_session(socket: WebSocket, peer: SocketAddr, gateway: Gateway) {
    let (id, mut outbox) = gateway.on_connect();
    log_gateway!(Level::DEBUG, "Session {} opened from {}", id, peer);

    let (mut sink, mut stream) = socket.split();

    let mut send_task = tokio::spawn(async move {
        while let Some(frame) = outbox.recv().await {
            if sink.send(Message::Text(frame.to_string())).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    let reader = gateway.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = stream.next().await {
            match msg {
                Ok(Message::Text(text)) => match parse_client_message(&text) {
                    ClientMessage::Subscribe(request) => {
                        if let Err(e) = reader.on_subscribe(id, &request) {
                            log_gateway!(Level::WARN, "Subscribe failed for {}: {}", id, e);
                        }
                    }
                    ClientMessage::Unknown(event) => {
                        log_gateway!(Level::DEBUG, "Ignoring '{}' from {}", event, id);
                    }
                },
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    log_gateway!(Level::DEBUG, "Socket error for {}: {}", id, e);
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    gateway.on_disconnect(id);
}
