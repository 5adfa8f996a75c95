//! Gateway wire protocol
//!
//! Every text frame is a JSON envelope `{"event": <name>, "data": <payload>}`.
//!
//! Client -> server:
//! - `subscribe` with optional `{"symbols": [..]}`
//!
//! Server -> client:
//! - `connected`: `{"message": .., "assets": [InstrumentSnapshot]}` once per subscribe
//! - `price-update`: `[Instrument]` on every tick

use crate::core::{Instrument, InstrumentSnapshot};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

pub const EVENT_SUBSCRIBE: &str = "subscribe";
pub const EVENT_CONNECTED: &str = "connected";
pub const EVENT_PRICE_UPDATE: &str = "price-update";

/// Greeting carried by the `connected` reply
pub const CONNECTED_MESSAGE: &str = "Subscribed to market updates";

/// Serialized text frame, shared across every recipient of a broadcast
pub type Frame = Arc<str>;

/// Subscribe intent
///
/// `symbols` is accepted for compatibility but every subscriber receives
/// the full set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscribeRequest {
    pub symbols: Option<Vec<String>>,
}

/// Parsed client frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    Subscribe(SubscribeRequest),
    /// Well-formed envelope with an event we do not handle
    Unknown(String),
}

#[derive(Debug, Deserialize)]
struct Envelope {
    event: String,
    #[serde(default)]
    data: Value,
}

/// Parse a client text frame
///
/// Parsing is permissive: a frame that is not a JSON envelope at all, or a
/// `subscribe` whose payload is malformed, is a subscribe to everything.
pub fn parse_client_message(text: &str) -> ClientMessage {
    let envelope: Envelope = match serde_json::from_str(text) {
        Ok(envelope) => envelope,
        Err(_) => return ClientMessage::Subscribe(SubscribeRequest::default()),
    };

    if envelope.event != EVENT_SUBSCRIBE {
        return ClientMessage::Unknown(envelope.event);
    }

    ClientMessage::Subscribe(SubscribeRequest {
        symbols: requested_symbols(&envelope.data),
    })
}

fn requested_symbols(data: &Value) -> Option<Vec<String>> {
    let symbols = data.get("symbols")?.as_array()?;
    Some(
        symbols
            .iter()
            .filter_map(|s| s.as_str().map(str::to_string))
            .collect(),
    )
}

#[derive(Debug, Serialize)]
struct OutboundEnvelope<'a, T: Serialize> {
    event: &'a str,
    data: T,
}

#[derive(Debug, Serialize)]
struct ConnectedPayload<'a> {
    message: &'a str,
    assets: &'a [InstrumentSnapshot],
}

/// Encode the one-time `connected` reply
pub fn encode_connected(assets: &[InstrumentSnapshot]) -> serde_json::Result<Frame> {
    encode(
        EVENT_CONNECTED,
        ConnectedPayload {
            message: CONNECTED_MESSAGE,
            assets,
        },
    )
}

/// Encode a `price-update` broadcast
pub fn encode_price_update(instruments: &[Instrument]) -> serde_json::Result<Frame> {
    encode(EVENT_PRICE_UPDATE, instruments)
}

fn encode<T: Serialize>(event: &str, data: T) -> serde_json::Result<Frame> {
    let text = serde_json::to_string(&OutboundEnvelope { event, data })?;
    Ok(Arc::from(text))
}
