//! Subscription gateway - client connections and broadcast fan-out

pub mod hub;
pub mod protocol;
pub mod registry;
pub mod session;

pub use hub::Gateway;
pub use protocol::{ClientMessage, Frame, SubscribeRequest};
pub use registry::{ConnectionId, ConnectionState, Delivery, SubscribeOutcome, SubscriberRegistry};

use thiserror::Error;

/// Gateway errors
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Unknown connection: {0}")]
    UnknownConnection(ConnectionId),

    #[error("Frame encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}
