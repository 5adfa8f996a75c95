//! Subscription gateway
//!
//! Bridges the publisher's broadcast domain and client connections. Reads
//! instrument state only through [`PriceBook`] snapshots; never writes it.

use crate::core::Instrument;
use crate::feed::PriceBook;
use crate::gateway::protocol::{encode_connected, encode_price_update, Frame, SubscribeRequest};
use crate::gateway::registry::{
    ConnectionId, ConnectionState, Delivery, SubscribeOutcome, SubscriberRegistry,
};
use crate::gateway::GatewayError;
use crate::infrastructure::metrics::MetricsCollector;
use crate::log_gateway;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::Level;

/// Gateway handle, cheap to clone into every session
#[derive(Clone)]
pub struct Gateway {
    registry: Arc<SubscriberRegistry>,
    book: PriceBook,
    metrics: Arc<MetricsCollector>,
}

impl Gateway {
    pub fn new(book: PriceBook, client_buffer: usize, metrics: Arc<MetricsCollector>) -> Self {
        Self {
            registry: Arc::new(SubscriberRegistry::new(client_buffer)),
            book,
            metrics,
        }
    }

    /// Accept a transport connection; nothing is sent until it subscribes
    pub fn on_connect(&self) -> (ConnectionId, mpsc::Receiver<Frame>) {
        let (id, outbox) = self.registry.connect();
        self.metrics.record_connection();
        log_gateway!(Level::INFO, "Client connected: {}", id);
        (id, outbox)
    }

    /// Join the broadcast group and queue the one-time snapshot
    ///
    /// Requested symbols are logged and ignored; every subscriber gets the
    /// full set.
    pub fn on_subscribe(
        &self,
        id: ConnectionId,
        request: &SubscribeRequest,
    ) -> Result<SubscribeOutcome, GatewayError> {
        match &request.symbols {
            Some(symbols) => log_gateway!(Level::INFO, "Client {} subscribing to: {:?}", id, symbols),
            None => log_gateway!(Level::INFO, "Client {} subscribing to: all assets", id),
        }

        let reply = encode_connected(&self.book.connected_snapshot())?;
        let subscription = self
            .registry
            .subscribe(id, reply)
            .ok_or(GatewayError::UnknownConnection(id))?;

        if !subscription.queued {
            log_gateway!(Level::WARN, "Snapshot for {} dropped: queue full", id);
        }
        self.metrics.record_subscribe();

        Ok(subscription.outcome)
    }

    /// Leave the broadcast group for good
    pub fn on_disconnect(&self, id: ConnectionId) {
        if let Some(state) = self.registry.disconnect(id) {
            self.metrics.record_disconnect();
            log_gateway!(Level::INFO, "Client disconnected: {} (was {:?})", id, state);
        }
    }

    /// Push the full instrument set to every subscriber
    pub fn broadcast(&self, instruments: &[Instrument]) -> Result<Delivery, GatewayError> {
        let frame = encode_price_update(instruments)?;
        let delivery = self.registry.broadcast(&frame);

        self.metrics
            .record_broadcast(delivery.delivered, delivery.dropped, delivery.closed);
        if delivery.dropped > 0 {
            log_gateway!(
                Level::DEBUG,
                "price-update dropped for {} slow clients",
                delivery.dropped
            );
        }
        if delivery.closed > 0 {
            log_gateway!(
                Level::DEBUG,
                "price-update skipped for {} closing clients",
                delivery.closed
            );
        }

        Ok(delivery)
    }

    pub fn state(&self, id: ConnectionId) -> ConnectionState {
        self.registry.state(id)
    }

    pub fn connection_count(&self) -> usize {
        self.registry.connection_count()
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry.subscriber_count()
    }

    pub fn book(&self) -> &PriceBook {
        &self.book
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{frame_json, still_feed};

    fn gateway() -> (crate::feed::PriceFeed<crate::feed::ScriptedSource>, Gateway) {
        let feed = still_feed();
        let gateway = Gateway::new(feed.book(), 8, Arc::new(MetricsCollector::new()));
        (feed, gateway)
    }

    #[test]
    fn test_subscribe_sends_connected_snapshot() {
        let (_feed, gateway) = gateway();
        let (id, mut outbox) = gateway.on_connect();

        let outcome = gateway.on_subscribe(id, &SubscribeRequest::default()).unwrap();
        assert_eq!(outcome, SubscribeOutcome::Joined);

        let json = frame_json(&outbox.try_recv().unwrap());
        assert_eq!(json["event"], "connected");
        assert_eq!(json["data"]["assets"].as_array().unwrap().len(), 8);
    }

    #[test]
    fn test_symbol_filter_is_ignored() {
        let (_feed, gateway) = gateway();
        let (id, mut outbox) = gateway.on_connect();

        let request = SubscribeRequest {
            symbols: Some(vec!["BTC".to_string()]),
        };
        gateway.on_subscribe(id, &request).unwrap();
        let snapshot = frame_json(&outbox.try_recv().unwrap());
        assert_eq!(snapshot["data"]["assets"].as_array().unwrap().len(), 8);
    }

    #[test]
    fn test_broadcast_after_tick() {
        let (mut feed, gateway) = gateway();
        let (id, mut outbox) = gateway.on_connect();
        gateway.on_subscribe(id, &SubscribeRequest::default()).unwrap();

        let report = feed.tick_at(10);
        let delivery = gateway.broadcast(&report.instruments).unwrap();
        assert_eq!(delivery.delivered, 1);

        let first = frame_json(&outbox.try_recv().unwrap());
        let second = frame_json(&outbox.try_recv().unwrap());
        assert_eq!(first["event"], "connected");
        assert_eq!(second["event"], "price-update");
        assert_eq!(second["data"][0]["timestamp"], 10);
    }

    #[test]
    fn test_subscribe_unknown_connection() {
        let (_feed, gateway) = gateway();
        let (id, _outbox) = gateway.on_connect();
        gateway.on_disconnect(id);

        let err = gateway.on_subscribe(id, &SubscribeRequest::default()).unwrap_err();
        assert!(matches!(err, GatewayError::UnknownConnection(gone) if gone == id));
    }

    #[test]
    fn test_closed_client_counted_in_metrics() {
        let (mut feed, gateway) = gateway();
        let metrics = gateway.metrics.clone();
        let (gone, outbox) = gateway.on_connect();
        gateway.on_subscribe(gone, &SubscribeRequest::default()).unwrap();
        let (live, _live_outbox) = gateway.on_connect();
        gateway.on_subscribe(live, &SubscribeRequest::default()).unwrap();
        drop(outbox);

        let report = feed.tick_at(10);
        let delivery = gateway.broadcast(&report.instruments).unwrap();

        assert_eq!(delivery.closed, 1);
        assert_eq!(delivery.delivered, 1);
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.frames_closed, 1);
        assert_eq!(snapshot.frames_delivered, 1);
    }

    #[test]
    fn test_broadcast_with_no_subscribers() {
        let (mut feed, gateway) = gateway();
        for t in 1..=2 {
            let report = feed.tick_at(t);
            let delivery = gateway.broadcast(&report.instruments).unwrap();
            assert_eq!(delivery, Delivery::default());
        }
        assert_eq!(gateway.subscriber_count(), 0);
    }
}
