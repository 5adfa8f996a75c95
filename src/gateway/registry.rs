//! Subscriber registry
//!
//! Explicit broadcast-group membership: one entry per live connection,
//! holding its lifecycle state and its bounded outbound queue.
//!
//! Lifecycle: `Connected -> Subscribed -> Terminated`, or straight from
//! `Connected` to `Terminated`. There is no unsubscribe; a terminated
//! connection is removed and never comes back.

use crate::gateway::protocol::Frame;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Connection identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Connection lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Transport accepted, no subscribe yet
    Connected,
    /// Member of the broadcast group
    Subscribed,
    /// Closed, absorbing
    Terminated,
}

/// Result of a subscribe call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscribeOutcome {
    /// Joined the group
    Joined,
    /// Already a member; snapshot sent again
    AlreadySubscribed,
}

/// Subscribe result for one connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription {
    pub outcome: SubscribeOutcome,
    /// Whether the snapshot made it into the queue
    pub queued: bool,
}

/// Fan-out result for one broadcast
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Delivery {
    /// Frames queued
    pub delivered: usize,
    /// Frames dropped because the client's queue was full
    pub dropped: usize,
    /// Members whose session already went away
    pub closed: usize,
}

struct Member {
    state: ConnectionState,
    outbox: mpsc::Sender<Frame>,
}

/// Broadcast-group registry
pub struct SubscriberRegistry {
    members: Mutex<HashMap<ConnectionId, Member>>,
    /// Per-connection outbound queue capacity
    buffer: usize,
}

impl SubscriberRegistry {
    /// Create a registry whose connections queue at most `buffer` frames
    pub fn new(buffer: usize) -> Self {
        Self {
            members: Mutex::new(HashMap::new()),
            buffer: buffer.max(1),
        }
    }

    /// Register a new connection in the `Connected` state
    ///
    /// Returns the connection's id and the receiving end of its queue.
    pub fn connect(&self) -> (ConnectionId, mpsc::Receiver<Frame>) {
        let (outbox, inbox) = mpsc::channel(self.buffer);
        let id = ConnectionId::new();

        self.members.lock().insert(
            id,
            Member {
                state: ConnectionState::Connected,
                outbox,
            },
        );

        (id, inbox)
    }

    /// Add a connection to the broadcast group and queue its snapshot
    ///
    /// `reply` is queued while the registry is locked, so it always lands
    /// ahead of any broadcast the connection sees. Returns `None` when the
    /// connection is not registered.
    pub fn subscribe(&self, id: ConnectionId, reply: Frame) -> Option<Subscription> {
        let mut members = self.members.lock();
        let member = members.get_mut(&id)?;

        let outcome = match member.state {
            ConnectionState::Subscribed => SubscribeOutcome::AlreadySubscribed,
            _ => SubscribeOutcome::Joined,
        };
        member.state = ConnectionState::Subscribed;
        let queued = member.outbox.try_send(reply).is_ok();

        Some(Subscription { outcome, queued })
    }

    /// Remove a connection; it is `Terminated` from here on
    ///
    /// Returns the state it was in, or `None` if it was already gone.
    pub fn disconnect(&self, id: ConnectionId) -> Option<ConnectionState> {
        self.members.lock().remove(&id).map(|member| member.state)
    }

    /// Queue `frame` for every subscribed connection
    ///
    /// Never blocks: a full queue drops the frame for that client only.
    pub fn broadcast(&self, frame: &Frame) -> Delivery {
        let members = self.members.lock();
        let mut delivery = Delivery::default();

        for member in members.values() {
            if member.state != ConnectionState::Subscribed {
                continue;
            }
            match member.outbox.try_send(frame.clone()) {
                Ok(()) => delivery.delivered += 1,
                Err(mpsc::error::TrySendError::Full(_)) => delivery.dropped += 1,
                Err(mpsc::error::TrySendError::Closed(_)) => delivery.closed += 1,
            }
        }

        delivery
    }

    /// Current state of a connection
    ///
    /// Ids are only minted by [`connect`](Self::connect), so an id that is no
    /// longer registered has terminated.
    pub fn state(&self, id: ConnectionId) -> ConnectionState {
        self.members
            .lock()
            .get(&id)
            .map(|member| member.state)
            .unwrap_or(ConnectionState::Terminated)
    }

    /// Live connections, subscribed or not
    pub fn connection_count(&self) -> usize {
        self.members.lock().len()
    }

    /// Members of the broadcast group
    pub fn subscriber_count(&self) -> usize {
        self.members
            .lock()
            .values()
            .filter(|member| member.state == ConnectionState::Subscribed)
            .count()
    }
}

impl Default for SubscriberRegistry {
    fn default() -> Self {
        Self::new(64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn frame(text: &str) -> Frame {
        Arc::from(text)
    }

    #[test]
    fn test_connect_starts_connected() {
        let registry = SubscriberRegistry::new(4);
        let (id, _rx) = registry.connect();

        assert_eq!(registry.state(id), ConnectionState::Connected);
        assert_eq!(registry.connection_count(), 1);
        assert_eq!(registry.subscriber_count(), 0);
    }

    #[test]
    fn test_connected_members_get_no_broadcast() {
        let registry = SubscriberRegistry::new(4);
        let (_id, mut rx) = registry.connect();

        let delivery = registry.broadcast(&frame("tick"));
        assert_eq!(delivery, Delivery::default());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_snapshot_precedes_broadcast() {
        let registry = SubscriberRegistry::new(4);
        let (id, mut rx) = registry.connect();

        let result = registry.subscribe(id, frame("snapshot"));
        assert_eq!(
            result,
            Some(Subscription {
                outcome: SubscribeOutcome::Joined,
                queued: true
            })
        );
        registry.broadcast(&frame("tick"));

        assert_eq!(&*rx.try_recv().unwrap(), "snapshot");
        assert_eq!(&*rx.try_recv().unwrap(), "tick");
    }

    #[test]
    fn test_resubscribe_is_idempotent() {
        let registry = SubscriberRegistry::new(4);
        let (id, _rx) = registry.connect();

        registry.subscribe(id, frame("a"));
        let again = registry.subscribe(id, frame("b"));

        assert_eq!(again.map(|s| s.outcome), Some(SubscribeOutcome::AlreadySubscribed));
        assert_eq!(registry.subscriber_count(), 1);
    }

    #[test]
    fn test_disconnect_stops_delivery() {
        let registry = SubscriberRegistry::new(4);
        let (id, mut rx) = registry.connect();
        registry.subscribe(id, frame("snapshot"));

        assert_eq!(registry.disconnect(id), Some(ConnectionState::Subscribed));
        assert_eq!(registry.state(id), ConnectionState::Terminated);

        let delivery = registry.broadcast(&frame("tick"));
        assert_eq!(delivery.delivered, 0);

        assert_eq!(&*rx.try_recv().unwrap(), "snapshot");
        // sender dropped with the member; the session writer sees end of stream
        assert_eq!(tokio_test::block_on(rx.recv()), None);
    }

    #[test]
    fn test_terminated_is_absorbing() {
        let registry = SubscriberRegistry::new(4);
        let (id, _rx) = registry.connect();
        registry.disconnect(id);

        assert_eq!(registry.subscribe(id, frame("snapshot")), None);
        assert_eq!(registry.disconnect(id), None);
        assert_eq!(registry.state(id), ConnectionState::Terminated);
    }

    #[test]
    fn test_full_queue_drops_frame() {
        let registry = SubscriberRegistry::new(1);
        let (id, mut rx) = registry.connect();
        registry.subscribe(id, frame("snapshot"));

        let delivery = registry.broadcast(&frame("tick"));
        assert_eq!(delivery.dropped, 1);
        assert_eq!(&*rx.try_recv().unwrap(), "snapshot");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_closed_receiver_is_counted() {
        let registry = SubscriberRegistry::new(4);
        let (id, rx) = registry.connect();
        registry.subscribe(id, frame("snapshot"));
        drop(rx);

        let delivery = registry.broadcast(&frame("tick"));
        assert_eq!(delivery.closed, 1);
    }

    #[test]
    fn test_fan_out_to_many() {
        let registry = SubscriberRegistry::new(4);
        let receivers: Vec<_> = (0..5)
            .map(|_| {
                let (id, rx) = registry.connect();
                registry.subscribe(id, frame("snapshot"));
                rx
            })
            .collect();

        let delivery = registry.broadcast(&frame("tick"));
        assert_eq!(delivery.delivered, 5);
        assert_eq!(receivers.len(), registry.subscriber_count());
    }
}
