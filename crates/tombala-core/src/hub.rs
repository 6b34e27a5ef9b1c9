// Fan-out of server events to connected clients.
//
// Each subscriber owns an unbounded mpsc receiver, which gives per-connection
// FIFO delivery. The hub knows connection ids only, never transport objects.

use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::mpsc;
use tracing::debug;

use crate::protocol::ServerEvent;
use crate::ConnectionId;

/// Registry of connected subscribers.
#[derive(Debug, Default)]
pub struct BroadcastHub {
    subscribers: Mutex<HashMap<ConnectionId, mpsc::UnboundedSender<ServerEvent>>>,
}

impl BroadcastHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `id` and return its event stream. Subscribing an id twice
    /// replaces the earlier stream, which then ends.
    pub fn subscribe(&self, id: &str) -> mpsc::UnboundedReceiver<ServerEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().insert(id.to_string(), tx);
        debug!(connection = id, "Subscribed");
        rx
    }

    /// Drop `id`'s stream. Returns whether it was subscribed.
    pub fn unsubscribe(&self, id: &str) -> bool {
        self.lock().remove(id).is_some()
    }

    /// Deliver `event` to every current subscriber. Subscribers whose
    /// receiver is gone are pruned. Returns the number of deliveries.
    pub fn publish(&self, event: ServerEvent) -> usize {
        let mut subscribers = self.lock();
        subscribers.retain(|_, tx| tx.send(event.clone()).is_ok());
        debug!(event = event.name(), delivered = subscribers.len(), "Published");
        subscribers.len()
    }

    /// Deliver `event` to `id` alone.
    pub fn send_to(&self, id: &str, event: ServerEvent) -> bool {
        let mut subscribers = self.lock();
        match subscribers.get(id) {
            Some(tx) if tx.send(event).is_ok() => true,
            Some(_) => {
                subscribers.remove(id);
                false
            }
            None => false,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(
        &self,
    ) -> std::sync::MutexGuard<'_, HashMap<ConnectionId, mpsc::UnboundedSender<ServerEvent>>> {
        self.subscribers.lock().expect("hub mutex poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_reaches_every_subscriber() {
        let hub = BroadcastHub::new();
        let mut a = hub.subscribe("a");
        let mut b = hub.subscribe("b");

        assert_eq!(hub.publish(ServerEvent::DrawnNumber { number: 7 }), 2);

        assert_eq!(a.try_recv().unwrap(), ServerEvent::DrawnNumber { number: 7 });
        assert_eq!(b.try_recv().unwrap(), ServerEvent::DrawnNumber { number: 7 });
    }

    #[test]
    fn events_arrive_in_publish_order() {
        let hub = BroadcastHub::new();
        let mut rx = hub.subscribe("a");
        for number in 1..=5 {
            hub.publish(ServerEvent::DrawnNumber { number });
        }
        for number in 1..=5 {
            assert_eq!(rx.try_recv().unwrap(), ServerEvent::DrawnNumber { number });
        }
    }

    #[test]
    fn send_to_is_unicast() {
        let hub = BroadcastHub::new();
        let mut a = hub.subscribe("a");
        let mut b = hub.subscribe("b");

        assert!(hub.send_to("a", ServerEvent::DrawnNumber { number: 1 }));
        assert!(!hub.send_to("nobody", ServerEvent::DrawnNumber { number: 1 }));

        assert!(a.try_recv().is_ok());
        assert!(b.try_recv().is_err());
    }

    #[test]
    fn unsubscribed_connection_misses_later_events() {
        let hub = BroadcastHub::new();
        let mut a = hub.subscribe("a");
        assert!(hub.unsubscribe("a"));
        assert!(!hub.unsubscribe("a"));

        assert_eq!(hub.publish(ServerEvent::DrawnNumber { number: 3 }), 0);
        // Sender dropped, so the stream is closed.
        assert!(a.try_recv().is_err());
    }

    #[test]
    fn dropped_receivers_are_pruned() {
        let hub = BroadcastHub::new();
        let a = hub.subscribe("a");
        let _b = hub.subscribe("b");
        drop(a);

        assert_eq!(hub.publish(ServerEvent::DrawnNumber { number: 3 }), 1);
        assert_eq!(hub.subscriber_count(), 1);
    }
}
