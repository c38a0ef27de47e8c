//! # Event bus for broadcasting runtime events.
//!
//! [`EventBus`] wraps [`tokio::sync::broadcast`] so that publishing never blocks
//! a dispatch task or a worker.
//!
//! ```text
//! Publishers (many):                       Listener (one):
//!   Dispatcher      ──┐
//!   Executor/pool   ──┼──► EventBus ──► MessageBus listener ──► SubscriberSet
//!   Scheduler/bus   ──┘
//! ```
//!
//! ## Rules
//! - `publish()` never blocks; events are dropped if nobody listens.
//! - A single ring buffer of `capacity` events is shared by all receivers;
//!   lagging receivers observe `RecvError::Lagged(n)`.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for runtime events. Cheap to clone.
#[derive(Clone, Debug)]
pub struct EventBus {
    tx: broadcast::Sender<Event>,
}

impl EventBus {
    /// Creates a new bus; capacity is clamped to a minimum of 1.
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Event>(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to all current receivers.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates a receiver for events sent after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[tokio::test]
    async fn receivers_only_see_later_events() {
        let bus = EventBus::new(0);
        bus.publish(Event::new(EventKind::BusStarted));

        let mut rx = bus.subscribe();
        bus.publish(Event::new(EventKind::BusStopped));

        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::BusStopped);
        assert!(rx.try_recv().is_err());
    }
}
