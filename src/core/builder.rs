//! # MessageBus builder.

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;

use crate::core::bus::MessageBus;
use crate::core::config::BusConfig;
use crate::events::EventBus;
use crate::subscribers::{Subscribe, SubscriberSet};

/// Builder for constructing a [`MessageBus`] with optional subscribers.
pub struct MessageBusBuilder {
    cfg: BusConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl MessageBusBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: BusConfig) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive runtime events through dedicated workers with
    /// bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the bus and spawns the subscriber listener.
    ///
    /// Must be called inside a tokio runtime.
    pub fn build(self) -> Arc<MessageBus> {
        let bus = EventBus::new(self.cfg.event_capacity_clamped());
        let listener = CancellationToken::new();

        if !self.subscribers.is_empty() {
            let set = SubscriberSet::new(self.subscribers, bus.clone());
            spawn_listener(&bus, set, listener.clone());
        }
        Arc::new(MessageBus::new_internal(self.cfg, bus, listener))
    }
}

/// Forwards bus events to the subscriber set until `token` is cancelled.
fn spawn_listener(bus: &EventBus, set: SubscriberSet, token: CancellationToken) {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                msg = rx.recv() => match msg {
                    Ok(ev) => set.emit(&ev),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "event listener lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
        set.shutdown().await;
    });
}
