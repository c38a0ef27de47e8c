//! # Example: custom_subscriber
//!
//! Demonstrates how to build and attach a custom event subscriber.
//!
//! Shows how to:
//! - Implement the [`Subscribe`] trait.
//! - Inspect [`Event`] / [`EventKind`] for dispatch metrics.
//! - Filter uninteresting kinds with [`Subscribe::wants`].
//! - Wire the subscriber into [`MessageBus::builder`].
//!
//! ## Flow
//! ```text
//! QueueChannel ──► Dispatcher ──► WorkerPoolExecutor("flaky")
//!     ├─► publish(RejectionLimitReached / MessageDropped)
//!     ├─► publish(TaskFailed / ExecutorShutdown)
//!     └─► listener ──► SubscriberSet.emit() ──► Tally.on_event()
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example custom_subscriber
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dispatchvisor::{
    BusConfig, ConsumerPolicy, EndpointFn, ErrorThresholds, Event, EventKind, HandlerError,
    Message, MessageBus, QueueChannel, Subscribe,
};

/// Counts a few event kinds and prints the interesting ones.
#[derive(Default)]
struct Tally {
    failed: AtomicU64,
    dropped: AtomicU64,
    saturated: AtomicU64,
}

#[async_trait::async_trait]
impl Subscribe for Tally {
    async fn on_event(&self, ev: &Event) {
        match ev.kind {
            EventKind::TaskFailed => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                println!(
                    "[sub] failed:    endpoint={} message={} reason={}",
                    ev.endpoint.as_deref().unwrap_or("<unknown>"),
                    ev.message_id.unwrap_or(0),
                    ev.reason.as_deref().unwrap_or("<none>")
                );
            }
            EventKind::RejectionLimitReached => {
                self.saturated.fetch_add(1, Ordering::Relaxed);
            }
            EventKind::MessageDropped => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
            EventKind::ExecutorShutdown => {
                println!(
                    "[sub] shutdown:  endpoint={} reason={}",
                    ev.endpoint.as_deref().unwrap_or("<unknown>"),
                    ev.reason.as_deref().unwrap_or("<none>")
                );
            }
            _ => {}
        }
    }

    fn name(&self) -> &'static str {
        "tally"
    }

    fn wants(&self, kind: EventKind) -> bool {
        matches!(
            kind,
            EventKind::TaskFailed
                | EventKind::RejectionLimitReached
                | EventKind::MessageDropped
                | EventKind::ExecutorShutdown
        )
    }

    fn queue_capacity(&self) -> usize {
        256
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let tally = Arc::new(Tally::default());
    let cfg = BusConfig {
        thresholds: ErrorThresholds {
            successive: 3,
            total: -1,
        },
        ..BusConfig::default()
    };
    let subs: Vec<Arc<dyn Subscribe>> = vec![tally.clone()];
    let bus = MessageBus::builder(cfg).with_subscribers(subs).build();

    let input = Arc::new(QueueChannel::new(64));
    bus.register_channel("input", input.clone())?;
    bus.register_endpoint_with_input(
        "flaky",
        EndpointFn::arc(|msg: Message| async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            if msg.payload().len() % 2 == 0 {
                Err(HandlerError::fail("even-sized payload"))
            } else {
                Ok(())
            }
        }),
        "input",
        Some(
            ConsumerPolicy::default()
                .with_period(Duration::from_millis(5))
                .with_receive_timeout(Duration::from_millis(20))
                .with_max_messages_per_poll(4)
                .with_concurrency(1, 1)
                .with_rejection_limit(2, Duration::from_millis(10)),
        ),
    )?;

    bus.start();
    for payload in ["a", "bb", "ccc", "dd", "eeee", "ff", "g"] {
        input.try_send(Message::new(payload))?;
    }
    tokio::time::sleep(Duration::from_millis(800)).await;
    bus.stop().await?;

    println!(
        "failed={} dropped={} saturated={}",
        tally.failed.load(Ordering::Relaxed),
        tally.dropped.load(Ordering::Relaxed),
        tally.saturated.load(Ordering::Relaxed)
    );
    Ok(())
}
