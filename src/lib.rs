//! # dispatchvisor
//!
//! **Dispatchvisor** is an in-process message dispatch and polling engine.
//!
//! It moves messages from channels to consuming endpoints under configurable
//! concurrency, retry and failure-threshold policies. Delivery is best-effort:
//! nothing is persisted and there is no cross-process coordination.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   ┌─────────────┐        ┌─────────────┐
//!   │  Channel A  │        │  Channel B  │   (QueueChannel or any `Channel`)
//!   │ point2point │        │  pub-sub    │
//!   └──────┬──────┘        └──────┬──────┘
//!          ▼ receive(timeout)     ▼
//!   ┌─────────────┐        ┌─────────────┐
//!   │ Retriever   │        │ Retriever   │   ≤ max_messages_per_poll per cycle
//!   │ Dispatcher  │        │ Dispatcher  │   Unicast/PerAttempt, Broadcast/PerRound
//!   └──┬───────┬──┘        └──┬───────┬──┘
//!      │submit │              │       │
//!      ▼       ▼              ▼       ▼
//! ┌─────────┐┌─────────┐┌─────────┐┌─────────┐
//! │Executor ││Executor ││Executor ││Executor │   one bounded WorkerPool per endpoint,
//! │  ep1    ││  ep2    ││  ep3    ││  ep4    │   error thresholds → shutdown
//! └─────────┘└─────────┘└─────────┘└─────────┘
//!
//! Scheduler (shared semaphore): one task per dispatcher, fixed-rate / fixed-delay / continuous
//! EventBus ──► listener ──► SubscriberSet ──► LogWriter, custom subscribers
//! ```
//!
//! ### Lifecycle
//! ```text
//! MessageBus::new(cfg)
//!   register_channel / register_endpoint / activate_subscription   (any state)
//!   start()  ─► executors start, dispatchers scheduled
//!   stop()   ─► scheduler cancelled and joined, executors drained (≤ grace)
//!   start()  ─► fresh pools, executors re-attached, schedules resumed
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                              |
//! |-------------------|--------------------------------------------------------------|-------------------------------------------------|
//! | **Bus**           | Registration, subscriptions, scheduling, lifecycle.          | [`MessageBus`], [`BusConfig`], [`Subscription`] |
//! | **Channels**      | Message sources polled by dispatchers.                       | [`Channel`], [`QueueChannel`]                   |
//! | **Endpoints**     | Async handlers with optional selectors.                      | [`Endpoint`], [`EndpointFn`]                    |
//! | **Dispatch**      | Bounded retrieval, unicast/broadcast delivery.               | [`Dispatcher`], [`MessageRetriever`]            |
//! | **Execution**     | Per-endpoint worker pools with error thresholds.             | [`WorkerPoolExecutor`], [`WorkerPool`]          |
//! | **Policies**      | Polling, retry, jitter and threshold settings.               | [`ConsumerPolicy`], [`RetryPolicy`]             |
//! | **Subscriber API**| Observe runtime events (logging, metrics).                   | [`Subscribe`], [`Event`]                        |
//! | **Errors**        | Typed errors for wiring, dispatch and runtime.               | [`ConfigError`], [`DispatchError`]              |
//!
//! ## Optional features
//! - `logging` (default): exports [`LogWriter`], which renders events through `tracing`.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::time::Duration;
//! use dispatchvisor::{BusConfig, Channel, ConsumerPolicy, EndpointFn, HandlerError, Message, MessageBus};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut cfg = BusConfig::default();
//!     cfg.auto_create_channels = true;
//!
//!     #[cfg(feature = "logging")]
//!     let subs: Vec<Arc<dyn dispatchvisor::Subscribe>> = vec![Arc::new(dispatchvisor::LogWriter)];
//!     #[cfg(not(feature = "logging"))]
//!     let subs: Vec<Arc<dyn dispatchvisor::Subscribe>> = Vec::new();
//!
//!     let bus = MessageBus::builder(cfg).with_subscribers(subs).build();
//!
//!     let handled = Arc::new(AtomicUsize::new(0));
//!     let counter = handled.clone();
//!     bus.register_endpoint_with_input(
//!         "audit",
//!         EndpointFn::arc(move |_msg: Message| {
//!             let counter = counter.clone();
//!             async move {
//!                 counter.fetch_add(1, Ordering::SeqCst);
//!                 Ok::<_, HandlerError>(())
//!             }
//!         }),
//!         "events",
//!         Some(ConsumerPolicy::default().with_receive_timeout(Duration::from_millis(5))),
//!     )?;
//!
//!     bus.start();
//!     let events = bus.channel("events").ok_or("channel was not auto-created")?;
//!     events.send(Message::new("hello")).await?;
//!
//!     tokio::time::sleep(Duration::from_millis(50)).await;
//!     bus.stop().await?;
//!     Ok(())
//! }
//! ```
mod channels;
mod core;
mod dispatch;
mod endpoints;
mod error;
mod events;
mod executor;
mod message;
mod policies;
mod subscribers;

// ---- Public re-exports ----

pub use channels::{Channel, ChannelRef, DispatchPolicy, QueueChannel, SendError};
pub use crate::core::{BusConfig, MessageBus, MessageBusBuilder, Subscription};
pub use dispatch::{
    ChannelPollingRetriever, Dispatch, DispatchMode, Dispatcher, MessageRetriever, Target,
    TargetList, TargetRef,
};
pub use endpoints::{Endpoint, EndpointFn, EndpointRef};
pub use error::{ConfigError, DispatchError, HandlerError, RuntimeError, SubmitError};
pub use events::{Event, EventBus, EventKind};
pub use executor::{CompletionHook, ErrorCounter, HookVerdict, WorkerPool, WorkerPoolExecutor};
pub use message::Message;
pub use policies::{ConsumerPolicy, ErrorThresholds, JitterPolicy, RetryPolicy};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: built-in subscriber rendering events through `tracing`.
// Enabled by default with the `logging` feature.
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
