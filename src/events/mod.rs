//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish runtime events emitted by the message bus, dispatchers, worker
//! pools and subscriber workers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`EventBus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `MessageBus` (registration/lifecycle), `Scheduler` (cycle
//!   failures), `Dispatcher` (drops, rejection limits, exhaustion),
//!   `WorkerPoolExecutor` (task failures, threshold shutdown), `SubscriberSet`
//!   workers (overflow/panic).
//! - **Consumer**: the bus listener that fans events out to `SubscriberSet`.

mod bus;
mod event;

pub use bus::EventBus;
pub use event::{Event, EventKind};
