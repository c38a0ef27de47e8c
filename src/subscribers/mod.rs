//! # Event subscribers.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] fan-out
//! and the built-in [`LogWriter`].
//!
//! ## Architecture
//! ```text
//!   Dispatcher / Executor ── publish(Event) ──► EventBus ──► MessageBus listener
//!                                                                 │
//!                                                      SubscriberSet::emit(&Event)
//!                                                     ┌───────────┼───────────┐
//!                                                     ▼           ▼           ▼
//!                                                 LogWriter    Metrics     Custom
//! ```
//!
//! ## Implementing custom subscribers
//! ```no_run
//! use async_trait::async_trait;
//! use dispatchvisor::{Event, EventKind, Subscribe};
//!
//! struct DropCounter;
//!
//! #[async_trait]
//! impl Subscribe for DropCounter {
//!     async fn on_event(&self, event: &Event) {
//!         if event.kind == EventKind::MessageDropped {
//!             // increment a counter
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str {
//!         "drop-counter"
//!     }
//! }
//! ```

#[cfg(feature = "logging")]
mod log;
mod set;
mod subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
