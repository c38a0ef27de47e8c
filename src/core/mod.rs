//! Runtime core: registry, scheduling and lifecycle.
//!
//! The public entry point is [`MessageBus`], built from a [`BusConfig`]
//! (optionally through [`MessageBusBuilder`] to attach subscribers).
//!
//! Internal modules:
//! - `registry`: channels, executors and per-channel dispatchers
//! - `scheduler`: one tokio task per dispatcher, bounded by a shared semaphore
//! - `shutdown`: OS signal handling for `run_until_signal`

mod builder;
mod bus;
mod config;
mod registry;
mod scheduler;
mod shutdown;
mod subscription;

pub use builder::MessageBusBuilder;
pub use bus::MessageBus;
pub use config::BusConfig;
pub use subscription::Subscription;
