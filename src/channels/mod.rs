//! Message sources consumed by the dispatch engine.
//!
//! ## Contents
//! - [`Channel`] the receive-side capability the retriever polls
//! - [`DispatchPolicy`] point-to-point vs. publish-subscribe delivery
//! - [`QueueChannel`] bounded in-memory channel (the default for auto-created channels)

mod channel;
mod queue;

pub use channel::{Channel, ChannelRef, DispatchPolicy};
pub use queue::{QueueChannel, SendError};
