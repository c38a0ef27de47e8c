//! # Channel capability.
//!
//! A [`Channel`] exposes a timeout-bounded `receive`, an optional `send`, and
//! declares how its messages should be delivered. Durability, ordering and capacity are the
//! channel's business; the engine only polls it.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::channels::queue::SendError;
use crate::message::Message;

/// Delivery semantics requested by a channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DispatchPolicy {
    /// Each message goes to exactly one subscriber (competing consumers).
    #[default]
    PointToPoint,
    /// Each message goes to every subscriber.
    PublishSubscribe,
}

impl DispatchPolicy {
    /// True for [`DispatchPolicy::PublishSubscribe`].
    #[inline]
    pub fn is_broadcast(&self) -> bool {
        matches!(self, DispatchPolicy::PublishSubscribe)
    }
}

/// Shared handle to a channel.
pub type ChannelRef = Arc<dyn Channel>;

/// Receive side of a message channel.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use async_trait::async_trait;
/// use dispatchvisor::{Channel, DispatchPolicy, Message};
///
/// struct Empty;
///
/// #[async_trait]
/// impl Channel for Empty {
///     async fn receive(&self, _timeout: Duration) -> Option<Message> { None }
///     fn dispatch_policy(&self) -> DispatchPolicy { DispatchPolicy::PointToPoint }
/// }
/// ```
#[async_trait]
pub trait Channel: Send + Sync + 'static {
    /// Waits up to `timeout` for the next message.
    ///
    /// `Duration::ZERO` means "poll without waiting". `None` means nothing
    /// arrived in time; it is not an error.
    ///
    /// Must be cancel-safe: a receive dropped before completion must not have
    /// taken a message off the channel.
    async fn receive(&self, timeout: Duration) -> Option<Message>;

    /// How messages from this channel must be dispatched.
    fn dispatch_policy(&self) -> DispatchPolicy;

    /// Producer side. Receive-only channels keep the default, which hands the
    /// message back as [`SendError::Unsupported`].
    async fn send(&self, message: Message) -> Result<(), SendError> {
        Err(SendError::Unsupported(message))
    }
}
