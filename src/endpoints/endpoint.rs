//! # Message handler abstraction.
//!
//! An [`Endpoint`] receives messages one at a time from its worker pool. Each
//! submission runs in its own task, so `handle` may be called concurrently up to
//! the pool's capacity.
//!
//! Failures (`Err` or panic) are contained by the pool and counted against the
//! endpoint's error thresholds; they never reach the dispatcher.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::HandlerError;
use crate::message::Message;

/// Shared handle to an endpoint.
pub type EndpointRef = Arc<dyn Endpoint>;

/// # Asynchronous message handler.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use dispatchvisor::{Endpoint, HandlerError, Message};
///
/// struct Audit;
///
/// #[async_trait]
/// impl Endpoint for Audit {
///     async fn handle(&self, msg: Message) -> Result<(), HandlerError> {
///         if msg.payload().is_empty() {
///             return Err(HandlerError::fail("empty payload"));
///         }
///         Ok(())
///     }
///
///     fn accepts(&self, msg: &Message) -> bool {
///         msg.header("audit").is_some()
///     }
/// }
/// ```
#[async_trait]
pub trait Endpoint: Send + Sync + 'static {
    /// Processes a single message.
    async fn handle(&self, message: Message) -> Result<(), HandlerError>;

    /// Whether the endpoint is willing to take work at all.
    ///
    /// A `false` here makes the executor report not-running, which removes it
    /// from dispatchers until the bus is restarted.
    fn is_running(&self) -> bool {
        true
    }

    /// Selector: whether this endpoint wants the given message.
    ///
    /// Rejected messages are skipped for this endpoint without counting as a
    /// delivery failure.
    fn accepts(&self, _message: &Message) -> bool {
        true
    }
}
