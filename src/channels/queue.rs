//! # Bounded in-memory channel.
//!
//! [`QueueChannel`] wraps a bounded [`tokio::sync::mpsc`] queue. Producers use
//! [`Channel::send`] / [`QueueChannel::try_send`]; the dispatch engine polls it
//! through [`Channel::receive`].
//!
//! ## Rules
//! - Capacity is clamped to a minimum of 1.
//! - Concurrent receivers are serialized; the whole wait (including waiting
//!   for the receiver lock) is bounded by the receive timeout.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{Mutex, mpsc};
use tokio::time;

use crate::channels::channel::{Channel, DispatchPolicy};
use crate::message::Message;

/// Why a message could not be enqueued. Carries the message back.
#[derive(Error, Debug)]
pub enum SendError {
    /// Queue is at capacity.
    #[error("channel full")]
    Full(Message),
    /// Receiving side is gone.
    #[error("channel closed")]
    Closed(Message),
    /// The channel does not accept messages from producers.
    #[error("channel is receive-only")]
    Unsupported(Message),
}

impl SendError {
    /// Takes the undelivered message back.
    pub fn into_message(self) -> Message {
        match self {
            SendError::Full(m) | SendError::Closed(m) | SendError::Unsupported(m) => m,
        }
    }
}

/// Bounded FIFO channel.
pub struct QueueChannel {
    tx: mpsc::Sender<Message>,
    rx: Mutex<mpsc::Receiver<Message>>,
    policy: DispatchPolicy,
}

impl QueueChannel {
    /// Creates a point-to-point channel holding at most `capacity` messages.
    pub fn new(capacity: usize) -> Self {
        Self::with_policy(capacity, DispatchPolicy::PointToPoint)
    }

    /// Creates a publish-subscribe channel holding at most `capacity` messages.
    pub fn publish_subscribe(capacity: usize) -> Self {
        Self::with_policy(capacity, DispatchPolicy::PublishSubscribe)
    }

    /// Creates a channel with an explicit dispatch policy.
    pub fn with_policy(capacity: usize, policy: DispatchPolicy) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        Self {
            tx,
            rx: Mutex::new(rx),
            policy,
        }
    }

    /// Enqueues a message without waiting.
    pub fn try_send(&self, message: Message) -> Result<(), SendError> {
        self.tx.try_send(message).map_err(|e| match e {
            mpsc::error::TrySendError::Full(m) => SendError::Full(m),
            mpsc::error::TrySendError::Closed(m) => SendError::Closed(m),
        })
    }

    /// Number of queued messages.
    pub fn len(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    /// True if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl Channel for QueueChannel {
    async fn receive(&self, timeout: Duration) -> Option<Message> {
        if timeout.is_zero() {
            let mut rx = self.rx.try_lock().ok()?;
            return rx.try_recv().ok();
        }
        let recv = async {
            let mut rx = self.rx.lock().await;
            rx.recv().await
        };
        time::timeout(timeout, recv).await.ok().flatten()
    }

    fn dispatch_policy(&self) -> DispatchPolicy {
        self.policy
    }

    /// Enqueues a message, waiting for free capacity.
    async fn send(&self, message: Message) -> Result<(), SendError> {
        self.tx
            .send(message)
            .await
            .map_err(|e| SendError::Closed(e.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fifo_and_timeout() {
        let ch = QueueChannel::new(4);
        let a = Message::new("a");
        let b = Message::new("b");
        ch.try_send(a.clone()).unwrap();
        ch.send(b.clone()).await.unwrap();
        assert_eq!(ch.len(), 2);

        assert_eq!(ch.receive(Duration::ZERO).await, Some(a));
        assert_eq!(ch.receive(Duration::from_millis(10)).await, Some(b));
        assert_eq!(ch.receive(Duration::from_millis(10)).await, None);
        assert!(ch.is_empty());
    }

    #[test]
    fn try_send_reports_full() {
        let ch = QueueChannel::new(1);
        ch.try_send(Message::new("1")).unwrap();
        assert!(matches!(ch.try_send(Message::new("2")), Err(SendError::Full(_))));
    }
}
