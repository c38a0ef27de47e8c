//! # Bounded batch retrieval.
//!
//! [`ChannelPollingRetriever`] drains at most `max_messages_per_poll` messages
//! per call and stops at the first empty receive, so a call blocks for at most
//! `max_messages_per_poll × receive_timeout`.
//!
//! Cancellation ends the receive loop early; messages already taken off the
//! channel are still returned so the caller can dispatch or account for them.

use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::channels::ChannelRef;
use crate::message::Message;

/// Source of message batches for a dispatcher.
#[async_trait]
pub trait MessageRetriever: Send + Sync + 'static {
    /// Returns the next batch, possibly empty. Absence of messages is not an error.
    ///
    /// Once `token` fires no further receives are started, but the messages
    /// gathered so far must be returned.
    async fn retrieve(&self, token: &CancellationToken) -> Vec<Message>;
}

/// Retriever polling a [`Channel`](crate::Channel) with a per-receive timeout.
pub struct ChannelPollingRetriever {
    channel: ChannelRef,
    receive_timeout: Duration,
    max_messages_per_poll: usize,
}

impl ChannelPollingRetriever {
    /// Creates a retriever; the batch bound is clamped to a minimum of 1.
    pub fn new(channel: ChannelRef, receive_timeout: Duration, max_messages_per_poll: usize) -> Self {
        Self {
            channel,
            receive_timeout,
            max_messages_per_poll: max_messages_per_poll.max(1),
        }
    }

    /// Batch bound.
    pub fn max_messages_per_poll(&self) -> usize {
        self.max_messages_per_poll
    }
}

#[async_trait]
impl MessageRetriever for ChannelPollingRetriever {
    async fn retrieve(&self, token: &CancellationToken) -> Vec<Message> {
        let mut batch = Vec::new();
        while batch.len() < self.max_messages_per_poll {
            let next = tokio::select! {
                biased;
                _ = token.cancelled() => break,
                next = self.channel.receive(self.receive_timeout) => next,
            };
            match next {
                Some(msg) => batch.push(msg),
                None => break,
            }
        }
        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::QueueChannel;
    use std::sync::Arc;

    #[tokio::test]
    async fn never_exceeds_batch_bound() {
        let ch = Arc::new(QueueChannel::new(16));
        for i in 0..10 {
            ch.try_send(Message::new(vec![i])).unwrap();
        }
        let r = ChannelPollingRetriever::new(ch.clone(), Duration::ZERO, 4);
        let token = CancellationToken::new();
        assert_eq!(r.retrieve(&token).await.len(), 4);
        assert_eq!(r.retrieve(&token).await.len(), 4);
        assert_eq!(r.retrieve(&token).await.len(), 2);
        assert!(r.retrieve(&token).await.is_empty());
    }

    #[test]
    fn zero_batch_is_clamped() {
        let ch = Arc::new(QueueChannel::new(1));
        assert_eq!(ChannelPollingRetriever::new(ch, Duration::ZERO, 0).max_messages_per_poll(), 1);
    }

    #[tokio::test]
    async fn cancelled_token_starts_no_receive() {
        let ch = Arc::new(QueueChannel::new(4));
        ch.try_send(Message::new("kept")).unwrap();
        let r = ChannelPollingRetriever::new(ch.clone(), Duration::from_secs(60), 4);
        let token = CancellationToken::new();
        token.cancel();

        assert!(r.retrieve(&token).await.is_empty());
        assert_eq!(r.retrieve(&CancellationToken::new()).await.len(), 1);
    }
}
