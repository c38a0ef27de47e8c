//! # Message dispatcher.
//!
//! One [`Dispatcher`] serves one channel. Each call to [`Dispatch::dispatch`]
//! retrieves a batch and delivers every message either to exactly one target
//! ([`DispatchMode::Unicast`]) or to all of them ([`DispatchMode::Broadcast`]),
//! retrying saturated targets as the [`RetryPolicy`] says.
//!
//! ## PerAttempt
//! ```text
//! for target in snapshot (registration order):
//!   not running        ─► remove from live list, next
//!   loop submit:
//!     Ok               ─► delivered (unicast: done)
//!     Rejected         ─► attempts += 1
//!                          attempts == limit ─► RejectionLimitReached, sleep rejection_wait, next
//!     SelectorRejected ─► next
//!     other            ─► SubmissionFailed, next
//! ```
//!
//! ## PerRound
//! ```text
//! working = snapshot
//! for round in 0..limit:
//!   round > 0          ─► sleep retry_interval
//!   drop stopped targets from working
//!   working empty      ─► NoActiveHandlers, fail
//!   offer to each target in working:
//!     Ok               ─► unicast: done / broadcast: drop from working
//!     Selector/NotRun  ─► drop from working (not a failure)
//!     Rejected/Failed  ─► keep, round failed
//!   broadcast && !round failed ─► done
//! exhausted ─► DeliveryExhausted (fail_on_limit ⇒ Err)
//! ```
//!
//! ## Cancellation
//! Backoff sleeps observe the dispatcher's [`CancellationToken`]; a cancelled
//! sleep fails the current message. Retrieval stops starting new receives once
//! the token fires, and whatever it already took off the channel is still
//! dispatched: delivered if a target accepts without waiting, otherwise
//! reported as [`EventKind::MessageDropped`].

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::channels::DispatchPolicy;
use crate::dispatch::retriever::MessageRetriever;
use crate::dispatch::target::TargetRef;
use crate::dispatch::targets::TargetList;
use crate::error::{DispatchError, SubmitError};
use crate::events::{Event, EventBus, EventKind};
use crate::message::Message;
use crate::policies::{JitterPolicy, RetryPolicy};

/// Whether a message goes to one target or to all of them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchMode {
    /// Exactly one target per message.
    Unicast,
    /// Every interested, running target.
    Broadcast,
}

impl From<DispatchPolicy> for DispatchMode {
    fn from(policy: DispatchPolicy) -> Self {
        match policy {
            DispatchPolicy::PointToPoint => DispatchMode::Unicast,
            DispatchPolicy::PublishSubscribe => DispatchMode::Broadcast,
        }
    }
}

/// A poll-and-dispatch cycle.
#[async_trait]
pub trait Dispatch: Send + Sync + 'static {
    /// Retrieves one batch and dispatches it.
    ///
    /// Returns the number of messages delivered. Only an exhausted round budget
    /// with `fail_on_limit` is an error; it aborts the rest of the batch.
    async fn dispatch(&self) -> Result<usize, DispatchError>;
}

/// Outcome of offering a message to one target under [`RetryPolicy::PerAttempt`].
enum Offer {
    Accepted,
    Skipped,
    Exhausted,
    Cancelled,
}

/// Channel dispatcher.
pub struct Dispatcher {
    channel: Arc<str>,
    retriever: Arc<dyn MessageRetriever>,
    targets: TargetList,
    mode: DispatchMode,
    retry: RetryPolicy,
    jitter: JitterPolicy,
    bus: EventBus,
    cancel: Mutex<CancellationToken>,
}

impl Dispatcher {
    /// Creates a dispatcher with no targets.
    pub fn new(
        channel: impl Into<Arc<str>>,
        retriever: Arc<dyn MessageRetriever>,
        mode: DispatchMode,
        retry: RetryPolicy,
        bus: EventBus,
    ) -> Self {
        Self {
            channel: channel.into(),
            retriever,
            targets: TargetList::new(),
            mode,
            retry,
            jitter: JitterPolicy::None,
            bus,
            cancel: Mutex::new(CancellationToken::new()),
        }
    }

    /// Applies jitter to every backoff sleep.
    #[must_use]
    pub fn with_jitter(mut self, jitter: JitterPolicy) -> Self {
        self.jitter = jitter;
        self
    }

    /// Channel name this dispatcher serves.
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Delivery mode.
    pub fn mode(&self) -> DispatchMode {
        self.mode
    }

    /// Retry policy.
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Registered targets.
    pub fn targets(&self) -> &TargetList {
        &self.targets
    }

    /// Adds a target; returns `false` if it was already registered.
    pub fn add_target(&self, target: TargetRef) -> bool {
        self.targets.add(target)
    }

    /// Removes a target by name.
    pub fn remove_target(&self, name: &str) -> bool {
        self.targets.remove_named(name)
    }

    /// Replaces the token observed by backoff sleeps and retrieval.
    pub fn set_cancellation(&self, token: CancellationToken) {
        *self.cancel.lock().unwrap_or_else(PoisonError::into_inner) = token;
    }

    fn token(&self) -> CancellationToken {
        self.cancel
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Delivers one message according to the mode and retry policy.
    ///
    /// `Ok(false)` means the message was not (fully) delivered in this cycle.
    pub async fn dispatch_message(&self, message: &Message) -> Result<bool, DispatchError> {
        let token = self.token();
        match self.retry {
            RetryPolicy::PerAttempt {
                rejection_limit,
                rejection_wait,
            } => Ok(self
                .dispatch_per_attempt(message, rejection_limit, rejection_wait, &token)
                .await),
            RetryPolicy::PerRound {
                rejection_limit,
                retry_interval,
                fail_on_limit,
            } => {
                self.dispatch_per_round(message, rejection_limit, retry_interval, fail_on_limit, &token)
                    .await
            }
        }
    }

    async fn dispatch_per_attempt(
        &self,
        message: &Message,
        limit: u32,
        wait: Duration,
        token: &CancellationToken,
    ) -> bool {
        let snapshot = self.targets.snapshot();
        let mut offered = false;
        let mut all_taken = true;

        for target in snapshot.iter() {
            if !target.is_running() {
                self.drop_target(target);
                continue;
            }
            offered = true;
            match self.offer(target, message, limit, wait, token).await {
                Offer::Accepted => {
                    if self.mode == DispatchMode::Unicast {
                        return true;
                    }
                }
                Offer::Skipped => {}
                Offer::Exhausted => all_taken = false,
                Offer::Cancelled => return false,
            }
        }

        match self.mode {
            DispatchMode::Unicast => false,
            DispatchMode::Broadcast => offered && all_taken,
        }
    }

    /// Offers `message` to one target, retrying rejections up to `limit` times.
    async fn offer(
        &self,
        target: &TargetRef,
        message: &Message,
        limit: u32,
        wait: Duration,
        token: &CancellationToken,
    ) -> Offer {
        let mut attempts = 0u32;
        loop {
            match target.submit(message.clone()) {
                Ok(()) => return Offer::Accepted,
                Err(SubmitError::Rejected) => {
                    attempts += 1;
                    if attempts < limit {
                        tokio::task::yield_now().await;
                        continue;
                    }
                    let delay = self.jitter.apply(wait);
                    self.bus.publish(
                        Event::new(EventKind::RejectionLimitReached)
                            .with_channel(Arc::clone(&self.channel))
                            .with_endpoint(target.name())
                            .with_attempt(attempts)
                            .with_delay(delay),
                    );
                    return if self.sleep(delay, token).await {
                        Offer::Exhausted
                    } else {
                        Offer::Cancelled
                    };
                }
                Err(SubmitError::NotRunning) => {
                    self.drop_target(target);
                    return Offer::Skipped;
                }
                Err(SubmitError::SelectorRejected) => return Offer::Skipped,
                Err(e) => {
                    self.publish_submit_failure(target, &e);
                    return Offer::Skipped;
                }
            }
        }
    }

    async fn dispatch_per_round(
        &self,
        message: &Message,
        limit: u32,
        interval: Duration,
        fail_on_limit: bool,
        token: &CancellationToken,
    ) -> Result<bool, DispatchError> {
        let mut working: Vec<TargetRef> = self.targets.snapshot().to_vec();
        let mut rounds = 0u32;

        while rounds < limit {
            if rounds > 0 && !self.sleep(self.jitter.apply(interval), token).await {
                return Ok(false);
            }
            working.retain(|target| {
                let live = target.is_running();
                if !live {
                    self.drop_target(target);
                }
                live
            });
            if working.is_empty() {
                self.bus.publish(
                    Event::new(EventKind::NoActiveHandlers)
                        .with_channel(Arc::clone(&self.channel))
                        .with_message(message.id()),
                );
                return Ok(false);
            }

            let mut round_failed = false;
            let mut retry = Vec::with_capacity(working.len());
            for target in working.drain(..) {
                match target.submit(message.clone()) {
                    Ok(()) => {
                        if self.mode == DispatchMode::Unicast {
                            return Ok(true);
                        }
                    }
                    Err(SubmitError::NotRunning) => self.drop_target(&target),
                    Err(SubmitError::SelectorRejected) => {}
                    Err(e) => {
                        if !matches!(e, SubmitError::Rejected) {
                            self.publish_submit_failure(&target, &e);
                        }
                        round_failed = true;
                        retry.push(target);
                    }
                }
            }
            working = retry;

            if self.mode == DispatchMode::Broadcast && !round_failed {
                return Ok(true);
            }
            rounds += 1;
        }

        self.bus.publish(
            Event::new(EventKind::DeliveryExhausted)
                .with_channel(Arc::clone(&self.channel))
                .with_message(message.id())
                .with_attempt(rounds),
        );
        if fail_on_limit {
            Err(DispatchError::DeliveryExhausted {
                message_id: message.id(),
                rounds,
            })
        } else {
            Ok(false)
        }
    }

    /// Sleeps unless cancelled first. Returns `false` on cancellation.
    async fn sleep(&self, delay: Duration, token: &CancellationToken) -> bool {
        if token.is_cancelled() {
            return false;
        }
        tokio::select! {
            _ = token.cancelled() => false,
            _ = tokio::time::sleep(delay) => true,
        }
    }

    fn drop_target(&self, target: &TargetRef) {
        if self.targets.remove(target) {
            self.bus.publish(
                Event::new(EventKind::TargetRemoved)
                    .with_channel(Arc::clone(&self.channel))
                    .with_endpoint(target.name()),
            );
        }
    }

    fn publish_submit_failure(&self, target: &TargetRef, err: &SubmitError) {
        self.bus.publish(
            Event::new(EventKind::SubmissionFailed)
                .with_channel(Arc::clone(&self.channel))
                .with_endpoint(target.name())
                .with_reason(err.as_message()),
        );
    }
}

#[async_trait]
impl Dispatch for Dispatcher {
    async fn dispatch(&self) -> Result<usize, DispatchError> {
        if self.targets.is_empty() {
            return Ok(0);
        }
        let batch = self.retriever.retrieve(&self.token()).await;

        let mut delivered = 0;
        for message in &batch {
            if self.dispatch_message(message).await? {
                delivered += 1;
            } else {
                self.bus.publish(
                    Event::new(EventKind::MessageDropped)
                        .with_channel(Arc::clone(&self.channel))
                        .with_message(message.id()),
                );
            }
        }
        Ok(delivered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::Target;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixed {
        name: &'static str,
        answer: Result<(), SubmitError>,
        calls: AtomicUsize,
    }

    impl Fixed {
        fn arc(name: &'static str, answer: Result<(), SubmitError>) -> Arc<Self> {
            Arc::new(Self {
                name,
                answer,
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl Target for Fixed {
        fn name(&self) -> &str {
            self.name
        }
        fn is_running(&self) -> bool {
            !matches!(self.answer, Err(SubmitError::NotRunning))
        }
        fn submit(&self, _message: Message) -> Result<(), SubmitError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answer.clone()
        }
    }

    struct Nothing;

    #[async_trait]
    impl MessageRetriever for Nothing {
        async fn retrieve(&self, _token: &CancellationToken) -> Vec<Message> {
            Vec::new()
        }
    }

    fn dispatcher(mode: DispatchMode, retry: RetryPolicy) -> Dispatcher {
        Dispatcher::new("test", Arc::new(Nothing), mode, retry, EventBus::new(64))
    }

    const PER_ATTEMPT: RetryPolicy = RetryPolicy::PerAttempt {
        rejection_limit: 3,
        rejection_wait: Duration::ZERO,
    };

    #[tokio::test]
    async fn per_attempt_retries_same_target_up_to_limit() {
        let d = dispatcher(DispatchMode::Unicast, PER_ATTEMPT);
        let busy = Fixed::arc("busy", Err(SubmitError::Rejected));
        let idle = Fixed::arc("idle", Ok(()));
        d.add_target(busy.clone());
        d.add_target(idle.clone());

        assert!(d.dispatch_message(&Message::new("m")).await.unwrap());
        assert_eq!(busy.calls.load(Ordering::SeqCst), 3);
        assert_eq!(idle.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stopped_targets_are_removed_from_live_list() {
        let d = dispatcher(DispatchMode::Unicast, PER_ATTEMPT);
        d.add_target(Fixed::arc("down", Err(SubmitError::NotRunning)));
        let up = Fixed::arc("up", Ok(()));
        d.add_target(up.clone());

        assert!(d.dispatch_message(&Message::new("m")).await.unwrap());
        assert_eq!(d.targets().len(), 1);
        assert_eq!(d.targets().snapshot()[0].name(), "up");
    }

    #[tokio::test]
    async fn broadcast_round_counts_selector_rejection_as_done() {
        let d = dispatcher(
            DispatchMode::Broadcast,
            RetryPolicy::PerRound {
                rejection_limit: 2,
                retry_interval: Duration::ZERO,
                fail_on_limit: true,
            },
        );
        let a = Fixed::arc("a", Ok(()));
        let picky = Fixed::arc("picky", Err(SubmitError::SelectorRejected));
        d.add_target(a.clone());
        d.add_target(picky.clone());

        assert!(d.dispatch_message(&Message::new("m")).await.unwrap());
        assert_eq!(a.calls.load(Ordering::SeqCst), 1);
        assert_eq!(picky.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn broadcast_retries_only_failed_targets() {
        let d = dispatcher(
            DispatchMode::Broadcast,
            RetryPolicy::PerRound {
                rejection_limit: 3,
                retry_interval: Duration::ZERO,
                fail_on_limit: false,
            },
        );
        let ok = Fixed::arc("ok", Ok(()));
        let busy = Fixed::arc("busy", Err(SubmitError::Rejected));
        d.add_target(ok.clone());
        d.add_target(busy.clone());

        assert!(!d.dispatch_message(&Message::new("m")).await.unwrap());
        assert_eq!(ok.calls.load(Ordering::SeqCst), 1);
        assert_eq!(busy.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn cancelled_backoff_fails_message() {
        let d = dispatcher(
            DispatchMode::Unicast,
            RetryPolicy::PerAttempt {
                rejection_limit: 1,
                rejection_wait: Duration::from_secs(3600),
            },
        );
        d.add_target(Fixed::arc("busy", Err(SubmitError::Rejected)));
        let token = CancellationToken::new();
        d.set_cancellation(token.clone());
        token.cancel();

        let res = tokio::time::timeout(Duration::from_secs(5), d.dispatch_message(&Message::new("m")))
            .await
            .unwrap();
        assert_eq!(res, Ok(false));
    }

    #[tokio::test]
    async fn no_targets_means_no_retrieval() {
        let d = dispatcher(DispatchMode::Unicast, PER_ATTEMPT);
        assert_eq!(d.dispatch().await, Ok(0));
    }
}
