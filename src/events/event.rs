//! # Runtime events emitted by the bus, dispatchers and worker pools.
//!
//! The [`EventKind`] enum classifies events across four groups:
//! - **Wiring**: channels, endpoints and subscriptions being registered
//! - **Lifecycle**: bus start/stop, grace handling
//! - **Dispatch**: drops, rejection limits, exhausted delivery, failed cycles
//! - **Execution**: handler failures and threshold-triggered shutdowns
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Use `seq` to restore order when events arrive out of order.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use dispatchvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::RejectionLimitReached)
//!     .with_channel("orders")
//!     .with_endpoint("billing")
//!     .with_attempt(5)
//!     .with_delay(Duration::from_millis(250));
//!
//! assert_eq!(ev.channel.as_deref(), Some("orders"));
//! assert_eq!(ev.delay_ms, Some(250));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets: `endpoint` (subscriber name), `reason` (panic info).
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `endpoint` (subscriber name), `reason`.
    SubscriberOverflow,

    // === Wiring ===
    /// A channel was registered explicitly.
    ///
    /// Sets: `channel`.
    ChannelRegistered,

    /// A channel was created on demand during subscription activation.
    ///
    /// Sets: `channel`.
    ChannelAutoCreated,

    /// An endpoint and its executor were registered.
    ///
    /// Sets: `endpoint`.
    EndpointRegistered,

    /// An endpoint was detached from all dispatchers and stopped.
    ///
    /// Sets: `endpoint`.
    EndpointRemoved,

    /// A subscription was activated.
    ///
    /// Sets: `channel`, `endpoint`.
    SubscriptionActivated,

    /// A subscription polls continuously with non-blocking receives.
    ///
    /// Sets: `channel`, `endpoint`.
    BusyPollWarning,

    // === Lifecycle ===
    /// Bus started: executors running, dispatch tasks scheduled.
    ///
    /// Sets: `count` (number of dispatch tasks).
    BusStarted,

    /// Bus stopped.
    BusStopped,

    /// Shutdown requested by an OS signal.
    ShutdownRequested,

    /// Every worker pool drained within the grace period.
    AllStoppedWithin,

    /// Some worker pools did not drain in time and were shut down abruptly.
    ///
    /// Sets: `reason` (stuck endpoint names).
    GraceExceeded,

    // === Dispatch ===
    /// A dispatch cycle returned an error; the schedule continues.
    ///
    /// Sets: `channel`, `reason`.
    CycleFailed,

    /// No target took the message during this cycle.
    ///
    /// Sets: `channel`, `message_id`.
    MessageDropped,

    /// A target hit the rejection limit; the dispatcher sleeps before moving on.
    ///
    /// Sets: `channel`, `endpoint`, `attempt`, `delay_ms`.
    RejectionLimitReached,

    /// A target refused a message for a reason other than saturation.
    ///
    /// Sets: `channel`, `endpoint`, `reason`.
    SubmissionFailed,

    /// A target reported not-running and was removed from the dispatcher.
    ///
    /// Sets: `channel`, `endpoint`.
    TargetRemoved,

    /// A round-based dispatch ran out of targets.
    ///
    /// Sets: `channel`, `message_id`.
    NoActiveHandlers,

    /// A round-based dispatch used up its rounds.
    ///
    /// Sets: `channel`, `message_id`, `attempt` (rounds).
    DeliveryExhausted,

    // === Execution ===
    /// An endpoint's handler returned an error or panicked.
    ///
    /// Sets: `endpoint`, `message_id`, `reason`, `count` (total failures).
    TaskFailed,

    /// An endpoint's pool breached an error threshold and shut down.
    ///
    /// Sets: `endpoint`, `reason`.
    ExecutorShutdown,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Channel name, if applicable.
    pub channel: Option<Arc<str>>,
    /// Endpoint (or subscriber) name, if applicable.
    pub endpoint: Option<Arc<str>>,
    /// Human-readable reason.
    pub reason: Option<Arc<str>>,
    /// Attempt or round counter.
    pub attempt: Option<u32>,
    /// Backoff delay in milliseconds (compact).
    pub delay_ms: Option<u32>,
    /// Generic counter (tasks scheduled, failures so far).
    pub count: Option<u64>,
    /// Id of the message concerned.
    pub message_id: Option<u64>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            channel: None,
            endpoint: None,
            reason: None,
            attempt: None,
            delay_ms: None,
            count: None,
            message_id: None,
        }
    }

    /// Attaches a channel name.
    #[inline]
    pub fn with_channel(mut self, channel: impl Into<Arc<str>>) -> Self {
        self.channel = Some(channel.into());
        self
    }

    /// Attaches an endpoint name.
    #[inline]
    pub fn with_endpoint(mut self, endpoint: impl Into<Arc<str>>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches an attempt/round counter.
    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches a delay (stored as milliseconds, saturating).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        self.delay_ms = Some(d.as_millis().min(u128::from(u32::MAX)) as u32);
        self
    }

    /// Attaches a counter.
    #[inline]
    pub fn with_count(mut self, n: u64) -> Self {
        self.count = Some(n);
        self
    }

    /// Attaches a message id.
    #[inline]
    pub fn with_message(mut self, id: u64) -> Self {
        self.message_id = Some(id);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_endpoint(subscriber)
            .with_reason(reason)
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_endpoint(subscriber)
            .with_reason(info)
    }

    /// True for events raised by the subscriber machinery itself.
    ///
    /// These are never fed back into the subscriber set.
    #[inline]
    pub fn is_subscriber_internal(&self) -> bool {
        matches!(
            self.kind,
            EventKind::SubscriberOverflow | EventKind::SubscriberPanicked
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seq_is_monotonic() {
        let a = Event::new(EventKind::BusStarted);
        let b = Event::new(EventKind::BusStopped);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn delay_saturates() {
        let ev = Event::new(EventKind::RejectionLimitReached).with_delay(Duration::from_secs(u64::MAX));
        assert_eq!(ev.delay_ms, Some(u32::MAX));
    }
}
