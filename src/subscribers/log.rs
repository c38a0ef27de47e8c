//! # LogWriter: renders events through `tracing`
//!
//! ## Example output (fmt subscriber)
//! ```text
//! INFO  subscription activated channel="orders" endpoint="billing"
//! WARN  rejection limit reached channel="orders" endpoint="billing" attempts=5 wait_ms=1000
//! WARN  handler failed endpoint="billing" message=42 failures=3 reason="timeout"
//! ERROR executor shut down endpoint="billing" reason="successive failures 3 > 2"
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let channel = e.channel.as_deref().unwrap_or("-");
        let endpoint = e.endpoint.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("-");

        match e.kind {
            EventKind::ChannelRegistered => tracing::debug!(channel, "channel registered"),
            EventKind::ChannelAutoCreated => tracing::info!(channel, "channel auto-created"),
            EventKind::EndpointRegistered => tracing::debug!(endpoint, "endpoint registered"),
            EventKind::EndpointRemoved => tracing::info!(endpoint, "endpoint removed"),
            EventKind::SubscriptionActivated => {
                tracing::info!(channel, endpoint, "subscription activated")
            }
            EventKind::BusyPollWarning => tracing::warn!(
                channel,
                endpoint,
                "period and receive timeout are both zero; this subscription busy-polls"
            ),
            EventKind::BusStarted => tracing::info!(tasks = e.count, "bus started"),
            EventKind::BusStopped => tracing::info!("bus stopped"),
            EventKind::ShutdownRequested => tracing::info!(signal = reason, "shutdown requested"),
            EventKind::AllStoppedWithin => tracing::info!("all endpoints drained within grace"),
            EventKind::GraceExceeded => tracing::warn!(stuck = reason, "grace exceeded"),
            EventKind::CycleFailed => tracing::error!(channel, reason, "dispatch cycle failed"),
            EventKind::MessageDropped => {
                tracing::warn!(channel, message = e.message_id, "no target accepted message")
            }
            EventKind::RejectionLimitReached => tracing::warn!(
                channel,
                endpoint,
                attempts = e.attempt,
                wait_ms = e.delay_ms,
                "rejection limit reached"
            ),
            EventKind::SubmissionFailed => {
                tracing::warn!(channel, endpoint, reason, "submission failed")
            }
            EventKind::TargetRemoved => {
                tracing::info!(channel, endpoint, "target not running; removed")
            }
            EventKind::NoActiveHandlers => {
                tracing::warn!(channel, message = e.message_id, "no active handlers")
            }
            EventKind::DeliveryExhausted => tracing::warn!(
                channel,
                message = e.message_id,
                rounds = e.attempt,
                "delivery exhausted"
            ),
            EventKind::TaskFailed => tracing::warn!(
                endpoint,
                message = e.message_id,
                failures = e.count,
                reason,
                "handler failed"
            ),
            EventKind::ExecutorShutdown => {
                tracing::error!(endpoint, reason, "executor shut down")
            }
            EventKind::SubscriberOverflow => {
                tracing::warn!(subscriber = endpoint, reason, "subscriber overflow")
            }
            EventKind::SubscriberPanicked => {
                tracing::error!(subscriber = endpoint, reason, "subscriber panicked")
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
