//! # Bus configuration.
//!
//! [`BusConfig`] centralizes settings for a [`MessageBus`](crate::MessageBus).
//!
//! ## Sentinel values
//! - `dispatcher_pool_size = 0` → size the scheduler to the number of dispatch tasks
//! - `event_capacity` is clamped to a minimum of 1

use std::time::Duration;

use crate::policies::{ConsumerPolicy, ErrorThresholds, JitterPolicy};

/// Global configuration for the message bus.
///
/// ## Field semantics
/// - `auto_create_channels`: unknown channels named by a subscription are created on demand
/// - `dispatcher_pool_size`: max concurrently running dispatch cycles (`0` = one per task)
/// - `channel_capacity`: capacity of auto-created channels
/// - `event_capacity`: event bus ring buffer size
/// - `grace`: how long `stop()` waits for each endpoint's in-flight messages
/// - `default_policy`: consumer policy for subscriptions/endpoints registered without one
/// - `thresholds`: error thresholds for endpoint executors registered without their own
/// - `retry_interval`: sleep between broadcast delivery rounds
/// - `jitter`: randomization of dispatcher backoff sleeps
#[derive(Clone, Debug)]
pub struct BusConfig {
    /// Create missing channels during subscription activation.
    pub auto_create_channels: bool,
    /// Scheduler concurrency (`0` = sized to the dispatch task count).
    pub dispatcher_pool_size: usize,
    /// Capacity of auto-created channels.
    pub channel_capacity: usize,
    /// Event bus capacity.
    pub event_capacity: usize,
    /// Stop grace per endpoint.
    pub grace: Duration,
    /// Default consumer policy.
    pub default_policy: ConsumerPolicy,
    /// Default error thresholds for endpoint executors.
    pub thresholds: ErrorThresholds,
    /// Sleep between broadcast rounds.
    pub retry_interval: Duration,
    /// Jitter on dispatcher backoff sleeps.
    pub jitter: JitterPolicy,
}

impl BusConfig {
    /// Returns the configured scheduler size as an `Option`.
    ///
    /// - `None` → size to the number of dispatch tasks
    /// - `Some(n)` → at most `n` cycles run at once
    #[inline]
    pub fn dispatcher_pool_limit(&self) -> Option<usize> {
        if self.dispatcher_pool_size == 0 {
            None
        } else {
            Some(self.dispatcher_pool_size)
        }
    }

    /// Returns the event capacity clamped to a minimum of 1.
    #[inline]
    pub fn event_capacity_clamped(&self) -> usize {
        self.event_capacity.max(1)
    }
}

impl Default for BusConfig {
    /// Default configuration:
    ///
    /// - `auto_create_channels = false`
    /// - `dispatcher_pool_size = 0` (one slot per dispatch task)
    /// - `channel_capacity = 1024`, `event_capacity = 1024`
    /// - `grace = 30s`
    /// - `retry_interval = 1s`, `jitter = None`
    /// - thresholds disabled
    fn default() -> Self {
        Self {
            auto_create_channels: false,
            dispatcher_pool_size: 0,
            channel_capacity: 1024,
            event_capacity: 1024,
            grace: Duration::from_secs(30),
            default_policy: ConsumerPolicy::default(),
            thresholds: ErrorThresholds::disabled(),
            retry_interval: Duration::from_secs(1),
            jitter: JitterPolicy::None,
        }
    }
}
