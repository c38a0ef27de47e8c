//! # Consumer policy for a subscription.
//!
//! [`ConsumerPolicy`] is an immutable value describing how one subscription
//! consumes its channel. It is fixed once the subscription is activated.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use dispatchvisor::ConsumerPolicy;
//!
//! let policy = ConsumerPolicy::default()
//!     .with_period(Duration::from_millis(50))
//!     .with_max_messages_per_poll(10)
//!     .with_concurrency(2, 8);
//!
//! assert!(policy.validate().is_ok());
//! assert_eq!(policy.pool_capacity(), 8);
//! ```

use std::time::Duration;

use crate::error::ConfigError;

/// Per-subscription polling, batching, concurrency and rejection settings.
///
/// ## Field semantics
/// - `period`: poll interval (`0` = continuous polling loop)
/// - `receive_timeout`: bound for one receive (`0` = non-blocking poll)
/// - `max_messages_per_poll`: batch bound per cycle (≥ 1)
/// - `concurrency` / `max_concurrency`: worker-pool bounds (≥ 1)
/// - `rejection_limit`: attempts (unicast) or rounds (broadcast) before giving up (≥ 1)
/// - `rejection_wait`: sleep after a unicast retry burst
/// - `fail_on_rejection_limit`: exhausted round budget aborts the cycle
/// - `fixed_rate`: fixed-rate vs fixed-delay scheduling
/// - `initial_delay`: delay before the first cycle
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConsumerPolicy {
    /// Poll interval.
    pub period: Duration,
    /// Per-receive wait bound.
    pub receive_timeout: Duration,
    /// Maximum messages retrieved per cycle.
    pub max_messages_per_poll: usize,
    /// Core worker count.
    pub concurrency: usize,
    /// Maximum worker count.
    pub max_concurrency: usize,
    /// Rejection budget (attempts or rounds).
    pub rejection_limit: u32,
    /// Sleep after a rejection burst.
    pub rejection_wait: Duration,
    /// Whether an exhausted round budget is a hard failure.
    pub fail_on_rejection_limit: bool,
    /// Fixed-rate (`true`) or fixed-delay (`false`) scheduling.
    pub fixed_rate: bool,
    /// Delay before the first cycle.
    pub initial_delay: Duration,
}

impl Default for ConsumerPolicy {
    fn default() -> Self {
        Self {
            period: Duration::from_millis(5),
            receive_timeout: Duration::from_secs(1),
            max_messages_per_poll: 1,
            concurrency: 1,
            max_concurrency: 10,
            rejection_limit: 5,
            rejection_wait: Duration::from_secs(1),
            fail_on_rejection_limit: true,
            fixed_rate: false,
            initial_delay: Duration::ZERO,
        }
    }
}

impl ConsumerPolicy {
    /// Sets the poll interval.
    #[must_use]
    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    /// Sets the per-receive wait bound.
    #[must_use]
    pub fn with_receive_timeout(mut self, timeout: Duration) -> Self {
        self.receive_timeout = timeout;
        self
    }

    /// Sets the batch bound per cycle.
    #[must_use]
    pub fn with_max_messages_per_poll(mut self, n: usize) -> Self {
        self.max_messages_per_poll = n;
        self
    }

    /// Sets core and maximum worker counts.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize, max_concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self.max_concurrency = max_concurrency;
        self
    }

    /// Sets the rejection budget and the wait after each exhausted burst.
    #[must_use]
    pub fn with_rejection_limit(mut self, limit: u32, wait: Duration) -> Self {
        self.rejection_limit = limit;
        self.rejection_wait = wait;
        self
    }

    /// Sets whether an exhausted round budget fails the cycle.
    #[must_use]
    pub fn with_fail_on_rejection_limit(mut self, fail: bool) -> Self {
        self.fail_on_rejection_limit = fail;
        self
    }

    /// Switches to fixed-rate scheduling.
    #[must_use]
    pub fn with_fixed_rate(mut self, fixed_rate: bool) -> Self {
        self.fixed_rate = fixed_rate;
        self
    }

    /// Sets the delay before the first cycle.
    #[must_use]
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// True when the policy polls in a tight loop with non-blocking receives.
    #[inline]
    pub fn is_busy_poll(&self) -> bool {
        self.period.is_zero() && self.receive_timeout.is_zero()
    }

    /// Worker-pool capacity: `max_concurrency`, raised to `concurrency` if lower.
    #[inline]
    pub fn pool_capacity(&self) -> usize {
        self.max_concurrency.max(self.concurrency)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: &str| {
            Err(ConfigError::InvalidPolicy {
                reason: reason.to_string(),
            })
        };
        if self.max_messages_per_poll == 0 {
            return invalid("max_messages_per_poll must be at least 1");
        }
        if self.concurrency == 0 {
            return invalid("concurrency must be at least 1");
        }
        if self.max_concurrency == 0 {
            return invalid("max_concurrency must be at least 1");
        }
        if self.rejection_limit == 0 {
            return invalid("rejection_limit must be at least 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(ConsumerPolicy::default().validate().is_ok());
    }

    #[test]
    fn zero_values_are_rejected() {
        let bad = [
            ConsumerPolicy::default().with_max_messages_per_poll(0),
            ConsumerPolicy::default().with_concurrency(0, 4),
            ConsumerPolicy::default().with_concurrency(1, 0),
            ConsumerPolicy::default().with_rejection_limit(0, Duration::ZERO),
        ];
        for p in bad {
            assert!(
                matches!(p.validate(), Err(ConfigError::InvalidPolicy { .. })),
                "{p:?} should be invalid"
            );
        }
    }

    #[test]
    fn capacity_never_below_concurrency() {
        assert_eq!(ConsumerPolicy::default().with_concurrency(4, 2).pool_capacity(), 4);
        assert_eq!(ConsumerPolicy::default().with_concurrency(1, 3).pool_capacity(), 3);
    }

    #[test]
    fn busy_poll_detection() {
        let p = ConsumerPolicy::default()
            .with_period(Duration::ZERO)
            .with_receive_timeout(Duration::ZERO);
        assert!(p.is_busy_poll());
        assert!(!p.with_receive_timeout(Duration::from_millis(1)).is_busy_poll());
    }
}
