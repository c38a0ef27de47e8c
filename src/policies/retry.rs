//! # Dispatcher retry policies.
//!
//! Two backoff shapes:
//!
//! ```text
//! PerAttempt (unicast, point-to-point):
//!   submit ─► Rejected ─► attempts += 1 ─► retry same target
//!                          └─ attempts == rejection_limit ─► reset, sleep rejection_wait,
//!                                                            move on to next target
//!
//! PerRound (broadcast, publish-subscribe):
//!   round k: offer to every remaining target
//!            ├─ all accepted / filtered ─► success
//!            └─ some rejected ─► sleep retry_interval, round k+1
//!   rounds exhausted ─► DeliveryExhausted (fail_on_limit) or drop
//! ```

use std::time::Duration;

use crate::channels::DispatchPolicy;
use crate::policies::consumer::ConsumerPolicy;

/// Backoff behaviour of a dispatcher when targets reject submissions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RetryPolicy {
    /// Count rejections per target scan; sleep after each full burst.
    PerAttempt {
        /// Rejections tolerated before sleeping and moving on.
        rejection_limit: u32,
        /// Sleep after the limit is reached.
        rejection_wait: Duration,
    },
    /// Offer in rounds; sleep between rounds.
    PerRound {
        /// Maximum number of rounds.
        rejection_limit: u32,
        /// Sleep before each round after the first.
        retry_interval: Duration,
        /// Exhausted rounds abort the cycle with an error.
        fail_on_limit: bool,
    },
}

impl RetryPolicy {
    /// Derives the retry policy for a channel from the consumer policy that
    /// created its dispatcher.
    ///
    /// Point-to-point channels use [`RetryPolicy::PerAttempt`]; publish-subscribe
    /// channels use [`RetryPolicy::PerRound`] with `retry_interval` between rounds.
    pub fn for_channel(
        policy: &ConsumerPolicy,
        dispatch: DispatchPolicy,
        retry_interval: Duration,
    ) -> Self {
        match dispatch {
            DispatchPolicy::PointToPoint => RetryPolicy::PerAttempt {
                rejection_limit: policy.rejection_limit.max(1),
                rejection_wait: policy.rejection_wait,
            },
            DispatchPolicy::PublishSubscribe => RetryPolicy::PerRound {
                rejection_limit: policy.rejection_limit.max(1),
                retry_interval,
                fail_on_limit: policy.fail_on_rejection_limit,
            },
        }
    }

    /// Configured rejection budget.
    #[inline]
    pub fn rejection_limit(&self) -> u32 {
        match self {
            RetryPolicy::PerAttempt {
                rejection_limit, ..
            }
            | RetryPolicy::PerRound {
                rejection_limit, ..
            } => *rejection_limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_policy_selects_backoff_shape() {
        let p = ConsumerPolicy::default()
            .with_rejection_limit(3, Duration::from_millis(7))
            .with_fail_on_rejection_limit(false);

        assert_eq!(
            RetryPolicy::for_channel(&p, DispatchPolicy::PointToPoint, Duration::from_secs(1)),
            RetryPolicy::PerAttempt {
                rejection_limit: 3,
                rejection_wait: Duration::from_millis(7),
            }
        );
        assert_eq!(
            RetryPolicy::for_channel(&p, DispatchPolicy::PublishSubscribe, Duration::from_millis(9)),
            RetryPolicy::PerRound {
                rejection_limit: 3,
                retry_interval: Duration::from_millis(9),
                fail_on_limit: false,
            }
        );
    }
}
