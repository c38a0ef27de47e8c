//! Consumer, retry and failure-threshold policies.
//!
//! This module groups the knobs that control **how often** a channel is polled,
//! **how hard** the dispatcher retries a saturated target, and **when** an
//! endpoint's worker pool gives up.
//!
//! ## Contents
//! - [`ConsumerPolicy`] polling schedule, batch size, pool bounds, rejection budget
//! - [`RetryPolicy`]    per-attempt (unicast) vs. per-round (broadcast) backoff
//! - [`ErrorThresholds`] successive/total failure ceilings for a worker pool
//! - [`JitterPolicy`]   randomization applied to backoff sleeps
//!
//! ## Quick wiring
//! ```text
//! Subscription { channel, endpoint, policy: Option<ConsumerPolicy> }
//!      └─► MessageBus::activate_subscription:
//!           - policy.period / fixed_rate / initial_delay → Scheduler
//!           - policy.max_messages_per_poll / receive_timeout → ChannelPollingRetriever
//!           - RetryPolicy::for_channel(policy, ...) → Dispatcher
//!           - policy.concurrency / max_concurrency + ErrorThresholds → WorkerPoolExecutor
//! ```
//!
//! ## Defaults
//! - `ConsumerPolicy::default()` → period=5ms, receive_timeout=1s, batch=1,
//!   concurrency=1..10, rejection_limit=5, rejection_wait=1s, fail_on_limit=true.
//! - `ErrorThresholds::default()` → both disabled.
//! - `JitterPolicy::None` by default.

mod consumer;
mod jitter;
mod retry;
mod threshold;

pub use consumer::ConsumerPolicy;
pub use jitter::JitterPolicy;
pub use retry::RetryPolicy;
pub use threshold::ErrorThresholds;
