//! # Subscription record.

use crate::policies::ConsumerPolicy;

/// Binds a channel to an endpoint under a consumer policy.
///
/// `policy = None` inherits the endpoint's registration policy, then the bus default.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Subscription {
    /// Channel name.
    pub channel: String,
    /// Endpoint name.
    pub endpoint: String,
    /// Explicit policy, if any.
    pub policy: Option<ConsumerPolicy>,
}

impl Subscription {
    /// Creates a subscription inheriting the default policy.
    pub fn new(channel: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            endpoint: endpoint.into(),
            policy: None,
        }
    }

    /// Sets an explicit policy.
    #[must_use]
    pub fn with_policy(mut self, policy: ConsumerPolicy) -> Self {
        self.policy = Some(policy);
        self
    }
}
