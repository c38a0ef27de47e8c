//! Error types used by the dispatch engine.
//!
//! This module defines the error enums surfaced by the crate:
//!
//! - [`ConfigError`]: registration/activation problems (unknown channel, bad policy).
//! - [`DispatchError`]: a dispatch cycle aborted (delivery budget exhausted).
//! - [`SubmitError`]: a target refused a message (saturated, stopped or filtered).
//! - [`HandlerError`]: an endpoint failed while handling a message.
//! - [`RuntimeError`]: lifecycle failures of the bus itself.
//!
//! Every type provides `as_label` (stable snake_case, for logs/metrics) and
//! `as_message` helpers.

use std::time::Duration;
use thiserror::Error;

/// # Errors raised while wiring channels, endpoints and subscriptions.
///
/// Only these (and [`DispatchError`]) ever reach the caller of the registration
/// or dispatch API; everything else is contained and reported as events.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Subscription references a channel that is not registered and
    /// auto-creation is disabled.
    #[error(
        "cannot activate subscription, unknown channel '{name}'; consider enabling 'auto_create_channels'"
    )]
    UnknownChannel {
        /// Channel name used by the subscription.
        name: String,
    },

    /// Subscription references an endpoint that is not registered.
    #[error("cannot activate subscription, unknown endpoint '{name}'")]
    UnknownEndpoint {
        /// Endpoint name used by the subscription.
        name: String,
    },

    /// A channel with this name is already registered.
    #[error("channel '{name}' is already registered")]
    DuplicateChannel {
        /// Conflicting channel name.
        name: String,
    },

    /// An endpoint with this name is already registered.
    #[error("endpoint '{name}' is already registered")]
    DuplicateEndpoint {
        /// Conflicting endpoint name.
        name: String,
    },

    /// A consumer policy value is out of range.
    #[error("invalid consumer policy: {reason}")]
    InvalidPolicy {
        /// What is wrong with the policy.
        reason: String,
    },
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use dispatchvisor::ConfigError;
    ///
    /// let err = ConfigError::UnknownChannel { name: "orders".into() };
    /// assert_eq!(err.as_label(), "config_unknown_channel");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::UnknownChannel { .. } => "config_unknown_channel",
            ConfigError::UnknownEndpoint { .. } => "config_unknown_endpoint",
            ConfigError::DuplicateChannel { .. } => "config_duplicate_channel",
            ConfigError::DuplicateEndpoint { .. } => "config_duplicate_endpoint",
            ConfigError::InvalidPolicy { .. } => "config_invalid_policy",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            ConfigError::UnknownChannel { name } => format!("unknown channel: {name}"),
            ConfigError::UnknownEndpoint { name } => format!("unknown endpoint: {name}"),
            ConfigError::DuplicateChannel { name } => format!("duplicate channel: {name}"),
            ConfigError::DuplicateEndpoint { name } => format!("duplicate endpoint: {name}"),
            ConfigError::InvalidPolicy { reason } => format!("invalid policy: {reason}"),
        }
    }
}

/// # Errors that abort a whole dispatch cycle.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// Round-based delivery ran out of its rejection budget and the policy
    /// asks for a hard failure.
    #[error("message {message_id} could not be delivered after {rounds} rounds")]
    DeliveryExhausted {
        /// Id of the message that could not be delivered.
        message_id: u64,
        /// Number of rounds attempted.
        rounds: u32,
    },
}

impl DispatchError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            DispatchError::DeliveryExhausted { .. } => "dispatch_delivery_exhausted",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            DispatchError::DeliveryExhausted { message_id, rounds } => {
                format!("delivery exhausted: message={message_id} rounds={rounds}")
            }
        }
    }
}

/// # Reasons a target refused a message at submission time.
///
/// `Rejected` is transient backpressure and is what the dispatcher's retry
/// policies count. The other variants are skipped without counting.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    /// No idle worker and the pool is at its maximum.
    #[error("rejected: worker pool saturated")]
    Rejected,

    /// The target is stopped or was shut down by an error threshold.
    #[error("target is not running")]
    NotRunning,

    /// The endpoint's selector does not accept this message.
    #[error("message rejected by selector")]
    SelectorRejected,

    /// The target failed while taking the message.
    #[error("target failed: {error}")]
    Failed {
        /// The underlying error message.
        error: String,
    },
}

impl SubmitError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            SubmitError::Rejected => "submit_rejected",
            SubmitError::NotRunning => "submit_not_running",
            SubmitError::SelectorRejected => "submit_selector_rejected",
            SubmitError::Failed { .. } => "submit_failed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            SubmitError::Rejected => "pool saturated".to_string(),
            SubmitError::NotRunning => "not running".to_string(),
            SubmitError::SelectorRejected => "selector rejected".to_string(),
            SubmitError::Failed { error } => format!("error: {error}"),
        }
    }
}

/// # Errors produced by endpoint handlers.
///
/// These never reach the dispatching side; the worker pool records them
/// against the endpoint's error thresholds.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandlerError {
    /// Handling failed.
    #[error("handler failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Handler observed cancellation and gave up.
    #[error("handler cancelled")]
    Canceled,
}

impl HandlerError {
    /// Shorthand for [`HandlerError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        HandlerError::Fail {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use dispatchvisor::HandlerError;
    ///
    /// assert_eq!(HandlerError::fail("boom").as_label(), "handler_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            HandlerError::Fail { .. } => "handler_failed",
            HandlerError::Canceled => "handler_canceled",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            HandlerError::Fail { error } => format!("error: {error}"),
            HandlerError::Canceled => "cancelled".to_string(),
        }
    }

    /// Whether this outcome counts against the endpoint's error thresholds.
    pub fn counts_as_failure(&self) -> bool {
        matches!(self, HandlerError::Fail { .. })
    }
}

/// # Errors produced by the bus runtime.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Some worker pools did not drain within the grace period and were shut down abruptly.
    #[error("stop grace {grace:?} exceeded; stuck endpoints: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Endpoints whose in-flight tasks were interrupted.
        stuck: Vec<String>,
    },

    /// OS signal listeners could not be installed.
    #[error("failed to install signal handlers: {0}")]
    Signal(#[from] std::io::Error),
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
            RuntimeError::Signal(_) => "runtime_signal",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::GraceExceeded { grace, stuck } => {
                format!("grace exceeded after {grace:?}; stuck endpoints={stuck:?}")
            }
            RuntimeError::Signal(e) => format!("signal: {e}"),
        }
    }
}
