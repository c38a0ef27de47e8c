//! # Dispatch targets.
//!
//! A [`Target`] is anything a dispatcher can hand a message to. Submission is
//! synchronous: it either takes the message (the work continues elsewhere) or
//! says why not, right away.

use std::sync::Arc;

use crate::error::SubmitError;
use crate::message::Message;

/// Shared handle to a target.
pub type TargetRef = Arc<dyn Target>;

/// Something that accepts messages for asynchronous processing.
pub trait Target: Send + Sync + 'static {
    /// Stable name (used in events).
    fn name(&self) -> &str;

    /// Whether the target takes work at all.
    fn is_running(&self) -> bool;

    /// Offers a message.
    ///
    /// - `Ok(())` → taken; processing outcome is the target's business
    /// - `Err(SubmitError::Rejected)` → saturated, worth retrying
    /// - `Err(SubmitError::NotRunning)` → stopped, should be removed
    /// - `Err(SubmitError::SelectorRejected)` → not interested in this message
    fn submit(&self, message: Message) -> Result<(), SubmitError>;
}
