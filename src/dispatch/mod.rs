//! Retrieval and dispatch: moving messages from a channel to targets.
//!
//! ## Contents
//! - [`MessageRetriever`] / [`ChannelPollingRetriever`] bounded batch retrieval
//! - [`Target`] / [`TargetRef`] what a dispatcher hands messages to
//! - [`TargetList`] copy-on-write target registry (snapshot per pass)
//! - [`Dispatch`] / [`Dispatcher`] / [`DispatchMode`] unicast and broadcast delivery
//!
//! ## One cycle
//! ```text
//! Dispatcher::dispatch()
//!   ├─ no targets?            ─► Ok(0) (nothing retrieved)
//!   ├─ retriever.retrieve()   ─► [m1, m2, ...] (≤ max_messages_per_poll; cut short on cancel)
//!   └─ for each message, in retrieval order:
//!        dispatch_message(m)
//!          ├─ Unicast   ─► first target that accepts
//!          └─ Broadcast ─► every running, interested target
//!        backoff per RetryPolicy (PerAttempt / PerRound)
//! ```

mod dispatcher;
mod retriever;
mod target;
mod targets;

pub use dispatcher::{Dispatch, DispatchMode, Dispatcher};
pub use retriever::{ChannelPollingRetriever, MessageRetriever};
pub use target::{Target, TargetRef};
pub use targets::TargetList;
