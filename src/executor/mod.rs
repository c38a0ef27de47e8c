//! Per-endpoint execution: bounded worker pools with failure bookkeeping.
//!
//! ## Contents
//! - [`WorkerPool`] zero-capacity handoff pool over tokio tasks, with a [`CompletionHook`]
//! - [`ErrorCounter`] successive/total failure counters
//! - [`WorkerPoolExecutor`] an endpoint bound to its own pool; a dispatch [`Target`](crate::Target)
//!
//! ```text
//! Dispatcher ── submit(msg) ──► WorkerPoolExecutor
//!                                 ├─ not running?  ─► SubmitError::NotRunning
//!                                 ├─ selector no?  ─► SubmitError::SelectorRejected
//!                                 └─ WorkerPool::submit
//!                                      ├─ no free slot ─► SubmitError::Rejected
//!                                      └─ spawn ─► endpoint.handle(msg)
//!                                                   └─► hook.on_complete ─► counters
//!                                                         └─ threshold breached ─► shutdown_now()
//! ```

mod counter;
mod endpoint;
mod pool;

pub use counter::ErrorCounter;
pub use endpoint::WorkerPoolExecutor;
pub use pool::{CompletionHook, HookVerdict, WorkerPool};
