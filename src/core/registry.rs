//! # Wiring registry.
//!
//! Plain maps of channels, endpoint executors and per-channel dispatchers.
//! Owned by [`MessageBus`](crate::MessageBus) behind a mutex; every method is
//! synchronous and never awaits while the lock is held.
//!
//! ## Rules
//! - One dispatcher per channel, created by the first subscription on it and
//!   configured by that subscription's policy.
//! - Later subscriptions on the same channel add their executor as another target.
//! - `members` remembers which executors belong to a dispatcher, so they can be
//!   re-attached after a dispatcher dropped them as not-running.

use std::collections::HashMap;
use std::sync::Arc;

use crate::channels::ChannelRef;
use crate::core::subscription::Subscription;
use crate::dispatch::{Dispatcher, TargetRef};
use crate::executor::WorkerPoolExecutor;
use crate::policies::ConsumerPolicy;

/// Registered endpoint: its executor plus the policy it was registered with.
pub(crate) struct EndpointEntry {
    pub(crate) executor: Arc<WorkerPoolExecutor>,
    pub(crate) policy: Option<ConsumerPolicy>,
}

/// Dispatcher bound to one channel.
pub(crate) struct ChannelDispatch {
    pub(crate) dispatcher: Arc<Dispatcher>,
    pub(crate) policy: ConsumerPolicy,
    pub(crate) members: Vec<String>,
}

#[derive(Default)]
pub(crate) struct Registry {
    pub(crate) channels: HashMap<String, ChannelRef>,
    pub(crate) endpoints: HashMap<String, EndpointEntry>,
    pub(crate) dispatchers: HashMap<String, ChannelDispatch>,
    pub(crate) subscriptions: Vec<Subscription>,
}

impl Registry {
    /// Every executor, in no particular order.
    pub(crate) fn executors(&self) -> Vec<Arc<WorkerPoolExecutor>> {
        self.endpoints
            .values()
            .map(|e| Arc::clone(&e.executor))
            .collect()
    }

    /// Adds back every member executor its dispatcher no longer lists.
    pub(crate) fn reattach_all(&self) {
        for cd in self.dispatchers.values() {
            for name in &cd.members {
                if let Some(entry) = self.endpoints.get(name) {
                    let target: TargetRef = entry.executor.clone();
                    cd.dispatcher.add_target(target);
                }
            }
        }
    }

    /// Detaches an endpoint from every dispatcher and forgets it.
    pub(crate) fn remove_endpoint(&mut self, name: &str) -> Option<Arc<WorkerPoolExecutor>> {
        let entry = self.endpoints.remove(name)?;
        for cd in self.dispatchers.values_mut() {
            cd.members.retain(|m| m != name);
            cd.dispatcher.remove_target(name);
        }
        self.subscriptions.retain(|s| s.endpoint != name);
        Some(entry.executor)
    }
}
