//! # Endpoint executor.
//!
//! [`WorkerPoolExecutor`] binds one [`Endpoint`](crate::Endpoint) to its own
//! [`WorkerPool`] and tracks failures against [`ErrorThresholds`]. Once an
//! enabled threshold is exceeded the pool shuts down abruptly and every later
//! submission is refused until [`WorkerPoolExecutor::start`].

use std::sync::Arc;

use crate::dispatch::Target;
use crate::endpoints::EndpointRef;
use crate::error::{HandlerError, SubmitError};
use crate::events::{Event, EventBus, EventKind};
use crate::executor::counter::ErrorCounter;
use crate::executor::pool::{CompletionHook, HookVerdict, WorkerPool};
use crate::message::Message;
use crate::policies::ErrorThresholds;

/// Completion hook feeding the error counters.
struct ThresholdHook {
    endpoint: Arc<str>,
    counter: Arc<ErrorCounter>,
    thresholds: ErrorThresholds,
    bus: EventBus,
}

impl CompletionHook for ThresholdHook {
    fn on_complete(&self, job_id: u64, outcome: &Result<(), HandlerError>) -> HookVerdict {
        let err = match outcome {
            Ok(()) => {
                self.counter.record_success();
                return HookVerdict::Continue;
            }
            Err(e) if !e.counts_as_failure() => return HookVerdict::Continue,
            Err(e) => e,
        };

        let (successive, total) = self.counter.record_failure();
        self.bus.publish(
            Event::new(EventKind::TaskFailed)
                .with_endpoint(Arc::clone(&self.endpoint))
                .with_message(job_id)
                .with_count(total)
                .with_reason(err.as_message()),
        );

        if !self.thresholds.is_breached(successive, total) {
            return HookVerdict::Continue;
        }
        let reason = match self.thresholds.successive_limit() {
            Some(k) if successive > k => format!("successive failures {successive} > {k}"),
            _ => format!(
                "total failures {total} > {}",
                self.thresholds.total_limit().unwrap_or_default()
            ),
        };
        HookVerdict::Shutdown { reason }
    }

    fn on_shutdown(&self, reason: &str) {
        self.bus.publish(
            Event::new(EventKind::ExecutorShutdown)
                .with_endpoint(Arc::clone(&self.endpoint))
                .with_reason(reason),
        );
    }
}

/// One endpoint plus its dedicated worker pool.
pub struct WorkerPoolExecutor {
    name: Arc<str>,
    endpoint: EndpointRef,
    pool: WorkerPool,
    counter: Arc<ErrorCounter>,
}

impl WorkerPoolExecutor {
    /// Creates a stopped executor with room for `capacity` concurrent messages.
    pub fn new(
        name: impl Into<Arc<str>>,
        endpoint: EndpointRef,
        capacity: usize,
        thresholds: ErrorThresholds,
        bus: EventBus,
    ) -> Self {
        let name = name.into();
        let counter = Arc::new(ErrorCounter::new());
        let hook = Arc::new(ThresholdHook {
            endpoint: Arc::clone(&name),
            counter: Arc::clone(&counter),
            thresholds,
            bus,
        });
        Self {
            name,
            endpoint,
            pool: WorkerPool::new(capacity, hook),
            counter,
        }
    }

    /// Starts (or restarts) the pool; clears shutdown state and the successive counter.
    pub fn start(&self) {
        if !self.pool.is_running() {
            self.counter.reset_successive();
        }
        self.pool.start();
    }

    /// Refuses new messages and waits for in-flight ones.
    pub async fn stop(&self) {
        self.pool.stop().await;
    }

    /// Refuses new messages and interrupts in-flight ones.
    pub fn shutdown_now(&self) -> bool {
        self.pool.shutdown_now()
    }

    /// True after a threshold-triggered (or forced) shutdown.
    pub fn is_shutdown(&self) -> bool {
        self.pool.is_shutdown()
    }

    /// Messages currently being handled.
    pub fn active_count(&self) -> usize {
        self.pool.active_count()
    }

    /// Pool capacity.
    pub fn capacity(&self) -> usize {
        self.pool.capacity()
    }

    /// Current `(successive, total)` failure counts.
    pub fn error_counts(&self) -> (u64, u64) {
        self.counter.snapshot()
    }

    /// The wrapped endpoint.
    pub fn endpoint(&self) -> &EndpointRef {
        &self.endpoint
    }
}

impl Target for WorkerPoolExecutor {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_running(&self) -> bool {
        self.pool.is_running() && self.endpoint.is_running()
    }

    fn submit(&self, message: Message) -> Result<(), SubmitError> {
        if !self.is_running() {
            return Err(SubmitError::NotRunning);
        }
        if !self.endpoint.accepts(&message) {
            return Err(SubmitError::SelectorRejected);
        }
        let endpoint = Arc::clone(&self.endpoint);
        let id = message.id();
        self.pool
            .submit(id, async move { endpoint.handle(message).await })
    }
}
