//! # Hooked worker pool.
//!
//! [`WorkerPool`] runs submitted futures as tokio tasks, at most `capacity` at
//! a time. There is no queue: a submission either gets a free slot right away
//! or is refused with [`SubmitError::Rejected`]. Backpressure is therefore
//! visible to the dispatcher immediately.
//!
//! Every finished task is reported to a [`CompletionHook`]; the hook decides
//! whether the pool must shut down.
//!
//! ## States
//! ```text
//!  Idle ──start()──► Running ──stop()──────► Stopped ──start()──► Running
//!                       │
//!                       └──shutdown_now()──► Shutdown ──start()──► Running
//! ```
//! - `stop()` refuses new work and waits for in-flight tasks.
//! - `shutdown_now()` refuses new work and interrupts in-flight tasks.
//! - `start()` always begins a fresh generation (new slots, tracker, token).
//!
//! ## Failure containment
//! Handler errors and panics are caught inside the task and only reach the
//! hook; the submitting side never sees them.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::FutureExt;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::error::{HandlerError, SubmitError};

/// What the pool should do after a task completes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HookVerdict {
    /// Keep accepting work.
    Continue,
    /// Shut down abruptly, interrupting running tasks.
    Shutdown {
        /// Why the pool is shutting down.
        reason: String,
    },
}

/// Observer of task outcomes.
pub trait CompletionHook: Send + Sync + 'static {
    /// Called once per finished task with the job id given at submission.
    ///
    /// Interrupted tasks report `Err(HandlerError::Canceled)`.
    fn on_complete(&self, job_id: u64, outcome: &Result<(), HandlerError>) -> HookVerdict;

    /// Called once when a [`HookVerdict::Shutdown`] actually shut the pool down.
    fn on_shutdown(&self, _reason: &str) {}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Idle,
    Running,
    Stopped,
    Shutdown,
}

struct Generation {
    slots: Arc<Semaphore>,
    tracker: TaskTracker,
    token: CancellationToken,
}

impl Generation {
    fn new(capacity: usize) -> Self {
        Self {
            slots: Arc::new(Semaphore::new(capacity)),
            tracker: TaskTracker::new(),
            token: CancellationToken::new(),
        }
    }
}

struct State {
    phase: Phase,
    generation: Generation,
}

struct Inner {
    capacity: usize,
    hook: Arc<dyn CompletionHook>,
    state: Mutex<State>,
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn shutdown_now(&self) -> bool {
        let mut st = self.state();
        if st.phase == Phase::Shutdown {
            return false;
        }
        st.phase = Phase::Shutdown;
        st.generation.tracker.close();
        st.generation.token.cancel();
        true
    }
}

/// Bounded, hook-driven pool of tokio tasks.
#[derive(Clone)]
pub struct WorkerPool {
    inner: Arc<Inner>,
}

impl WorkerPool {
    /// Creates an idle pool; call [`WorkerPool::start`] before submitting.
    ///
    /// Capacity is clamped to a minimum of 1.
    pub fn new(capacity: usize, hook: Arc<dyn CompletionHook>) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Arc::new(Inner {
                capacity,
                hook,
                state: Mutex::new(State {
                    phase: Phase::Idle,
                    generation: Generation::new(capacity),
                }),
            }),
        }
    }

    /// Maximum number of concurrently running tasks.
    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    /// Starts a fresh generation. No-op while already running.
    pub fn start(&self) {
        let mut st = self.inner.state();
        if st.phase == Phase::Running {
            return;
        }
        st.generation = Generation::new(self.inner.capacity);
        st.phase = Phase::Running;
    }

    /// Refuses new work and waits for in-flight tasks of the current generation.
    pub async fn stop(&self) {
        let tracker = {
            let mut st = self.inner.state();
            if st.phase == Phase::Running {
                st.phase = Phase::Stopped;
            }
            st.generation.tracker.close();
            st.generation.tracker.clone()
        };
        tracker.wait().await;
    }

    /// Refuses new work and interrupts running tasks.
    ///
    /// Returns `true` if this call performed the transition.
    pub fn shutdown_now(&self) -> bool {
        self.inner.shutdown_now()
    }

    /// True while submissions are accepted.
    pub fn is_running(&self) -> bool {
        self.inner.state().phase == Phase::Running
    }

    /// True after an abrupt shutdown, until the next [`WorkerPool::start`].
    pub fn is_shutdown(&self) -> bool {
        self.inner.state().phase == Phase::Shutdown
    }

    /// Number of tasks currently occupying a slot.
    pub fn active_count(&self) -> usize {
        let st = self.inner.state();
        self.inner.capacity - st.generation.slots.available_permits()
    }

    /// Hands `fut` to a free worker slot, or refuses it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit<F>(&self, job_id: u64, fut: F) -> Result<(), SubmitError>
    where
        F: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        let st = self.inner.state();
        if st.phase != Phase::Running {
            return Err(SubmitError::NotRunning);
        }
        let permit = Arc::clone(&st.generation.slots)
            .try_acquire_owned()
            .map_err(|_| SubmitError::Rejected)?;
        let token = st.generation.token.clone();
        let inner = Arc::clone(&self.inner);

        st.generation.tracker.spawn(async move {
            let outcome = tokio::select! {
                _ = token.cancelled() => Err(HandlerError::Canceled),
                res = AssertUnwindSafe(fut).catch_unwind() => match res {
                    Ok(outcome) => outcome,
                    Err(panic) => Err(HandlerError::fail(panic_message(panic.as_ref()))),
                },
            };

            if let HookVerdict::Shutdown { reason } = inner.hook.on_complete(job_id, &outcome) {
                if inner.shutdown_now() {
                    inner.hook.on_shutdown(&reason);
                }
            }
            drop(permit);
        });
        Ok(())
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("panic: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("panic: {s}")
    } else {
        "panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;

    #[derive(Default)]
    struct Counting {
        ok: AtomicUsize,
        failed: AtomicUsize,
        canceled: AtomicUsize,
        shutdown_on_failure: bool,
    }

    impl CompletionHook for Counting {
        fn on_complete(&self, _job: u64, outcome: &Result<(), HandlerError>) -> HookVerdict {
            match outcome {
                Ok(()) => {
                    self.ok.fetch_add(1, Ordering::SeqCst);
                }
                Err(HandlerError::Canceled) => {
                    self.canceled.fetch_add(1, Ordering::SeqCst);
                }
                Err(_) => {
                    self.failed.fetch_add(1, Ordering::SeqCst);
                    if self.shutdown_on_failure {
                        return HookVerdict::Shutdown {
                            reason: "failure".into(),
                        };
                    }
                }
            }
            HookVerdict::Continue
        }
    }

    #[tokio::test]
    async fn full_pool_rejects_without_queueing() {
        let hook = Arc::new(Counting::default());
        let pool = WorkerPool::new(1, hook.clone());
        assert_eq!(pool.submit(1, async { Ok(()) }), Err(SubmitError::NotRunning));

        pool.start();
        let gate = Arc::new(Notify::new());
        let g = gate.clone();
        pool.submit(1, async move {
            g.notified().await;
            Ok(())
        })
        .unwrap();
        assert_eq!(pool.active_count(), 1);
        assert_eq!(pool.submit(2, async { Ok(()) }), Err(SubmitError::Rejected));

        gate.notify_one();
        pool.stop().await;
        assert_eq!(hook.ok.load(Ordering::SeqCst), 1);
        assert!(!pool.is_running());
        assert_eq!(pool.submit(3, async { Ok(()) }), Err(SubmitError::NotRunning));
    }

    #[tokio::test]
    async fn panics_are_contained_and_reported_as_failures() {
        let hook = Arc::new(Counting::default());
        let pool = WorkerPool::new(2, hook.clone());
        pool.start();
        pool.submit(1, async {
            if true {
                panic!("kaboom");
            }
            Ok(())
        })
        .unwrap();
        pool.stop().await;
        assert_eq!(hook.failed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn shutdown_verdict_interrupts_running_tasks() {
        let hook = Arc::new(Counting {
            shutdown_on_failure: true,
            ..Default::default()
        });
        let pool = WorkerPool::new(2, hook.clone());
        pool.start();

        pool.submit(1, async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(())
        })
        .unwrap();
        pool.submit(2, async { Err(HandlerError::fail("bad")) }).unwrap();

        tokio::time::timeout(Duration::from_secs(5), pool.stop())
            .await
            .unwrap();
        assert!(pool.is_shutdown());
        assert_eq!(hook.failed.load(Ordering::SeqCst), 1);
        assert_eq!(hook.canceled.load(Ordering::SeqCst), 1);

        pool.start();
        assert!(pool.is_running());
        assert!(!pool.is_shutdown());
    }
}
