//! # Dispatch scheduler.
//!
//! Drives dispatcher cycles on their consumer policy's schedule. Each dispatch
//! task is one long-lived tokio task; a shared semaphore bounds how many cycles
//! run at the same time across all tasks.
//!
//! ```text
//! schedule(dispatcher, policy)
//!   └─► sleep(initial_delay)                          (cancellable)
//!       ├─ period == 0 ─► loop { cycle; yield }                     continuous
//!       ├─ fixed_rate  ─► interval(period) { tick; cycle }          fixed-rate
//!       └─ otherwise   ─► loop { cycle; sleep(period) }             fixed-delay
//!
//! cycle: acquire slot (cancellable) ─► dispatcher.dispatch()
//!          └─ Err ─► CycleFailed event; the schedule continues
//! ```
//!
//! Cancellation interrupts slot waits, schedule sleeps, retrieval and
//! dispatcher backoff; `shutdown()` then joins every task.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::dispatch::{Dispatch, Dispatcher};
use crate::events::{Event, EventBus, EventKind};
use crate::policies::ConsumerPolicy;

/// Pause of a continuous loop whose dispatcher has no targets left.
const IDLE_PAUSE: Duration = Duration::from_millis(10);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Cadence {
    Continuous,
    FixedRate(Duration),
    FixedDelay(Duration),
}

impl Cadence {
    fn of(policy: &ConsumerPolicy) -> Self {
        if policy.period.is_zero() {
            Cadence::Continuous
        } else if policy.fixed_rate {
            Cadence::FixedRate(policy.period)
        } else {
            Cadence::FixedDelay(policy.period)
        }
    }
}

/// One run of scheduled dispatch tasks (created on bus start, consumed on stop).
pub(crate) struct Scheduler {
    token: CancellationToken,
    slots: Arc<Semaphore>,
    auto_sized: bool,
    tracker: TaskTracker,
    bus: EventBus,
}

impl Scheduler {
    /// `limit = None` sizes the slot pool to the number of scheduled tasks.
    pub(crate) fn new(limit: Option<usize>, bus: EventBus) -> Self {
        Self {
            token: CancellationToken::new(),
            slots: Arc::new(Semaphore::new(limit.unwrap_or(0))),
            auto_sized: limit.is_none(),
            tracker: TaskTracker::new(),
            bus,
        }
    }

    /// Spawns the dispatch task for `dispatcher`.
    pub(crate) fn schedule(&self, dispatcher: Arc<Dispatcher>, policy: &ConsumerPolicy) {
        if self.auto_sized {
            self.slots.add_permits(1);
        }
        dispatcher.set_cancellation(self.token.child_token());

        let task = DispatchTask {
            dispatcher,
            cadence: Cadence::of(policy),
            initial_delay: policy.initial_delay,
            slots: Arc::clone(&self.slots),
            token: self.token.clone(),
            bus: self.bus.clone(),
        };
        self.tracker.spawn(task.run());
    }

    /// Cancels every task and waits up to `grace` for them to exit.
    ///
    /// Returns `false` if some task was still running when `grace` elapsed.
    pub(crate) async fn shutdown(self, grace: Duration) -> bool {
        self.token.cancel();
        self.slots.close();
        self.tracker.close();
        time::timeout(grace, self.tracker.wait()).await.is_ok()
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

struct DispatchTask {
    dispatcher: Arc<Dispatcher>,
    cadence: Cadence,
    initial_delay: Duration,
    slots: Arc<Semaphore>,
    token: CancellationToken,
    bus: EventBus,
}

impl DispatchTask {
    async fn run(self) {
        if !self.initial_delay.is_zero() && !self.pause(self.initial_delay).await {
            return;
        }

        match self.cadence {
            Cadence::Continuous => {
                while !self.token.is_cancelled() {
                    self.cycle().await;
                    if self.dispatcher.targets().is_empty() {
                        if !self.pause(IDLE_PAUSE).await {
                            return;
                        }
                    } else {
                        tokio::task::yield_now().await;
                    }
                }
            }
            Cadence::FixedRate(period) => {
                let mut ticks = time::interval_at(Instant::now(), period);
                ticks.set_missed_tick_behavior(MissedTickBehavior::Burst);
                loop {
                    tokio::select! {
                        _ = self.token.cancelled() => return,
                        _ = ticks.tick() => {}
                    }
                    self.cycle().await;
                }
            }
            Cadence::FixedDelay(period) => loop {
                self.cycle().await;
                if !self.pause(period).await {
                    return;
                }
            },
        }
    }

    /// Runs one dispatch cycle inside a scheduler slot.
    async fn cycle(&self) {
        let _slot = tokio::select! {
            _ = self.token.cancelled() => return,
            slot = Arc::clone(&self.slots).acquire_owned() => match slot {
                Ok(slot) => slot,
                Err(_) => return,
            },
        };
        if let Err(e) = self.dispatcher.dispatch().await {
            self.bus.publish(
                Event::new(EventKind::CycleFailed)
                    .with_channel(self.dispatcher.channel())
                    .with_reason(e.as_message()),
            );
        }
    }

    /// Sleeps unless cancelled first. Returns `false` on cancellation.
    async fn pause(&self, d: Duration) -> bool {
        tokio::select! {
            _ = self.token.cancelled() => false,
            _ = time::sleep(d) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cadence_follows_policy() {
        let p = ConsumerPolicy::default();
        assert_eq!(Cadence::of(&p.clone().with_period(Duration::ZERO)), Cadence::Continuous);
        assert_eq!(
            Cadence::of(&p.clone().with_fixed_rate(true)),
            Cadence::FixedRate(p.period)
        );
        assert_eq!(Cadence::of(&p), Cadence::FixedDelay(p.period));
    }
}
