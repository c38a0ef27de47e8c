//! # MessageBus: wiring, scheduling and lifecycle.
//!
//! The [`MessageBus`] owns channels, endpoint executors, per-channel
//! dispatchers and the scheduler that drives them. Everything is explicit
//! state on this object; there are no globals.
//!
//! ## Lifecycle
//! ```text
//!  Unstarted ──start()──► Running ──stop()──► Stopped ──start()──► Running ...
//!
//! start():  executors.start() ─► re-attach executors ─► schedule every dispatcher
//! stop():   scheduler: cancel + join (backoff sleeps return early)
//!           executors: stop, wait ≤ grace each; stuck ones ─► shutdown_now()
//! ```
//!
//! Registration (`register_channel`, `register_endpoint`, `activate_subscription`)
//! is allowed in any state; anything registered while running is started or
//! scheduled immediately.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use dispatchvisor::{
//!     BusConfig, Channel, ConsumerPolicy, EndpointFn, HandlerError, Message, MessageBus,
//!     QueueChannel, Subscription,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bus = MessageBus::new(BusConfig::default());
//!
//!     let orders = std::sync::Arc::new(QueueChannel::new(64));
//!     bus.register_channel("orders", orders.clone())?;
//!     bus.register_endpoint(
//!         "billing",
//!         EndpointFn::arc(|msg: Message| async move {
//!             println!("billing {}", msg.id());
//!             Ok::<_, HandlerError>(())
//!         }),
//!         None,
//!     )?;
//!     bus.activate_subscription(
//!         Subscription::new("orders", "billing")
//!             .with_policy(ConsumerPolicy::default().with_receive_timeout(Duration::from_millis(10))),
//!     )?;
//!
//!     bus.start();
//!     orders.send(Message::new("order-1")).await?;
//!     tokio::time::sleep(Duration::from_millis(50)).await;
//!     bus.stop().await?;
//!     Ok(())
//! }
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::channels::{ChannelRef, QueueChannel};
use crate::core::builder::MessageBusBuilder;
use crate::core::config::BusConfig;
use crate::core::registry::{ChannelDispatch, EndpointEntry, Registry};
use crate::core::scheduler::Scheduler;
use crate::core::shutdown;
use crate::core::subscription::Subscription;
use crate::dispatch::{ChannelPollingRetriever, DispatchMode, Dispatcher, Target, TargetRef};
use crate::endpoints::EndpointRef;
use crate::error::{ConfigError, RuntimeError};
use crate::events::{Event, EventBus, EventKind};
use crate::executor::WorkerPoolExecutor;
use crate::policies::{ConsumerPolicy, ErrorThresholds, RetryPolicy};

/// Message dispatch and polling engine.
pub struct MessageBus {
    cfg: BusConfig,
    bus: EventBus,
    registry: Mutex<Registry>,
    scheduler: Mutex<Option<Scheduler>>,
    listener: CancellationToken,
}

impl MessageBus {
    /// Returns a builder for configuring subscribers.
    pub fn builder(cfg: BusConfig) -> MessageBusBuilder {
        MessageBusBuilder::new(cfg)
    }

    /// Builds a bus without subscribers. Must be called inside a tokio runtime.
    pub fn new(cfg: BusConfig) -> Arc<Self> {
        MessageBusBuilder::new(cfg).build()
    }

    pub(crate) fn new_internal(cfg: BusConfig, bus: EventBus, listener: CancellationToken) -> Self {
        Self {
            cfg,
            bus,
            registry: Mutex::new(Registry::default()),
            scheduler: Mutex::new(None),
            listener,
        }
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn scheduler(&self) -> MutexGuard<'_, Option<Scheduler>> {
        self.scheduler.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Configuration this bus was built with.
    pub fn config(&self) -> &BusConfig {
        &self.cfg
    }

    /// Receiver for runtime events published from now on.
    pub fn subscribe_events(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    // ---------------------------
    // Registration
    // ---------------------------

    /// Registers a channel under `name`.
    pub fn register_channel(
        &self,
        name: impl Into<String>,
        channel: ChannelRef,
    ) -> Result<(), ConfigError> {
        let name = name.into();
        let mut reg = self.registry();
        if reg.channels.contains_key(&name) {
            return Err(ConfigError::DuplicateChannel { name });
        }
        reg.channels.insert(name.clone(), channel);
        drop(reg);

        self.bus
            .publish(Event::new(EventKind::ChannelRegistered).with_channel(name));
        Ok(())
    }

    /// Registers an endpoint and creates its executor.
    ///
    /// The executor's pool capacity comes from `policy` (or the bus default).
    /// The policy is also inherited by subscriptions that do not name one.
    pub fn register_endpoint(
        &self,
        name: impl Into<String>,
        endpoint: EndpointRef,
        policy: Option<ConsumerPolicy>,
    ) -> Result<Arc<WorkerPoolExecutor>, ConfigError> {
        self.add_endpoint(name.into(), endpoint, policy, self.cfg.thresholds)
    }

    /// Like [`register_endpoint`](Self::register_endpoint), with error
    /// thresholds for this endpoint instead of [`BusConfig::thresholds`].
    pub fn register_endpoint_with_thresholds(
        &self,
        name: impl Into<String>,
        endpoint: EndpointRef,
        policy: Option<ConsumerPolicy>,
        thresholds: ErrorThresholds,
    ) -> Result<Arc<WorkerPoolExecutor>, ConfigError> {
        self.add_endpoint(name.into(), endpoint, policy, thresholds)
    }

    fn add_endpoint(
        &self,
        name: String,
        endpoint: EndpointRef,
        policy: Option<ConsumerPolicy>,
        thresholds: ErrorThresholds,
    ) -> Result<Arc<WorkerPoolExecutor>, ConfigError> {
        let capacity = {
            let effective = policy.as_ref().unwrap_or(&self.cfg.default_policy);
            effective.validate()?;
            effective.pool_capacity()
        };

        let mut reg = self.registry();
        if reg.endpoints.contains_key(&name) {
            return Err(ConfigError::DuplicateEndpoint { name });
        }
        let executor = Arc::new(WorkerPoolExecutor::new(
            name.as_str(),
            endpoint,
            capacity,
            thresholds,
            self.bus.clone(),
        ));
        if self.scheduler().is_some() {
            executor.start();
        }
        reg.endpoints.insert(
            name.clone(),
            EndpointEntry {
                executor: Arc::clone(&executor),
                policy,
            },
        );
        drop(reg);

        self.bus
            .publish(Event::new(EventKind::EndpointRegistered).with_endpoint(name));
        Ok(executor)
    }

    /// Registers an endpoint and subscribes it to `input` in one step.
    ///
    /// If the subscription cannot be activated the endpoint is not kept.
    pub fn register_endpoint_with_input(
        &self,
        name: impl Into<String>,
        endpoint: EndpointRef,
        input: impl Into<String>,
        policy: Option<ConsumerPolicy>,
    ) -> Result<Arc<WorkerPoolExecutor>, ConfigError> {
        let name = name.into();
        let executor = self.register_endpoint(name.clone(), endpoint, policy)?;
        if let Err(e) = self.activate_subscription(Subscription::new(input, name.clone())) {
            self.registry().remove_endpoint(&name);
            return Err(e);
        }
        Ok(executor)
    }

    /// Activates a subscription: the endpoint's executor becomes a target of
    /// the channel's dispatcher (created on first use).
    ///
    /// # Errors
    /// - [`ConfigError::UnknownEndpoint`] if the endpoint is not registered
    /// - [`ConfigError::UnknownChannel`] if the channel is not registered and
    ///   `auto_create_channels` is off
    /// - [`ConfigError::InvalidPolicy`] for an out-of-range policy
    pub fn activate_subscription(&self, sub: Subscription) -> Result<(), ConfigError> {
        let mut reg = self.registry();

        let (executor, policy) = {
            let entry = reg
                .endpoints
                .get(&sub.endpoint)
                .ok_or_else(|| ConfigError::UnknownEndpoint {
                    name: sub.endpoint.clone(),
                })?;
            let policy = sub
                .policy
                .clone()
                .or_else(|| entry.policy.clone())
                .unwrap_or_else(|| self.cfg.default_policy.clone());
            (Arc::clone(&entry.executor), policy)
        };
        policy.validate()?;

        let channel = match reg.channels.get(&sub.channel) {
            Some(ch) => Arc::clone(ch),
            None if self.cfg.auto_create_channels => {
                let ch: ChannelRef = Arc::new(QueueChannel::new(self.cfg.channel_capacity));
                reg.channels.insert(sub.channel.clone(), Arc::clone(&ch));
                self.bus.publish(
                    Event::new(EventKind::ChannelAutoCreated).with_channel(sub.channel.as_str()),
                );
                ch
            }
            None => {
                return Err(ConfigError::UnknownChannel {
                    name: sub.channel.clone(),
                });
            }
        };

        let target: TargetRef = executor;
        if let Some(cd) = reg.dispatchers.get_mut(&sub.channel) {
            if !cd.members.contains(&sub.endpoint) {
                cd.members.push(sub.endpoint.clone());
            }
            cd.dispatcher.add_target(target);
        } else {
            if policy.is_busy_poll() {
                self.bus.publish(
                    Event::new(EventKind::BusyPollWarning)
                        .with_channel(sub.channel.as_str())
                        .with_endpoint(sub.endpoint.as_str()),
                );
            }
            let dispatcher = Arc::new(self.new_dispatcher(&sub.channel, channel, &policy));
            dispatcher.add_target(target);
            if let Some(scheduler) = self.scheduler().as_ref() {
                scheduler.schedule(Arc::clone(&dispatcher), &policy);
            }
            reg.dispatchers.insert(
                sub.channel.clone(),
                ChannelDispatch {
                    dispatcher,
                    policy,
                    members: vec![sub.endpoint.clone()],
                },
            );
        }

        let event = Event::new(EventKind::SubscriptionActivated)
            .with_channel(sub.channel.as_str())
            .with_endpoint(sub.endpoint.as_str());
        if !reg.subscriptions.contains(&sub) {
            reg.subscriptions.push(sub);
        }
        drop(reg);
        self.bus.publish(event);
        Ok(())
    }

    fn new_dispatcher(&self, name: &str, channel: ChannelRef, policy: &ConsumerPolicy) -> Dispatcher {
        let dispatch_policy = channel.dispatch_policy();
        let retriever = Arc::new(ChannelPollingRetriever::new(
            channel,
            policy.receive_timeout,
            policy.max_messages_per_poll,
        ));
        Dispatcher::new(
            name,
            retriever,
            DispatchMode::from(dispatch_policy),
            RetryPolicy::for_channel(policy, dispatch_policy, self.cfg.retry_interval),
            self.bus.clone(),
        )
        .with_jitter(self.cfg.jitter)
    }

    /// Detaches an endpoint from every dispatcher, stops its executor and
    /// forgets it. Returns `false` if no such endpoint exists.
    pub async fn remove_endpoint(&self, name: &str) -> bool {
        let Some(executor) = self.registry().remove_endpoint(name) else {
            return false;
        };
        if time::timeout(self.cfg.grace, executor.stop()).await.is_err() {
            executor.shutdown_now();
        }
        self.bus
            .publish(Event::new(EventKind::EndpointRemoved).with_endpoint(name));
        true
    }

    // ---------------------------
    // Lifecycle
    // ---------------------------

    /// Starts every executor and schedules every dispatcher. Idempotent.
    ///
    /// Must be called inside a tokio runtime.
    pub fn start(&self) {
        let reg = self.registry();
        let mut slot = self.scheduler();
        if slot.is_some() {
            return;
        }

        let scheduler = Scheduler::new(self.cfg.dispatcher_pool_limit(), self.bus.clone());
        for executor in reg.executors() {
            executor.start();
        }
        reg.reattach_all();
        for cd in reg.dispatchers.values() {
            scheduler.schedule(Arc::clone(&cd.dispatcher), &cd.policy);
        }
        *slot = Some(scheduler);
        let tasks = reg.dispatchers.len() as u64;
        drop(slot);
        drop(reg);

        self.bus
            .publish(Event::new(EventKind::BusStarted).with_count(tasks));
    }

    /// Cancels scheduled dispatch, then stops every executor. Idempotent.
    ///
    /// # Errors
    /// [`RuntimeError::GraceExceeded`] if some executors still had work in
    /// flight after `grace`; those were shut down abruptly.
    pub async fn stop(&self) -> Result<(), RuntimeError> {
        let (scheduler, executors) = {
            let reg = self.registry();
            let Some(scheduler) = self.scheduler().take() else {
                return Ok(());
            };
            (scheduler, reg.executors())
        };

        let grace = self.cfg.grace;
        if !scheduler.shutdown(grace).await {
            tracing::warn!(?grace, "dispatch tasks still running after grace");
        }

        let drained = futures::future::join_all(executors.iter().map(|executor| async move {
            time::timeout(grace, executor.stop()).await.is_ok()
        }))
        .await;

        let mut stuck = Vec::new();
        for (executor, ok) in executors.iter().zip(drained) {
            if !ok {
                executor.shutdown_now();
                stuck.push(executor.name().to_string());
            }
        }
        stuck.sort_unstable();

        let result = if stuck.is_empty() {
            self.bus.publish(Event::new(EventKind::AllStoppedWithin));
            Ok(())
        } else {
            self.bus
                .publish(Event::new(EventKind::GraceExceeded).with_reason(stuck.join(",")));
            Err(RuntimeError::GraceExceeded { grace, stuck })
        };
        self.bus.publish(Event::new(EventKind::BusStopped));
        result
    }

    /// Starts the bus, waits for a termination signal, then stops it.
    pub async fn run_until_signal(&self) -> Result<(), RuntimeError> {
        self.start();
        let signal = shutdown::wait_for_shutdown_signal().await?;
        self.bus
            .publish(Event::new(EventKind::ShutdownRequested).with_reason(signal));
        self.stop().await
    }

    /// True between `start()` and `stop()`.
    pub fn is_running(&self) -> bool {
        self.scheduler().is_some()
    }

    // ---------------------------
    // Introspection
    // ---------------------------

    /// Messages currently being handled by an endpoint.
    pub fn active_count_for_endpoint(&self, name: &str) -> Option<usize> {
        self.registry()
            .endpoints
            .get(name)
            .map(|e| e.executor.active_count())
    }

    /// Looks up a registered (or auto-created) channel.
    pub fn channel(&self, name: &str) -> Option<ChannelRef> {
        self.registry().channels.get(name).cloned()
    }

    /// Looks up an endpoint's executor.
    pub fn executor(&self, name: &str) -> Option<Arc<WorkerPoolExecutor>> {
        self.registry()
            .endpoints
            .get(name)
            .map(|e| Arc::clone(&e.executor))
    }

    /// Looks up the dispatcher serving a channel.
    pub fn dispatcher(&self, channel: &str) -> Option<Arc<Dispatcher>> {
        self.registry()
            .dispatchers
            .get(channel)
            .map(|cd| Arc::clone(&cd.dispatcher))
    }

    /// Active subscriptions, in activation order.
    pub fn subscriptions(&self) -> Vec<Subscription> {
        self.registry().subscriptions.clone()
    }
}

impl Drop for MessageBus {
    fn drop(&mut self) {
        self.listener.cancel();
    }
}
