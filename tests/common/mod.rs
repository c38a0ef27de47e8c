//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use dispatchvisor::{
    Channel, DispatchPolicy, EndpointFn, EndpointRef, Event, EventKind, HandlerError, Message, MessageRetriever,
    SubmitError, Target,
};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

/// Endpoint that counts handled messages and optionally sleeps first.
pub fn counting_endpoint(hits: Arc<AtomicUsize>, delay: Duration) -> EndpointRef {
    EndpointFn::arc(move |_msg: Message| {
        let hits = hits.clone();
        async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            hits.fetch_add(1, Ordering::SeqCst);
            Ok::<_, HandlerError>(())
        }
    })
}

/// Endpoint that fails every message.
pub fn failing_endpoint() -> EndpointRef {
    EndpointFn::arc(|_msg: Message| async { Err::<(), _>(HandlerError::fail("boom")) })
}

/// Target answering every submission with the same result and recording what it took.
pub struct ScriptedTarget {
    name: &'static str,
    answer: Result<(), SubmitError>,
    running: bool,
    pub calls: AtomicUsize,
    pub taken: Mutex<Vec<u64>>,
}

impl ScriptedTarget {
    pub fn accepting(name: &'static str) -> Arc<Self> {
        Self::with(name, Ok(()), true)
    }

    pub fn rejecting(name: &'static str) -> Arc<Self> {
        Self::with(name, Err(SubmitError::Rejected), true)
    }

    pub fn failing(name: &'static str) -> Arc<Self> {
        Self::with(
            name,
            Err(SubmitError::Failed {
                error: "broken".into(),
            }),
            true,
        )
    }

    pub fn stopped(name: &'static str) -> Arc<Self> {
        Self::with(name, Err(SubmitError::NotRunning), false)
    }

    fn with(name: &'static str, answer: Result<(), SubmitError>, running: bool) -> Arc<Self> {
        Arc::new(Self {
            name,
            answer,
            running,
            calls: AtomicUsize::new(0),
            taken: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn taken(&self) -> Vec<u64> {
        self.taken.lock().unwrap().clone()
    }
}

impl Target for ScriptedTarget {
    fn name(&self) -> &str {
        self.name
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn submit(&self, message: Message) -> Result<(), SubmitError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.answer.is_ok() {
            self.taken.lock().unwrap().push(message.id());
        }
        self.answer.clone()
    }
}

/// Channel replaying a fixed queue; counts receive calls.
pub struct ScriptedChannel {
    queue: Mutex<VecDeque<Message>>,
    pub receives: AtomicUsize,
}

impl ScriptedChannel {
    pub fn with(messages: Vec<Message>) -> Arc<Self> {
        Arc::new(Self {
            queue: Mutex::new(messages.into()),
            receives: AtomicUsize::new(0),
        })
    }

    pub fn receives(&self) -> usize {
        self.receives.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Channel for ScriptedChannel {
    async fn receive(&self, timeout: Duration) -> Option<Message> {
        self.receives.fetch_add(1, Ordering::SeqCst);
        let next = self.queue.lock().unwrap().pop_front();
        if next.is_none() && !timeout.is_zero() {
            tokio::time::sleep(timeout).await;
        }
        next
    }

    fn dispatch_policy(&self) -> DispatchPolicy {
        DispatchPolicy::PointToPoint
    }
}

/// Retriever handing out one prepared batch, then nothing.
pub struct OnceRetriever(Mutex<Option<Vec<Message>>>);

impl OnceRetriever {
    pub fn arc(batch: Vec<Message>) -> Arc<Self> {
        Arc::new(Self(Mutex::new(Some(batch))))
    }
}

#[async_trait]
impl MessageRetriever for OnceRetriever {
    async fn retrieve(&self, _token: &CancellationToken) -> Vec<Message> {
        self.0.lock().unwrap().take().unwrap_or_default()
    }
}

/// Polls `cond` until it holds or five seconds pass.
pub async fn eventually(mut cond: impl FnMut() -> bool) -> bool {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .is_ok()
}

/// Waits for the first event of `kind`.
pub async fn next_of(rx: &mut broadcast::Receiver<Event>, kind: EventKind) -> Option<Event> {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match rx.recv().await {
                Ok(ev) if ev.kind == kind => return Some(ev),
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    })
    .await
    .ok()
    .flatten()
}

/// Drains every event already buffered.
pub fn drain(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
    let mut out = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(ev) => out.push(ev),
            Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
            Err(_) => return out,
        }
    }
}
