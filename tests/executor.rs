mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use common::{counting_endpoint, eventually, failing_endpoint, next_of};
use dispatchvisor::{
    EndpointFn, EndpointRef, ErrorThresholds, EventBus, EventKind, HandlerError, Message,
    SubmitError, Target, WorkerPoolExecutor,
};

fn successive(k: i64) -> ErrorThresholds {
    ErrorThresholds {
        successive: k,
        total: -1,
    }
}

/// Fails unless the payload is `ok`.
fn flaky_endpoint() -> EndpointRef {
    EndpointFn::arc(|msg: Message| async move {
        if msg.payload() == b"ok" {
            Ok(())
        } else {
            Err(HandlerError::fail("bad payload"))
        }
    })
}

async fn run_one(exec: &WorkerPoolExecutor, payload: &str) {
    exec.submit(Message::new(payload)).unwrap();
    assert!(eventually(|| exec.active_count() == 0).await);
}

#[tokio::test]
async fn successive_failures_beyond_threshold_shut_the_pool_down() {
    let bus = EventBus::new(64);
    let mut rx = bus.subscribe();
    let exec = WorkerPoolExecutor::new("ep", failing_endpoint(), 1, successive(2), bus);
    exec.start();

    run_one(&exec, "1").await;
    run_one(&exec, "2").await;
    assert!(!exec.is_shutdown());
    run_one(&exec, "3").await;

    assert!(exec.is_shutdown());
    assert!(!exec.is_running());
    assert_eq!(exec.submit(Message::new("4")), Err(SubmitError::NotRunning));

    let ev = next_of(&mut rx, EventKind::ExecutorShutdown).await.unwrap();
    assert_eq!(ev.endpoint.as_deref(), Some("ep"));
}

#[tokio::test]
async fn intervening_success_resets_successive_count() {
    let exec = WorkerPoolExecutor::new("ep", flaky_endpoint(), 1, successive(2), EventBus::new(64));
    exec.start();

    for payload in ["bad", "bad", "ok", "bad", "bad"] {
        run_one(&exec, payload).await;
    }

    assert!(!exec.is_shutdown());
    assert_eq!(exec.error_counts(), (2, 4));
    assert!(exec.submit(Message::new("ok")).is_ok());
    exec.stop().await;
}

#[tokio::test]
async fn zero_threshold_shuts_down_on_first_failure() {
    let exec = WorkerPoolExecutor::new("ep", failing_endpoint(), 1, successive(0), EventBus::new(16));
    exec.start();
    run_one(&exec, "x").await;
    assert!(exec.is_shutdown());
}

#[tokio::test]
async fn disabled_thresholds_never_shut_down() {
    let exec = WorkerPoolExecutor::new(
        "ep",
        failing_endpoint(),
        2,
        ErrorThresholds::disabled(),
        EventBus::new(64),
    );
    exec.start();
    for i in 0..10 {
        run_one(&exec, &i.to_string()).await;
    }
    assert!(!exec.is_shutdown());
    assert_eq!(exec.error_counts(), (10, 10));
}

#[tokio::test]
async fn saturated_pool_rejects_without_queueing() {
    let hits = Arc::new(AtomicUsize::new(0));
    let exec = WorkerPoolExecutor::new(
        "slow",
        counting_endpoint(hits.clone(), Duration::from_millis(100)),
        2,
        ErrorThresholds::disabled(),
        EventBus::new(16),
    );
    exec.start();

    assert!(exec.submit(Message::new("a")).is_ok());
    assert!(exec.submit(Message::new("b")).is_ok());
    assert_eq!(exec.submit(Message::new("c")), Err(SubmitError::Rejected));
    assert_eq!(exec.active_count(), 2);

    exec.stop().await;
    assert_eq!(hits.load(Ordering::SeqCst), 2);
    assert_eq!(exec.active_count(), 0);
}

#[tokio::test]
async fn restart_clears_shutdown() {
    let exec = WorkerPoolExecutor::new("ep", flaky_endpoint(), 1, successive(0), EventBus::new(16));
    exec.start();
    run_one(&exec, "bad").await;
    assert!(exec.is_shutdown());

    exec.start();
    assert!(!exec.is_shutdown());
    assert_eq!(exec.error_counts(), (0, 1));
    run_one(&exec, "ok").await;
    assert!(exec.is_running());
}

#[tokio::test]
async fn panicking_handler_counts_as_failure() {
    let ep: EndpointRef = EndpointFn::arc(|_msg: Message| async {
        if true {
            panic!("handler exploded");
        }
        Ok::<_, HandlerError>(())
    });
    let exec = WorkerPoolExecutor::new("boom", ep, 1, successive(5), EventBus::new(16));
    exec.start();

    run_one(&exec, "x").await;
    assert_eq!(exec.error_counts(), (1, 1));
    assert!(exec.is_running());
}

#[tokio::test]
async fn shutdown_now_interrupts_in_flight_work() {
    let hits = Arc::new(AtomicUsize::new(0));
    let exec = WorkerPoolExecutor::new(
        "stuck",
        counting_endpoint(hits.clone(), Duration::from_secs(3600)),
        1,
        ErrorThresholds::disabled(),
        EventBus::new(16),
    );
    exec.start();
    exec.submit(Message::new("x")).unwrap();

    assert!(exec.shutdown_now());
    assert!(!exec.shutdown_now());
    assert!(eventually(|| exec.active_count() == 0).await);
    assert_eq!(hits.load(Ordering::SeqCst), 0);
    assert_eq!(exec.error_counts(), (0, 0));
}
