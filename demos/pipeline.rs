//! # Order pipeline
//!
//! Demonstrates basic dispatchvisor features:
//! - Point-to-point channel shared by two competing endpoints
//! - Publish-subscribe channel fanned out to every subscriber
//! - Error thresholds shutting down a misbehaving endpoint
//! - Graceful stop
//!
//! ## Run
//! ```bash
//! RUST_LOG=info cargo run --example pipeline
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dispatchvisor::{
    BusConfig, ConsumerPolicy, EndpointFn, EndpointRef, ErrorThresholds, HandlerError, LogWriter,
    Message, MessageBus, QueueChannel, Subscribe, Subscription,
};

/// Bills an order; every seventh one fails.
fn billing(name: &'static str, seen: Arc<AtomicU64>) -> EndpointRef {
    EndpointFn::arc(move |msg: Message| {
        let seen = seen.clone();
        async move {
            let n = seen.fetch_add(1, Ordering::Relaxed) + 1;
            tokio::time::sleep(Duration::from_millis(20)).await;
            if n % 7 == 0 {
                return Err(HandlerError::fail(format!("{name}: card declined")));
            }
            println!(
                "💳 {name}: billed {}",
                String::from_utf8_lossy(msg.payload())
            );
            Ok(())
        }
    })
}

/// Prints every announcement.
fn reader(name: &'static str) -> EndpointRef {
    EndpointFn::arc(move |msg: Message| async move {
        println!(
            "📣 {name}: {}",
            String::from_utf8_lossy(msg.payload())
        );
        Ok::<_, HandlerError>(())
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cfg = BusConfig {
        grace: Duration::from_secs(2),
        retry_interval: Duration::from_millis(50),
        thresholds: ErrorThresholds {
            successive: 2,
            total: 10,
        },
        ..BusConfig::default()
    };
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let bus = MessageBus::builder(cfg).with_subscribers(subs).build();

    let orders = Arc::new(QueueChannel::new(128));
    let news = Arc::new(QueueChannel::publish_subscribe(16));
    bus.register_channel("orders", orders.clone())?;
    bus.register_channel("news", news.clone())?;

    let policy = ConsumerPolicy::default()
        .with_period(Duration::from_millis(10))
        .with_receive_timeout(Duration::from_millis(50))
        .with_max_messages_per_poll(8)
        .with_concurrency(1, 2)
        .with_rejection_limit(3, Duration::from_millis(25));

    let seen = Arc::new(AtomicU64::new(0));
    for name in ["billing-a", "billing-b"] {
        bus.register_endpoint(name, billing(name, seen.clone()), Some(policy.clone()))?;
        bus.activate_subscription(Subscription::new("orders", name))?;
    }
    for name in ["mailer", "auditor"] {
        bus.register_endpoint_with_input(name, reader(name), "news", Some(policy.clone()))?;
    }

    bus.start();

    for i in 0..30 {
        orders.try_send(Message::new(format!("order-{i}")))?;
    }
    news.try_send(Message::new("spring sale starts today"))?;

    tokio::time::sleep(Duration::from_secs(2)).await;
    println!(
        "active: billing-a={:?} billing-b={:?}",
        bus.active_count_for_endpoint("billing-a"),
        bus.active_count_for_endpoint("billing-b")
    );

    bus.stop().await?;
    println!("stopped; {} orders handled", seen.load(Ordering::Relaxed));
    Ok(())
}
