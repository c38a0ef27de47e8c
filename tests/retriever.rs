mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use common::ScriptedChannel;
use dispatchvisor::{ChannelPollingRetriever, Message, MessageRetriever, QueueChannel};
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn batch_never_exceeds_max_messages_per_poll() {
    for max in [1usize, 2, 5] {
        let ch = Arc::new(QueueChannel::new(64));
        for i in 0..12u8 {
            ch.try_send(Message::new(vec![i])).unwrap();
        }
        let retriever = ChannelPollingRetriever::new(ch.clone(), Duration::from_millis(5), max);

        let mut total = 0;
        loop {
            let batch = retriever.retrieve(&CancellationToken::new()).await;
            assert!(batch.len() <= max, "batch of {} with max {max}", batch.len());
            if batch.is_empty() {
                break;
            }
            total += batch.len();
        }
        assert_eq!(total, 12);
    }
}

#[tokio::test]
async fn empty_receive_stops_retrieval_early() {
    let ch = ScriptedChannel::with(vec![Message::new("only")]);
    let retriever = ChannelPollingRetriever::new(ch.clone(), Duration::from_millis(20), 10);

    let started = Instant::now();
    let batch = retriever.retrieve(&CancellationToken::new()).await;

    assert_eq!(batch.len(), 1);
    assert_eq!(ch.receives(), 2);
    assert!(started.elapsed() < Duration::from_millis(200));
}

#[tokio::test]
async fn partial_batch_is_returned_after_timeout() {
    let m1 = Message::new("m1");
    let m2 = Message::new("m2");
    let ch = Arc::new(QueueChannel::new(8));
    ch.try_send(m1.clone()).unwrap();
    ch.try_send(m2.clone()).unwrap();

    let retriever = ChannelPollingRetriever::new(ch, Duration::from_millis(50), 3);
    let started = Instant::now();
    let batch = retriever.retrieve(&CancellationToken::new()).await;

    assert_eq!(batch, vec![m1, m2]);
    assert!(started.elapsed() >= Duration::from_millis(50));
}

#[tokio::test]
async fn empty_channel_yields_empty_batch() {
    let ch = Arc::new(QueueChannel::new(1));
    let retriever = ChannelPollingRetriever::new(ch, Duration::from_millis(10), 4);
    assert!(retriever.retrieve(&CancellationToken::new()).await.is_empty());
}

#[tokio::test]
async fn cancellation_returns_messages_already_received() {
    let m1 = Message::new("m1");
    let m2 = Message::new("m2");
    let ch = ScriptedChannel::with(vec![m1.clone(), m2.clone()]);
    let retriever = ChannelPollingRetriever::new(ch.clone(), Duration::from_secs(10), 10);
    let token = CancellationToken::new();

    let stop = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        stop.cancel();
    });
    let batch = tokio::time::timeout(Duration::from_secs(5), retriever.retrieve(&token))
        .await
        .unwrap();

    assert_eq!(batch, vec![m1, m2]);
    assert_eq!(ch.receives(), 3);
}
