//! Queue consumer loop driven by the in-memory broker under paused time

mod common;

use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use common::{order_payload, ConsumerHarness, RecordingRepository, QUEUE};
use fulfillment_worker::worker::{ConsumerState, QueueConsumer};
use fulfillment_worker::{OrderStatus, Outcome};

fn spawn_consumer(
    consumer: &Arc<QueueConsumer>,
    token: &CancellationToken,
) -> tokio::task::JoinHandle<()> {
    let consumer = Arc::clone(consumer);
    let token = token.clone();
    tokio::spawn(async move { consumer.run(&token).await })
}

#[tokio::test(start_paused = true)]
async fn test_messages_are_processed_in_queue_order() {
    let harness = ConsumerHarness::new(RecordingRepository::new());
    for order_id in [1, 2, 3] {
        harness.broker.push(QUEUE, order_payload(order_id, "fifo"));
    }
    let token = CancellationToken::new();
    let task = spawn_consumer(&harness.consumer, &token);

    harness
        .wait_until(|h| h.consumer.stats().snapshot().messages_processed == 3)
        .await;
    token.cancel();
    task.await.unwrap();

    assert_eq!(
        harness.repository.writes(),
        vec![
            (1, OrderStatus::Processing),
            (1, OrderStatus::Fulfilled),
            (2, OrderStatus::Processing),
            (2, OrderStatus::Fulfilled),
            (3, OrderStatus::Processing),
            (3, OrderStatus::Fulfilled),
        ]
    );
    assert_eq!(harness.metrics.processed_count(Outcome::Success), 3);
    assert_eq!(harness.consumer.state(), ConsumerState::Stopped);
}

#[tokio::test(start_paused = true)]
async fn test_malformed_payload_is_discarded_without_delay() {
    let harness = ConsumerHarness::new(RecordingRepository::new());
    harness.broker.push(QUEUE, "{not json");
    harness.broker.push(QUEUE, r#"{"product_id":1,"quantity":1}"#);
    harness.broker.push(QUEUE, order_payload(42, "after-garbage"));
    let started = Instant::now();
    let token = CancellationToken::new();
    let task = spawn_consumer(&harness.consumer, &token);

    harness
        .wait_until(|h| h.consumer.stats().snapshot().messages_processed == 1)
        .await;
    let elapsed = started.elapsed();
    token.cancel();
    task.await.unwrap();

    let stats = harness.consumer.stats().snapshot();
    assert_eq!(stats.parse_failures, 2);
    assert_eq!(stats.messages_received, 3);
    assert_eq!(
        harness.repository.writes(),
        vec![(42, OrderStatus::Processing), (42, OrderStatus::Fulfilled)]
    );
    // Neither the backoff nor a dequeue timeout was spent on the bad payloads
    assert!(elapsed < Duration::from_secs(1), "took {elapsed:?}");
    assert_eq!(harness.metrics.processed_count(Outcome::Error), 0);
}

#[tokio::test(start_paused = true)]
async fn test_broker_error_backs_off_then_resumes() {
    let harness = ConsumerHarness::new(RecordingRepository::new());
    harness.broker.inject_error("connection reset");
    harness.broker.push(QUEUE, order_payload(5, "after-error"));
    let started = Instant::now();
    let token = CancellationToken::new();
    let task = spawn_consumer(&harness.consumer, &token);

    harness
        .wait_until(|h| h.consumer.stats().snapshot().messages_processed == 1)
        .await;
    let elapsed = started.elapsed();
    token.cancel();
    task.await.unwrap();

    assert_eq!(harness.consumer.stats().snapshot().broker_errors, 1);
    assert!(elapsed >= Duration::from_secs(1), "took {elapsed:?}");
    assert_eq!(harness.repository.writes_for(5).len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_interrupts_blocked_dequeue() {
    let harness = ConsumerHarness::new(RecordingRepository::new());
    let token = CancellationToken::new();
    let task = spawn_consumer(&harness.consumer, &token);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(harness.consumer.state(), ConsumerState::Waiting);

    let cancelled_at = Instant::now();
    token.cancel();
    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("consumer did not stop within the dequeue bound")
        .unwrap();

    assert!(cancelled_at.elapsed() < Duration::from_secs(5));
    assert_eq!(harness.consumer.state(), ConsumerState::Stopped);

    // Work arriving after shutdown stays on the queue
    harness.broker.push(QUEUE, order_payload(9, "late"));
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(harness.broker.queue_length(QUEUE), 1);
    assert!(harness.repository.writes().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_during_backoff_stops_loop() {
    let harness = ConsumerHarness::new(RecordingRepository::new());
    harness.broker.inject_error("connection refused");
    let token = CancellationToken::new();
    let task = spawn_consumer(&harness.consumer, &token);

    harness
        .wait_until(|h| h.consumer.state() == ConsumerState::Backoff)
        .await;
    token.cancel();
    task.await.unwrap();

    assert_eq!(harness.consumer.state(), ConsumerState::Stopped);
    assert_eq!(harness.broker.dequeue_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_pre_cancelled_token_processes_nothing() {
    let harness = ConsumerHarness::new(RecordingRepository::new());
    harness.broker.push(QUEUE, order_payload(1, "never"));
    let token = CancellationToken::new();
    token.cancel();

    harness.consumer.run(&token).await;

    assert_eq!(harness.broker.queue_length(QUEUE), 1);
    assert_eq!(harness.broker.dequeue_calls(), 0);
    assert_eq!(harness.consumer.state(), ConsumerState::Stopped);
}

#[tokio::test(start_paused = true)]
async fn test_handler_failure_does_not_stop_loop() {
    let harness = ConsumerHarness::new(RecordingRepository::new().with_missing(999));
    harness.broker.push(QUEUE, order_payload(999, "missing"));
    harness.broker.push(QUEUE, order_payload(42, "present"));
    let token = CancellationToken::new();
    let task = spawn_consumer(&harness.consumer, &token);

    harness
        .wait_until(|h| {
            let stats = h.consumer.stats().snapshot();
            stats.handler_failures == 1 && stats.messages_processed == 1
        })
        .await;
    token.cancel();
    task.await.unwrap();

    assert!(harness.repository.writes_for(999).is_empty());
    assert_eq!(
        harness.repository.writes_for(42),
        vec![OrderStatus::Processing, OrderStatus::Fulfilled]
    );
    assert_eq!(harness.metrics.processed_count(Outcome::Error), 1);
    assert_eq!(harness.metrics.processed_count(Outcome::Success), 1);
    // Failed messages are dropped, not requeued
    assert_eq!(harness.broker.queue_length(QUEUE), 0);
}

#[tokio::test(start_paused = true)]
async fn test_empty_polls_are_counted() {
    let harness = ConsumerHarness::new(RecordingRepository::new());
    let token = CancellationToken::new();
    let task = spawn_consumer(&harness.consumer, &token);

    tokio::time::sleep(Duration::from_millis(10_500)).await;
    token.cancel();
    task.await.unwrap();

    assert_eq!(harness.consumer.stats().snapshot().empty_polls, 2);
}
