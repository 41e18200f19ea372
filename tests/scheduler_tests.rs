// Scheduler tests: both channels drained on the shared delay, shutdown stops the triggers

mod common;

use common::*;
use gateway_metrics::models::MetricsChannel;
use gateway_metrics::scheduler::{SchedulerConfig, spawn};
use std::time::Duration;
use tokio::time::sleep;

fn config(delay_ms: u64, chunk: usize) -> SchedulerConfig {
    SchedulerConfig {
        delay: Duration::from_millis(delay_ms),
        chunk,
        stats_log_interval: Duration::from_secs(3600),
    }
}

#[tokio::test]
async fn scheduler_drains_both_channels() {
    let h = harness().await;
    h.publisher.publish_request("req1", &simple_request(1)).await.unwrap();
    h.publisher.publish_request("req2", &simple_request(2)).await.unwrap();
    h.publisher.publish_network(&network_snapshot("n1", 4)).await.unwrap();

    let scheduler = spawn(h.service.clone(), config(20, 10));
    sleep(Duration::from_millis(300)).await;
    scheduler.shutdown().await;

    assert_eq!(h.store.get_request_metrics("req1").await.unwrap().len(), 1);
    assert_eq!(h.store.get_request_metrics("req2").await.unwrap().len(), 1);
    assert_eq!(h.store.get_network_metrics("n1").await.unwrap().len(), 1);
    assert_eq!(h.queue.len(MetricsChannel::RequestIds.as_str()).await.unwrap(), 0);
    assert_eq!(h.queue.len(MetricsChannel::Network.as_str()).await.unwrap(), 0);
}

#[tokio::test]
async fn scheduler_first_firing_waits_one_delay() {
    let h = harness().await;
    h.publisher.publish_network(&network_snapshot("n1", 1)).await.unwrap();

    let scheduler = spawn(h.service.clone(), config(10_000, 10));
    sleep(Duration::from_millis(100)).await;
    scheduler.shutdown().await;

    assert!(h.store.get_network_metrics("n1").await.unwrap().is_empty());
    assert_eq!(h.queue.len(MetricsChannel::Network.as_str()).await.unwrap(), 1);
}

#[tokio::test]
async fn scheduler_takes_at_most_chunk_per_firing() {
    let h = harness().await;
    for i in 0..6 {
        h.publisher
            .publish_network(&network_snapshot("n1", i))
            .await
            .unwrap();
    }

    // Long delay: exactly one firing happens inside the window
    let scheduler = spawn(h.service.clone(), config(150, 2));
    sleep(Duration::from_millis(250)).await;
    scheduler.shutdown().await;

    assert_eq!(h.store.get_network_metrics("n1").await.unwrap().len(), 2);
    assert_eq!(h.queue.len(MetricsChannel::Network.as_str()).await.unwrap(), 4);
}

#[tokio::test]
async fn scheduler_stops_after_shutdown() {
    let h = harness().await;
    let scheduler = spawn(h.service.clone(), config(20, 10));
    sleep(Duration::from_millis(50)).await;
    scheduler.shutdown().await;

    h.publisher.publish_network(&network_snapshot("late", 1)).await.unwrap();
    sleep(Duration::from_millis(150)).await;
    assert!(h.store.get_network_metrics("late").await.unwrap().is_empty());
}

#[tokio::test]
async fn scheduler_survives_failing_records() {
    let h = harness().await;
    h.queue
        .push(MetricsChannel::Network.as_str(), "not json")
        .await
        .unwrap();

    let scheduler = spawn(h.service.clone(), config(20, 10));
    sleep(Duration::from_millis(100)).await;
    // Published after the bad record was consumed; picked up by a later firing
    h.publisher.publish_network(&network_snapshot("n1", 1)).await.unwrap();
    sleep(Duration::from_millis(200)).await;
    scheduler.shutdown().await;

    assert_eq!(h.store.get_network_metrics("n1").await.unwrap().len(), 1);
    assert_eq!(h.service.stats().snapshot().events_skipped, 1);
}
