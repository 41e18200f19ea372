// Shared test helpers: temp-file repos and event builders

#![allow(dead_code)]

use gateway_metrics::metric_repo::MetricRepo;
use gateway_metrics::metric_service::MetricService;
use gateway_metrics::models::*;
use gateway_metrics::publisher::MetricsPublisher;
use gateway_metrics::queue_repo::QueueRepo;
use serde_json::{Value, json};
use std::sync::Arc;
use tempfile::TempDir;

pub struct Harness {
    // Keeps the database files alive for the test
    pub _dir: TempDir,
    pub queue: Arc<QueueRepo>,
    pub store: Arc<MetricRepo>,
    pub service: MetricService,
    pub publisher: MetricsPublisher,
}

pub async fn queue_repo(dir: &TempDir) -> QueueRepo {
    let path = dir.path().join("queue.db");
    let repo = QueueRepo::connect(path.to_str().unwrap(), 4).await.unwrap();
    repo.init().await.unwrap();
    repo
}

pub async fn metric_repo(dir: &TempDir) -> MetricRepo {
    let path = dir.path().join("metrics.db");
    let repo = MetricRepo::connect(path.to_str().unwrap(), 4).await.unwrap();
    repo.init().await.unwrap();
    repo
}

pub async fn harness() -> Harness {
    let dir = TempDir::new().unwrap();
    let queue = Arc::new(queue_repo(&dir).await);
    let store = Arc::new(metric_repo(&dir).await);
    let service = MetricService::new(queue.clone(), store.clone());
    let publisher = MetricsPublisher::new(queue.clone());
    Harness {
        _dir: dir,
        queue,
        store,
        service,
        publisher,
    }
}

pub fn got_request(date: i64, node_id: &str, query: Value, ip: &str) -> RequestLifecycleEvent {
    RequestLifecycleEvent::GotRequest(GotRequest {
        node_id: node_id.into(),
        query,
        user_agent: Some("test-agent".into()),
        ip: Some(ip.into()),
        request: json!({ "headers": { "host": "gateway" } }),
        date,
    })
}

pub fn resolver_called(path: &str, date: i64) -> RequestLifecycleEvent {
    RequestLifecycleEvent::ResolverCalled(ResolverCalled {
        path: path.into(),
        source: None,
        args: Some(json!({})),
        info: Some(json!({ "fieldName": path })),
        date,
    })
}

pub fn resolver_done(path: &str, date: i64, result: Value) -> RequestLifecycleEvent {
    RequestLifecycleEvent::ResolverDone(ResolverDone {
        path: path.into(),
        source: None,
        result: Some(result),
        date,
    })
}

pub fn resolver_error(path: &str, date: i64, error: Value) -> RequestLifecycleEvent {
    RequestLifecycleEvent::ResolverError(ResolverError {
        path: path.into(),
        source: None,
        error: Some(error),
        date,
    })
}

pub fn sent_response(date: i64, content_length: &str) -> RequestLifecycleEvent {
    RequestLifecycleEvent::SentResponse(SentResponse {
        raw_response_body: Some("{\"data\":{}}".into()),
        content_length: Some(content_length.into()),
        error: None,
        date,
    })
}

/// A complete request: GOT_REQUEST at `start`, one resolver, SENT_RESPONSE at `start + 4`.
pub fn simple_request(start: i64) -> Vec<RequestLifecycleEvent> {
    vec![
        got_request(start, "n1", json!({ "query": "{ a }", "variables": {} }), "1.2.3.4"),
        resolver_called("a", start),
        resolver_done("a", start + 1, json!("r")),
        sent_response(start + 4, "10"),
    ]
}

pub fn network_snapshot(node_id: &str, date: i64) -> NetworkSnapshotEvent {
    NetworkSnapshotEvent {
        node_id: node_id.into(),
        date,
        network: NetworkCounters {
            bytes_in: 1,
            bytes_out: 2,
            connections: 3,
        },
    }
}
