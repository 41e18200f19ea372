// Producer side of the queue contract: what the gateway pushes for each request and node.

use std::sync::Arc;

use crate::models::{
    MetricsChannel, NetworkSnapshotEvent, RequestLifecycleEvent, request_events_key,
};
use crate::queue_repo::QueueRepo;

/// Serializes events as JSON and appends them to the right queue key.
#[derive(Clone)]
pub struct MetricsPublisher {
    queue: Arc<QueueRepo>,
}

impl MetricsPublisher {
    pub fn new(queue: Arc<QueueRepo>) -> Self {
        Self { queue }
    }

    /// Appends one lifecycle event to the event list of `request_id`.
    pub async fn publish_event(
        &self,
        request_id: &str,
        event: &RequestLifecycleEvent,
    ) -> anyhow::Result<()> {
        let payload = serde_json::to_string(event)?;
        self.queue
            .push(&request_events_key(request_id), &payload)
            .await
    }

    /// Marks `request_id` as ready for aggregation. Publish after SENT_RESPONSE, otherwise the
    /// metric is built without the response side.
    pub async fn publish_request_id(&self, request_id: &str) -> anyhow::Result<()> {
        self.queue
            .push(MetricsChannel::RequestIds.as_str(), request_id)
            .await
    }

    /// Publishes a whole request lifecycle followed by its id.
    pub async fn publish_request(
        &self,
        request_id: &str,
        events: &[RequestLifecycleEvent],
    ) -> anyhow::Result<()> {
        for event in events {
            self.publish_event(request_id, event).await?;
        }
        self.publish_request_id(request_id).await
    }

    pub async fn publish_network(&self, snapshot: &NetworkSnapshotEvent) -> anyhow::Result<()> {
        let payload = serde_json::to_string(snapshot)?;
        self.queue
            .push(MetricsChannel::Network.as_str(), &payload)
            .await
    }
}
