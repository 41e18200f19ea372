// Drain-and-correlate: reads a chunk from a channel and runs one aggregation pass per entry.
// Every entry is aggregated in its own task; a failing entry is logged and counted, never rethrown.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::task::JoinSet;
use tracing::{debug, instrument, warn};

use crate::aggregation::{build_request_metric, parse_events, parse_network_snapshot};
use crate::metric_repo::MetricRepo;
use crate::models::{MetricsChannel, request_events_key};
use crate::queue_repo::QueueRepo;

/// Lifetime counters, logged periodically by the scheduler.
#[derive(Debug, Default)]
pub struct AggregationStats {
    pub requests_aggregated: AtomicU64,
    pub network_aggregated: AtomicU64,
    pub events_skipped: AtomicU64,
    pub failures: AtomicU64,
}

/// Point-in-time copy of [`AggregationStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub requests_aggregated: u64,
    pub network_aggregated: u64,
    pub events_skipped: u64,
    pub failures: u64,
}

impl AggregationStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            requests_aggregated: self.requests_aggregated.load(Ordering::Relaxed),
            network_aggregated: self.network_aggregated.load(Ordering::Relaxed),
            events_skipped: self.events_skipped.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

/// Outcome of one request aggregation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// A metric was persisted; `skipped` events failed to decode.
    Persisted { events: usize, skipped: usize },
    /// No events were queued under the id (already consumed or never published).
    Empty,
}

#[derive(Clone)]
pub struct MetricService {
    queue: Arc<QueueRepo>,
    store: Arc<MetricRepo>,
    stats: Arc<AggregationStats>,
}

impl MetricService {
    pub fn new(queue: Arc<QueueRepo>, store: Arc<MetricRepo>) -> Self {
        Self {
            queue,
            store,
            stats: Arc::new(AggregationStats::default()),
        }
    }

    pub fn stats(&self) -> Arc<AggregationStats> {
        self.stats.clone()
    }

    /// Takes up to `chunk` entries from `channel` and aggregates each one concurrently.
    /// Returns how many entries were dispatched. Only the channel read can fail; per-entry
    /// failures are logged and counted.
    #[instrument(skip(self))]
    pub async fn fetch_metrics(&self, channel: MetricsChannel, chunk: usize) -> anyhow::Result<usize> {
        let records = self.queue.take_front(channel.as_str(), Some(chunk)).await?;
        let dispatched = records.len();
        if dispatched == 0 {
            return Ok(0);
        }

        let mut tasks = JoinSet::new();
        for record in records {
            let service = self.clone();
            tasks.spawn(async move {
                let result = match channel {
                    MetricsChannel::RequestIds => {
                        service.aggregate_request_metric(&record).await.map(|_| ())
                    }
                    MetricsChannel::Network => service.aggregate_network_metric(&record).await,
                };
                if let Err(e) = result {
                    service.stats.failures.fetch_add(1, Ordering::Relaxed);
                    warn!(
                        error = %e,
                        channel = %channel,
                        record = %record,
                        operation = "aggregate",
                        "aggregation failed"
                    );
                }
            });
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                self.stats.failures.fetch_add(1, Ordering::Relaxed);
                warn!(error = %e, channel = %channel, "aggregation task panicked");
            }
        }

        debug!(dispatched, "chunk processed");
        Ok(dispatched)
    }

    /// Takes every event queued under `request_id`, folds them into one RequestMetric and
    /// persists it. Events are removed before the write: a failed write loses them.
    #[instrument(skip(self))]
    pub async fn aggregate_request_metric(&self, request_id: &str) -> anyhow::Result<RequestOutcome> {
        let payloads = self
            .queue
            .take_front(&request_events_key(request_id), None)
            .await?;
        if payloads.is_empty() {
            debug!("no events queued for request");
            return Ok(RequestOutcome::Empty);
        }

        let (events, errors) = parse_events(&payloads);
        for (index, e) in &errors {
            warn!(
                error = %e,
                index,
                operation = "parse_event",
                "skipping malformed request event"
            );
        }
        self.stats
            .events_skipped
            .fetch_add(errors.len() as u64, Ordering::Relaxed);

        let metric = build_request_metric(request_id, &events);
        self.store.insert_request_metric(&metric).await?;
        self.stats.requests_aggregated.fetch_add(1, Ordering::Relaxed);

        Ok(RequestOutcome::Persisted {
            events: events.len(),
            skipped: errors.len(),
        })
    }

    /// Persists one network snapshot. A malformed payload is logged and dropped.
    #[instrument(skip(self, payload))]
    pub async fn aggregate_network_metric(&self, payload: &str) -> anyhow::Result<()> {
        let metric = match parse_network_snapshot(payload) {
            Ok(m) => m,
            Err(e) => {
                self.stats.events_skipped.fetch_add(1, Ordering::Relaxed);
                warn!(
                    error = %e,
                    operation = "parse_network_snapshot",
                    "skipping malformed network snapshot"
                );
                return Ok(());
            }
        };
        self.store.insert_network_metric(&metric).await?;
        self.stats.network_aggregated.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
