// Scheduler: two independent periodic triggers (REQUEST_IDS, NETWORK) on the same delay,
// plus a stats logger. Each firing runs fetch-and-dispatch in its own task, so a slow pass
// overlaps the next one instead of delaying it.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{info, instrument, warn};

use crate::config::AppConfig;
use crate::metric_service::MetricService;
use crate::models::MetricsChannel;

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Interval between firings, shared by both channels. First firing is one delay after start.
    pub delay: Duration,
    /// Max entries fetched per firing.
    pub chunk: usize,
    pub stats_log_interval: Duration,
}

impl From<&AppConfig> for SchedulerConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            delay: Duration::from_millis(config.metrics.delay_ms),
            chunk: config.metrics.chunk,
            stats_log_interval: Duration::from_secs(config.monitoring.stats_log_interval_secs),
        }
    }
}

/// Owns the scheduler tasks. Dropping it without [`SchedulerHandle::shutdown`] also stops
/// the loops (the shutdown channel closes), but does not wait for them.
pub struct SchedulerHandle {
    shutdown_tx: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl SchedulerHandle {
    /// Stops the triggers and waits for the loops to exit, including passes already in flight.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        for task in self.tasks {
            if let Err(e) = task.await {
                warn!(error = %e, "scheduler task ended abnormally");
            }
        }
        tracing::debug!("Scheduler shut down");
    }
}

/// Spawns one trigger per channel and the stats logger.
pub fn spawn(service: MetricService, config: SchedulerConfig) -> SchedulerHandle {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let mut tasks: Vec<JoinHandle<()>> = MetricsChannel::ALL
        .into_iter()
        .map(|channel| {
            tokio::spawn(run_channel(
                service.clone(),
                channel,
                config.clone(),
                shutdown_rx.clone(),
            ))
        })
        .collect();
    tasks.push(tokio::spawn(log_stats(
        service,
        config.stats_log_interval,
        shutdown_rx,
    )));

    SchedulerHandle { shutdown_tx, tasks }
}

#[instrument(skip(service, channel, config, shutdown_rx), fields(channel = %channel, delay_ms = config.delay.as_millis() as u64, chunk = config.chunk))]
async fn run_channel(
    service: MetricService,
    channel: MetricsChannel,
    config: SchedulerConfig,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut tick = interval_at(Instant::now() + config.delay, config.delay);
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut in_flight = JoinSet::new();

    loop {
        tokio::select! {
            _ = tick.tick() => {
                let service = service.clone();
                let chunk = config.chunk;
                in_flight.spawn(async move {
                    if let Err(e) = service.fetch_metrics(channel, chunk).await {
                        warn!(
                            error = %e,
                            channel = %channel,
                            operation = "fetch_metrics",
                            "fetching metrics failed"
                        );
                    }
                });
            }
            Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                if let Err(e) = joined {
                    warn!(error = %e, channel = %channel, "fetch task panicked");
                }
            }
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
            }
        }
    }

    // Passes already started finish their read/trim/persist sequence
    while in_flight.join_next().await.is_some() {}
}

async fn log_stats(
    service: MetricService,
    every: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let stats = service.stats();
    let mut tick = interval_at(Instant::now() + every, every);
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = tick.tick() => {
                let s = stats.snapshot();
                info!(
                    requests_aggregated = s.requests_aggregated,
                    network_aggregated = s.network_aggregated,
                    events_skipped = s.events_skipped,
                    failures = s.failures,
                    "aggregation stats"
                );
            }
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
            }
        }
    }
}
