use anyhow::Result;
use gateway_metrics::*;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = config::AppConfig::load()?;
    tracing::info!(
        service = version::NAME,
        version = version::VERSION,
        delay_ms = app_config.metrics.delay_ms,
        chunk = app_config.metrics.chunk,
        "Starting metrics aggregator"
    );

    let queue_repo = Arc::new(
        queue_repo::QueueRepo::connect(&app_config.queue.path, app_config.queue.max_pool_size)
            .await?,
    );
    queue_repo.init().await?;

    let metric_repo = Arc::new(
        metric_repo::MetricRepo::connect(
            &app_config.database.path,
            app_config.database.max_pool_size,
        )
        .await?,
    );
    metric_repo.init().await?;

    let service = metric_service::MetricService::new(queue_repo, metric_repo);
    let scheduler = scheduler::spawn(service, scheduler::SchedulerConfig::from(&app_config));

    shutdown_signal().await;
    tracing::info!("Received shutdown signal");
    scheduler.shutdown().await;

    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(_) => {
                    let _ = tokio::signal::ctrl_c().await;
                    return;
                }
            };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
