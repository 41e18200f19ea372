use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub queue: QueueConfig,
    pub database: DatabaseConfig,
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub monitoring: MonitoringConfig,
}

/// SQLite file backing the event queue (request ids, request events, network snapshots).
#[derive(Debug, Clone, Deserialize)]
pub struct QueueConfig {
    pub path: String,
    #[serde(default = "default_max_pool_size")]
    pub max_pool_size: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
    #[serde(default = "default_max_pool_size")]
    pub max_pool_size: u32,
}

fn default_max_pool_size() -> u32 {
    10
}

/// Scheduler settings, shared by the REQUEST_IDS and NETWORK channels.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    /// Interval between scheduler firings.
    pub delay_ms: u64,
    /// Max queue entries fetched per firing.
    pub chunk: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    /// How often to log aggregation stats at INFO level.
    #[serde(default = "default_stats_log_interval_secs")]
    pub stats_log_interval_secs: u64,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            stats_log_interval_secs: default_stats_log_interval_secs(),
        }
    }
}

fn default_stats_log_interval_secs() -> u64 {
    60
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(!self.queue.path.is_empty(), "queue.path must be non-empty");
        anyhow::ensure!(
            self.queue.max_pool_size > 0,
            "queue.max_pool_size must be > 0, got {}",
            self.queue.max_pool_size
        );
        anyhow::ensure!(
            !self.database.path.is_empty(),
            "database.path must be non-empty"
        );
        anyhow::ensure!(
            self.database.max_pool_size > 0,
            "database.max_pool_size must be > 0, got {}",
            self.database.max_pool_size
        );
        anyhow::ensure!(
            self.metrics.delay_ms > 0,
            "metrics.delay_ms must be > 0, got {}",
            self.metrics.delay_ms
        );
        anyhow::ensure!(
            self.metrics.chunk > 0,
            "metrics.chunk must be > 0, got {}",
            self.metrics.chunk
        );
        anyhow::ensure!(
            self.monitoring.stats_log_interval_secs > 0,
            "monitoring.stats_log_interval_secs must be > 0, got {}",
            self.monitoring.stats_log_interval_secs
        );
        Ok(())
    }
}
