// Config loading and validation tests

use gateway_metrics::config::AppConfig;
use gateway_metrics::scheduler::SchedulerConfig;
use std::time::Duration;

const VALID_CONFIG: &str = r#"
[queue]
path = "data/queue.db"
max_pool_size = 4

[database]
path = "data/metrics.db"
max_pool_size = 10

[metrics]
delay_ms = 5000
chunk = 100

[monitoring]
stats_log_interval_secs = 30
"#;

#[test]
fn test_config_loads_from_str() {
    let config = AppConfig::load_from_str(VALID_CONFIG).expect("load_from_str");
    assert_eq!(config.queue.path, "data/queue.db");
    assert_eq!(config.queue.max_pool_size, 4);
    assert_eq!(config.database.path, "data/metrics.db");
    assert_eq!(config.database.max_pool_size, 10);
    assert_eq!(config.metrics.delay_ms, 5000);
    assert_eq!(config.metrics.chunk, 100);
    assert_eq!(config.monitoring.stats_log_interval_secs, 30);
}

#[test]
fn test_config_defaults_when_omitted() {
    let minimal = r#"
[queue]
path = "q.db"

[database]
path = "m.db"

[metrics]
delay_ms = 1000
chunk = 10
"#;
    let config = AppConfig::load_from_str(minimal).expect("valid");
    assert_eq!(config.queue.max_pool_size, 10);
    assert_eq!(config.database.max_pool_size, 10);
    assert_eq!(config.monitoring.stats_log_interval_secs, 60);
}

#[test]
fn test_scheduler_config_from_app_config() {
    let config = AppConfig::load_from_str(VALID_CONFIG).unwrap();
    let scheduler = SchedulerConfig::from(&config);
    assert_eq!(scheduler.delay, Duration::from_millis(5000));
    assert_eq!(scheduler.chunk, 100);
    assert_eq!(scheduler.stats_log_interval, Duration::from_secs(30));
}

#[test]
fn test_config_validation_rejects_empty_queue_path() {
    let bad = VALID_CONFIG.replace("path = \"data/queue.db\"", "path = \"\"");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("queue.path"));
}

#[test]
fn test_config_validation_rejects_empty_db_path() {
    let bad = VALID_CONFIG.replace("path = \"data/metrics.db\"", "path = \"\"");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("database.path"));
}

#[test]
fn test_config_validation_rejects_max_pool_size_zero() {
    let bad = VALID_CONFIG.replace("max_pool_size = 10", "max_pool_size = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("database.max_pool_size"));
}

#[test]
fn test_config_validation_rejects_delay_zero() {
    let bad = VALID_CONFIG.replace("delay_ms = 5000", "delay_ms = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("metrics.delay_ms"));
}

#[test]
fn test_config_validation_rejects_chunk_zero() {
    let bad = VALID_CONFIG.replace("chunk = 100", "chunk = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("metrics.chunk"));
}

#[test]
fn test_config_validation_rejects_stats_log_interval_zero() {
    let bad = VALID_CONFIG.replace(
        "stats_log_interval_secs = 30",
        "stats_log_interval_secs = 0",
    );
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("stats_log_interval_secs"));
}

#[test]
fn test_config_rejects_missing_metrics_section() {
    let bad = VALID_CONFIG.replace("[metrics]\ndelay_ms = 5000\nchunk = 100\n", "");
    assert!(AppConfig::load_from_str(&bad).is_err());
}

#[test]
fn test_config_validation_rejects_invalid_toml() {
    let err = AppConfig::load_from_str("not valid toml [[[").unwrap_err();
    assert!(!err.to_string().is_empty());
}

#[test]
fn test_config_load_from_file_via_env() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, VALID_CONFIG).unwrap();
    unsafe { std::env::set_var("CONFIG_FILE", path.to_str().unwrap()) };
    let result = AppConfig::load();
    unsafe { std::env::remove_var("CONFIG_FILE") };
    let config = result.expect("load from CONFIG_FILE");
    assert_eq!(config.metrics.chunk, 100);
    assert_eq!(config.database.path, "data/metrics.db");
}
