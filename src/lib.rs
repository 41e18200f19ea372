// Library for tests to access modules

pub mod aggregation;
pub mod config;
pub mod metric_repo;
pub mod metric_service;
pub mod models;
pub mod publisher;
pub mod queue_repo;
pub mod scheduler;
pub mod sqlite;
pub mod version;
