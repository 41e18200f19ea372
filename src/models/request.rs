// Persisted per-request metric and its embedded resolver summaries

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One entry per distinct resolver path of a request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolverSummary {
    pub path: String,
    /// done_at - called_at; None when either is missing.
    pub latency: Option<i64>,
    pub info: Option<Value>,
    pub args: Option<Value>,
    pub source: Option<Value>,
    pub result: Option<Value>,
    pub error: Option<Value>,
    pub called_at: Option<i64>,
    pub done_at: Option<i64>,
    pub error_at: Option<i64>,
}

/// Denormalized record of one request's lifecycle. Write-once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestMetric {
    pub request_id: String,
    pub resolvers: Vec<ResolverSummary>,
    /// response_date - request_date; None when either side is missing.
    pub latency: Option<i64>,
    pub node_id: Option<String>,
    pub query: Value,
    pub user_agent: Option<String>,
    pub ip: Option<String>,
    pub request: Value,
    pub raw_response_body: Option<String>,
    pub content_length: Option<Value>,
    pub error: Option<Value>,
    pub request_date: Option<i64>,
    pub response_date: Option<i64>,
}
