// Request lifecycle events as published by the gateway.
// One JSON object per event, kind in the `event` tag; dates are epoch millis.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestLifecycleEvent {
    GotRequest(GotRequest),
    ResolverCalled(ResolverCalled),
    ResolverDone(ResolverDone),
    ResolverError(ResolverError),
    SentResponse(SentResponse),
}

impl RequestLifecycleEvent {
    /// Resolver-level view of this event, if it is one.
    pub fn as_resolver(&self) -> Option<ResolverEvent<'_>> {
        match self {
            RequestLifecycleEvent::ResolverCalled(e) => Some(ResolverEvent::Called(e)),
            RequestLifecycleEvent::ResolverDone(e) => Some(ResolverEvent::Done(e)),
            RequestLifecycleEvent::ResolverError(e) => Some(ResolverEvent::Error(e)),
            RequestLifecycleEvent::GotRequest(_) | RequestLifecycleEvent::SentResponse(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GotRequest {
    pub node_id: String,
    /// `{ query, variables }` as received.
    #[serde(default)]
    pub query: Value,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub ip: Option<String>,
    /// Raw request (headers etc.).
    #[serde(default)]
    pub request: Value,
    pub date: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolverCalled {
    pub path: String,
    #[serde(default)]
    pub source: Option<Value>,
    #[serde(default)]
    pub args: Option<Value>,
    #[serde(default)]
    pub info: Option<Value>,
    pub date: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolverDone {
    pub path: String,
    #[serde(default)]
    pub source: Option<Value>,
    #[serde(default)]
    pub result: Option<Value>,
    pub date: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolverError {
    pub path: String,
    #[serde(default)]
    pub source: Option<Value>,
    #[serde(default)]
    pub error: Option<Value>,
    pub date: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentResponse {
    #[serde(default)]
    pub raw_response_body: Option<String>,
    /// Passed through as sent; producers emit either a string or a number.
    #[serde(default)]
    pub content_length: Option<Value>,
    /// Request-level error signal, passed through to the metric untouched.
    #[serde(default)]
    pub error: Option<Value>,
    pub date: i64,
}

/// Borrowed resolver event, the input of the resolver fold.
#[derive(Debug, Clone, Copy)]
pub enum ResolverEvent<'a> {
    Called(&'a ResolverCalled),
    Done(&'a ResolverDone),
    Error(&'a ResolverError),
}

impl<'a> ResolverEvent<'a> {
    pub fn path(&self) -> &'a str {
        match *self {
            ResolverEvent::Called(e) => &e.path,
            ResolverEvent::Done(e) => &e.path,
            ResolverEvent::Error(e) => &e.path,
        }
    }
}
