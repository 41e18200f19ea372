// Pure correlation logic: payload decoding, the resolver fold and request metric assembly.
// Queue and store access stays in metric_service.

use std::collections::HashMap;

use serde_json::Value;

use crate::models::{
    NetworkMetric, NetworkSnapshotEvent, RequestLifecycleEvent, RequestMetric, ResolverEvent,
    ResolverSummary,
};

#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    /// Not JSON, unknown `event` tag, or a field of the wrong type.
    #[error("malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),
    /// A field the payload kind requires is absent or null.
    #[error("missing field `{0}`")]
    MissingField(&'static str),
}

/// Top-level keys each event kind must carry.
fn required_event_fields(kind: &str) -> &'static [&'static str] {
    match kind {
        "GOT_REQUEST" => &["nodeId", "date"],
        "RESOLVER_CALLED" | "RESOLVER_DONE" | "RESOLVER_ERROR" => &["path", "date"],
        "SENT_RESPONSE" => &["date"],
        _ => &[],
    }
}

fn require_fields(value: &Value, fields: &'static [&'static str]) -> Result<(), PayloadError> {
    for &field in fields {
        if value.get(field).is_none_or(Value::is_null) {
            return Err(PayloadError::MissingField(field));
        }
    }
    Ok(())
}

pub fn parse_event(payload: &str) -> Result<RequestLifecycleEvent, PayloadError> {
    let value: Value = serde_json::from_str(payload)?;
    match value.get("event") {
        Some(Value::String(kind)) => require_fields(&value, required_event_fields(kind))?,
        None if value.is_object() => return Err(PayloadError::MissingField("event")),
        _ => {}
    }
    Ok(serde_json::from_value(value)?)
}

pub fn parse_network_snapshot(payload: &str) -> Result<NetworkMetric, PayloadError> {
    let value: Value = serde_json::from_str(payload)?;
    if value.is_object() {
        require_fields(&value, &["nodeId", "date", "network"])?;
    }
    let snapshot: NetworkSnapshotEvent = serde_json::from_value(value)?;
    Ok(snapshot.into())
}

/// Decodes payloads in order, dropping the ones that fail. Returns the events and the
/// per-payload errors (index into `payloads`, error) for the caller to report.
pub fn parse_events(payloads: &[String]) -> (Vec<RequestLifecycleEvent>, Vec<(usize, PayloadError)>) {
    let mut events = Vec::with_capacity(payloads.len());
    let mut errors = Vec::new();
    for (i, payload) in payloads.iter().enumerate() {
        match parse_event(payload) {
            Ok(e) => events.push(e),
            Err(e) => errors.push((i, e)),
        }
    }
    (events, errors)
}

/// Folds resolver events into one summary per distinct path, in order of first appearance.
///
/// Events sharing a path merge field by field with last-value-wins, so a path resolved
/// several times in one request (list items, batching) keeps only the latest values.
/// A field absent from a later event keeps the earlier value.
pub fn reduce_resolvers<'a, I>(events: I) -> Vec<ResolverSummary>
where
    I: IntoIterator<Item = ResolverEvent<'a>>,
{
    let mut out: Vec<ResolverSummary> = Vec::new();
    let mut index: HashMap<&'a str, usize> = HashMap::new();

    for event in events {
        let path = event.path();
        let i = *index.entry(path).or_insert_with(|| {
            out.push(ResolverSummary {
                path: path.to_string(),
                ..Default::default()
            });
            out.len() - 1
        });
        let summary = &mut out[i];

        match event {
            ResolverEvent::Called(e) => {
                summary.called_at = Some(e.date);
                overwrite(&mut summary.info, &e.info);
                overwrite(&mut summary.args, &e.args);
                overwrite(&mut summary.source, &e.source);
            }
            ResolverEvent::Done(e) => {
                summary.done_at = Some(e.date);
                overwrite(&mut summary.result, &e.result);
                overwrite(&mut summary.source, &e.source);
            }
            ResolverEvent::Error(e) => {
                summary.error_at = Some(e.date);
                overwrite(&mut summary.error, &e.error);
                overwrite(&mut summary.source, &e.source);
            }
        }
    }

    for summary in &mut out {
        summary.latency = summary
            .done_at
            .zip(summary.called_at)
            .map(|(done, called)| done - called);
    }
    out
}

fn overwrite(slot: &mut Option<Value>, incoming: &Option<Value>) {
    if incoming.is_some() {
        slot.clone_from(incoming);
    }
}

/// Builds the request metric from one request's events. Missing GOT_REQUEST or
/// SENT_RESPONSE leaves the fields they supply (and latency) as None.
pub fn build_request_metric(request_id: &str, events: &[RequestLifecycleEvent]) -> RequestMetric {
    let mut metric = RequestMetric {
        request_id: request_id.to_string(),
        resolvers: reduce_resolvers(events.iter().filter_map(RequestLifecycleEvent::as_resolver)),
        latency: None,
        node_id: None,
        query: Value::Null,
        user_agent: None,
        ip: None,
        request: Value::Null,
        raw_response_body: None,
        content_length: None,
        error: None,
        request_date: None,
        response_date: None,
    };

    for event in events {
        match event {
            RequestLifecycleEvent::GotRequest(e) => {
                metric.node_id = Some(e.node_id.clone());
                metric.query = e.query.clone();
                metric.user_agent = e.user_agent.clone();
                metric.ip = e.ip.clone();
                metric.request = e.request.clone();
                metric.request_date = Some(e.date);
            }
            RequestLifecycleEvent::SentResponse(e) => {
                metric.raw_response_body = e.raw_response_body.clone();
                metric.content_length = e.content_length.clone();
                metric.error = e.error.clone();
                metric.response_date = Some(e.date);
            }
            RequestLifecycleEvent::ResolverCalled(_)
            | RequestLifecycleEvent::ResolverDone(_)
            | RequestLifecycleEvent::ResolverError(_) => {}
        }
    }

    metric.latency = metric
        .response_date
        .zip(metric.request_date)
        .map(|(response, request)| response - request);
    metric
}
