// Queue payloads and persisted metric records

mod channel;
mod event;
mod network;
mod request;

pub use channel::{MetricsChannel, request_events_key};
pub use event::{
    GotRequest, RequestLifecycleEvent, ResolverCalled, ResolverDone, ResolverError, ResolverEvent,
    SentResponse,
};
pub use network::{NetworkCounters, NetworkMetric, NetworkSnapshotEvent};
pub use request::{RequestMetric, ResolverSummary};
