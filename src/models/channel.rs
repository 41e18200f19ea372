// Queue channel identifiers

use std::fmt;

/// Named queue partitions drained by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricsChannel {
    /// Values are request id strings; each id keys its own list of lifecycle events.
    RequestIds,
    /// Values are serialized network snapshots.
    Network,
}

impl MetricsChannel {
    pub const ALL: [MetricsChannel; 2] = [MetricsChannel::RequestIds, MetricsChannel::Network];

    /// Queue key for this channel.
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricsChannel::RequestIds => "REQUEST_IDS",
            MetricsChannel::Network => "NETWORK",
        }
    }
}

impl fmt::Display for MetricsChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Queue key holding the lifecycle events of `request_id`. The prefix keeps request ids out of
/// the channel key space, so an id equal to a channel name never drains that channel.
pub fn request_events_key(request_id: &str) -> String {
    format!("request:{request_id}")
}
