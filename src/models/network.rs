// Per-node network counters: the queued snapshot and the flattened persisted record

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkCounters {
    pub bytes_in: i64,
    pub bytes_out: i64,
    pub connections: i64,
}

/// Payload queued under the NETWORK channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSnapshotEvent {
    pub node_id: String,
    pub date: i64,
    pub network: NetworkCounters,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkMetric {
    pub node_id: String,
    pub date: i64,
    pub bytes_in: i64,
    pub bytes_out: i64,
    pub connections: i64,
}

impl From<NetworkSnapshotEvent> for NetworkMetric {
    fn from(e: NetworkSnapshotEvent) -> Self {
        Self {
            node_id: e.node_id,
            date: e.date,
            bytes_in: e.network.bytes_in,
            bytes_out: e.network.bytes_out,
            connections: e.network.connections,
        }
    }
}
