use serde::{Deserialize, Serialize};

use super::message::ServerMessage;
use crate::net::RECV_BUFFER_SIZE;

/// Snapshots that would exceed this size on the wire are split into parts.
pub const MAX_SNAPSHOT_BYTES: usize = RECV_BUFFER_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TransformState {
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
    pub scale: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct VelocityState {
    pub dx: f32,
    pub dy: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HealthState {
    pub hp: i32,
    pub max_hp: i32,
}

/// One replicated entity inside a `snapshot` message.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EntityRecord {
    pub id: u32,
    pub transform: TransformState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub velocity: Option<VelocityState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health: Option<HealthState>,
}

fn encoded_len<T: Serialize>(value: &T) -> usize {
    serde_json::to_string(value).map_or(0, |s| s.len())
}

/// Build the `snapshot` message(s) for one tick. A snapshot that fits in
/// `max_bytes` goes out as a single message; otherwise entities are
/// partitioned deterministically, in id order, into consecutive parts
/// tagged `part`/`parts`. Clients merge parts by entity id.
pub fn snapshot_parts(entities: Vec<EntityRecord>, max_bytes: usize) -> Vec<ServerMessage> {
    let whole = ServerMessage::Snapshot {
        entities,
        part: 0,
        parts: 1,
    };
    if encoded_len(&whole) <= max_bytes {
        return vec![whole];
    }
    let ServerMessage::Snapshot { entities, .. } = whole else {
        return Vec::new();
    };

    // Envelope cost of an entity-less part, with slack for the part counters
    // growing past one digit.
    let envelope = encoded_len(&ServerMessage::Snapshot {
        entities: Vec::new(),
        part: 0,
        parts: 1,
    }) + 8;
    let capacity = max_bytes.saturating_sub(envelope).max(1);

    let mut chunks: Vec<Vec<EntityRecord>> = Vec::new();
    let mut current: Vec<EntityRecord> = Vec::new();
    let mut current_len = 0usize;
    for record in entities {
        let record_len = encoded_len(&record) + 1;
        if !current.is_empty() && current_len + record_len > capacity {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        current_len += record_len;
        current.push(record);
    }
    if !current.is_empty() || chunks.is_empty() {
        chunks.push(current);
    }

    let parts = chunks.len() as u32;
    chunks
        .into_iter()
        .enumerate()
        .map(|(index, entities)| ServerMessage::Snapshot {
            entities,
            part: index as u32,
            parts,
        })
        .collect()
}
