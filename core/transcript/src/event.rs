//! [`TranscriptEvent`]: the durable record every server<->client message
//! is reduced to before it reaches disk (§3, §6).

use agentsrv_protocol::ThreadId;
use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// Who sent the framed message this event records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Server,
    Client,
}

/// A single durable transcript record.
///
/// The payload is opaque here by design: this crate does not parse wire
/// protocol messages, it only stores and replays whatever `serde_json::Value`
/// the caller hands it, the same way the teacher's `core/tools`
/// result-persistence layer stores tool results without knowing their shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptEvent {
    pub ts: DateTime<Utc>,
    #[serde(rename = "threadId")]
    pub thread_id: ThreadId,
    pub direction: Direction,
    pub payload: serde_json::Value,
}

impl TranscriptEvent {
    pub fn new(thread_id: ThreadId, direction: Direction, payload: serde_json::Value) -> Self {
        Self {
            ts: Utc::now(),
            thread_id,
            direction,
            payload,
        }
    }
}
