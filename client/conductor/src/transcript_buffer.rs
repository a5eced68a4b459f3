//! Client-side transcript buffering (§4.4, §5): both directions of
//! traffic are buffered and flushed to the transcript store every 200 ms
//! in a single batch, or immediately on session close.

use std::sync::Arc;
use std::time::Duration;

use agentsrv_protocol::ThreadId;
use agentsrv_transcript::Direction;
use agentsrv_transcript::TranscriptError;
use agentsrv_transcript::TranscriptEvent;
use agentsrv_transcript::TranscriptStore;
use tokio::sync::Mutex;

/// Debounce window before a batch is flushed (§5).
pub const FLUSH_INTERVAL: Duration = Duration::from_millis(200);

pub struct TranscriptBuffer {
    store: Arc<dyn TranscriptStore>,
    thread_id: ThreadId,
    pending: Mutex<Vec<TranscriptEvent>>,
}

impl TranscriptBuffer {
    pub fn new(store: Arc<dyn TranscriptStore>, thread_id: ThreadId) -> Self {
        Self {
            store,
            thread_id,
            pending: Mutex::new(Vec::new()),
        }
    }

    pub async fn record(&self, direction: Direction, payload: serde_json::Value) {
        self.pending
            .lock()
            .await
            .push(TranscriptEvent::new(self.thread_id.clone(), direction, payload));
    }

    /// Drain whatever has accumulated and append it as one batch. A no-op
    /// when nothing is pending, matching the store's empty-batch no-op.
    pub async fn flush(&self) -> Result<(), TranscriptError> {
        let batch = std::mem::take(&mut *self.pending.lock().await);
        self.store.append_batch(&self.thread_id, &batch).await
    }

    pub async fn pending_count(&self) -> usize {
        self.pending.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn flush_writes_everything_recorded_since_the_last_flush() {
        let tmp = tempfile::tempdir().unwrap();
        let store: Arc<dyn TranscriptStore> =
            Arc::new(agentsrv_transcript::FileTranscriptStore::new(tmp.path()));
        let thread_id = ThreadId::from("t1");
        let buffer = TranscriptBuffer::new(store.clone(), thread_id.clone());

        buffer.record(Direction::Client, serde_json::json!({"a": 1})).await;
        buffer.record(Direction::Server, serde_json::json!({"b": 2})).await;
        assert_eq!(buffer.pending_count().await, 2);

        buffer.flush().await.unwrap();
        assert_eq!(buffer.pending_count().await, 0);

        let events = store.read(&thread_id).await.unwrap();
        assert_eq!(events.len(), 2);
    }

    #[tokio::test]
    async fn flush_with_nothing_pending_is_a_no_op() {
        let tmp = tempfile::tempdir().unwrap();
        let store: Arc<dyn TranscriptStore> =
            Arc::new(agentsrv_transcript::FileTranscriptStore::new(tmp.path()));
        let buffer = TranscriptBuffer::new(store, ThreadId::from("t1"));
        buffer.flush().await.unwrap();
    }
}
