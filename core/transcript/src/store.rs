//! The transcript store interface (§6: `readTranscript`,
//! `appendTranscriptBatch`, `deleteTranscript`) and a default
//! newline-delimited-JSON file backend.

use std::path::Path;
use std::path::PathBuf;

use agentsrv_protocol::ThreadId;
use async_trait::async_trait;
use snafu::ResultExt;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::instrument;

use crate::error::AppendSnafu;
use crate::error::DeleteSnafu;
use crate::error::ReadSnafu;
use crate::error::TranscriptError;
use crate::event::TranscriptEvent;

/// Total order per thread, atomic batch append — the guarantees named by
/// the §3 data model and relied on by the client conductor's 200ms
/// debounced flush (§4.4).
#[async_trait]
pub trait TranscriptStore: Send + Sync {
    async fn read(&self, thread_id: &ThreadId) -> Result<Vec<TranscriptEvent>, TranscriptError>;
    async fn append_batch(
        &self,
        thread_id: &ThreadId,
        events: &[TranscriptEvent],
    ) -> Result<(), TranscriptError>;
    async fn delete(&self, thread_id: &ThreadId) -> Result<(), TranscriptError>;
}

/// One append-only `.jsonl` file per thread under `root`.
pub struct FileTranscriptStore {
    root: PathBuf,
}

impl FileTranscriptStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, thread_id: &ThreadId) -> PathBuf {
        self.root.join(format!("{}.jsonl", thread_id.as_str()))
    }
}

#[async_trait]
impl TranscriptStore for FileTranscriptStore {
    #[instrument(skip_all, fields(thread_id = %thread_id))]
    async fn read(&self, thread_id: &ThreadId) -> Result<Vec<TranscriptEvent>, TranscriptError> {
        let path = self.path_for(thread_id);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let raw = fs::read_to_string(&path).await.context(ReadSnafu { path: path.clone() })?;
        let mut events = Vec::new();
        for line in raw.lines().filter(|line| !line.trim().is_empty()) {
            let deserializer = &mut serde_json::Deserializer::from_str(line);
            let event: TranscriptEvent = serde_path_to_error::deserialize(deserializer)
                .context(crate::error::CorruptSnafu { path: path.clone() })?;
            events.push(event);
        }
        Ok(events)
    }

    #[instrument(skip_all, fields(thread_id = %thread_id, count = events.len()))]
    async fn append_batch(
        &self,
        thread_id: &ThreadId,
        events: &[TranscriptEvent],
    ) -> Result<(), TranscriptError> {
        if events.is_empty() {
            return Ok(());
        }
        fs::create_dir_all(&self.root)
            .await
            .context(AppendSnafu {
                path: self.root.clone(),
            })?;
        let path = self.path_for(thread_id);
        let mut buf = String::new();
        for event in events {
            buf.push_str(&serde_json::to_string(event).unwrap_or_default());
            buf.push('\n');
        }
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .context(AppendSnafu { path: path.clone() })?;
        file.write_all(buf.as_bytes())
            .await
            .context(AppendSnafu { path: path.clone() })?;
        Ok(())
    }

    #[instrument(skip_all, fields(thread_id = %thread_id))]
    async fn delete(&self, thread_id: &ThreadId) -> Result<(), TranscriptError> {
        let path = self.path_for(thread_id);
        if !path.exists() {
            return Ok(());
        }
        fs::remove_file(&path).await.context(DeleteSnafu { path })
    }
}

impl FileTranscriptStore {
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Direction;

    fn sample_event(thread_id: &ThreadId) -> TranscriptEvent {
        TranscriptEvent::new(
            thread_id.clone(),
            Direction::Client,
            serde_json::json!({"type": "user_message", "text": "hi"}),
        )
    }

    #[tokio::test]
    async fn read_of_missing_thread_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileTranscriptStore::new(tmp.path());
        let thread_id = ThreadId::from("t1");
        assert!(store.read(&thread_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn append_then_read_preserves_order() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileTranscriptStore::new(tmp.path());
        let thread_id = ThreadId::from("t1");

        let first = sample_event(&thread_id);
        let second = sample_event(&thread_id);
        store.append_batch(&thread_id, &[first.clone()]).await.unwrap();
        store.append_batch(&thread_id, &[second.clone()]).await.unwrap();

        let events = store.read(&thread_id).await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].ts, first.ts);
        assert_eq!(events[1].ts, second.ts);
    }

    #[tokio::test]
    async fn delete_removes_the_thread_file() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileTranscriptStore::new(tmp.path());
        let thread_id = ThreadId::from("t1");
        store
            .append_batch(&thread_id, &[sample_event(&thread_id)])
            .await
            .unwrap();
        store.delete(&thread_id).await.unwrap();
        assert!(store.read(&thread_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_batch_is_a_no_op() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileTranscriptStore::new(tmp.path());
        let thread_id = ThreadId::from("t1");
        store.append_batch(&thread_id, &[]).await.unwrap();
        assert!(!tmp.path().join("t1.jsonl").exists());
    }
}
