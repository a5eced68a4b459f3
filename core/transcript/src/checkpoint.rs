//! Named, restorable snapshots of a thread's transcript and config (§3).

use std::path::PathBuf;

use agentsrv_protocol::ThreadId;
use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use snafu::ResultExt;
use tokio::fs;
use tracing::instrument;

use crate::error::DeleteSnafu;
use crate::error::ReadSnafu;
use crate::error::TranscriptError;
use crate::error::UnknownCheckpointSnafu;
use crate::event::TranscriptEvent;
use crate::store::TranscriptStore;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub created_at: DateTime<Utc>,
    pub events: Vec<TranscriptEvent>,
    pub config: serde_json::Value,
}

#[async_trait]
pub trait CheckpointStore: Send + Sync {
    async fn create(
        &self,
        thread_id: &ThreadId,
        label: Option<String>,
        config: serde_json::Value,
    ) -> Result<Checkpoint, TranscriptError>;

    async fn restore(
        &self,
        thread_id: &ThreadId,
        checkpoint_id: &str,
    ) -> Result<Checkpoint, TranscriptError>;

    async fn delete(&self, thread_id: &ThreadId, checkpoint_id: &str) -> Result<(), TranscriptError>;
}

/// Checkpoints live as one JSON file per `(thread, checkpoint)` pair under
/// `root`, and restoring one overwrites the thread's live transcript with
/// the checkpoint's event log via the same [`TranscriptStore`].
pub struct FileCheckpointStore<'a> {
    root: PathBuf,
    transcripts: &'a dyn TranscriptStore,
}

impl<'a> FileCheckpointStore<'a> {
    pub fn new(root: impl Into<PathBuf>, transcripts: &'a dyn TranscriptStore) -> Self {
        Self {
            root: root.into(),
            transcripts,
        }
    }

    fn dir_for(&self, thread_id: &ThreadId) -> PathBuf {
        self.root.join(thread_id.as_str())
    }

    fn path_for(&self, thread_id: &ThreadId, checkpoint_id: &str) -> PathBuf {
        self.dir_for(thread_id).join(format!("{checkpoint_id}.json"))
    }
}

#[async_trait]
impl<'a> CheckpointStore for FileCheckpointStore<'a> {
    #[instrument(skip_all, fields(thread_id = %thread_id))]
    async fn create(
        &self,
        thread_id: &ThreadId,
        label: Option<String>,
        config: serde_json::Value,
    ) -> Result<Checkpoint, TranscriptError> {
        let events = self.transcripts.read(thread_id).await?;
        let checkpoint = Checkpoint {
            id: uuid::Uuid::new_v4().to_string(),
            label,
            created_at: Utc::now(),
            events,
            config,
        };
        let dir = self.dir_for(thread_id);
        fs::create_dir_all(&dir).await.context(ReadSnafu { path: dir.clone() })?;
        let path = self.path_for(thread_id, &checkpoint.id);
        let serialized = serde_json::to_string_pretty(&checkpoint).unwrap_or_default();
        fs::write(&path, serialized)
            .await
            .context(ReadSnafu { path: path.clone() })?;
        Ok(checkpoint)
    }

    #[instrument(skip_all, fields(thread_id = %thread_id, checkpoint_id))]
    async fn restore(
        &self,
        thread_id: &ThreadId,
        checkpoint_id: &str,
    ) -> Result<Checkpoint, TranscriptError> {
        let path = self.path_for(thread_id, checkpoint_id);
        if !path.exists() {
            return UnknownCheckpointSnafu {
                thread_id: thread_id.to_string(),
                checkpoint_id: checkpoint_id.to_string(),
            }
            .fail();
        }
        let raw = fs::read_to_string(&path).await.context(ReadSnafu { path: path.clone() })?;
        let deserializer = &mut serde_json::Deserializer::from_str(&raw);
        let checkpoint: Checkpoint = serde_path_to_error::deserialize(deserializer)
            .context(crate::error::CorruptSnafu { path: path.clone() })?;
        self.transcripts.delete(thread_id).await?;
        self.transcripts
            .append_batch(thread_id, &checkpoint.events)
            .await?;
        Ok(checkpoint)
    }

    #[instrument(skip_all, fields(thread_id = %thread_id, checkpoint_id))]
    async fn delete(&self, thread_id: &ThreadId, checkpoint_id: &str) -> Result<(), TranscriptError> {
        let path = self.path_for(thread_id, checkpoint_id);
        if !path.exists() {
            return UnknownCheckpointSnafu {
                thread_id: thread_id.to_string(),
                checkpoint_id: checkpoint_id.to_string(),
            }
            .fail();
        }
        fs::remove_file(&path).await.context(DeleteSnafu { path })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Direction;
    use crate::store::FileTranscriptStore;

    #[tokio::test]
    async fn create_then_restore_round_trips_events() {
        let transcript_dir = tempfile::tempdir().unwrap();
        let checkpoint_dir = tempfile::tempdir().unwrap();
        let transcripts = FileTranscriptStore::new(transcript_dir.path());
        let thread_id = ThreadId::from("t1");

        transcripts
            .append_batch(
                &thread_id,
                &[TranscriptEvent::new(
                    thread_id.clone(),
                    Direction::Client,
                    serde_json::json!({"text": "hello"}),
                )],
            )
            .await
            .unwrap();

        let checkpoints = FileCheckpointStore::new(checkpoint_dir.path(), &transcripts);
        let checkpoint = checkpoints
            .create(&thread_id, Some("before-refactor".to_string()), serde_json::json!({}))
            .await
            .unwrap();

        transcripts
            .append_batch(
                &thread_id,
                &[TranscriptEvent::new(
                    thread_id.clone(),
                    Direction::Server,
                    serde_json::json!({"text": "more"}),
                )],
            )
            .await
            .unwrap();
        assert_eq!(transcripts.read(&thread_id).await.unwrap().len(), 2);

        checkpoints.restore(&thread_id, &checkpoint.id).await.unwrap();
        assert_eq!(transcripts.read(&thread_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn restoring_unknown_checkpoint_fails() {
        let transcript_dir = tempfile::tempdir().unwrap();
        let checkpoint_dir = tempfile::tempdir().unwrap();
        let transcripts = FileTranscriptStore::new(transcript_dir.path());
        let checkpoints = FileCheckpointStore::new(checkpoint_dir.path(), &transcripts);
        let thread_id = ThreadId::from("t1");
        assert!(checkpoints.restore(&thread_id, "missing").await.is_err());
    }
}
