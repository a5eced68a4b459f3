//! The in-memory session registry (§5: "Session registry: mutated only
//! inside the runtime's supervisor task").

use std::collections::HashMap;
use std::sync::Arc;

use agentsrv_protocol::SessionId;
use tokio::sync::RwLock;

use crate::runtime::Session;

/// Owns every live session for one workspace. A thin `RwLock<HashMap>`
/// rather than a sharded map: session count per workspace is small (tens,
/// not thousands), so contention is not a concern.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionId, Arc<Session>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, session: Arc<Session>) {
        self.sessions.write().await.insert(session.id.clone(), session);
    }

    pub async fn get(&self, id: &SessionId) -> Option<Arc<Session>> {
        self.sessions.read().await.get(id).cloned()
    }

    pub async fn remove(&self, id: &SessionId) -> Option<Arc<Session>> {
        self.sessions.write().await.remove(id)
    }

    pub async fn all(&self) -> Vec<Arc<Session>> {
        self.sessions.read().await.values().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use crate::mediator::PromptRequest;
    use agentsrv_protocol::ProviderType;
    use agentsrv_protocol::ThreadId;
    use agentsrv_protocol_wire::ServerEvent;
    use agentsrv_transcript::FileTranscriptStore;
    use agentsrv_transcript::TranscriptStore;
    use async_trait::async_trait;
    use tokio::sync::mpsc;

    struct NoopModelClient;

    #[async_trait]
    impl crate::model_client::ModelClient for NoopModelClient {
        async fn open_turn(
            &self,
            _request: crate::model_client::TurnRequest,
        ) -> Result<mpsc::Receiver<crate::model_client::ModelChunk>, crate::error::SessionError>
        {
            let (tx, rx) = mpsc::channel(1);
            let _ = tx.send(crate::model_client::ModelChunk::Finish).await;
            Ok(rx)
        }
    }

    struct NoopToolExecutor;

    #[async_trait]
    impl crate::model_client::ToolExecutor for NoopToolExecutor {
        async fn execute(&self, _name: &str, _args: &serde_json::Value) -> Result<serde_json::Value, String> {
            Ok(serde_json::json!({}))
        }
    }

    fn make_session(id: &str) -> Arc<Session> {
        let (events_tx, _events_rx) = mpsc::unbounded_channel::<ServerEvent>();
        let (prompts_tx, _prompts_rx) = mpsc::unbounded_channel::<PromptRequest>();
        let transcript: Arc<dyn TranscriptStore> =
            Arc::new(FileTranscriptStore::new(std::env::temp_dir()));
        Arc::new(Session::new(
            SessionId::from(id),
            ThreadId::from(id),
            std::env::temp_dir(),
            SessionConfig::new(ProviderType::Anthropic, "claude"),
            events_tx,
            prompts_tx,
            transcript,
            Arc::new(NoopModelClient),
            Arc::new(NoopToolExecutor),
        ))
    }

    #[tokio::test]
    async fn insert_get_remove_round_trips() {
        let registry = SessionRegistry::new();
        let session = make_session("S1");
        registry.insert(session.clone()).await;
        assert!(registry.get(&SessionId::from("S1")).await.is_some());
        assert_eq!(registry.len().await, 1);

        registry.remove(&SessionId::from("S1")).await;
        assert!(registry.get(&SessionId::from("S1")).await.is_none());
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn all_lists_every_registered_session() {
        let registry = SessionRegistry::new();
        registry.insert(make_session("A")).await;
        registry.insert(make_session("B")).await;
        assert_eq!(registry.all().await.len(), 2);
    }
}
