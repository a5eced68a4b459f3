//! A deliberately minimal [`ModelClient`]: any particular model vendor's
//! wire format is out of scope here (see `agentsrv_session::ModelClient`'s
//! own doc comment). This implementation never calls out to a real
//! provider; it streams back a single acknowledgement chunk so the turn
//! loop, tool mediator, and transcript plumbing can be exercised without
//! a network dependency or an API key.

use agentsrv_session::ModelChunk;
use agentsrv_session::ModelClient;
use agentsrv_session::SessionError;
use agentsrv_session::TurnRequest;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Echoes a fixed acknowledgement and never requests a tool call.
///
/// Wiring in a real provider means implementing `ModelClient` against
/// that provider's streaming API and swapping this out at construction
/// time in `main.rs` — the session runtime itself does not change.
pub struct EchoModelClient {
    reply: String,
}

impl EchoModelClient {
    pub fn new(reply: impl Into<String>) -> Self {
        Self { reply: reply.into() }
    }
}

impl Default for EchoModelClient {
    fn default() -> Self {
        Self::new("hi")
    }
}

#[async_trait]
impl ModelClient for EchoModelClient {
    async fn open_turn(&self, _request: TurnRequest) -> Result<mpsc::Receiver<ModelChunk>, SessionError> {
        let (tx, rx) = mpsc::channel(4);
        let reply = self.reply.clone();
        tokio::spawn(async move {
            let _ = tx.send(ModelChunk::TextDelta(reply)).await;
            let _ = tx.send(ModelChunk::Finish).await;
        });
        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentsrv_protocol::ProviderType;

    #[tokio::test]
    async fn streams_the_configured_reply_then_finishes() {
        let client = EchoModelClient::new("hi");
        let mut rx = client
            .open_turn(TurnRequest {
                provider: ProviderType::Anthropic,
                model: "stub".to_string(),
                user_text: "hello".to_string(),
                prior_tool_results: Vec::new(),
            })
            .await
            .unwrap();
        match rx.recv().await {
            Some(ModelChunk::TextDelta(text)) => assert_eq!(text, "hi"),
            other => panic!("unexpected: {other:?}"),
        }
        assert!(matches!(rx.recv().await, Some(ModelChunk::Finish)));
        assert!(rx.recv().await.is_none());
    }
}
