//! [`Session`]: the per-session runtime (§4.2) — lifecycle, turn
//! execution, and the glue between the tool mediator and the transcript.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use agentsrv_policy::ToolInvocation;
use agentsrv_protocol::ApprovalRiskCode;
use agentsrv_protocol::ProviderType;
use agentsrv_protocol::SessionId;
use agentsrv_protocol::ThreadId;
use agentsrv_protocol::TurnId;
use agentsrv_protocol_wire::ServerEvent;
use agentsrv_protocol_wire::StreamPart;
use agentsrv_transcript::Direction;
use agentsrv_transcript::TranscriptEvent;
use agentsrv_transcript::TranscriptStore;
use tokio::sync::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::instrument;
use tracing::warn;

use crate::config::SessionConfig;
use crate::error::BusySnafu;
use crate::error::SessionError;
use crate::lifecycle::LifecycleEvent;
use crate::lifecycle::LifecycleState;
use crate::mediator::MediatorOutcome;
use crate::mediator::PromptRequest;
use crate::mediator::PromptResponse;
use crate::mediator::ToolMediator;
use crate::model::Turn;
use crate::model_client::ModelChunk;
use crate::model_client::ModelClient;
use crate::model_client::ToolExecutor;
use crate::model_client::ToolRoundOutcome;
use crate::model_client::ToolRoundResult;
use crate::model_client::TurnRequest;
use crate::title;

pub struct Session {
    pub id: SessionId,
    pub thread_id: ThreadId,
    workspace_root: PathBuf,
    config: Mutex<SessionConfig>,
    lifecycle: Mutex<LifecycleState>,
    turn_counter: AtomicU64,
    title: Mutex<Option<String>>,
    title_is_explicit: Mutex<bool>,
    mediator: ToolMediator,
    cancel_token: Mutex<Option<CancellationToken>>,
    events_tx: mpsc::UnboundedSender<ServerEvent>,
    transcript: Arc<dyn TranscriptStore>,
    model_client: Arc<dyn ModelClient>,
    tool_executor: Arc<dyn ToolExecutor>,
    created_at: chrono::DateTime<chrono::Utc>,
    last_activity_at: Mutex<chrono::DateTime<chrono::Utc>>,
}

impl Session {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: SessionId,
        thread_id: ThreadId,
        workspace_root: PathBuf,
        config: SessionConfig,
        events_tx: mpsc::UnboundedSender<ServerEvent>,
        prompts_tx: mpsc::UnboundedSender<PromptRequest>,
        transcript: Arc<dyn TranscriptStore>,
        model_client: Arc<dyn ModelClient>,
        tool_executor: Arc<dyn ToolExecutor>,
    ) -> Self {
        let now = chrono::Utc::now();
        Self {
            id,
            thread_id,
            mediator: ToolMediator::new(workspace_root.clone(), prompts_tx),
            workspace_root,
            config: Mutex::new(config),
            lifecycle: Mutex::new(LifecycleState::Initializing),
            turn_counter: AtomicU64::new(0),
            title: Mutex::new(None),
            title_is_explicit: Mutex::new(false),
            cancel_token: Mutex::new(None),
            events_tx,
            transcript,
            model_client,
            tool_executor,
            created_at: now,
            last_activity_at: Mutex::new(now),
        }
    }

    /// A snapshot for `sessions` listing (§6).
    pub async fn summary(&self) -> agentsrv_protocol_wire::SessionSummary {
        let config = self.config.lock().await;
        agentsrv_protocol_wire::SessionSummary {
            session_id: self.id.clone(),
            title: self.title.lock().await.clone().unwrap_or_default(),
            provider: config.provider,
            model: config.model.clone(),
            busy: self.lifecycle().await.is_busy(),
            created_at: self.created_at,
            last_activity_at: *self.last_activity_at.lock().await,
        }
    }

    pub async fn hello(&self) {
        let mut lifecycle = self.lifecycle.lock().await;
        if let Some(next) = lifecycle.transition(LifecycleEvent::Hello) {
            *lifecycle = next;
        }
    }

    pub async fn lifecycle(&self) -> LifecycleState {
        *self.lifecycle.lock().await
    }

    pub async fn is_busy(&self) -> bool {
        self.lifecycle().await.is_busy()
    }

    pub async fn config_snapshot(&self) -> agentsrv_protocol_wire::SessionConfigSnapshot {
        self.config.lock().await.snapshot()
    }

    pub async fn set_config(
        &self,
        patch: agentsrv_protocol_wire::SessionConfigPatch,
    ) -> Result<agentsrv_protocol_wire::SessionConfigSnapshot, SessionError> {
        let mut config = self.config.lock().await;
        config.apply_patch(patch)?;
        Ok(config.snapshot())
    }

    pub async fn set_model(
        &self,
        provider: Option<ProviderType>,
        model: String,
    ) -> agentsrv_protocol_wire::SessionConfigSnapshot {
        let mut config = self.config.lock().await;
        config.set_model(provider, model);
        config.snapshot()
    }

    pub async fn set_enable_mcp(&self, enabled: bool) -> agentsrv_protocol_wire::SessionConfigSnapshot {
        let mut config = self.config.lock().await;
        config.set_enable_mcp(enabled);
        config.snapshot()
    }

    pub async fn set_title(&self, title: String) {
        *self.title.lock().await = Some(title);
        *self.title_is_explicit.lock().await = true;
    }

    pub async fn title(&self) -> Option<String> {
        self.title.lock().await.clone()
    }

    /// Run one full user->assistant turn (§4.2 steps 1-8).
    #[instrument(skip_all, fields(session_id = %self.id))]
    pub async fn run_turn(
        &self,
        user_text: String,
        client_message_id: String,
    ) -> Result<(), SessionError> {
        {
            let mut lifecycle = self.lifecycle.lock().await;
            if lifecycle.is_busy() {
                return BusySnafu {
                    session_id: self.id.to_string(),
                }
                .fail();
            }
            let next = lifecycle
                .transition(LifecycleEvent::UserMessage)
                .unwrap_or(LifecycleState::Busy);
            *lifecycle = next;
        }
        *self.last_activity_at.lock().await = chrono::Utc::now();

        if !*self.title_is_explicit.lock().await {
            if let Some(derived) = title::derive_title(&user_text) {
                *self.title.lock().await = Some(derived);
            }
        }

        let turn_id = TurnId::from(format!("t{}", self.turn_counter.fetch_add(1, Ordering::SeqCst)));
        let cancel_token = CancellationToken::new();
        *self.cancel_token.lock().await = Some(cancel_token.clone());

        self.emit(ServerEvent::SessionBusy {
            session_id: self.id.clone(),
            busy: true,
        });
        self.emit(ServerEvent::UserMessage {
            session_id: self.id.clone(),
            text: user_text.clone(),
            client_message_id,
        });
        self.persist_client(serde_json::json!({
            "type": "user_message",
            "text": user_text,
        }))
        .await;

        let result = self.drive_turn(&turn_id, user_text, &cancel_token).await;

        *self.cancel_token.lock().await = None;
        {
            let mut lifecycle = self.lifecycle.lock().await;
            let next = lifecycle
                .transition(LifecycleEvent::ModelFinish)
                .or_else(|| lifecycle.transition(LifecycleEvent::ModelAbort))
                .unwrap_or(LifecycleState::Idle);
            *lifecycle = next;
        }
        self.emit(ServerEvent::SessionBusy {
            session_id: self.id.clone(),
            busy: false,
        });

        result
    }

    async fn drive_turn(
        &self,
        turn_id: &TurnId,
        user_text: String,
        cancel_token: &CancellationToken,
    ) -> Result<(), SessionError> {
        let config = self.config.lock().await.clone();
        let mut turn = Turn::new(turn_id.clone());
        let mut prior_tool_results = Vec::new();
        let max_rounds = config.max_steps.max(1) as u64;

        for _round in 0..max_rounds {
            if cancel_token.is_cancelled() {
                self.mediator.cancel_all().await;
                return Ok(());
            }

            let request = TurnRequest {
                provider: config.provider,
                model: config.model.clone(),
                user_text: user_text.clone(),
                prior_tool_results: std::mem::take(&mut prior_tool_results),
            };
            let mut chunks = self
                .model_client
                .open_turn(request)
                .await
                .map_err(|err| {
                    warn!(error = %err, "model stream failed to open");
                    err
                })?;

            let mut produced_tool_call = false;
            loop {
                let chunk = tokio::select! {
                    _ = cancel_token.cancelled() => {
                        self.mediator.cancel_all().await;
                        return Ok(());
                    }
                    chunk = chunks.recv() => chunk,
                };
                let Some(chunk) = chunk else { break };
                match chunk {
                    ModelChunk::TextDelta(text) => {
                        self.emit_stream_part(turn_id, &mut turn, StreamPart::TextDelta { text });
                    }
                    ModelChunk::ReasoningDelta { stream_id, text } => {
                        self.emit_stream_part(
                            turn_id,
                            &mut turn,
                            StreamPart::ReasoningDelta { stream_id, text },
                        );
                    }
                    ModelChunk::ToolInputStart { call_id, name } => {
                        turn.tool_invocations.insert(
                            call_id.clone(),
                            crate::model::ToolInvocationState::started(),
                        );
                        self.emit_stream_part(
                            turn_id,
                            &mut turn,
                            StreamPart::ToolInputStart { call_id, name },
                        );
                    }
                    ModelChunk::ToolInputDelta { call_id, delta } => {
                        if let Some(state) = turn.tool_invocations.get_mut(&call_id) {
                            state.input.push_str(&delta);
                        }
                        self.emit_stream_part(
                            turn_id,
                            &mut turn,
                            StreamPart::ToolInputDelta { call_id, delta },
                        );
                    }
                    ModelChunk::ToolCall { call_id, name, args } => {
                        produced_tool_call = true;
                        self.emit_stream_part(
                            turn_id,
                            &mut turn,
                            StreamPart::ToolCall {
                                call_id: call_id.clone(),
                                name: name.clone(),
                                args: args.clone(),
                            },
                        );
                        let outcome = self
                            .mediate_and_execute(&name, &args, cancel_token)
                            .await;
                        self.emit_tool_outcome(turn_id, &mut turn, &call_id, &outcome);
                        prior_tool_results.push(ToolRoundResult {
                            call_id,
                            outcome,
                        });
                    }
                    ModelChunk::Finish => {
                        self.emit_stream_part(turn_id, &mut turn, StreamPart::Finish);
                        break;
                    }
                }
            }

            if !produced_tool_call {
                if let Some(final_text) = turn.final_text.clone() {
                    self.emit(ServerEvent::AssistantMessage {
                        session_id: self.id.clone(),
                        turn_id: turn_id.clone(),
                        text: final_text,
                    });
                }
                return Ok(());
            }
        }

        warn!(turn_id = %turn_id, "turn exceeded max_steps without finishing");
        Ok(())
    }

    /// Classify and, unless auto-approved, route a tool call through the
    /// mediator before executing it (§4.3).
    async fn mediate_and_execute(
        &self,
        name: &str,
        args: &serde_json::Value,
        cancel_token: &CancellationToken,
    ) -> ToolRoundOutcome {
        let invocation = ToolInvocation { name, args };
        let reason_code = self.mediator.classify(&invocation);
        let yolo = self.config.lock().await.yolo;

        if reason_code != ApprovalRiskCode::SafeAutoApproved {
            let command = args
                .get("command")
                .and_then(serde_json::Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| name.to_string());
            let outcome = self
                .mediator
                .request_approval(command, reason_code, yolo)
                .await;
            if let MediatorOutcome::Prompted(rx) = outcome {
                let response = tokio::select! {
                    _ = cancel_token.cancelled() => return ToolRoundOutcome::Denied("[skipped]".to_string()),
                    response = rx => response,
                };
                match response {
                    Ok(PromptResponse::Approved(true)) => {}
                    Ok(PromptResponse::Approved(false)) | Err(_) => {
                        return ToolRoundOutcome::Denied("not approved".to_string());
                    }
                    Ok(PromptResponse::Answer(answer)) if answer == crate::mediator::SKIPPED => {
                        return ToolRoundOutcome::Denied("[skipped]".to_string());
                    }
                    Ok(PromptResponse::Answer(_)) => {}
                }
            }
        }

        match self.tool_executor.execute(name, args).await {
            Ok(value) => ToolRoundOutcome::Result(value),
            Err(message) => ToolRoundOutcome::Error(message),
        }
    }

    fn emit_tool_outcome(
        &self,
        turn_id: &TurnId,
        turn: &mut Turn,
        call_id: &str,
        outcome: &ToolRoundOutcome,
    ) {
        if let Some(state) = turn.tool_invocations.get_mut(call_id) {
            state.status = crate::model::ToolInvocationStatus::Done;
        }
        let part = match outcome {
            ToolRoundOutcome::Result(value) => StreamPart::ToolResult {
                call_id: call_id.to_string(),
                result: value.clone(),
            },
            ToolRoundOutcome::Error(message) => StreamPart::ToolError {
                call_id: call_id.to_string(),
                message: message.clone(),
            },
            ToolRoundOutcome::Denied(reason) => StreamPart::ToolOutputDenied {
                call_id: call_id.to_string(),
                reason: reason.clone(),
            },
        };
        self.emit_stream_part(turn_id, turn, part);
    }

    fn emit_stream_part(&self, turn_id: &TurnId, turn: &mut Turn, part: StreamPart) {
        if let StreamPart::TextDelta { text } = &part {
            let entry = turn.final_text.get_or_insert_with(String::new);
            entry.push_str(text);
        }
        let index = turn.next_index();
        self.emit(ServerEvent::ModelStreamChunk {
            session_id: self.id.clone(),
            turn_id: turn_id.clone(),
            index,
            part,
        });
    }

    /// Best-effort cancellation of the in-flight turn (§4.2, §5). A no-op
    /// while idle.
    pub async fn cancel(&self) {
        let mut lifecycle = self.lifecycle.lock().await;
        if !lifecycle.is_busy() {
            return;
        }
        if let Some(next) = lifecycle.transition(LifecycleEvent::Cancel) {
            *lifecycle = next;
        }
        drop(lifecycle);
        if let Some(token) = self.cancel_token.lock().await.as_ref() {
            token.cancel();
        }
        self.mediator.cancel_all().await;
    }

    pub async fn resolve_ask(&self, request_id: &agentsrv_protocol::RequestId, answer: String) -> bool {
        self.mediator
            .resolve(request_id, PromptResponse::Answer(answer))
            .await
    }

    pub async fn resolve_approval(
        &self,
        request_id: &agentsrv_protocol::RequestId,
        approved: bool,
    ) -> bool {
        self.mediator
            .resolve(request_id, PromptResponse::Approved(approved))
            .await
    }

    /// Clear in-flight turn state and restart turn numbering, without
    /// tearing down the session itself (`reset` vs. `session_close`).
    pub async fn reset(&self) {
        self.cancel().await;
        self.turn_counter.store(0, Ordering::SeqCst);
        *self.title.lock().await = None;
        *self.title_is_explicit.lock().await = false;
    }

    pub async fn close(&self) {
        let mut lifecycle = self.lifecycle.lock().await;
        if let Some(next) = lifecycle.transition(LifecycleEvent::Close) {
            *lifecycle = next;
        }
        drop(lifecycle);
        self.mediator.cancel_all().await;
    }

    pub fn workspace_root(&self) -> &std::path::Path {
        &self.workspace_root
    }

    fn emit(&self, event: ServerEvent) {
        let _ = self.events_tx.send(event);
    }

    async fn persist_client(&self, payload: serde_json::Value) {
        let event = TranscriptEvent::new(self.thread_id.clone(), Direction::Client, payload);
        if let Err(err) = self.transcript.append_batch(&self.thread_id, &[event]).await {
            warn!(error = %err, "failed to persist transcript event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use agentsrv_protocol::ProviderType;
    use async_trait::async_trait;

    /// Never yields a chunk — `drive_turn`'s `select!` blocks on
    /// `chunks.recv()` until the cancel branch fires, so this holds the
    /// sender alive for the test rather than letting it drop and close
    /// the channel early.
    #[derive(Default)]
    struct BlockingModelClient {
        senders: Mutex<Vec<mpsc::Sender<ModelChunk>>>,
    }

    #[async_trait]
    impl ModelClient for BlockingModelClient {
        async fn open_turn(&self, _request: TurnRequest) -> Result<mpsc::Receiver<ModelChunk>, SessionError> {
            let (tx, rx) = mpsc::channel(1);
            self.senders.lock().await.push(tx);
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

    fn make_session() -> (Arc<Session>, mpsc::UnboundedReceiver<ServerEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel::<ServerEvent>();
        let (prompts_tx, _prompts_rx) = mpsc::unbounded_channel::<PromptRequest>();
        let transcript: Arc<dyn TranscriptStore> = Arc::new(
            agentsrv_transcript::FileTranscriptStore::new(std::env::temp_dir()),
        );
        let session = Arc::new(Session::new(
            SessionId::from("s1"),
            ThreadId::from("s1"),
            std::env::temp_dir(),
            SessionConfig::new(ProviderType::Anthropic, "claude"),
            events_tx,
            prompts_tx,
            transcript,
            Arc::new(BlockingModelClient::default()),
            Arc::new(NoopToolExecutor),
        ));
        (session, events_rx)
    }

    #[tokio::test]
    async fn cancel_while_idle_is_a_no_op() {
        let (session, _events_rx) = make_session();
        assert_eq!(session.lifecycle().await, LifecycleState::Initializing);
        session.cancel().await;
        assert_eq!(session.lifecycle().await, LifecycleState::Initializing);
    }

    #[tokio::test]
    async fn cancel_mid_turn_unblocks_run_turn_and_returns_to_idle() {
        let (session, mut events_rx) = make_session();
        session.hello().await;

        let turn = tokio::spawn({
            let session = session.clone();
            async move { session.run_turn("hello".to_string(), "c1".to_string()).await }
        });

        // Wait for the turn to actually report busy before cancelling,
        // so the race is "cancel during the model wait", not "before".
        loop {
            match events_rx.recv().await {
                Some(ServerEvent::SessionBusy { busy: true, .. }) => break,
                Some(_) => {}
                None => panic!("event channel closed before session_busy:true"),
            }
        }

        session.cancel().await;

        let result = tokio::time::timeout(std::time::Duration::from_secs(5), turn)
            .await
            .expect("run_turn did not return after cancel")
            .expect("run_turn task panicked");
        assert!(result.is_ok(), "a cancelled turn should not surface as an error");
        assert_eq!(session.lifecycle().await, LifecycleState::Idle);
    }
}
