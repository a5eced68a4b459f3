//! The session websocket: one connection, one live [`Session`] for its
//! lifetime (a conductor's `connect(url, thread_id, ...)` takes a single
//! thread, so there is no case in this protocol where one socket serves
//! more than one session at once). Provider-auth events are workspace-wide
//! and reach every connection through a `broadcast` channel instead.

use std::sync::Arc;

use agentsrv_error::ErrorCode;
use agentsrv_error::WireError;
use agentsrv_protocol::SessionId;
use agentsrv_protocol::ThreadId;
use agentsrv_protocol_wire::ClientMessage;
use agentsrv_protocol_wire::OutboundMessage;
use agentsrv_protocol_wire::ServerEvent;
use agentsrv_protocol_wire::TranscriptRecord;
use agentsrv_session::Session;
use agentsrv_session::SessionConfig;
use agentsrv_transcript::CheckpointStore;
use agentsrv_transcript::Direction;
use agentsrv_transcript::FileCheckpointStore;
use axum::extract::State;
use axum::extract::ws::Message;
use axum::extract::ws::WebSocket;
use axum::extract::ws::WebSocketUpgrade;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tokio::sync::broadcast;
use tokio::sync::mpsc;
use tracing::info;
use tracing::warn;

use crate::error::AppServerError;
use crate::model_client::EchoModelClient;
use crate::state::AppState;
use crate::tool_executor::FsToolExecutor;

pub fn router(state: Arc<AppState>, workspace_events: broadcast::Sender<ServerEvent>) -> Router {
    Router::new()
        .route("/session", get(ws_handler))
        .with_state((state, workspace_events))
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State((state, workspace_events)): State<(Arc<AppState>, broadcast::Sender<ServerEvent>)>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, workspace_events))
}

async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>, workspace_events: broadcast::Sender<ServerEvent>) {
    let (events_tx, mut events_rx) = mpsc::unbounded_channel::<ServerEvent>();
    let (error_tx, mut error_rx) = mpsc::unbounded_channel::<WireError>();
    let mut broadcast_rx = workspace_events.subscribe();

    let Some((session, mut prompts_rx)) = handshake(&mut socket, &state, events_tx.clone()).await else {
        return;
    };

    let _ = events_tx.send(ServerEvent::ServerHello {
        session_id: session.id.clone(),
        config: session.config_snapshot().await,
    });

    let session_for_prompts = session.clone();
    let prompts_events_tx = events_tx.clone();
    let prompt_forwarder = tokio::spawn(async move {
        while let Some(request) = prompts_rx.recv().await {
            let event = prompt_to_event(session_for_prompts.id.clone(), request);
            if prompts_events_tx.send(event).is_err() {
                break;
            }
        }
    });

    loop {
        tokio::select! {
            incoming = socket.recv() => {
                match incoming {
                    None => break,
                    Some(Ok(Message::Text(text))) => {
                        handle_frame(&state, &text, &session, &events_tx, &error_tx).await;
                    }
                    Some(Ok(Message::Close(_))) => break,
                    Some(Ok(_)) => {}
                    Some(Err(err)) => {
                        warn!(error = %err, "websocket read failed");
                        break;
                    }
                }
            }
            Some(event) = events_rx.recv() => {
                send_outbound(&mut socket, OutboundMessage::Event(event)).await;
            }
            Some(error) = error_rx.recv() => {
                send_outbound(&mut socket, OutboundMessage::Error(error)).await;
            }
            Ok(event) = broadcast_rx.recv() => {
                send_outbound(&mut socket, OutboundMessage::Event(event)).await;
            }
        }
    }

    prompt_forwarder.abort();
    session.close().await;
    state.registry.remove(&session.id).await;
    state.supervisor.mark_thread_disconnected(session.thread_id.as_str()).await;
}

/// Wait for the first frame, require it to be `client_hello`, and mint a
/// fresh session for this connection.
///
/// A `resumeSessionId` naming a session still in the registry cannot be
/// handed this connection's event channel — the original connection that
/// built it is what `Session::new` bound `events_tx` to, and `Session`
/// has no way to rebind that sender later. So the resumed session is
/// closed and removed, and the client gets a brand new `sessionId` in
/// `server_hello`, matching the documented "old session gone" fallback.
async fn handshake(
    socket: &mut WebSocket,
    state: &Arc<AppState>,
    events_tx: mpsc::UnboundedSender<ServerEvent>,
) -> Option<(Arc<Session>, mpsc::UnboundedReceiver<agentsrv_session::PromptRequest>)> {
    loop {
        let message = match socket.recv().await {
            Some(Ok(Message::Text(text))) => text,
            Some(Ok(Message::Close(_))) | None => return None,
            Some(Ok(_)) => continue,
            Some(Err(err)) => {
                warn!(error = %err, "websocket read failed before handshake");
                return None;
            }
        };

        let parsed = agentsrv_protocol_wire::parse_client_message(&message);
        let resume_session_id = match parsed {
            Ok(ClientMessage::ClientHello { resume_session_id, client, version }) => {
                info!(client = %client, version = %version, "client_hello");
                resume_session_id
            }
            Ok(_) => {
                let err = WireError::new(ErrorCode::ValidationFailed, "expected client_hello as the first frame");
                send_text(socket, &OutboundMessage::Error(err)).await;
                continue;
            }
            Err(err) => {
                send_text(socket, &OutboundMessage::Error(err)).await;
                continue;
            }
        };

        if let Some(stale_id) = resume_session_id {
            if let Some(stale) = state.registry.remove(&stale_id).await {
                stale.close().await;
            }
        }

        return Some(new_session(state, events_tx).await);
    }
}

async fn new_session(
    state: &Arc<AppState>,
    events_tx: mpsc::UnboundedSender<ServerEvent>,
) -> (Arc<Session>, mpsc::UnboundedReceiver<agentsrv_session::PromptRequest>) {
    let session_id = SessionId::new();
    let thread_id = ThreadId::new();
    let (prompts_tx, prompts_rx) = mpsc::unbounded_channel();

    let config = SessionConfig::new(state.default_provider, state.default_model.clone());
    let session = Arc::new(Session::new(
        session_id,
        thread_id.clone(),
        state.workspace_root.clone(),
        config,
        events_tx,
        prompts_tx,
        state.transcript.clone(),
        Arc::new(EchoModelClient::default()),
        Arc::new(FsToolExecutor::new(state.workspace_root.clone())),
    ));
    session.hello().await;
    state.registry.insert(session.clone()).await;
    state.supervisor.touch_workspace(&state.workspace_id, &state.workspace_root).await;
    state.supervisor.touch_thread(thread_id.as_str(), &state.workspace_id, "").await;

    (session, prompts_rx)
}

fn prompt_to_event(session_id: SessionId, request: agentsrv_session::PromptRequest) -> ServerEvent {
    match request {
        agentsrv_session::PromptRequest::Ask { request_id, question, options } => ServerEvent::Ask {
            session_id,
            request_id,
            question,
            options,
        },
        agentsrv_session::PromptRequest::Approval {
            request_id,
            command,
            dangerous,
            reason_code,
        } => ServerEvent::Approval {
            session_id,
            request_id,
            command,
            dangerous,
            reason_code,
        },
    }
}

async fn send_outbound(socket: &mut WebSocket, message: OutboundMessage) {
    send_text(socket, &message).await;
}

async fn send_text(socket: &mut WebSocket, message: &OutboundMessage) {
    let Ok(text) = serde_json::to_string(message) else {
        warn!("failed to serialize outbound message");
        return;
    };
    if let Err(err) = socket.send(Message::Text(text.into())).await {
        warn!(error = %err, "websocket write failed");
    }
}

async fn handle_frame(
    state: &Arc<AppState>,
    raw: &str,
    own_session: &Arc<Session>,
    events_tx: &mpsc::UnboundedSender<ServerEvent>,
    error_tx: &mpsc::UnboundedSender<WireError>,
) {
    let message = match agentsrv_protocol_wire::parse_client_message(raw) {
        Ok(message) => message,
        Err(err) => {
            let _ = error_tx.send(err);
            return;
        }
    };
    dispatch(state, message, own_session, events_tx, error_tx).await;
}

async fn resolve(state: &Arc<AppState>, session_id: &SessionId, error_tx: &mpsc::UnboundedSender<WireError>) -> Option<Arc<Session>> {
    match state.registry.get(session_id).await {
        Some(session) => Some(session),
        None => {
            let _ = error_tx.send(
                WireError::new(ErrorCode::UnknownSession, format!("no live session {session_id}"))
                    .with_session(session_id.as_str()),
            );
            None
        }
    }
}

fn direction_str(direction: Direction) -> String {
    match direction {
        Direction::Server => "server".to_string(),
        Direction::Client => "client".to_string(),
    }
}

#[allow(clippy::too_many_lines)]
async fn dispatch(
    state: &Arc<AppState>,
    message: ClientMessage,
    own_session: &Arc<Session>,
    events_tx: &mpsc::UnboundedSender<ServerEvent>,
    error_tx: &mpsc::UnboundedSender<WireError>,
) {
    let _ = own_session;
    match message {
        ClientMessage::ClientHello { .. } => {
            let _ = error_tx.send(WireError::new(
                ErrorCode::ValidationFailed,
                "client_hello is only valid as the first frame on a connection",
            ));
        }

        ClientMessage::UserMessage {
            session_id,
            text,
            client_message_id,
        } => {
            let Some(session) = resolve(state, &session_id, error_tx).await else {
                return;
            };
            let error_tx = error_tx.clone();
            tokio::spawn(async move {
                if let Err(err) = session.run_turn(text, client_message_id).await {
                    let _ = error_tx.send(err.to_wire_error(Some(session.id.as_str())));
                }
            });
        }
        ClientMessage::Cancel { session_id } => {
            if let Some(session) = resolve(state, &session_id, error_tx).await {
                session.cancel().await;
            }
        }
        ClientMessage::Reset { session_id } => {
            if let Some(session) = resolve(state, &session_id, error_tx).await {
                session.reset().await;
                let _ = events_tx.send(ServerEvent::ResetDone { session_id });
            }
        }
        ClientMessage::SessionClose { session_id } => {
            if let Some(session) = state.registry.remove(&session_id).await {
                session.close().await;
                state.supervisor.mark_thread_disconnected(session.thread_id.as_str()).await;
            }
        }

        ClientMessage::AskResponse { session_id, payload } => {
            if let Some(session) = resolve(state, &session_id, error_tx).await {
                if !session.resolve_ask(&payload.request_id, payload.answer).await {
                    let _ = error_tx.send(
                        WireError::new(ErrorCode::ValidationFailed, "no ask prompt outstanding for that requestId")
                            .with_session(session_id.as_str()),
                    );
                }
            }
        }
        ClientMessage::ApprovalResponse { session_id, payload } => {
            if let Some(session) = resolve(state, &session_id, error_tx).await {
                if !session.resolve_approval(&payload.request_id, payload.approved).await {
                    let _ = error_tx.send(
                        WireError::new(
                            ErrorCode::ValidationFailed,
                            "no approval prompt outstanding for that requestId",
                        )
                        .with_session(session_id.as_str()),
                    );
                }
            }
        }

        ClientMessage::SetModel {
            session_id,
            model,
            provider,
        } => {
            if let Some(session) = resolve(state, &session_id, error_tx).await {
                let config = session.set_model(provider, model).await;
                let _ = events_tx.send(ServerEvent::ConfigUpdated { session_id, config });
            }
        }
        ClientMessage::SetEnableMcp { session_id, enable_mcp } => {
            if let Some(session) = resolve(state, &session_id, error_tx).await {
                let config = session.set_enable_mcp(enable_mcp).await;
                let _ = events_tx.send(ServerEvent::ConfigUpdated { session_id, config });
            }
        }
        ClientMessage::SetConfig { session_id, config } => {
            if let Some(session) = resolve(state, &session_id, error_tx).await {
                match session.set_config(config).await {
                    Ok(config) => {
                        let _ = events_tx.send(ServerEvent::ConfigUpdated { session_id, config });
                    }
                    Err(err) => {
                        let _ = error_tx.send(err.to_wire_error(Some(session_id.as_str())));
                    }
                }
            }
        }

        ClientMessage::ListTools { session_id } => {
            if resolve(state, &session_id, error_tx).await.is_some() {
                let _ = events_tx.send(ServerEvent::Tools {
                    session_id,
                    tools: tool_descriptors(),
                });
            }
        }
        ClientMessage::ListCommands { session_id } => {
            let _ = error_tx.send(
                AppServerError::NotSupported {
                    operation: "list_commands".to_string(),
                }
                .to_wire_error(Some(session_id.as_str())),
            );
        }
        ClientMessage::ListSkills { session_id } => {
            let _ = events_tx.send(ServerEvent::SkillsList {
                session_id,
                skills: Vec::new(),
            });
        }
        ClientMessage::ListSessions => {
            let mut sessions = Vec::new();
            for session in state.registry.all().await {
                sessions.push(session.summary().await);
            }
            let _ = events_tx.send(ServerEvent::Sessions { sessions });
        }
        ClientMessage::Ping => {}

        ClientMessage::ProviderCatalogGet => {
            let _ = events_tx.send(state.provider_auth.catalog_event().await);
        }
        ClientMessage::ProviderAuthMethodsGet { provider } => {
            let _ = events_tx.send(state.provider_auth.auth_methods_event(provider));
        }
        ClientMessage::ProviderAuthAuthorize { provider, method_id } => match state
            .provider_auth
            .authorize(provider, method_id)
            .await
        {
            Ok(challenge) => {
                let _ = events_tx.send(challenge);
            }
            Err(err) => {
                let _ = error_tx.send(err.to_wire_error());
            }
        },
        ClientMessage::ProviderAuthCallback { provider, code, .. } => {
            if let Err(err) = state.provider_auth.callback(provider, code).await {
                let _ = error_tx.send(err.to_wire_error());
            }
        }
        ClientMessage::ProviderAuthSetApiKey {
            provider,
            method_id,
            api_key,
        } => match state.provider_auth.set_api_key(provider, method_id, api_key).await {
            Ok(()) => {
                let _ = state.workspace_events.send(state.provider_auth.status_event().await);
                let _ = state.workspace_events.send(state.provider_auth.catalog_event().await);
            }
            Err(err) => {
                let _ = error_tx.send(err.to_wire_error());
            }
        },
        ClientMessage::RefreshProviderStatus => {
            let _ = events_tx.send(state.provider_auth.status_event().await);
        }

        ClientMessage::GetMessages {
            session_id,
            offset,
            limit,
        } => {
            let Some(session) = resolve(state, &session_id, error_tx).await else {
                return;
            };
            match state.transcript.read(&session.thread_id).await {
                Ok(events) => {
                    let offset = offset.unwrap_or(0).max(0) as usize;
                    let limit = limit.map(|l| l.max(0) as usize).unwrap_or(usize::MAX);
                    let records = events
                        .into_iter()
                        .skip(offset)
                        .take(limit)
                        .map(|event| TranscriptRecord {
                            ts: event.ts,
                            direction: direction_str(event.direction),
                            payload: event.payload,
                        })
                        .collect();
                    let _ = events_tx.send(ServerEvent::Messages { session_id, records });
                }
                Err(err) => {
                    let _ = error_tx.send(
                        AppServerError::Transcript { source: err }.to_wire_error(Some(session_id.as_str())),
                    );
                }
            }
        }
        ClientMessage::SetSessionTitle { session_id, title } => {
            if let Some(session) = resolve(state, &session_id, error_tx).await {
                session.set_title(title).await;
                let config = session.config_snapshot().await;
                let _ = events_tx.send(ServerEvent::SessionSettings { session_id, config });
            }
        }
        ClientMessage::DeleteSession {
            target_session_id, ..
        } => match state.registry.remove(&target_session_id).await {
            Some(session) => {
                session.close().await;
                if let Err(err) = state.transcript.delete(&session.thread_id).await {
                    let _ = error_tx.send(
                        AppServerError::Transcript { source: err }
                            .to_wire_error(Some(target_session_id.as_str())),
                    );
                }
            }
            None => {
                let _ = error_tx.send(
                    WireError::new(ErrorCode::UnknownSession, format!("no live session {target_session_id}"))
                        .with_session(target_session_id.as_str()),
                );
            }
        },

        ClientMessage::SessionBackupGet { session_id } => {
            let Some(session) = resolve(state, &session_id, error_tx).await else {
                return;
            };
            match list_checkpoints(&state.checkpoint_root, &session.thread_id).await {
                Ok(checkpoints) => {
                    let _ = events_tx.send(ServerEvent::Checkpoints { session_id, checkpoints });
                }
                Err(message) => {
                    let _ = error_tx.send(
                        AppServerError::ToolExecution { message }.to_wire_error(Some(session_id.as_str())),
                    );
                }
            }
        }
        ClientMessage::SessionBackupCheckpoint { session_id, label } => {
            let Some(session) = resolve(state, &session_id, error_tx).await else {
                return;
            };
            let checkpoints = FileCheckpointStore::new(state.checkpoint_root.clone(), state.transcript.as_ref());
            let config = serde_json::to_value(session.config_snapshot().await).unwrap_or_default();
            match checkpoints.create(&session.thread_id, label.clone(), config).await {
                Ok(checkpoint) => {
                    let _ = events_tx.send(ServerEvent::CheckpointCreated {
                        session_id,
                        checkpoint_id: checkpoint.id,
                        label,
                    });
                }
                Err(err) => {
                    let _ = error_tx.send(
                        AppServerError::Transcript { source: err }.to_wire_error(Some(session_id.as_str())),
                    );
                }
            }
        }
        ClientMessage::SessionBackupRestore {
            session_id,
            checkpoint_id,
        } => {
            let Some(session) = resolve(state, &session_id, error_tx).await else {
                return;
            };
            let Some(checkpoint_id) = checkpoint_id else {
                let _ = error_tx.send(
                    WireError::validation_failed(
                        "session_backup_restore",
                        "checkpointId",
                        "must be present",
                    )
                    .with_session(session_id.as_str()),
                );
                return;
            };
            let checkpoints = FileCheckpointStore::new(state.checkpoint_root.clone(), state.transcript.as_ref());
            match checkpoints.restore(&session.thread_id, &checkpoint_id).await {
                Ok(_) => {
                    let _ = events_tx.send(ServerEvent::CheckpointRestored {
                        session_id,
                        checkpoint_id,
                    });
                }
                Err(err) => {
                    let _ = error_tx.send(
                        AppServerError::Transcript { source: err }.to_wire_error(Some(session_id.as_str())),
                    );
                }
            }
        }
        ClientMessage::SessionBackupDeleteCheckpoint {
            session_id,
            checkpoint_id,
        } => {
            let Some(session) = resolve(state, &session_id, error_tx).await else {
                return;
            };
            let checkpoints = FileCheckpointStore::new(state.checkpoint_root.clone(), state.transcript.as_ref());
            match checkpoints.delete(&session.thread_id, &checkpoint_id).await {
                Ok(()) => {
                    let _ = events_tx.send(ServerEvent::CheckpointDeleted {
                        session_id,
                        checkpoint_id,
                    });
                }
                Err(err) => {
                    let _ = error_tx.send(
                        AppServerError::Transcript { source: err }.to_wire_error(Some(session_id.as_str())),
                    );
                }
            }
        }

        ClientMessage::HarnessContextSet { session_id, context } => {
            if resolve(state, &session_id, error_tx).await.is_some() {
                state.harness_context_set(session_id, context).await;
            }
        }
        ClientMessage::HarnessContextGet { session_id } => {
            if resolve(state, &session_id, error_tx).await.is_some() {
                if let Some(context) = state.harness_context_get(&session_id).await {
                    let _ = events_tx.send(ServerEvent::Log {
                        session_id,
                        level: "info".to_string(),
                        message: serde_json::to_string(&context).unwrap_or_default(),
                    });
                } else {
                    let _ = error_tx.send(
                        WireError::new(ErrorCode::ValidationFailed, "no harness context set for this session")
                            .with_session(session_id.as_str()),
                    );
                }
            }
        }

        ClientMessage::McpServerUpsert { session_id, .. }
        | ClientMessage::McpServerDelete { session_id, .. }
        | ClientMessage::McpServerValidate { session_id, .. }
        | ClientMessage::McpServerAuth { session_id, .. } => {
            let _ = error_tx.send(
                AppServerError::NotSupported {
                    operation: "mcp_server".to_string(),
                }
                .to_wire_error(Some(session_id.as_str())),
            );
        }
        ClientMessage::SkillEnable { session_id, .. }
        | ClientMessage::SkillDisable { session_id, .. }
        | ClientMessage::SkillDelete { session_id, .. } => {
            let _ = error_tx.send(
                AppServerError::NotSupported {
                    operation: "skill".to_string(),
                }
                .to_wire_error(Some(session_id.as_str())),
            );
        }

        ClientMessage::UploadFile {
            session_id,
            filename,
            content_base64,
        } => {
            let Some(session) = resolve(state, &session_id, error_tx).await else {
                return;
            };
            use base64::Engine;
            match base64::engine::general_purpose::STANDARD.decode(content_base64) {
                Ok(bytes) => {
                    let path = session.workspace_root().join(&filename);
                    match tokio::fs::write(&path, &bytes).await {
                        Ok(()) => {
                            let _ = events_tx.send(ServerEvent::Log {
                                session_id,
                                level: "info".to_string(),
                                message: format!("uploaded {filename} ({} bytes)", bytes.len()),
                            });
                        }
                        Err(err) => {
                            let _ = error_tx.send(
                                AppServerError::ToolExecution {
                                    message: err.to_string(),
                                }
                                .to_wire_error(Some(session_id.as_str())),
                            );
                        }
                    }
                }
                Err(err) => {
                    let _ = error_tx.send(
                        WireError::validation_failed("upload_file", "contentBase64", &err.to_string())
                            .with_session(session_id.as_str()),
                    );
                }
            }
        }
    }
}

fn tool_descriptors() -> Vec<agentsrv_protocol_wire::ToolDescriptor> {
    use agentsrv_protocol_wire::ToolDescriptor;
    let path_schema = serde_json::json!({
        "type": "object",
        "properties": { "path": { "type": "string" } },
        "required": ["path"],
    });
    vec![
        ToolDescriptor {
            name: "read_file".to_string(),
            description: "Read a file's contents".to_string(),
            input_schema: path_schema.clone(),
        },
        ToolDescriptor {
            name: "write_file".to_string(),
            description: "Write a file's contents".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": { "path": {"type": "string"}, "content": {"type": "string"} },
                "required": ["path", "content"],
            }),
        },
        ToolDescriptor {
            name: "edit_file".to_string(),
            description: "Replace one occurrence of a string in a file".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "path": {"type": "string"},
                    "oldString": {"type": "string"},
                    "newString": {"type": "string"},
                },
                "required": ["path", "oldString", "newString"],
            }),
        },
        ToolDescriptor {
            name: "list_dir".to_string(),
            description: "List a directory's entries".to_string(),
            input_schema: path_schema.clone(),
        },
        ToolDescriptor {
            name: "glob".to_string(),
            description: "Find files matching a glob pattern".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": { "pattern": {"type": "string"}, "path": {"type": "string"} },
                "required": ["pattern"],
            }),
        },
        ToolDescriptor {
            name: "grep".to_string(),
            description: "Search file contents with a regular expression".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "pattern": {"type": "string"},
                    "path": {"type": "string"},
                    "caseInsensitive": {"type": "boolean"},
                },
                "required": ["pattern"],
            }),
        },
    ]
}

async fn list_checkpoints(
    checkpoint_root: &std::path::Path,
    thread_id: &ThreadId,
) -> Result<Vec<agentsrv_protocol_wire::CheckpointSummary>, String> {
    let dir = checkpoint_root.join(thread_id.as_str());
    let mut entries = match tokio::fs::read_dir(&dir).await {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err.to_string()),
    };

    let mut checkpoints = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(|e| e.to_string())? {
        if entry.path().extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let raw = tokio::fs::read_to_string(entry.path()).await.map_err(|e| e.to_string())?;
        let value: serde_json::Value = serde_json::from_str(&raw).map_err(|e| e.to_string())?;
        let Some(id) = value.get("id").and_then(serde_json::Value::as_str) else {
            continue;
        };
        let label = value
            .get("label")
            .and_then(serde_json::Value::as_str)
            .map(str::to_string);
        let created_at = value
            .get("created_at")
            .and_then(serde_json::Value::as_str)
            .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&chrono::Utc))
            .unwrap_or_else(chrono::Utc::now);
        checkpoints.push(agentsrv_protocol_wire::CheckpointSummary {
            id: id.to_string(),
            label,
            created_at,
        });
    }
    Ok(checkpoints)
}
