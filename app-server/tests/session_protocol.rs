//! End-to-end coverage over a real loopback websocket: a test harness
//! binds the actual router to an ephemeral port and drives it with
//! `tokio-tungstenite`, the way a real client conductor would.

use std::sync::Arc;
use std::time::Duration;

use agentsrv_app_server::state;
use agentsrv_app_server::supervisor::WorkspaceSupervisor;
use agentsrv_app_server::ws;
use agentsrv_protocol::ProviderType;
use agentsrv_protocol_wire::OutboundMessage;
use agentsrv_protocol_wire::ServerEvent;
use agentsrv_protocol_wire::StreamPart;
use agentsrv_transcript::FileTranscriptStore;
use agentsrv_transcript::TranscriptStore;
use futures::SinkExt;
use futures::StreamExt;
use tokio::net::TcpListener;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

struct Harness {
    url: String,
    _workspace: tempfile::TempDir,
    _state_dir: tempfile::TempDir,
}

async fn spawn_server() -> Harness {
    let workspace = tempfile::tempdir().expect("tempdir");
    let state_dir = tempfile::tempdir().expect("tempdir");

    let supervisor = Arc::new(
        WorkspaceSupervisor::load(state_dir.path().join("state.json")).expect("load supervisor state"),
    );
    let transcript: Arc<dyn TranscriptStore> =
        Arc::new(FileTranscriptStore::new(workspace.path().join("transcripts")));
    let keyring: Arc<dyn agentsrv_keyring_store::KeyringStore> =
        Arc::new(agentsrv_keyring_store::DefaultKeyringStore);

    let (app_state, auth_rx) = state::build(
        "w1".to_string(),
        workspace.path().to_path_buf(),
        false,
        ProviderType::Anthropic,
        "claude-test".to_string(),
        keyring,
        transcript,
        workspace.path().join("checkpoints"),
        supervisor,
    );

    let (broadcast_tx, _broadcast_rx) = tokio::sync::broadcast::channel(64);
    tokio::spawn(state::bridge_workspace_events(auth_rx, broadcast_tx.clone()));

    let router = ws::router(app_state, broadcast_tx);
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("local_addr").port();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });

    Harness {
        url: format!("ws://127.0.0.1:{port}/session"),
        _workspace: workspace,
        _state_dir: state_dir,
    }
}

async fn next_event(
    ws: &mut tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>,
) -> OutboundMessage {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for a server message")
            .expect("stream ended")
            .expect("websocket read error");
        if let Message::Text(text) = msg {
            return serde_json::from_str(&text).expect("valid OutboundMessage JSON");
        }
    }
}

async fn hello(
    ws: &mut tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>,
) -> agentsrv_protocol::SessionId {
    ws.send(Message::text(
        serde_json::json!({"type": "client_hello", "client": "test", "version": "1"}).to_string(),
    ))
    .await
    .expect("send client_hello");

    match next_event(ws).await {
        OutboundMessage::Event(ServerEvent::ServerHello { session_id, .. }) => session_id,
        other => panic!("expected server_hello, got {other:?}"),
    }
}

#[tokio::test]
async fn basic_turn_echoes_the_configured_reply() {
    let harness = spawn_server().await;
    let (mut ws, _) = connect_async(&harness.url).await.expect("connect");
    let session_id = hello(&mut ws).await;

    ws.send(Message::text(
        serde_json::json!({
            "type": "user_message",
            "sessionId": session_id.as_str(),
            "text": "hello",
            "clientMessageId": "c1",
        })
        .to_string(),
    ))
    .await
    .expect("send user_message");

    match next_event(&mut ws).await {
        OutboundMessage::Event(ServerEvent::SessionBusy { busy: true, .. }) => {}
        other => panic!("expected session_busy:true, got {other:?}"),
    }

    let mut saw_text_delta = false;
    loop {
        match next_event(&mut ws).await {
            OutboundMessage::Event(ServerEvent::ModelStreamChunk { part, .. }) => match part {
                StreamPart::TextDelta { text } => {
                    assert_eq!(text, "hi");
                    saw_text_delta = true;
                }
                StreamPart::Finish => break,
                other => panic!("unexpected stream part: {other:?}"),
            },
            other => panic!("expected a model_stream_chunk, got {other:?}"),
        }
    }
    assert!(saw_text_delta, "expected a text_delta chunk before finish");

    match next_event(&mut ws).await {
        OutboundMessage::Event(ServerEvent::SessionBusy { busy: false, .. }) => {}
        other => panic!("expected session_busy:false, got {other:?}"),
    }
}

#[tokio::test]
async fn second_user_message_while_busy_is_rejected() {
    let harness = spawn_server().await;
    let (mut ws, _) = connect_async(&harness.url).await.expect("connect");
    let session_id = hello(&mut ws).await;

    let send_user_message = |id: &str| {
        serde_json::json!({
            "type": "user_message",
            "sessionId": session_id.as_str(),
            "text": "hello",
            "clientMessageId": id,
        })
        .to_string()
    };

    ws.send(Message::text(send_user_message("c1"))).await.expect("send first");
    ws.send(Message::text(send_user_message("c2"))).await.expect("send second");

    // Drain every event for a short window — the two user_messages race,
    // and the busy rejection for the loser may land before or after the
    // winner's `session_busy:false`, so collect everything rather than
    // stopping at the first terminal event.
    let mut busy_true_count = 0;
    let mut saw_busy_error = false;
    loop {
        match tokio::time::timeout(Duration::from_millis(500), ws.next()).await {
            Ok(Some(Ok(Message::Text(text)))) => {
                match serde_json::from_str(&text).expect("valid OutboundMessage JSON") {
                    OutboundMessage::Event(ServerEvent::SessionBusy { busy: true, .. }) => busy_true_count += 1,
                    OutboundMessage::Error(err) if err.code == "busy" => saw_busy_error = true,
                    _ => {}
                }
            }
            Ok(Some(Ok(_))) => {}
            _ => break,
        }
    }
    assert_eq!(busy_true_count, 1, "only one turn should have started");
    assert!(saw_busy_error, "the concurrent user_message should have been rejected as busy");
}

#[tokio::test]
async fn set_config_rejects_max_steps_out_of_bounds() {
    let harness = spawn_server().await;
    let (mut ws, _) = connect_async(&harness.url).await.expect("connect");
    let session_id = hello(&mut ws).await;

    ws.send(Message::text(
        serde_json::json!({
            "type": "set_config",
            "sessionId": session_id.as_str(),
            "config": {"maxSteps": 2000},
        })
        .to_string(),
    ))
    .await
    .expect("send set_config");

    match next_event(&mut ws).await {
        OutboundMessage::Error(err) => {
            assert_eq!(err.code, "validation_failed");
            assert_eq!(err.message, "set_config config.maxSteps must be number 1-1000");
        }
        other => panic!("expected a validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn unknown_session_id_is_rejected() {
    let harness = spawn_server().await;
    let (mut ws, _) = connect_async(&harness.url).await.expect("connect");
    let _ = hello(&mut ws).await;

    ws.send(Message::text(
        serde_json::json!({
            "type": "cancel",
            "sessionId": "does-not-exist",
        })
        .to_string(),
    ))
    .await
    .expect("send cancel");

    match next_event(&mut ws).await {
        OutboundMessage::Error(err) => assert_eq!(err.code, "unknown_session"),
        other => panic!("expected unknown_session, got {other:?}"),
    }
}

#[tokio::test]
async fn resume_with_a_stale_session_id_mints_a_new_one() {
    let harness = spawn_server().await;

    let (mut first, _) = connect_async(&harness.url).await.expect("connect");
    let stale_id = hello(&mut first).await;
    drop(first);

    // Give the server a beat to notice the closed connection before the
    // new one races it on cleanup.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let (mut second, _) = connect_async(&harness.url).await.expect("connect");
    second
        .send(Message::text(
            serde_json::json!({
                "type": "client_hello",
                "client": "test",
                "version": "1",
                "resumeSessionId": stale_id.as_str(),
            })
            .to_string(),
        ))
        .await
        .expect("send client_hello with resumeSessionId");

    match next_event(&mut second).await {
        OutboundMessage::Event(ServerEvent::ServerHello { session_id, .. }) => {
            assert_ne!(session_id.as_str(), stale_id.as_str());
        }
        other => panic!("expected server_hello, got {other:?}"),
    }
}

#[tokio::test]
async fn list_tools_reports_the_filesystem_tool_set() {
    let harness = spawn_server().await;
    let (mut ws, _) = connect_async(&harness.url).await.expect("connect");
    let session_id = hello(&mut ws).await;

    ws.send(Message::text(
        serde_json::json!({"type": "list_tools", "sessionId": session_id.as_str()}).to_string(),
    ))
    .await
    .expect("send list_tools");

    match next_event(&mut ws).await {
        OutboundMessage::Event(ServerEvent::Tools { tools, .. }) => {
            let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
            for expected in ["read_file", "write_file", "edit_file", "list_dir", "glob", "grep"] {
                assert!(names.contains(&expected), "missing tool {expected} in {names:?}");
            }
        }
        other => panic!("expected tools, got {other:?}"),
    }
}
