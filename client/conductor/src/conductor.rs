//! [`SessionConductor`]: the per-session control loop shared by every
//! client (§4.4). Owns the socket, the reducer state, the transcript
//! buffer, and the watchdog set; exposes `send`/`run_once` for the host
//! UI's event loop to drive.

use std::sync::Arc;
use std::time::Duration;

use agentsrv_error::WireError;
use agentsrv_protocol::SessionId;
use agentsrv_protocol::ThreadId;
use agentsrv_protocol_wire::ClientMessage;
use agentsrv_protocol_wire::OutboundMessage;
use agentsrv_protocol_wire::ServerEvent;
use agentsrv_transcript::Direction;
use agentsrv_transcript::TranscriptStore;
use tracing::warn;
use uuid::Uuid;

use crate::connection::SessionConnection;
use crate::error::ConductorError;
use crate::pending_queue::PendingQueue;
use crate::state::ConnectionState;
use crate::state::SessionConductorState;
use crate::transcript_buffer::FLUSH_INTERVAL;
use crate::transcript_buffer::TranscriptBuffer;
use crate::watchdog::CANCEL_GRACE;
use crate::watchdog::HANDSHAKE_TIMEOUT;
use crate::watchdog::PROVIDER_STATUS_TIMEOUT;
use crate::watchdog::STUCK_TURN_TIMEOUT;
use crate::watchdog::Watchdog;

/// One inbound step of the conductor's event loop.
pub enum ConductorEvent {
    /// A server event was folded into state; `changed` mirrors
    /// [`SessionConductorState::apply`]'s return value.
    Server { event: ServerEvent, changed: bool },
    /// The server sent a structured error instead of an event.
    ServerError(WireError),
    /// The transcript debounce interval elapsed; caller should call
    /// nothing further, `tick()` already flushed.
    TranscriptFlushed,
    /// A watchdog expired; the session should be treated as disconnected.
    WatchdogExpired(WatchdogKind),
    /// The socket closed.
    Disconnected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogKind {
    Handshake,
    StuckTurn,
    CancelGrace,
    ProviderStatus,
}

pub struct SessionConductor {
    url: String,
    connection: SessionConnection,
    state: SessionConductorState,
    transcript: TranscriptBuffer,
    pending: PendingQueue,
    handshake: Watchdog,
    stuck_turn: Watchdog,
    cancel_grace: Watchdog,
    provider_status: Watchdog,
    reconnect_attempt: u32,
}

impl SessionConductor {
    pub async fn connect(
        url: &str,
        thread_id: ThreadId,
        transcript_store: Arc<dyn TranscriptStore>,
    ) -> Result<Self, ConductorError> {
        let connection = SessionConnection::connect(url).await?;
        let mut handshake = Watchdog::disarmed();
        handshake.arm(HANDSHAKE_TIMEOUT);
        Ok(Self {
            url: url.to_string(),
            connection,
            state: SessionConductorState::new(),
            transcript: TranscriptBuffer::new(transcript_store, thread_id),
            pending: PendingQueue::new(),
            handshake,
            stuck_turn: Watchdog::disarmed(),
            cancel_grace: Watchdog::disarmed(),
            provider_status: Watchdog::disarmed(),
            reconnect_attempt: 0,
        })
    }

    /// Reopen the socket after an unexpected disconnect, waiting the
    /// backoff for the current attempt first (§4.4: "reconnect"). The
    /// thread id and transcript buffer carry over unchanged, i.e. this
    /// preserves the same session/thread rather than forking a new one;
    /// callers that learn from the server that the old session is gone
    /// should drop this conductor and `connect()` a fresh one instead.
    pub async fn reconnect(&mut self) -> Result<(), ConductorError> {
        tokio::time::sleep(reconnect_backoff(self.reconnect_attempt)).await;
        match SessionConnection::connect(&self.url).await {
            Ok(connection) => {
                self.connection = connection;
                self.reconnect_attempt = 0;
                self.state.connection = ConnectionState::Handshaking;
                self.handshake.arm(HANDSHAKE_TIMEOUT);
                Ok(())
            }
            Err(err) => {
                self.reconnect_attempt = self.reconnect_attempt.saturating_add(1);
                Err(err)
            }
        }
    }

    pub fn state(&self) -> &SessionConductorState {
        &self.state
    }

    /// Send a user message with optimistic local echo (§4.4), or queue it
    /// if the handshake hasn't finished yet.
    pub async fn send_user_message(
        &mut self,
        session_id: SessionId,
        text: String,
    ) -> Result<(), ConductorError> {
        let client_message_id = Uuid::new_v4().to_string();
        let message = ClientMessage::UserMessage {
            session_id,
            text: text.clone(),
            client_message_id: client_message_id.clone(),
        };
        if self.state.connection != ConnectionState::Connected {
            self.pending.push(message);
            return Ok(());
        }
        self.state.optimistic_user_message(client_message_id, text);
        self.stuck_turn.arm(STUCK_TURN_TIMEOUT);
        self.send_now(&message).await
    }

    pub async fn send_cancel(&mut self, session_id: SessionId) -> Result<(), ConductorError> {
        self.cancel_grace.arm(CANCEL_GRACE);
        self.send_now(&ClientMessage::Cancel { session_id }).await
    }

    pub async fn request_provider_status_refresh(&mut self) -> Result<(), ConductorError> {
        self.provider_status.arm(PROVIDER_STATUS_TIMEOUT);
        self.send_now(&ClientMessage::RefreshProviderStatus).await
    }

    async fn send_now(&mut self, message: &ClientMessage) -> Result<(), ConductorError> {
        self.transcript
            .record(Direction::Client, serde_json::to_value(message).unwrap_or_default())
            .await;
        self.connection.send(message).await
    }

    /// Drain the pending-message queue once the handshake resolves (§4.4).
    async fn flush_pending(&mut self) -> Result<(), ConductorError> {
        for message in self.pending.drain() {
            self.send_now(&message).await?;
        }
        Ok(())
    }

    /// Race the socket, the transcript debounce timer, and the armed
    /// watchdogs, and fold whatever resolves first into state. The host
    /// UI loop calls this in a `loop { }` and reacts to the result.
    pub async fn tick(&mut self) -> Result<ConductorEvent, ConductorError> {
        tokio::select! {
            frame = self.connection.recv() => {
                match frame? {
                    None => {
                        self.state.connection = ConnectionState::Disconnected;
                        Ok(ConductorEvent::Disconnected)
                    }
                    Some(OutboundMessage::Event(event)) => self.handle_event(event).await,
                    Some(OutboundMessage::Error(error)) => {
                        warn!(code = error.code, message = %error.message, "server error");
                        self.transcript
                            .record(Direction::Server, serde_json::to_value(&error).unwrap_or_default())
                            .await;
                        Ok(ConductorEvent::ServerError(error))
                    }
                }
            }
            _ = tokio::time::sleep(FLUSH_INTERVAL) => {
                self.transcript.flush().await.map_err(|err| ConductorError::SocketClosed {
                    message: err.to_string(),
                })?;
                Ok(ConductorEvent::TranscriptFlushed)
            }
            _ = self.handshake.wait() => {
                self.handshake.disarm();
                Ok(ConductorEvent::WatchdogExpired(WatchdogKind::Handshake))
            }
            _ = self.stuck_turn.wait() => {
                self.stuck_turn.disarm();
                Ok(ConductorEvent::WatchdogExpired(WatchdogKind::StuckTurn))
            }
            _ = self.cancel_grace.wait() => {
                self.cancel_grace.disarm();
                Ok(ConductorEvent::WatchdogExpired(WatchdogKind::CancelGrace))
            }
            _ = self.provider_status.wait() => {
                self.provider_status.disarm();
                Ok(ConductorEvent::WatchdogExpired(WatchdogKind::ProviderStatus))
            }
        }
    }

    async fn handle_event(&mut self, event: ServerEvent) -> Result<ConductorEvent, ConductorError> {
        self.transcript
            .record(Direction::Server, serde_json::to_value(&event).unwrap_or_default())
            .await;

        if matches!(event, ServerEvent::ServerHello { .. }) {
            self.handshake.disarm();
        }
        if matches!(event, ServerEvent::ProviderStatus { .. }) {
            self.provider_status.disarm();
        }
        if matches!(event, ServerEvent::AssistantMessage { .. }) {
            self.stuck_turn.disarm();
        }

        let changed = self.state.apply(&event);

        if matches!(event, ServerEvent::ServerHello { .. }) {
            self.flush_pending().await?;
        }

        Ok(ConductorEvent::Server { event, changed })
    }

    /// Flush any buffered transcript events immediately, e.g. on session
    /// close or workspace removal (§4.4, §5).
    pub async fn flush_transcript_now(&self) -> Result<(), ConductorError> {
        self.transcript.flush().await.map_err(|err| ConductorError::SocketClosed {
            message: err.to_string(),
        })
    }

    pub async fn close(mut self) -> Result<(), ConductorError> {
        self.flush_transcript_now().await?;
        self.connection.close().await
    }
}

/// Backoff schedule for reconnect attempts after an unexpected
/// disconnect (§4.4: reconnect preserving `sessionId` when still valid).
pub fn reconnect_backoff(attempt: u32) -> Duration {
    let capped = attempt.min(6);
    Duration::from_millis(250u64.saturating_mul(1u64 << capped))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reconnect_backoff_grows_and_caps() {
        let first = reconnect_backoff(0);
        let later = reconnect_backoff(10);
        assert!(first < later);
        assert_eq!(later, reconnect_backoff(6));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_reconnect_increments_the_attempt_counter() {
        let tmp = tempfile::tempdir().unwrap();
        let store: Arc<dyn TranscriptStore> =
            Arc::new(agentsrv_transcript::FileTranscriptStore::new(tmp.path()));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let url = format!("ws://{addr}/");
        let accept = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            tokio_tungstenite::accept_async(stream).await.unwrap();
        });
        let connection = SessionConnection::connect(&url).await.unwrap();
        accept.await.unwrap();

        // Nothing listens on the port anymore once the one-shot server
        // above has accepted and dropped its side, so the next connect
        // attempt fails and bumps the attempt counter.
        let mut conductor = SessionConductor {
            url,
            connection,
            state: SessionConductorState::new(),
            transcript: TranscriptBuffer::new(store, ThreadId::from("t1")),
            pending: PendingQueue::new(),
            handshake: Watchdog::disarmed(),
            stuck_turn: Watchdog::disarmed(),
            cancel_grace: Watchdog::disarmed(),
            provider_status: Watchdog::disarmed(),
            reconnect_attempt: 0,
        };

        let result = conductor.reconnect().await;
        assert!(result.is_err());
        assert_eq!(conductor.reconnect_attempt, 1);
    }
}
