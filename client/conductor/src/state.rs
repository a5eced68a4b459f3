//! [`SessionConductorState`]: the reducer that folds [`ServerEvent`]s into
//! per-thread runtime state and a feed (§4.4). One instance per socket the
//! conductor holds open.

use std::collections::VecDeque;

use agentsrv_protocol_wire::ServerEvent;
use agentsrv_protocol_wire::StreamPart;

use crate::feed::Feed;
use crate::feed::FeedItem;

/// How many recently-seen `clientMessageId`s we remember for echo dedup.
/// Generous relative to the feed capacity since echoes typically arrive
/// within a handful of messages of the optimistic send.
const ECHO_MEMORY: usize = 256;

/// Connection/thread lifecycle as the conductor sees it, independent of
/// the session's own busy/idle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Handshaking,
    Connected,
    Disconnected,
}

/// Runtime state for one session's socket, rebuilt by folding events.
#[derive(Debug, Clone)]
pub struct SessionConductorState {
    pub connection: ConnectionState,
    pub busy: bool,
    feed: Feed,
    seen_client_message_ids: VecDeque<String>,
}

impl SessionConductorState {
    pub fn new() -> Self {
        Self {
            connection: ConnectionState::Handshaking,
            busy: false,
            feed: Feed::default(),
            seen_client_message_ids: VecDeque::with_capacity(ECHO_MEMORY),
        }
    }

    pub fn feed(&self) -> &Feed {
        &self.feed
    }

    /// Record an optimistic send before the message reaches the wire, so
    /// the later echo from the server can be suppressed as a duplicate.
    pub fn optimistic_user_message(&mut self, client_message_id: String, text: String) {
        self.remember(client_message_id.clone());
        self.feed.push(FeedItem::UserMessage {
            client_message_id,
            text,
            optimistic: true,
        });
    }

    fn remember(&mut self, id: String) {
        if self.seen_client_message_ids.len() >= ECHO_MEMORY {
            self.seen_client_message_ids.pop_front();
        }
        self.seen_client_message_ids.push_back(id);
    }

    fn already_echoed(&self, id: &str) -> bool {
        self.seen_client_message_ids.iter().any(|seen| seen == id)
    }

    /// Fold one server event into this session's state, returning whether
    /// it produced a visible feed change (as opposed to a pure
    /// bookkeeping update like `session_busy`).
    pub fn apply(&mut self, event: &ServerEvent) -> bool {
        match event {
            ServerEvent::ServerHello { .. } => {
                self.connection = ConnectionState::Connected;
                false
            }
            ServerEvent::UserMessage { client_message_id, text, .. } => {
                if self.already_echoed(client_message_id) && self.feed.reconcile_echo(client_message_id) {
                    return true;
                }
                self.remember(client_message_id.clone());
                self.feed.push(FeedItem::UserMessage {
                    client_message_id: client_message_id.clone(),
                    text: text.clone(),
                    optimistic: false,
                });
                true
            }
            ServerEvent::AssistantMessage { turn_id, text, .. } => {
                self.feed.push(FeedItem::AssistantMessage {
                    turn_id: turn_id.clone(),
                    text: text.clone(),
                });
                true
            }
            ServerEvent::Reasoning { turn_id, kind, text, .. } => {
                self.feed.push(FeedItem::Reasoning {
                    turn_id: turn_id.clone(),
                    kind: *kind,
                    text: text.clone(),
                });
                true
            }
            ServerEvent::ModelStreamChunk { part, .. } => self.apply_stream_part(part),
            ServerEvent::SessionBusy { busy, .. } => {
                self.busy = *busy;
                false
            }
            ServerEvent::Ask { request_id, question, .. } => {
                self.feed.push(FeedItem::Ask {
                    request_id: request_id.clone(),
                    question: question.clone(),
                });
                true
            }
            ServerEvent::Approval {
                request_id,
                command,
                dangerous,
                reason_code,
                ..
            } => {
                self.feed.push(FeedItem::Approval {
                    request_id: request_id.clone(),
                    command: command.clone(),
                    dangerous: *dangerous,
                    reason_code: *reason_code,
                });
                true
            }
            _ => false,
        }
    }

    fn apply_stream_part(&mut self, part: &StreamPart) -> bool {
        match part {
            StreamPart::ToolCall { call_id, name, .. } => {
                self.feed.push(FeedItem::ToolCall {
                    call_id: call_id.clone(),
                    name: name.clone(),
                });
                true
            }
            StreamPart::ToolResult { call_id, result } => {
                self.feed.push(FeedItem::ToolResult {
                    call_id: call_id.clone(),
                    ok: true,
                    detail: result.to_string(),
                });
                true
            }
            StreamPart::ToolError { call_id, message } => {
                self.feed.push(FeedItem::ToolResult {
                    call_id: call_id.clone(),
                    ok: false,
                    detail: message.clone(),
                });
                true
            }
            StreamPart::ToolOutputDenied { call_id, reason } => {
                self.feed.push(FeedItem::ToolResult {
                    call_id: call_id.clone(),
                    ok: false,
                    detail: reason.clone(),
                });
                true
            }
            // Text/reasoning deltas and the remaining bookkeeping parts
            // (tool input streaming, approval handoff, finish) are
            // rendered incrementally by the UI layer directly off the
            // wire event, not folded into the feed.
            _ => false,
        }
    }
}

impl Default for SessionConductorState {
    fn default() -> Self {
        Self::new()
    }
}
