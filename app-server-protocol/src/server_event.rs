use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use agentsrv_error::WireError;
use agentsrv_protocol::ApprovalRiskCode;
use agentsrv_protocol::AuthMode;
use agentsrv_protocol::ProviderType;
use agentsrv_protocol::RequestId;
use agentsrv_protocol::SessionId;
use agentsrv_protocol::TurnId;

use crate::config::SessionConfigSnapshot;

/// Every message the server may emit on the session socket.
///
/// Errors are not a variant here: they are serialized as a standalone
/// [`WireError`], which carries its own `"type":"error"` tag. See
/// [`OutboundMessage`] for a single type covering both.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    #[serde(rename_all = "camelCase")]
    ServerHello {
        session_id: SessionId,
        config: SessionConfigSnapshot,
    },

    #[serde(rename_all = "camelCase")]
    UserMessage {
        session_id: SessionId,
        text: String,
        client_message_id: String,
    },
    #[serde(rename_all = "camelCase")]
    AssistantMessage {
        session_id: SessionId,
        turn_id: TurnId,
        text: String,
    },
    #[serde(rename_all = "camelCase")]
    Reasoning {
        session_id: SessionId,
        turn_id: TurnId,
        kind: ReasoningKind,
        text: String,
    },
    #[serde(rename_all = "camelCase")]
    Todos {
        session_id: SessionId,
        todos: Vec<TodoItem>,
    },
    #[serde(rename_all = "camelCase")]
    Log {
        session_id: SessionId,
        level: String,
        message: String,
    },

    #[serde(rename_all = "camelCase")]
    ModelStreamChunk {
        session_id: SessionId,
        turn_id: TurnId,
        index: u64,
        #[serde(flatten)]
        part: StreamPart,
    },

    #[serde(rename_all = "camelCase")]
    SessionBusy {
        session_id: SessionId,
        busy: bool,
    },
    #[serde(rename_all = "camelCase")]
    SessionSettings {
        session_id: SessionId,
        config: SessionConfigSnapshot,
    },
    #[serde(rename_all = "camelCase")]
    ConfigUpdated {
        session_id: SessionId,
        config: SessionConfigSnapshot,
    },
    #[serde(rename_all = "camelCase")]
    ResetDone { session_id: SessionId },

    #[serde(rename_all = "camelCase")]
    Ask {
        session_id: SessionId,
        request_id: RequestId,
        question: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        options: Option<Vec<String>>,
    },
    #[serde(rename_all = "camelCase")]
    Approval {
        session_id: SessionId,
        request_id: RequestId,
        command: String,
        dangerous: bool,
        reason_code: ApprovalRiskCode,
    },

    #[serde(rename_all = "camelCase")]
    ProviderCatalog {
        all: Vec<ProviderCatalogEntry>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default: Option<ProviderType>,
        connected: Vec<ProviderType>,
    },
    #[serde(rename_all = "camelCase")]
    ProviderAuthMethods {
        provider: ProviderType,
        methods: Vec<ProviderAuthMethodEntry>,
    },
    #[serde(rename_all = "camelCase")]
    ProviderAuthChallenge {
        provider: ProviderType,
        method_id: String,
        challenge: AuthChallenge,
    },
    #[serde(rename_all = "camelCase")]
    ProviderAuthResult {
        ok: bool,
        provider: ProviderType,
        method_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mode: Option<AuthMode>,
        message: String,
    },
    #[serde(rename_all = "camelCase")]
    ProviderStatus {
        providers: Vec<ProviderStatusEntry>,
    },

    #[serde(rename_all = "camelCase")]
    Tools {
        session_id: SessionId,
        tools: Vec<ToolDescriptor>,
    },
    Sessions {
        sessions: Vec<SessionSummary>,
    },
    #[serde(rename_all = "camelCase")]
    Messages {
        session_id: SessionId,
        records: Vec<TranscriptRecord>,
    },

    #[serde(rename_all = "camelCase")]
    Checkpoints {
        session_id: SessionId,
        checkpoints: Vec<CheckpointSummary>,
    },
    #[serde(rename_all = "camelCase")]
    CheckpointCreated {
        session_id: SessionId,
        checkpoint_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    CheckpointRestored {
        session_id: SessionId,
        checkpoint_id: String,
    },
    #[serde(rename_all = "camelCase")]
    CheckpointDeleted {
        session_id: SessionId,
        checkpoint_id: String,
    },

    #[serde(rename_all = "camelCase")]
    SkillsList {
        session_id: SessionId,
        skills: Vec<SkillDescriptor>,
    },
    #[serde(rename_all = "camelCase")]
    SkillContent {
        session_id: SessionId,
        skill_id: String,
        content: String,
    },
}

/// Wraps every message type a session socket may carry outbound, so
/// writer code has one type to serialize regardless of whether it holds
/// a protocol event or a structured error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OutboundMessage {
    Event(ServerEvent),
    Error(WireError),
}

impl From<ServerEvent> for OutboundMessage {
    fn from(event: ServerEvent) -> Self {
        Self::Event(event)
    }
}

impl From<WireError> for OutboundMessage {
    fn from(error: WireError) -> Self {
        Self::Error(error)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasoningKind {
    Reasoning,
    Summary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoItem {
    pub id: String,
    pub text: String,
    pub done: bool,
}

/// One incremental piece of a turn's model output.
///
/// Adjacently tagged on `partType`/`part`, matching the wire shape
/// `{turnId, index, partType, part}` — the tag names the shape of `part`,
/// which otherwise varies per chunk kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "partType", content = "part", rename_all = "snake_case")]
pub enum StreamPart {
    TextDelta {
        text: String,
    },
    #[serde(rename_all = "camelCase")]
    ReasoningDelta {
        stream_id: String,
        text: String,
    },
    #[serde(rename_all = "camelCase")]
    ToolInputStart {
        call_id: String,
        name: String,
    },
    #[serde(rename_all = "camelCase")]
    ToolInputDelta {
        call_id: String,
        delta: String,
    },
    #[serde(rename_all = "camelCase")]
    ToolCall {
        call_id: String,
        name: String,
        args: Value,
    },
    #[serde(rename_all = "camelCase")]
    ToolResult {
        call_id: String,
        result: Value,
    },
    #[serde(rename_all = "camelCase")]
    ToolError {
        call_id: String,
        message: String,
    },
    #[serde(rename_all = "camelCase")]
    ToolOutputDenied {
        call_id: String,
        reason: String,
    },
    #[serde(rename_all = "camelCase")]
    ToolApprovalRequest {
        call_id: String,
        request_id: RequestId,
    },
    Finish,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderCatalogEntry {
    pub provider: ProviderType,
    pub display_name: String,
    pub default_model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderAuthMethodEntry {
    pub method_id: String,
    pub kind: ProviderAuthMethodKind,
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderAuthMethodKind {
    Api,
    Oauth,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthChallenge {
    pub instructions: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderStatusEntry {
    pub provider: ProviderType,
    pub mode: AuthMode,
    pub authorized: bool,
    pub verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Projection returned by `list_sessions`: enough to render a session
/// picker without loading any single session's full transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: SessionId,
    pub title: String,
    pub provider: ProviderType,
    pub model: String,
    pub busy: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub last_activity_at: chrono::DateTime<chrono::Utc>,
}

/// One stored transcript record, replayed verbatim in reply to
/// `get_messages` (§6 Transcript record). `direction` is `"server"` or
/// `"client"`; `payload` is whatever JSON value was originally recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptRecord {
    pub ts: chrono::DateTime<chrono::Utc>,
    pub direction: String,
    pub payload: Value,
}

/// One named checkpoint, as listed in reply to `session_backup_get`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckpointSummary {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillDescriptor {
    pub skill_id: String,
    pub name: String,
    pub enabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentsrv_error::ErrorCode;

    #[test]
    fn stream_part_text_delta_matches_literal_example() {
        let event = ServerEvent::ModelStreamChunk {
            session_id: SessionId::from("S"),
            turn_id: TurnId::from("t1"),
            index: 0,
            part: StreamPart::TextDelta {
                text: "hi".to_string(),
            },
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["turnId"], "t1");
        assert_eq!(json["partType"], "text_delta");
        assert_eq!(json["part"]["text"], "hi");
    }

    #[test]
    fn outbound_message_carries_either_event_or_error() {
        let event: OutboundMessage =
            ServerEvent::ResetDone {
                session_id: SessionId::from("S"),
            }
            .into();
        assert_eq!(serde_json::to_value(&event).unwrap()["type"], "reset_done");

        let error: OutboundMessage = WireError::new(ErrorCode::Busy, "turn in flight").into();
        assert_eq!(serde_json::to_value(&error).unwrap()["type"], "error");
    }

    #[test]
    fn approval_event_matches_tool_approval_scenario() {
        let event = ServerEvent::Approval {
            session_id: SessionId::from("S"),
            request_id: RequestId::from("r1"),
            command: "rm -rf /".to_string(),
            dangerous: true,
            reason_code: ApprovalRiskCode::MatchesDangerousPattern,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["reasonCode"], "matches_dangerous_pattern");
    }
}
