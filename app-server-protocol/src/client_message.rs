use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use agentsrv_protocol::ProviderType;
use agentsrv_protocol::RequestId;
use agentsrv_protocol::SessionId;

use crate::config::SessionConfigPatch;

/// Every message a client may send on the session socket.
///
/// Session-scoped variants carry a `sessionId`; the handshake does not.
/// Unknown `type` values fail to deserialize into this enum — callers
/// should prefer [`crate::parse_client_message`], which turns that failure
/// into a structured [`agentsrv_error::WireError`] instead of a raw serde error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    #[serde(rename_all = "camelCase")]
    ClientHello {
        client: String,
        version: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        resume_session_id: Option<SessionId>,
    },

    #[serde(rename_all = "camelCase")]
    UserMessage {
        session_id: SessionId,
        text: String,
        client_message_id: String,
    },
    #[serde(rename_all = "camelCase")]
    Cancel { session_id: SessionId },
    #[serde(rename_all = "camelCase")]
    Reset { session_id: SessionId },
    #[serde(rename_all = "camelCase")]
    SessionClose { session_id: SessionId },

    #[serde(rename_all = "camelCase")]
    AskResponse {
        session_id: SessionId,
        #[serde(flatten)]
        payload: AskResponsePayload,
    },
    #[serde(rename_all = "camelCase")]
    ApprovalResponse {
        session_id: SessionId,
        #[serde(flatten)]
        payload: ApprovalResponsePayload,
    },

    #[serde(rename_all = "camelCase")]
    SetModel {
        session_id: SessionId,
        model: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        provider: Option<ProviderType>,
    },
    #[serde(rename_all = "camelCase")]
    SetEnableMcp {
        session_id: SessionId,
        enable_mcp: bool,
    },
    #[serde(rename_all = "camelCase")]
    SetConfig {
        session_id: SessionId,
        config: SessionConfigPatch,
    },

    #[serde(rename_all = "camelCase")]
    ListTools { session_id: SessionId },
    #[serde(rename_all = "camelCase")]
    ListCommands { session_id: SessionId },
    #[serde(rename_all = "camelCase")]
    ListSkills { session_id: SessionId },
    ListSessions,
    Ping,

    ProviderCatalogGet,
    #[serde(rename_all = "camelCase")]
    ProviderAuthMethodsGet { provider: ProviderType },
    #[serde(rename_all = "camelCase")]
    ProviderAuthAuthorize {
        provider: ProviderType,
        method_id: String,
    },
    #[serde(rename_all = "camelCase")]
    ProviderAuthCallback {
        provider: ProviderType,
        method_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        code: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    ProviderAuthSetApiKey {
        provider: ProviderType,
        method_id: String,
        api_key: String,
    },
    RefreshProviderStatus,

    #[serde(rename_all = "camelCase")]
    GetMessages {
        session_id: SessionId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        offset: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        limit: Option<i64>,
    },
    #[serde(rename_all = "camelCase")]
    SetSessionTitle {
        session_id: SessionId,
        title: String,
    },
    #[serde(rename_all = "camelCase")]
    DeleteSession {
        session_id: SessionId,
        target_session_id: SessionId,
    },
    #[serde(rename_all = "camelCase")]
    SessionBackupGet { session_id: SessionId },
    #[serde(rename_all = "camelCase")]
    SessionBackupCheckpoint {
        session_id: SessionId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    SessionBackupRestore {
        session_id: SessionId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        checkpoint_id: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    SessionBackupDeleteCheckpoint {
        session_id: SessionId,
        checkpoint_id: String,
    },

    #[serde(rename_all = "camelCase")]
    HarnessContextSet {
        session_id: SessionId,
        context: HarnessContext,
    },
    #[serde(rename_all = "camelCase")]
    HarnessContextGet { session_id: SessionId },

    #[serde(rename_all = "camelCase")]
    McpServerUpsert {
        session_id: SessionId,
        server_id: String,
        config: McpServerConfigPatch,
    },
    #[serde(rename_all = "camelCase")]
    McpServerDelete {
        session_id: SessionId,
        server_id: String,
    },
    #[serde(rename_all = "camelCase")]
    McpServerValidate {
        session_id: SessionId,
        server_id: String,
    },
    #[serde(rename_all = "camelCase")]
    McpServerAuth {
        session_id: SessionId,
        server_id: String,
    },

    #[serde(rename_all = "camelCase")]
    SkillEnable {
        session_id: SessionId,
        skill_id: String,
    },
    #[serde(rename_all = "camelCase")]
    SkillDisable {
        session_id: SessionId,
        skill_id: String,
    },
    #[serde(rename_all = "camelCase")]
    SkillDelete {
        session_id: SessionId,
        skill_id: String,
    },

    #[serde(rename_all = "camelCase")]
    UploadFile {
        session_id: SessionId,
        filename: String,
        content_base64: String,
    },
}

/// `ask_response`'s payload, shared so approval/ask carry the same
/// request-correlation shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AskResponsePayload {
    pub request_id: RequestId,
    pub answer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalResponsePayload {
    pub request_id: RequestId,
    pub approved: bool,
}

/// Harness-mode objective context, set once per session by an automated
/// caller (e.g. an eval harness) rather than an interactive user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HarnessContext {
    pub run_id: String,
    pub objective: String,
    #[serde(default)]
    pub acceptance_criteria: Vec<String>,
    #[serde(default)]
    pub constraints: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

/// Opaque MCP server configuration; the registry that interprets it is
/// out of scope here, this crate only carries the shape over the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpServerConfigPatch(pub Value);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_message_round_trips_through_json() {
        let msg = ClientMessage::UserMessage {
            session_id: SessionId::from("S"),
            text: "hello".to_string(),
            client_message_id: "c1".to_string(),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "user_message");
        assert_eq!(json["sessionId"], "S");
        assert_eq!(json["clientMessageId"], "c1");
        let parsed: ClientMessage = serde_json::from_value(json).unwrap();
        match parsed {
            ClientMessage::UserMessage { text, .. } => assert_eq!(text, "hello"),
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn set_config_flattens_the_patch() {
        let msg = ClientMessage::SetConfig {
            session_id: SessionId::from("S"),
            config: SessionConfigPatch {
                max_steps: Some(10),
                ..Default::default()
            },
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["config"]["maxSteps"], 10);
    }

    #[test]
    fn unscoped_variants_carry_no_session_id() {
        let json = serde_json::to_value(ClientMessage::Ping).unwrap();
        assert_eq!(json, serde_json::json!({"type": "ping"}));
    }
}
