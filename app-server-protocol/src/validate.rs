//! Parsing and field-level validation for inbound client messages.
//!
//! Parsing happens in two passes. First the raw frame is checked for valid
//! JSON and a present/known `type` discriminator — this catches malformed
//! input before serde ever sees it, so the error always matches the exact
//! [`ErrorCode`] the wire protocol promises (`invalid_json`, `missing_type`,
//! `unknown_type`) rather than whatever serde's own message happens to say.
//! Only then does it deserialize into [`ClientMessage`] and run
//! [`validate_client_message`] for the bound checks serde's shape alone
//! can't express (numeric ranges, non-empty ids).

use agentsrv_error::ErrorCode;
use agentsrv_error::WireError;
use serde_json::Value;

use crate::client_message::ClientMessage;

const KNOWN_TYPES: &[&str] = &[
    "client_hello",
    "user_message",
    "cancel",
    "reset",
    "session_close",
    "ask_response",
    "approval_response",
    "set_model",
    "set_enable_mcp",
    "set_config",
    "list_tools",
    "list_commands",
    "list_skills",
    "list_sessions",
    "ping",
    "provider_catalog_get",
    "provider_auth_methods_get",
    "provider_auth_authorize",
    "provider_auth_callback",
    "provider_auth_set_api_key",
    "refresh_provider_status",
    "get_messages",
    "set_session_title",
    "delete_session",
    "session_backup_get",
    "session_backup_checkpoint",
    "session_backup_restore",
    "session_backup_delete_checkpoint",
    "harness_context_set",
    "harness_context_get",
    "mcp_server_upsert",
    "mcp_server_delete",
    "mcp_server_validate",
    "mcp_server_auth",
    "skill_enable",
    "skill_disable",
    "skill_delete",
    "upload_file",
];

const MAX_MCP_API_KEY_BYTES: usize = 100_000;
const MAX_STEPS_MIN: i64 = 1;
const MAX_STEPS_MAX: i64 = 1000;

/// Parse one inbound frame into a validated [`ClientMessage`].
pub fn parse_client_message(raw: &str) -> Result<ClientMessage, WireError> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| WireError::new(ErrorCode::InvalidJson, e.to_string()))?;

    let message_type = value
        .get("type")
        .ok_or_else(|| WireError::new(ErrorCode::MissingType, "message is missing a \"type\" field"))?
        .as_str()
        .ok_or_else(|| WireError::new(ErrorCode::MissingType, "\"type\" field must be a string"))?;

    if !KNOWN_TYPES.contains(&message_type) {
        return Err(WireError::new(
            ErrorCode::UnknownType,
            format!("unknown message type \"{message_type}\""),
        ));
    }

    let message: ClientMessage = serde_json::from_value(value)
        .map_err(|e| WireError::new(ErrorCode::InvalidPayload, e.to_string()))?;

    validate_client_message(&message)?;
    Ok(message)
}

/// Field-level checks beyond what the JSON shape alone guarantees: the
/// bound behaviors named in the testable-properties section (`maxSteps`,
/// `offset`, `limit`, MCP key length, non-empty `sessionId`).
pub fn validate_client_message(message: &ClientMessage) -> Result<(), WireError> {
    if let Some(session_id) = session_id_of(message) {
        if session_id.as_str().is_empty() {
            return Err(WireError::validation_failed(
                message_name(message),
                "sessionId",
                "must not be empty",
            ));
        }
    }

    match message {
        ClientMessage::SetConfig { config, .. } => {
            if let Some(max_steps) = config.max_steps {
                if !(MAX_STEPS_MIN..=MAX_STEPS_MAX).contains(&max_steps) {
                    return Err(WireError::validation_failed(
                        "set_config",
                        "config.maxSteps",
                        "must be number 1-1000",
                    ));
                }
            }
        }
        ClientMessage::GetMessages { offset, limit, .. } => {
            if let Some(offset) = offset {
                if *offset < 0 {
                    return Err(WireError::validation_failed(
                        "get_messages",
                        "offset",
                        "must be >= 0",
                    ));
                }
            }
            if let Some(limit) = limit {
                if *limit < 1 {
                    return Err(WireError::validation_failed(
                        "get_messages",
                        "limit",
                        "must be >= 1",
                    ));
                }
            }
        }
        ClientMessage::ProviderAuthSetApiKey { api_key, .. } => {
            if api_key.len() > MAX_MCP_API_KEY_BYTES {
                return Err(WireError::validation_failed(
                    "provider_auth_set_api_key",
                    "apiKey",
                    "must be at most 100000 bytes",
                ));
            }
        }
        ClientMessage::UserMessage {
            client_message_id, ..
        } => {
            if client_message_id.is_empty() {
                return Err(WireError::validation_failed(
                    "user_message",
                    "clientMessageId",
                    "must not be empty",
                ));
            }
        }
        _ => {}
    }

    Ok(())
}

fn session_id_of(message: &ClientMessage) -> Option<&agentsrv_protocol::SessionId> {
    match message {
        ClientMessage::UserMessage { session_id, .. }
        | ClientMessage::Cancel { session_id }
        | ClientMessage::Reset { session_id }
        | ClientMessage::SessionClose { session_id }
        | ClientMessage::AskResponse { session_id, .. }
        | ClientMessage::ApprovalResponse { session_id, .. }
        | ClientMessage::SetModel { session_id, .. }
        | ClientMessage::SetEnableMcp { session_id, .. }
        | ClientMessage::SetConfig { session_id, .. }
        | ClientMessage::ListTools { session_id }
        | ClientMessage::ListCommands { session_id }
        | ClientMessage::ListSkills { session_id }
        | ClientMessage::GetMessages { session_id, .. }
        | ClientMessage::SetSessionTitle { session_id, .. }
        | ClientMessage::DeleteSession { session_id, .. }
        | ClientMessage::SessionBackupGet { session_id }
        | ClientMessage::SessionBackupCheckpoint { session_id, .. }
        | ClientMessage::SessionBackupRestore { session_id, .. }
        | ClientMessage::SessionBackupDeleteCheckpoint { session_id, .. }
        | ClientMessage::HarnessContextSet { session_id, .. }
        | ClientMessage::HarnessContextGet { session_id }
        | ClientMessage::McpServerUpsert { session_id, .. }
        | ClientMessage::McpServerDelete { session_id, .. }
        | ClientMessage::McpServerValidate { session_id, .. }
        | ClientMessage::McpServerAuth { session_id, .. }
        | ClientMessage::SkillEnable { session_id, .. }
        | ClientMessage::SkillDisable { session_id, .. }
        | ClientMessage::SkillDelete { session_id, .. }
        | ClientMessage::UploadFile { session_id, .. } => Some(session_id),
        ClientMessage::ClientHello { .. }
        | ClientMessage::ListSessions
        | ClientMessage::Ping
        | ClientMessage::ProviderCatalogGet
        | ClientMessage::ProviderAuthMethodsGet { .. }
        | ClientMessage::ProviderAuthAuthorize { .. }
        | ClientMessage::ProviderAuthCallback { .. }
        | ClientMessage::ProviderAuthSetApiKey { .. }
        | ClientMessage::RefreshProviderStatus => None,
    }
}

fn message_name(message: &ClientMessage) -> &'static str {
    match message {
        ClientMessage::ClientHello { .. } => "client_hello",
        ClientMessage::UserMessage { .. } => "user_message",
        ClientMessage::Cancel { .. } => "cancel",
        ClientMessage::Reset { .. } => "reset",
        ClientMessage::SessionClose { .. } => "session_close",
        ClientMessage::AskResponse { .. } => "ask_response",
        ClientMessage::ApprovalResponse { .. } => "approval_response",
        ClientMessage::SetModel { .. } => "set_model",
        ClientMessage::SetEnableMcp { .. } => "set_enable_mcp",
        ClientMessage::SetConfig { .. } => "set_config",
        ClientMessage::ListTools { .. } => "list_tools",
        ClientMessage::ListCommands { .. } => "list_commands",
        ClientMessage::ListSkills { .. } => "list_skills",
        ClientMessage::ListSessions => "list_sessions",
        ClientMessage::Ping => "ping",
        ClientMessage::ProviderCatalogGet => "provider_catalog_get",
        ClientMessage::ProviderAuthMethodsGet { .. } => "provider_auth_methods_get",
        ClientMessage::ProviderAuthAuthorize { .. } => "provider_auth_authorize",
        ClientMessage::ProviderAuthCallback { .. } => "provider_auth_callback",
        ClientMessage::ProviderAuthSetApiKey { .. } => "provider_auth_set_api_key",
        ClientMessage::RefreshProviderStatus => "refresh_provider_status",
        ClientMessage::GetMessages { .. } => "get_messages",
        ClientMessage::SetSessionTitle { .. } => "set_session_title",
        ClientMessage::DeleteSession { .. } => "delete_session",
        ClientMessage::SessionBackupGet { .. } => "session_backup_get",
        ClientMessage::SessionBackupCheckpoint { .. } => "session_backup_checkpoint",
        ClientMessage::SessionBackupRestore { .. } => "session_backup_restore",
        ClientMessage::SessionBackupDeleteCheckpoint { .. } => "session_backup_delete_checkpoint",
        ClientMessage::HarnessContextSet { .. } => "harness_context_set",
        ClientMessage::HarnessContextGet { .. } => "harness_context_get",
        ClientMessage::McpServerUpsert { .. } => "mcp_server_upsert",
        ClientMessage::McpServerDelete { .. } => "mcp_server_delete",
        ClientMessage::McpServerValidate { .. } => "mcp_server_validate",
        ClientMessage::McpServerAuth { .. } => "mcp_server_auth",
        ClientMessage::SkillEnable { .. } => "skill_enable",
        ClientMessage::SkillDisable { .. } => "skill_disable",
        ClientMessage::SkillDelete { .. } => "skill_delete",
        ClientMessage::UploadFile { .. } => "upload_file",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_type_is_rejected() {
        let err = parse_client_message(r#"{"type":"do_a_barrel_roll"}"#).unwrap_err();
        assert_eq!(err.code, "unknown_type");
    }

    #[test]
    fn missing_type_is_rejected() {
        let err = parse_client_message(r#"{"sessionId":"S"}"#).unwrap_err();
        assert_eq!(err.code, "missing_type");
    }

    #[test]
    fn invalid_json_is_rejected() {
        let err = parse_client_message("{not json").unwrap_err();
        assert_eq!(err.code, "invalid_json");
    }

    #[test]
    fn max_steps_zero_is_rejected() {
        let err = parse_client_message(
            r#"{"type":"set_config","sessionId":"S","config":{"maxSteps":0}}"#,
        )
        .unwrap_err();
        assert_eq!(err.code, "validation_failed");
        assert_eq!(err.message, "set_config config.maxSteps must be number 1-1000");
    }

    #[test]
    fn max_steps_1001_is_rejected() {
        let err = parse_client_message(
            r#"{"type":"set_config","sessionId":"S","config":{"maxSteps":1001}}"#,
        )
        .unwrap_err();
        assert_eq!(err.code, "validation_failed");
    }

    #[test]
    fn max_steps_1000_is_accepted() {
        parse_client_message(r#"{"type":"set_config","sessionId":"S","config":{"maxSteps":1000}}"#)
            .unwrap();
    }

    #[test]
    fn empty_session_id_is_rejected() {
        let err =
            parse_client_message(r#"{"type":"cancel","sessionId":""}"#).unwrap_err();
        assert_eq!(err.code, "validation_failed");
    }

    #[test]
    fn oversized_mcp_api_key_is_rejected() {
        let oversized = "a".repeat(100_001);
        let raw = serde_json::json!({
            "type": "provider_auth_set_api_key",
            "provider": "anthropic",
            "methodId": "api",
            "apiKey": oversized,
        })
        .to_string();
        let err = parse_client_message(&raw).unwrap_err();
        assert_eq!(err.code, "validation_failed");
    }

    #[test]
    fn literal_scenario_six_message_matches_exactly() {
        let err = parse_client_message(
            r#"{"type":"set_config","sessionId":"S","config":{"maxSteps":2000}}"#,
        )
        .unwrap_err();
        assert_eq!(err.source.as_ref(), "protocol");
        assert_eq!(
            err.message,
            "set_config config.maxSteps must be number 1-1000"
        );
    }
}
