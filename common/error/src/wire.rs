//! The `{type:"error", ...}` shape sent to clients.

use serde::Deserialize;
use serde::Serialize;

use crate::ErrorCode;
use crate::ErrorSource;

/// An error surfaced to a client over the wire.
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireError {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub source: ErrorSource,
    pub code: &'static str,
    pub message: String,
    #[serde(rename = "sessionId", skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl WireError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            kind: "error",
            source: code.default_source(),
            code: code.wire_str(),
            message: message.into(),
            session_id: None,
        }
    }

    pub fn with_source(mut self, source: ErrorSource) -> Self {
        self.source = source;
        self
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Build the `"set_config config.maxSteps must be number 1-1000"`-style
    /// message naming the offending field, as required by the validator.
    pub fn validation_failed(message_type: &str, field: &str, constraint: &str) -> Self {
        Self::new(
            ErrorCode::ValidationFailed,
            format!("{message_type} {field} {constraint}"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_matches_literal_example() {
        let err = WireError::validation_failed(
            "set_config",
            "config.maxSteps",
            "must be number 1-1000",
        );
        assert_eq!(
            err.message,
            "set_config config.maxSteps must be number 1-1000"
        );
        assert_eq!(err.code, "validation_failed");
    }

    #[test]
    fn serializes_with_type_tag() {
        let err = WireError::new(ErrorCode::UnknownSession, "no such session")
            .with_session("S1");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["code"], "unknown_session");
        assert_eq!(json["sessionId"], "S1");
    }
}
