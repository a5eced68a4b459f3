use serde::Deserialize;
use serde::Serialize;

/// Partial update carried by `set_config`. Every field is optional — only
/// fields present in the JSON are applied, the rest keep their current
/// session value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfigPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yolo: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observability_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_agent_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_steps: Option<i64>,
}

/// The effective session configuration, echoed in `server_hello` and
/// `config_updated`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfigSnapshot {
    pub provider: agentsrv_protocol::ProviderType,
    pub model: String,
    pub enable_mcp: bool,
    pub yolo: bool,
    pub observability_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_agent_model: Option<String>,
    pub max_steps: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_omits_absent_fields_on_the_wire() {
        let patch = SessionConfigPatch {
            max_steps: Some(50),
            ..Default::default()
        };
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json, serde_json::json!({"maxSteps": 50}));
    }
}
