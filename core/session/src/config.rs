//! The session's owned configuration and its wire projection.

use agentsrv_protocol::ProviderType;
use agentsrv_protocol_wire::SessionConfigPatch;
use agentsrv_protocol_wire::SessionConfigSnapshot;

use crate::error::SessionError;

/// Bounds enforced on `maxSteps` (§4.1 validation rules, §8 boundaries).
pub const MAX_STEPS_MIN: i64 = 1;
pub const MAX_STEPS_MAX: i64 = 1000;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub provider: ProviderType,
    pub model: String,
    pub enable_mcp: bool,
    pub yolo: bool,
    pub observability_enabled: bool,
    pub sub_agent_model: Option<String>,
    pub max_steps: i64,
}

impl SessionConfig {
    pub fn new(provider: ProviderType, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            enable_mcp: false,
            yolo: false,
            observability_enabled: true,
            sub_agent_model: None,
            max_steps: 200,
        }
    }

    pub fn snapshot(&self) -> SessionConfigSnapshot {
        SessionConfigSnapshot {
            provider: self.provider,
            model: self.model.clone(),
            enable_mcp: self.enable_mcp,
            yolo: self.yolo,
            observability_enabled: self.observability_enabled,
            sub_agent_model: self.sub_agent_model.clone(),
            max_steps: self.max_steps,
        }
    }

    pub fn set_model(&mut self, provider: Option<ProviderType>, model: String) {
        if let Some(provider) = provider {
            self.provider = provider;
        }
        self.model = model;
    }

    pub fn set_enable_mcp(&mut self, enabled: bool) {
        self.enable_mcp = enabled;
    }

    /// Apply a `set_config` patch, rejecting an out-of-range `maxSteps`
    /// before mutating anything (§4.1, §8 boundary: 0 and 1001 rejected,
    /// 1000 accepted).
    pub fn apply_patch(&mut self, patch: SessionConfigPatch) -> Result<(), SessionError> {
        if let Some(max_steps) = patch.max_steps {
            if !(MAX_STEPS_MIN..=MAX_STEPS_MAX).contains(&max_steps) {
                return Err(SessionError::ValidationFailed {
                    field: "set_config config.maxSteps".to_string(),
                    message: "must be number 1-1000".to_string(),
                });
            }
        }
        if let Some(yolo) = patch.yolo {
            self.yolo = yolo;
        }
        if let Some(observability_enabled) = patch.observability_enabled {
            self.observability_enabled = observability_enabled;
        }
        if patch.sub_agent_model.is_some() {
            self.sub_agent_model = patch.sub_agent_model;
        }
        if let Some(max_steps) = patch.max_steps {
            self.max_steps = max_steps;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_steps_zero_is_rejected() {
        let mut config = SessionConfig::new(ProviderType::Anthropic, "claude");
        let patch = SessionConfigPatch {
            max_steps: Some(0),
            ..Default::default()
        };
        let err = config.apply_patch(patch).unwrap_err();
        assert_eq!(err.to_string(), "set_config config.maxSteps must be number 1-1000");
    }

    #[test]
    fn max_steps_1001_is_rejected_1000_accepted() {
        let mut config = SessionConfig::new(ProviderType::Anthropic, "claude");
        assert!(
            config
                .apply_patch(SessionConfigPatch {
                    max_steps: Some(1001),
                    ..Default::default()
                })
                .is_err()
        );
        assert!(
            config
                .apply_patch(SessionConfigPatch {
                    max_steps: Some(1000),
                    ..Default::default()
                })
                .is_ok()
        );
        assert_eq!(config.max_steps, 1000);
    }

    #[test]
    fn absent_fields_leave_current_values_untouched() {
        let mut config = SessionConfig::new(ProviderType::Anthropic, "claude");
        config.yolo = true;
        config
            .apply_patch(SessionConfigPatch {
                sub_agent_model: Some("fast-model".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert!(config.yolo);
        assert_eq!(config.sub_agent_model.as_deref(), Some("fast-model"));
    }
}
