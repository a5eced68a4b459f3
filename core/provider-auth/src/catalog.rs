//! The provider catalog and the fixed per-provider auth method table.
//!
//! Matching the pattern the rest of the pack uses for provider metadata:
//! adding a provider means adding a row here, never a conditional
//! elsewhere.

use agentsrv_protocol::AuthMode;
use agentsrv_protocol::ProviderType;
use agentsrv_protocol_wire::ProviderAuthMethodEntry;
use agentsrv_protocol_wire::ProviderAuthMethodKind;
use agentsrv_protocol_wire::ProviderCatalogEntry;

/// `displayName` / `defaultModel` for the `provider_catalog_get` response.
pub fn catalog_entry(provider: ProviderType) -> ProviderCatalogEntry {
    let (display_name, default_model) = match provider {
        ProviderType::Anthropic => ("Anthropic", "claude-sonnet-4-5"),
        ProviderType::Openai => ("OpenAI", "gpt-5"),
        ProviderType::CodexCli => ("Codex CLI", "gpt-5-codex"),
        ProviderType::GoogleGenai => ("Google Gemini", "gemini-2.5-pro"),
        ProviderType::OpenaiCompat => ("OpenAI-compatible", "default"),
    };
    ProviderCatalogEntry {
        provider,
        display_name: display_name.to_string(),
        default_model: default_model.to_string(),
    }
}

/// The auth mode a provider normally authorizes through. `OauthAuto`
/// providers also register the `api` method so a user can override with
/// a bearer key.
pub const fn primary_auth_mode(provider: ProviderType) -> AuthMode {
    match provider {
        ProviderType::Anthropic | ProviderType::Openai | ProviderType::GoogleGenai => {
            AuthMode::ApiKey
        }
        ProviderType::CodexCli => AuthMode::Oauth,
        ProviderType::OpenaiCompat => AuthMode::ApiKey,
    }
}

/// The loopback redirect port an `oauth` method prefers before falling
/// back to an ephemeral one. `None` means "always ephemeral".
pub const fn preferred_oauth_port(provider: ProviderType) -> Option<u16> {
    match provider {
        ProviderType::CodexCli => Some(1455),
        _ => None,
    }
}

pub fn auth_methods(provider: ProviderType) -> Vec<ProviderAuthMethodEntry> {
    match primary_auth_mode(provider) {
        AuthMode::ApiKey => vec![ProviderAuthMethodEntry {
            method_id: "api_key".to_string(),
            kind: ProviderAuthMethodKind::Api,
            label: "API key".to_string(),
        }],
        AuthMode::Oauth | AuthMode::OauthAuto => vec![
            ProviderAuthMethodEntry {
                method_id: "oauth_cli".to_string(),
                kind: ProviderAuthMethodKind::Oauth,
                label: "Sign in with browser".to_string(),
            },
            ProviderAuthMethodEntry {
                method_id: "api_key".to_string(),
                kind: ProviderAuthMethodKind::Api,
                label: "API key".to_string(),
            },
        ],
    }
}

pub fn method_kind(provider: ProviderType, method_id: &str) -> Option<ProviderAuthMethodKind> {
    auth_methods(provider)
        .into_iter()
        .find(|entry| entry.method_id == method_id)
        .map(|entry| entry.kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codex_cli_offers_oauth_and_api_key() {
        let methods = auth_methods(ProviderType::CodexCli);
        assert_eq!(methods.len(), 2);
        assert_eq!(methods[0].kind, ProviderAuthMethodKind::Oauth);
    }

    #[test]
    fn anthropic_offers_api_key_only() {
        let methods = auth_methods(ProviderType::Anthropic);
        assert_eq!(methods.len(), 1);
        assert_eq!(methods[0].method_id, "api_key");
    }

    #[test]
    fn unknown_method_id_is_none() {
        assert!(method_kind(ProviderType::Anthropic, "oauth_cli").is_none());
    }

    #[test]
    fn every_provider_has_a_catalog_entry() {
        for provider in ProviderType::ALL {
            let entry = catalog_entry(provider);
            assert_eq!(entry.provider, provider);
        }
    }
}
