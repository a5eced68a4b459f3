//! Provider metadata: identity, auth mode, and reasoning-stream shape.
//!
//! Per the design notes, provider reasoning mode is a fixed lookup table —
//! adding a provider means adding a table entry, never a conditional.

use serde::Deserialize;
use serde::Serialize;

/// A model provider known to the catalog.
///
/// New providers are added here and to [`ReasoningMode::for_provider`]
/// together; nothing else in the runtime branches on provider identity.
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderType {
    Anthropic,
    Openai,
    CodexCli,
    GoogleGenai,
    OpenaiCompat,
}

impl ProviderType {
    pub const ALL: [ProviderType; 5] = [
        ProviderType::Anthropic,
        ProviderType::Openai,
        ProviderType::CodexCli,
        ProviderType::GoogleGenai,
        ProviderType::OpenaiCompat,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Anthropic => "anthropic",
            Self::Openai => "openai",
            Self::CodexCli => "codex-cli",
            Self::GoogleGenai => "google-genai",
            Self::OpenaiCompat => "openai-compat",
        }
    }
}

impl std::fmt::Display for ProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ProviderType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or(())
    }
}

/// How a provider authorizes: a bearer API key, an interactive OAuth
/// flow, or an OAuth flow the server can complete without prompting
/// (refresh-token reuse).
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthMode {
    ApiKey,
    Oauth,
    OauthAuto,
}

impl AuthMode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ApiKey => "api-key",
            Self::Oauth => "oauth",
            Self::OauthAuto => "oauth-auto",
        }
    }
}

impl std::fmt::Display for AuthMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The class of `reasoning` chunk a provider emits.
///
/// Some providers expose the model's full reasoning trace; others expose
/// only a provider-generated summary of it. Clients render both as
/// `reasoning` feed items but may style them differently.
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasoningMode {
    /// The model's own reasoning tokens, streamed verbatim.
    Reasoning,
    /// A provider-generated summary of reasoning, not the raw trace.
    Summary,
    /// The provider exposes no reasoning stream at all.
    None,
}

impl ReasoningMode {
    /// Fixed per-provider table. New providers add a row here.
    pub const fn for_provider(provider: ProviderType) -> Self {
        match provider {
            ProviderType::Anthropic => Self::Reasoning,
            ProviderType::CodexCli => Self::Reasoning,
            ProviderType::Openai => Self::Summary,
            ProviderType::GoogleGenai => Self::Summary,
            ProviderType::OpenaiCompat => Self::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reasoning_mode_table_covers_every_provider() {
        for provider in ProviderType::ALL {
            // Exercising every variant is the point: a new ProviderType
            // variant that isn't matched in `for_provider` fails to compile.
            let _ = ReasoningMode::for_provider(provider);
        }
    }

    #[test]
    fn provider_round_trips_through_str() {
        for provider in ProviderType::ALL {
            let parsed: ProviderType = provider.as_str().parse().unwrap();
            assert_eq!(parsed, provider);
        }
    }

    #[test]
    fn codex_cli_uses_oauth_reasoning() {
        assert_eq!(
            ReasoningMode::for_provider(ProviderType::CodexCli),
            ReasoningMode::Reasoning
        );
    }
}
