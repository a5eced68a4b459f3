//! Per-provider auth state (§4.5): `unknown -> querying -> {authorized,
//! unauthorized}`.

use agentsrv_protocol::AuthMode;
use agentsrv_protocol::ProviderType;
use agentsrv_protocol_wire::ProviderStatusEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unknown,
    Querying,
    Authorized,
    Unauthorized,
}

#[derive(Debug, Clone)]
pub struct ProviderStatus {
    pub state: AuthState,
    pub mode: AuthMode,
    pub account: Option<String>,
}

impl ProviderStatus {
    pub fn unknown(provider: ProviderType) -> Self {
        Self {
            state: AuthState::Unknown,
            mode: crate::catalog::primary_auth_mode(provider),
            account: None,
        }
    }

    pub fn to_entry(&self, provider: ProviderType) -> ProviderStatusEntry {
        ProviderStatusEntry {
            provider,
            mode: self.mode,
            authorized: self.state == AuthState::Authorized,
            verified: matches!(self.state, AuthState::Authorized | AuthState::Unauthorized),
            account: self.account.clone(),
        }
    }
}
