//! [`ProviderAuthRegistry`]: the provider catalog, auth method table,
//! status cache, and OAuth flow supervisor (§4.5). Workspace-scoped, not
//! session-scoped — none of its events carry a `sessionId`.

use std::collections::HashMap;
use std::sync::Arc;

use agentsrv_keyring_store::KeyringStore;
use agentsrv_protocol::AuthMode;
use agentsrv_protocol::ProviderType;
use agentsrv_protocol_wire::AuthChallenge;
use agentsrv_protocol_wire::ProviderAuthMethodKind;
use agentsrv_protocol_wire::ServerEvent;
use tokio::sync::Mutex;
use tokio::sync::mpsc;
use tokio::sync::oneshot;
use tracing::warn;

use crate::catalog;
use crate::error::OauthFailedSnafu;
use crate::error::ProviderAuthError;
use crate::error::UnknownMethodSnafu;
use crate::error::WrongMethodKindSnafu;
use crate::flow;
use crate::flow::FlowOutcome;
use crate::flow::OauthFlowHandle;
use crate::status::ProviderStatus;
use snafu::OptionExt;

const KEYRING_SERVICE: &str = "Agent Session Server Provider Credentials";

struct Inner {
    keyring: Arc<dyn KeyringStore>,
    statuses: Mutex<HashMap<ProviderType, ProviderStatus>>,
    active_flows: Mutex<HashMap<ProviderType, (OauthFlowHandle, oneshot::Sender<String>)>>,
    events_tx: mpsc::UnboundedSender<ServerEvent>,
}

#[derive(Clone)]
pub struct ProviderAuthRegistry {
    inner: Arc<Inner>,
}

impl ProviderAuthRegistry {
    pub fn new(keyring: Arc<dyn KeyringStore>, events_tx: mpsc::UnboundedSender<ServerEvent>) -> Self {
        let mut statuses = HashMap::new();
        for provider in ProviderType::ALL {
            statuses.insert(provider, ProviderStatus::unknown(provider));
        }
        Self {
            inner: Arc::new(Inner {
                keyring,
                statuses: Mutex::new(statuses),
                active_flows: Mutex::new(HashMap::new()),
                events_tx,
            }),
        }
    }

    pub async fn catalog_event(&self) -> ServerEvent {
        let statuses = self.inner.statuses.lock().await;
        let connected: Vec<ProviderType> = ProviderType::ALL
            .into_iter()
            .filter(|p| statuses.get(p).map(|s| s.to_entry(*p).authorized).unwrap_or(false))
            .collect();
        ServerEvent::ProviderCatalog {
            all: ProviderType::ALL.into_iter().map(catalog::catalog_entry).collect(),
            default: connected.first().copied(),
            connected,
        }
    }

    pub fn auth_methods_event(&self, provider: ProviderType) -> ServerEvent {
        ServerEvent::ProviderAuthMethods {
            provider,
            methods: catalog::auth_methods(provider),
        }
    }

    pub async fn status_event(&self) -> ServerEvent {
        let statuses = self.inner.statuses.lock().await;
        ServerEvent::ProviderStatus {
            providers: ProviderType::ALL
                .into_iter()
                .map(|p| {
                    statuses
                        .get(&p)
                        .cloned()
                        .unwrap_or_else(|| ProviderStatus::unknown(p))
                        .to_entry(p)
                })
                .collect(),
        }
    }

    /// Store a bearer key for an `api` method, then mark the provider
    /// authorized. Unknown or non-`api` method ids are rejected (§4.5).
    pub async fn set_api_key(
        &self,
        provider: ProviderType,
        method_id: String,
        api_key: String,
    ) -> Result<(), ProviderAuthError> {
        let kind = catalog::method_kind(provider, &method_id).context(UnknownMethodSnafu {
            method_id: method_id.clone(),
        })?;
        if kind != ProviderAuthMethodKind::Api {
            return WrongMethodKindSnafu { method_id }.fail();
        }

        let account = format!("{provider}:{method_id}");
        self.inner
            .keyring
            .save(KEYRING_SERVICE, &account, &api_key)
            .map_err(|err| {
                ProviderAuthError::KeyringError {
                    message: err.message(),
                }
            })?;

        let mut statuses = self.inner.statuses.lock().await;
        statuses.insert(
            provider,
            ProviderStatus {
                state: crate::status::AuthState::Authorized,
                mode: AuthMode::ApiKey,
                account: None,
            },
        );
        Ok(())
    }

    /// Start (or replace) an OAuth flow for `provider`/`method_id` and
    /// emit the challenge. The caller is responsible for also emitting
    /// the returned event.
    pub async fn authorize(
        &self,
        provider: ProviderType,
        method_id: String,
    ) -> Result<ServerEvent, ProviderAuthError> {
        let kind = catalog::method_kind(provider, &method_id).context(UnknownMethodSnafu {
            method_id: method_id.clone(),
        })?;
        if kind != ProviderAuthMethodKind::Oauth {
            return WrongMethodKindSnafu { method_id }.fail();
        }

        let preferred_port = catalog::preferred_oauth_port(provider);
        let (handle, url, explicit_tx, outcome_rx) =
            flow::spawn(preferred_port).map_err(|message| ProviderAuthError::LoopbackBindFailed { message })?;

        let mut flows = self.inner.active_flows.lock().await;
        if let Some((old_handle, _)) = flows.remove(&provider) {
            old_handle.cancel();
        }
        flows.insert(provider, (handle, explicit_tx));
        drop(flows);

        {
            let mut statuses = self.inner.statuses.lock().await;
            let entry = statuses.entry(provider).or_insert_with(|| ProviderStatus::unknown(provider));
            entry.state = crate::status::AuthState::Querying;
        }

        let registry = self.clone();
        let method_id_for_task = method_id.clone();
        tokio::spawn(async move {
            registry.finalize(provider, method_id_for_task, outcome_rx).await;
        });

        Ok(ServerEvent::ProviderAuthChallenge {
            provider,
            method_id,
            challenge: AuthChallenge {
                instructions: "Open the link below to finish signing in.".to_string(),
                command: None,
                url: Some(url),
            },
        })
    }

    /// Feed an explicit `provider_auth_callback {code}` into whichever
    /// flow is in progress for this provider.
    pub async fn callback(
        &self,
        provider: ProviderType,
        code: Option<String>,
    ) -> Result<(), ProviderAuthError> {
        let entry = self.inner.active_flows.lock().await.remove(&provider);
        let Some((handle, explicit_tx)) = entry else {
            return OauthFailedSnafu {
                message: format!("no authorization flow in progress for {provider}"),
            }
            .fail();
        };
        match code {
            Some(code) => {
                let _ = explicit_tx.send(code);
            }
            None => handle.cancel(),
        }
        Ok(())
    }

    async fn finalize(
        &self,
        provider: ProviderType,
        method_id: String,
        outcome_rx: oneshot::Receiver<FlowOutcome>,
    ) {
        self.inner.active_flows.lock().await.remove(&provider);

        let outcome = match outcome_rx.await {
            Ok(outcome) => outcome,
            Err(_) => FlowOutcome::Cancelled,
        };

        let (ok, message) = match &outcome {
            FlowOutcome::Completed { code } if !code.is_empty() => (true, "signed in".to_string()),
            FlowOutcome::Completed { .. } => (false, "callback carried no authorization code".to_string()),
            FlowOutcome::Cancelled => (false, "authorization flow cancelled or replaced".to_string()),
            FlowOutcome::TimedOut => (false, "authorization flow timed out".to_string()),
        };

        {
            let mut statuses = self.inner.statuses.lock().await;
            statuses.insert(
                provider,
                ProviderStatus {
                    state: if ok {
                        crate::status::AuthState::Authorized
                    } else {
                        crate::status::AuthState::Unauthorized
                    },
                    mode: AuthMode::Oauth,
                    account: None,
                },
            );
        }

        let result = ServerEvent::ProviderAuthResult {
            ok,
            provider,
            method_id,
            mode: Some(AuthMode::Oauth),
            message,
        };
        if self.inner.events_tx.send(result).is_err() {
            warn!(provider = %provider, "no receiver for provider auth result");
        }
        let _ = self.inner.events_tx.send(self.status_event().await);
        let _ = self.inner.events_tx.send(self.catalog_event().await);
    }
}
