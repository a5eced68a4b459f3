//! Shared, per-workspace-server state (§3, §5): the live session
//! registry, the workspace-wide provider auth registry, and the handles
//! every websocket connection needs to build a [`agentsrv_session::Session`].

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use agentsrv_protocol::ProviderType;
use agentsrv_protocol::SessionId;
use agentsrv_protocol_wire::HarnessContext;
use agentsrv_protocol_wire::ServerEvent;
use agentsrv_provider_auth::ProviderAuthRegistry;
use agentsrv_session::SessionRegistry;
use agentsrv_transcript::TranscriptStore;
use tokio::sync::Mutex;
use tokio::sync::mpsc;
use tracing::warn;

use crate::supervisor::WorkspaceSupervisor;

/// Everything one running workspace server needs, shared across every
/// open websocket connection via an `Arc`.
pub struct AppState {
    pub workspace_id: String,
    pub workspace_root: PathBuf,
    pub yolo: bool,
    pub default_provider: ProviderType,
    pub default_model: String,
    pub registry: Arc<SessionRegistry>,
    pub provider_auth: ProviderAuthRegistry,
    /// Workspace-wide events (currently just provider auth) fed to every
    /// connected client, independent of which session(s) it owns.
    pub workspace_events: mpsc::UnboundedSender<ServerEvent>,
    pub transcript: Arc<dyn TranscriptStore>,
    pub checkpoint_root: PathBuf,
    pub supervisor: Arc<WorkspaceSupervisor>,
    harness_contexts: Mutex<HashMap<SessionId, HarnessContext>>,
}

impl AppState {
    pub async fn harness_context_set(&self, session_id: SessionId, context: HarnessContext) {
        self.harness_contexts.lock().await.insert(session_id, context);
    }

    pub async fn harness_context_get(&self, session_id: &SessionId) -> Option<HarnessContext> {
        self.harness_contexts.lock().await.get(session_id).cloned()
    }
}

/// Build `AppState` and spawn the bridge task that forwards the provider
/// auth registry's events onto `workspace_events` for every connection
/// to subscribe to (each websocket handler opens its own
/// `mpsc::unbounded_channel` from `workspace_events.subscribe()`-equivalent
/// via a `broadcast` wrapper built in `ws::router`).
pub fn build(
    workspace_id: String,
    workspace_root: PathBuf,
    yolo: bool,
    default_provider: ProviderType,
    default_model: String,
    keyring: Arc<dyn agentsrv_keyring_store::KeyringStore>,
    transcript: Arc<dyn TranscriptStore>,
    checkpoint_root: PathBuf,
    supervisor: Arc<WorkspaceSupervisor>,
) -> (Arc<AppState>, mpsc::UnboundedReceiver<ServerEvent>) {
    let (auth_tx, auth_rx) = mpsc::unbounded_channel();
    let provider_auth = ProviderAuthRegistry::new(keyring, auth_tx.clone());
    let state = Arc::new(AppState {
        workspace_id,
        workspace_root,
        yolo,
        default_provider,
        default_model,
        registry: Arc::new(SessionRegistry::new()),
        provider_auth,
        workspace_events: auth_tx,
        transcript,
        checkpoint_root,
        supervisor,
        harness_contexts: Mutex::new(HashMap::new()),
    });
    (state, auth_rx)
}

/// Forward every workspace event onto `sink`, until the source closes.
/// Runs for the lifetime of the server; logs rather than panics if the
/// broadcast has no current subscribers (normal when no client is
/// connected at the moment an auth event fires).
pub async fn bridge_workspace_events(
    mut source: mpsc::UnboundedReceiver<ServerEvent>,
    sink: tokio::sync::broadcast::Sender<ServerEvent>,
) {
    while let Some(event) = source.recv().await {
        if sink.send(event).is_err() {
            warn!("workspace event dropped: no connected client is listening");
        }
    }
}
