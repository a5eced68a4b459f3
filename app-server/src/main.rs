use std::path::PathBuf;
use std::sync::Arc;

use agentsrv_keyring_store::DefaultKeyringStore;
use agentsrv_keyring_store::KeyringStore;
use agentsrv_protocol::ProviderType;
use agentsrv_transcript::FileTranscriptStore;
use agentsrv_transcript::TranscriptStore;
use clap::Parser;
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

use agentsrv_app_server::state;
use agentsrv_app_server::supervisor::WorkspaceSupervisor;
use agentsrv_app_server::ws;

/// Runs one loopback websocket server scoped to a single workspace
/// directory. The conductor that opens this workspace is responsible
/// for spawning this process and tearing it down; there is no
/// multi-workspace listener here (§3).
#[derive(Debug, Parser)]
#[command(name = "agentsrv-app-server", version, about)]
struct Cli {
    /// Stable identifier for this workspace, shared with the conductor.
    #[arg(long)]
    workspace_id: String,

    /// Root directory the session's tools are confined to.
    #[arg(long)]
    workspace_path: PathBuf,

    /// Loopback port to bind. Defaults to an OS-assigned port, printed
    /// to stdout once bound so the conductor can read it back.
    #[arg(long, default_value_t = 0)]
    port: u16,

    /// Skip command approval prompts and run tools without asking.
    #[arg(long)]
    yolo: bool,

    #[arg(long, default_value = "anthropic")]
    default_provider: String,

    #[arg(long, default_value = "claude-sonnet-4-5")]
    default_model: String,

    /// Overrides where workspace/thread bookkeeping is persisted.
    /// Defaults to the platform state directory.
    #[arg(long)]
    state_path: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let default_provider: ProviderType = cli
        .default_provider
        .parse()
        .map_err(|()| anyhow::anyhow!("unknown provider: {}", cli.default_provider))?;

    let state_path = match cli.state_path {
        Some(path) => path,
        None => agentsrv_config::default_state_path()?,
    };
    let supervisor = Arc::new(WorkspaceSupervisor::load(state_path)?);

    let workspace_root = cli.workspace_path;
    let transcript_root = workspace_root.join(".agentsrv").join("transcripts");
    let checkpoint_root = workspace_root.join(".agentsrv").join("checkpoints");
    tokio::fs::create_dir_all(&transcript_root).await?;
    tokio::fs::create_dir_all(&checkpoint_root).await?;
    let transcript: Arc<dyn TranscriptStore> = Arc::new(FileTranscriptStore::new(transcript_root));

    let keyring: Arc<dyn KeyringStore> = Arc::new(DefaultKeyringStore);

    let (app_state, auth_rx) = state::build(
        cli.workspace_id,
        workspace_root,
        cli.yolo,
        default_provider,
        cli.default_model,
        keyring,
        transcript,
        checkpoint_root,
        supervisor.clone(),
    );

    let (broadcast_tx, _broadcast_rx) = broadcast::channel(256);
    tokio::spawn(state::bridge_workspace_events(auth_rx, broadcast_tx.clone()));

    let router = ws::router(app_state, broadcast_tx);
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", cli.port)).await?;
    let bound_port = listener.local_addr()?.port();
    println!("{bound_port}");
    tracing::info!(port = bound_port, "agent session server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    supervisor.save().await?;
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
