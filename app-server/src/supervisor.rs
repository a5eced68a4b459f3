//! The slice of the workspace supervisor's interface that lives inside
//! this process (§6): persisted-state bookkeeping and directory
//! listing. Spawning/stopping the server process itself, and picking a
//! workspace directory through a native file dialog, are the external
//! supervisor's job and are not reimplemented here — `pick_workspace_directory`
//! below is honest about that rather than faking a dialog headlessly.

use std::path::Path;
use std::path::PathBuf;

use agentsrv_config::PersistedState;
use agentsrv_config::ThreadEntry;
use agentsrv_config::ThreadStatus;
use agentsrv_config::WorkspaceEntry;
use chrono::Utc;
use ignore::WalkBuilder;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::instrument;

use crate::error::AppServerError;
use crate::error::StateSnafu;
use snafu::ResultExt;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub name: String,
    pub is_dir: bool,
}

/// Owns the one persisted-state file for this installation and keeps it
/// current as workspaces/threads open and close.
pub struct WorkspaceSupervisor {
    state_path: PathBuf,
    state: Mutex<PersistedState>,
}

impl WorkspaceSupervisor {
    #[instrument(skip_all, fields(path = %state_path.display()))]
    pub fn load(state_path: PathBuf) -> Result<Self, AppServerError> {
        let state = agentsrv_config::load_state(&state_path).context(StateSnafu)?;
        Ok(Self {
            state_path,
            state: Mutex::new(state),
        })
    }

    /// Record that `workspace_id` was opened, inserting a fresh entry if
    /// this is the first time this installation has seen it.
    pub async fn touch_workspace(&self, workspace_id: &str, workspace_path: &Path) {
        let now = Utc::now();
        let mut state = self.state.lock().await;
        if let Some(entry) = state.workspaces.iter_mut().find(|w| w.id == workspace_id) {
            entry.last_opened_at = now;
        } else {
            state.workspaces.push(WorkspaceEntry {
                id: workspace_id.to_string(),
                name: workspace_path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_else(|| workspace_id.to_string()),
                path: workspace_path.to_path_buf(),
                created_at: now,
                last_opened_at: now,
                default_provider: None,
                default_model: None,
                default_enable_mcp: false,
                yolo: false,
            });
        }
    }

    /// Upsert the thread's entry, setting it `active` and bumping
    /// `lastMessageAt` (§3: threads span reconnects of a session).
    pub async fn touch_thread(&self, thread_id: &str, workspace_id: &str, title: &str) {
        let now = Utc::now();
        let mut state = self.state.lock().await;
        if let Some(entry) = state.threads.iter_mut().find(|t| t.id == thread_id) {
            entry.title = title.to_string();
            entry.last_message_at = now;
            entry.status = ThreadStatus::Active;
        } else {
            state.threads.push(ThreadEntry {
                id: thread_id.to_string(),
                workspace_id: workspace_id.to_string(),
                title: title.to_string(),
                created_at: now,
                last_message_at: now,
                status: ThreadStatus::Active,
            });
        }
    }

    /// Flip a thread to `disconnected` (§7: "repeated failures flip the
    /// thread to disconnected"), e.g. once its watchdog-driven reconnect
    /// budget is exhausted.
    pub async fn mark_thread_disconnected(&self, thread_id: &str) {
        let mut state = self.state.lock().await;
        if let Some(entry) = state.threads.iter_mut().find(|t| t.id == thread_id) {
            entry.status = ThreadStatus::Disconnected;
        }
    }

    pub async fn save(&self) -> Result<(), AppServerError> {
        let state = self.state.lock().await;
        agentsrv_config::save_state(&state, &self.state_path).context(StateSnafu)
    }
}

/// A non-recursive directory listing, the shape `listDirectory` returns
/// on the wire (§6).
pub fn list_directory(path: &Path) -> Result<Vec<FileEntry>, AppServerError> {
    let mut entries = Vec::new();
    let mut walker = WalkBuilder::new(path);
    walker.max_depth(Some(1));
    for entry in walker.build() {
        let entry = entry.map_err(|err| AppServerError::ToolExecution {
            message: err.to_string(),
        })?;
        if entry.path() == path {
            continue;
        }
        let Some(name) = entry.path().file_name() else {
            continue;
        };
        entries.push(FileEntry {
            name: name.to_string_lossy().to_string(),
            is_dir: entry.file_type().map(|t| t.is_dir()).unwrap_or(false),
        });
    }
    Ok(entries)
}

/// Supervisor-owned native directory picker. Out of process here — this
/// binary has no UI toolkit dependency, matching the non-goal.
pub fn pick_workspace_directory() -> Option<PathBuf> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn touch_workspace_inserts_then_updates_in_place() {
        let tmp = tempfile::tempdir().unwrap();
        let supervisor = WorkspaceSupervisor::load(tmp.path().join("state.json")).unwrap();
        supervisor.touch_workspace("w1", Path::new("/repo")).await;
        supervisor.touch_workspace("w1", Path::new("/repo")).await;
        let state = supervisor.state.lock().await;
        assert_eq!(state.workspaces.len(), 1);
    }

    #[tokio::test]
    async fn mark_disconnected_flips_status() {
        let tmp = tempfile::tempdir().unwrap();
        let supervisor = WorkspaceSupervisor::load(tmp.path().join("state.json")).unwrap();
        supervisor.touch_thread("t1", "w1", "hello").await;
        supervisor.mark_thread_disconnected("t1").await;
        let state = supervisor.state.lock().await;
        assert_eq!(state.threads[0].status, ThreadStatus::Disconnected);
    }

    #[tokio::test]
    async fn save_then_reload_round_trips() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("state.json");
        let supervisor = WorkspaceSupervisor::load(path.clone()).unwrap();
        supervisor.touch_workspace("w1", Path::new("/repo")).await;
        supervisor.save().await.unwrap();

        let reloaded = WorkspaceSupervisor::load(path).unwrap();
        assert_eq!(reloaded.state.lock().await.workspaces.len(), 1);
    }

    #[test]
    fn list_directory_skips_the_root_entry() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("a.txt"), "x").unwrap();
        let entries = list_directory(tmp.path()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "a.txt");
    }
}
