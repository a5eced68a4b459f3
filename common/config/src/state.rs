use std::fs;
use std::path::Path;
use std::path::PathBuf;

use agentsrv_protocol::ProviderType;
use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use snafu::ResultExt;
use tracing::debug;
use tracing::instrument;

use crate::error::ConfigError;
use crate::error::NoHomeDirectorySnafu;
use crate::error::ParseSnafu;
use crate::error::ReadSnafu;
use crate::error::WriteSnafu;

const CURRENT_VERSION: u32 = 1;

/// The full contents of the server's state file.
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersistedState {
    #[serde(default = "current_version")]
    pub version: u32,
    #[serde(default)]
    pub workspaces: Vec<WorkspaceEntry>,
    #[serde(default)]
    pub threads: Vec<ThreadEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub developer_mode: Option<bool>,
}

fn current_version() -> u32 {
    CURRENT_VERSION
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            workspaces: Vec::new(),
            threads: Vec::new(),
            developer_mode: None,
        }
    }
}

#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkspaceEntry {
    pub id: String,
    pub name: String,
    pub path: PathBuf,
    pub created_at: DateTime<Utc>,
    pub last_opened_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_provider: Option<ProviderType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
    #[serde(default)]
    pub default_enable_mcp: bool,
    #[serde(default)]
    pub yolo: bool,
}

#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThreadEntry {
    pub id: String,
    pub workspace_id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub last_message_at: DateTime<Utc>,
    pub status: ThreadStatus,
}

#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreadStatus {
    Active,
    Disconnected,
}

/// `~/.agentsrv/state.json`, or `None` if no home directory can be found.
pub fn default_state_path() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().context(NoHomeDirectorySnafu)?;
    Ok(home.join(".agentsrv").join("state.json"))
}

#[instrument(skip_all, fields(path = %path.display()))]
pub fn load_state(path: &Path) -> Result<PersistedState, ConfigError> {
    if !path.exists() {
        debug!("no state file yet, starting from defaults");
        return Ok(PersistedState::default());
    }
    let raw = fs::read_to_string(path).context(ReadSnafu { path })?;
    let deserializer = &mut serde_json::Deserializer::from_str(&raw);
    serde_path_to_error::deserialize(deserializer).context(ParseSnafu { path })
}

/// Atomic write: serialize to a sibling temp file, then rename over the
/// target, so a crash mid-write never leaves a truncated state file.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn save_state(state: &PersistedState, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context(WriteSnafu { path })?;
    }
    let serialized = serde_json::to_string_pretty(state).unwrap_or_default();
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, serialized).context(WriteSnafu { path: &tmp_path })?;
    fs::rename(&tmp_path, path).context(WriteSnafu { path })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_workspace() -> WorkspaceEntry {
        let now = Utc::now();
        WorkspaceEntry {
            id: "w1".to_string(),
            name: "demo".to_string(),
            path: PathBuf::from("/tmp/demo"),
            created_at: now,
            last_opened_at: now,
            default_provider: Some(ProviderType::Anthropic),
            default_model: Some("claude-opus".to_string()),
            default_enable_mcp: true,
            yolo: false,
        }
    }

    #[test]
    fn missing_state_file_yields_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("state.json");
        let state = load_state(&path).unwrap();
        assert_eq!(state, PersistedState::default());
    }

    #[test]
    fn save_then_load_round_trips() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("state.json");

        let mut state = PersistedState::default();
        state.workspaces.push(sample_workspace());
        state.threads.push(ThreadEntry {
            id: "t1".to_string(),
            workspace_id: "w1".to_string(),
            title: "first thread".to_string(),
            created_at: Utc::now(),
            last_message_at: Utc::now(),
            status: ThreadStatus::Active,
        });

        save_state(&state, &path).unwrap();
        let loaded = load_state(&path).unwrap();
        assert_eq!(loaded, state);
    }

    #[test]
    fn version_defaults_when_absent_from_json() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("state.json");
        fs::write(&path, r#"{"workspaces":[],"threads":[]}"#).unwrap();
        let state = load_state(&path).unwrap();
        assert_eq!(state.version, CURRENT_VERSION);
    }

    #[test]
    fn malformed_json_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("state.json");
        fs::write(&path, "{not json").unwrap();
        assert!(load_state(&path).is_err());
    }
}
