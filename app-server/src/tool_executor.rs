//! A filesystem-backed [`ToolExecutor`]: read/write/edit a file, list a
//! directory, glob, and grep within the session's workspace root.
//!
//! Every path argument is resolved against `workspace_root` before use;
//! the tool mediator's policy table (not this executor) is what actually
//! rejects attempts to escape it, but resolving relative to the root
//! here keeps a buggy absolute-path argument from reaching outside it
//! too (`Path::join` with an absolute second operand replaces the base,
//! so paths are joined as given and left to the mediator's classification).

use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use agentsrv_session::ToolExecutor;
use async_trait::async_trait;
use grep_regex::RegexMatcherBuilder;
use grep_searcher::BinaryDetection;
use grep_searcher::Searcher;
use grep_searcher::SearcherBuilder;
use grep_searcher::Sink;
use grep_searcher::SinkMatch;
use ignore::WalkBuilder;
use serde_json::Value;
use serde_json::json;
use tokio::fs;
use tokio::time::timeout;

const SEARCH_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_WALK_DEPTH: usize = 6;
const MAX_GREP_RESULTS: usize = 500;

pub struct FsToolExecutor {
    workspace_root: PathBuf,
}

impl FsToolExecutor {
    pub fn new(workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            workspace_root: workspace_root.into(),
        }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.workspace_root.join(path)
    }
}

#[async_trait]
impl ToolExecutor for FsToolExecutor {
    async fn execute(&self, name: &str, args: &Value) -> Result<Value, String> {
        match name {
            "read_file" => self.read_file(args).await,
            "write_file" => self.write_file(args).await,
            "edit_file" => self.edit_file(args).await,
            "list_dir" => self.list_dir(args).await,
            "glob" => self.glob(args).await,
            "grep" => self.grep(args).await,
            "web_fetch" | "web_search" => {
                Err(format!("{name} is not supported by this tool executor"))
            }
            other => Err(format!("unknown tool {other}")),
        }
    }
}

fn string_arg<'a>(args: &'a Value, key: &str) -> Result<&'a str, String> {
    args.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| format!("missing or non-string argument \"{key}\""))
}

impl FsToolExecutor {
    async fn read_file(&self, args: &Value) -> Result<Value, String> {
        let path = self.resolve(string_arg(args, "path")?);
        let content = fs::read_to_string(&path).await.map_err(|e| e.to_string())?;
        Ok(json!({ "content": content }))
    }

    async fn write_file(&self, args: &Value) -> Result<Value, String> {
        let path = self.resolve(string_arg(args, "path")?);
        let content = string_arg(args, "content")?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| e.to_string())?;
        }
        fs::write(&path, content).await.map_err(|e| e.to_string())?;
        Ok(json!({ "bytesWritten": content.len() }))
    }

    async fn edit_file(&self, args: &Value) -> Result<Value, String> {
        let path = self.resolve(string_arg(args, "path")?);
        let old_string = string_arg(args, "oldString")?;
        let new_string = string_arg(args, "newString")?;
        let content = fs::read_to_string(&path).await.map_err(|e| e.to_string())?;
        let occurrences = content.matches(old_string).count();
        if occurrences == 0 {
            return Err(format!("oldString not found in {}", path.display()));
        }
        if occurrences > 1 {
            return Err(format!(
                "oldString matches {occurrences} locations in {}, expected exactly one",
                path.display()
            ));
        }
        let updated = content.replacen(old_string, new_string, 1);
        fs::write(&path, updated).await.map_err(|e| e.to_string())?;
        Ok(json!({ "replaced": 1 }))
    }

    async fn list_dir(&self, args: &Value) -> Result<Value, String> {
        let path = self.resolve(args.get("path").and_then(Value::as_str).unwrap_or("."));
        let max_depth = args
            .get("depth")
            .and_then(Value::as_u64)
            .map(|d| d as usize)
            .unwrap_or(1);

        let entries = tokio::task::spawn_blocking(move || collect_dir_entries(&path, max_depth))
            .await
            .map_err(|e| e.to_string())?
            .map_err(|e| e.to_string())?;
        Ok(json!({ "entries": entries }))
    }

    async fn glob(&self, args: &Value) -> Result<Value, String> {
        let pattern = string_arg(args, "pattern")?.to_string();
        let root = self.resolve(args.get("path").and_then(Value::as_str).unwrap_or("."));

        let matches = tokio::task::spawn_blocking(move || glob_match(&root, &pattern))
            .await
            .map_err(|e| e.to_string())??;
        Ok(json!({ "matches": matches }))
    }

    async fn grep(&self, args: &Value) -> Result<Value, String> {
        let pattern = string_arg(args, "pattern")?.to_string();
        let root = self.resolve(args.get("path").and_then(Value::as_str).unwrap_or("."));
        let case_insensitive = args.get("caseInsensitive").and_then(Value::as_bool).unwrap_or(false);

        let search = tokio::task::spawn_blocking(move || grep_search(&root, &pattern, case_insensitive));
        let matches = timeout(SEARCH_TIMEOUT, search)
            .await
            .map_err(|_| "grep search timed out".to_string())?
            .map_err(|e| e.to_string())??;
        Ok(json!({ "matches": matches }))
    }
}

fn collect_dir_entries(root: &Path, max_depth: usize) -> Result<Vec<Value>, io::Error> {
    if !root.exists() {
        return Err(io::Error::new(io::ErrorKind::NotFound, root.display().to_string()));
    }
    let mut entries = Vec::new();
    let mut walker = WalkBuilder::new(root);
    walker.max_depth(Some(max_depth.max(1)));
    for entry in walker.build() {
        let Ok(entry) = entry else { continue };
        if entry.path() == root {
            continue;
        }
        let Ok(rel) = entry.path().strip_prefix(root) else {
            continue;
        };
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        entries.push(json!({
            "path": rel.to_string_lossy(),
            "isDir": is_dir,
        }));
    }
    Ok(entries)
}

fn glob_match(root: &Path, pattern: &str) -> Result<Vec<String>, String> {
    let glob = globset::Glob::new(pattern).map_err(|e| e.to_string())?.compile_matcher();
    let mut matches = Vec::new();
    let walker = WalkBuilder::new(root).build();
    for entry in walker.flatten() {
        let Ok(rel) = entry.path().strip_prefix(root) else {
            continue;
        };
        if glob.is_match(rel) {
            matches.push(rel.to_string_lossy().to_string());
        }
    }
    Ok(matches)
}

struct MatchSink<'a> {
    matches: &'a mut Vec<Value>,
    file_path: String,
    limit: usize,
}

impl Sink for MatchSink<'_> {
    type Error = io::Error;

    fn matched(&mut self, _searcher: &Searcher, mat: &SinkMatch<'_>) -> Result<bool, io::Error> {
        if self.matches.len() >= self.limit {
            return Ok(false);
        }
        self.matches.push(json!({
            "path": self.file_path,
            "lineNumber": mat.line_number().unwrap_or(0),
            "line": String::from_utf8_lossy(mat.bytes()).trim_end().to_string(),
        }));
        Ok(true)
    }
}

fn grep_search(root: &Path, pattern: &str, case_insensitive: bool) -> Result<Vec<Value>, String> {
    let mut builder = RegexMatcherBuilder::new();
    builder.case_insensitive(case_insensitive);
    let matcher = builder.build(pattern).map_err(|e| format!("invalid regex pattern: {e}"))?;

    let mut searcher_builder = SearcherBuilder::new();
    searcher_builder
        .line_number(true)
        .binary_detection(BinaryDetection::quit(0));

    let mut matches = Vec::new();
    if root.is_file() {
        let mut searcher = searcher_builder.build();
        let mut sink = MatchSink {
            matches: &mut matches,
            file_path: root.display().to_string(),
            limit: MAX_GREP_RESULTS,
        };
        let _ = searcher.search_path(&matcher, root, &mut sink);
        return Ok(matches);
    }

    for entry in WalkBuilder::new(root).max_depth(Some(MAX_WALK_DEPTH)).build().flatten() {
        if matches.len() >= MAX_GREP_RESULTS {
            break;
        }
        if entry.file_type().map(|t| !t.is_file()).unwrap_or(true) {
            continue;
        }
        let mut searcher = searcher_builder.build();
        let mut sink = MatchSink {
            matches: &mut matches,
            file_path: entry.path().display().to_string(),
            limit: MAX_GREP_RESULTS,
        };
        let _ = searcher.search_path(&matcher, entry.path(), &mut sink);
    }
    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_then_read_round_trips() {
        let tmp = tempfile::tempdir().unwrap();
        let executor = FsToolExecutor::new(tmp.path());
        executor
            .execute("write_file", &json!({"path": "a.txt", "content": "hello"}))
            .await
            .unwrap();
        let result = executor.execute("read_file", &json!({"path": "a.txt"})).await.unwrap();
        assert_eq!(result["content"], "hello");
    }

    #[tokio::test]
    async fn edit_replaces_the_single_occurrence() {
        let tmp = tempfile::tempdir().unwrap();
        let executor = FsToolExecutor::new(tmp.path());
        executor
            .execute("write_file", &json!({"path": "a.txt", "content": "foo bar"}))
            .await
            .unwrap();
        executor
            .execute(
                "edit_file",
                &json!({"path": "a.txt", "oldString": "bar", "newString": "baz"}),
            )
            .await
            .unwrap();
        let result = executor.execute("read_file", &json!({"path": "a.txt"})).await.unwrap();
        assert_eq!(result["content"], "foo baz");
    }

    #[tokio::test]
    async fn edit_rejects_ambiguous_match() {
        let tmp = tempfile::tempdir().unwrap();
        let executor = FsToolExecutor::new(tmp.path());
        executor
            .execute("write_file", &json!({"path": "a.txt", "content": "bar bar"}))
            .await
            .unwrap();
        let err = executor
            .execute(
                "edit_file",
                &json!({"path": "a.txt", "oldString": "bar", "newString": "baz"}),
            )
            .await
            .unwrap_err();
        assert!(err.contains("2 locations"));
    }

    #[tokio::test]
    async fn grep_finds_matching_line() {
        let tmp = tempfile::tempdir().unwrap();
        let executor = FsToolExecutor::new(tmp.path());
        executor
            .execute("write_file", &json!({"path": "a.txt", "content": "needle\nhay"}))
            .await
            .unwrap();
        let result = executor.execute("grep", &json!({"pattern": "needle"})).await.unwrap();
        let matches = result["matches"].as_array().unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0]["lineNumber"], 1);
    }

    #[tokio::test]
    async fn web_fetch_is_not_supported() {
        let tmp = tempfile::tempdir().unwrap();
        let executor = FsToolExecutor::new(tmp.path());
        let err = executor.execute("web_fetch", &json!({})).await.unwrap_err();
        assert!(err.contains("not supported"));
    }
}
