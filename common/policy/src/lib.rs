//! The tool mediator's risk classification policy table (§4.3).
//!
//! [`classify`] inspects a tool invocation and produces an
//! [`ApprovalRiskCode`]. The table is intentionally a fixed, ordered list
//! of rules rather than a generic rule engine: the mediator needs a
//! decision, not a configuration language, and every rule is documented
//! here so a reviewer can audit the full policy in one file.
//!
//! Rule precedence (first match wins):
//! 1. Path-scope check — outside the workspace root always wins, even
//!    over an otherwise-safe command, because `yolo` never bypasses it.
//! 2. Known-dangerous command patterns.
//! 3. Shell control operators (`;`, `&&`, `||`, `|`, backticks, `$(...)`).
//! 4. Read-only commands that still warrant a look (e.g. `cat` on an
//!    arbitrary path, `curl` without `-o`).
//! 5. The allow-listed safe surface (read-only introspection tools).
//! 6. Default: requires manual review.

mod scope;
mod shell;

pub use scope::is_outside_scope;

use std::path::Path;

use agentsrv_protocol::ApprovalRiskCode;
use serde_json::Value;

/// The tool name surface that never needs interactive approval, as long
/// as it stays in scope. These are read-only introspection tools.
const SAFE_TOOL_NAMES: &[&str] = &[
    "read_file",
    "list_dir",
    "glob",
    "grep",
    "web_fetch",
    "web_search",
];

/// Tool names whose sole argument is a path to check for scope.
const PATH_ARG_TOOLS: &[(&str, &str)] = &[
    ("read_file", "path"),
    ("write_file", "path"),
    ("edit_file", "path"),
    ("list_dir", "path"),
    ("glob", "path"),
];

/// A tool invocation as seen by the mediator: the tool name plus its raw
/// JSON arguments, as produced by the model.
pub struct ToolInvocation<'a> {
    pub name: &'a str,
    pub args: &'a Value,
}

/// Classify a tool invocation against the workspace root.
pub fn classify(invocation: &ToolInvocation<'_>, workspace_root: &Path) -> ApprovalRiskCode {
    if let Some(path) = path_argument(invocation) {
        let resolved = workspace_root.join(&path);
        if is_outside_scope(&resolved, workspace_root) {
            return ApprovalRiskCode::OutsideAllowedScope;
        }
    }

    if let Some(command) = command_argument(invocation) {
        if shell::matches_dangerous_pattern(&command) {
            return ApprovalRiskCode::MatchesDangerousPattern;
        }
        if shell::contains_control_operator(&command) {
            return ApprovalRiskCode::ContainsShellControlOperator;
        }
        if shell::is_plain_file_read(&command) {
            return ApprovalRiskCode::FileReadCommandRequiresReview;
        }
        return ApprovalRiskCode::RequiresManualReview;
    }

    if SAFE_TOOL_NAMES.contains(&invocation.name) {
        return ApprovalRiskCode::SafeAutoApproved;
    }

    ApprovalRiskCode::RequiresManualReview
}

fn path_argument(invocation: &ToolInvocation<'_>) -> Option<String> {
    let (_, key) = PATH_ARG_TOOLS
        .iter()
        .find(|(name, _)| *name == invocation.name)?;
    invocation
        .args
        .get(*key)
        .and_then(Value::as_str)
        .map(str::to_owned)
}

fn command_argument(invocation: &ToolInvocation<'_>) -> Option<String> {
    if invocation.name != "run_command" && invocation.name != "shell" {
        return None;
    }
    invocation
        .args
        .get("command")
        .and_then(Value::as_str)
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;

    fn root() -> PathBuf {
        PathBuf::from("/workspace")
    }

    #[test]
    fn safe_tool_in_scope_is_auto_approved() {
        let args = json!({"path": "src/main.rs"});
        let invocation = ToolInvocation {
            name: "read_file",
            args: &args,
        };
        assert_eq!(
            classify(&invocation, &root()),
            ApprovalRiskCode::SafeAutoApproved
        );
    }

    #[test]
    fn path_escaping_workspace_is_outside_scope() {
        let args = json!({"path": "../../etc/passwd"});
        let invocation = ToolInvocation {
            name: "read_file",
            args: &args,
        };
        assert_eq!(
            classify(&invocation, &root()),
            ApprovalRiskCode::OutsideAllowedScope
        );
    }

    #[test]
    fn rm_rf_is_dangerous() {
        let args = json!({"command": "rm -rf /"});
        let invocation = ToolInvocation {
            name: "run_command",
            args: &args,
        };
        assert_eq!(
            classify(&invocation, &root()),
            ApprovalRiskCode::MatchesDangerousPattern
        );
    }

    #[test]
    fn chained_commands_flagged_as_control_operator() {
        let args = json!({"command": "ls && rm file.txt"});
        let invocation = ToolInvocation {
            name: "run_command",
            args: &args,
        };
        assert_eq!(
            classify(&invocation, &root()),
            ApprovalRiskCode::ContainsShellControlOperator
        );
    }

    #[test]
    fn plain_cat_requires_review() {
        let args = json!({"command": "cat secrets.env"});
        let invocation = ToolInvocation {
            name: "run_command",
            args: &args,
        };
        assert_eq!(
            classify(&invocation, &root()),
            ApprovalRiskCode::FileReadCommandRequiresReview
        );
    }

    #[test]
    fn unknown_command_requires_manual_review() {
        let args = json!({"command": "deploy-prod --force"});
        let invocation = ToolInvocation {
            name: "run_command",
            args: &args,
        };
        assert_eq!(
            classify(&invocation, &root()),
            ApprovalRiskCode::RequiresManualReview
        );
    }
}
