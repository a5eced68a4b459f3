//! Risk classification codes produced by the tool mediator's policy table.

use serde::Deserialize;
use serde::Serialize;

/// Why a tool invocation was (or wasn't) routed to interactive approval.
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalRiskCode {
    /// Matched an allow-listed pattern; no approval needed.
    SafeAutoApproved,
    /// Command matches a known-dangerous pattern (e.g. `rm -rf`).
    MatchesDangerousPattern,
    /// Command string contains a shell control operator (`;`, `&&`, `|`, backticks).
    ContainsShellControlOperator,
    /// Risk could not be classified automatically; ask a human.
    RequiresManualReview,
    /// A file-read command (e.g. `cat`) fell outside the safe-pattern allowlist.
    FileReadCommandRequiresReview,
    /// The tool would act outside the session's allowed working-directory scope.
    OutsideAllowedScope,
}

impl ApprovalRiskCode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SafeAutoApproved => "safe_auto_approved",
            Self::MatchesDangerousPattern => "matches_dangerous_pattern",
            Self::ContainsShellControlOperator => "contains_shell_control_operator",
            Self::RequiresManualReview => "requires_manual_review",
            Self::FileReadCommandRequiresReview => "file_read_command_requires_review",
            Self::OutsideAllowedScope => "outside_allowed_scope",
        }
    }

    /// Whether this classification is safe to auto-approve under the
    /// session's `yolo` flag. `OutsideAllowedScope` is always excluded,
    /// even under `yolo` (§4.3).
    pub const fn yolo_bypasses(&self) -> bool {
        !matches!(self, Self::OutsideAllowedScope)
    }

    /// Whether this classification, on its own, marks the command as
    /// requiring the `dangerous` flag on the wire `approval` message.
    pub const fn is_dangerous(&self) -> bool {
        matches!(
            self,
            Self::MatchesDangerousPattern | Self::ContainsShellControlOperator
        )
    }
}

impl std::fmt::Display for ApprovalRiskCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outside_scope_never_bypassed_by_yolo() {
        assert!(!ApprovalRiskCode::OutsideAllowedScope.yolo_bypasses());
    }

    #[test]
    fn safe_auto_approved_is_not_dangerous() {
        assert!(!ApprovalRiskCode::SafeAutoApproved.is_dangerous());
    }

    #[test]
    fn dangerous_pattern_is_dangerous_and_yolo_bypassable() {
        let code = ApprovalRiskCode::MatchesDangerousPattern;
        assert!(code.is_dangerous());
        assert!(code.yolo_bypasses());
    }
}
