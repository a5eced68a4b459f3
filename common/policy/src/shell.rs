//! Shell command string classification.

/// Patterns that are dangerous regardless of context. Kept small and
/// literal rather than a clever regex — false negatives here fail open
/// into `requires_manual_review`, never into silent approval.
const DANGEROUS_SUBSTRINGS: &[&str] = &[
    "rm -rf",
    "rm -fr",
    "mkfs",
    "dd if=",
    ":(){ :|:& };:",
    "chmod -r 777",
    "chmod 777 -r",
    "git push --force",
    "git push -f",
    "> /dev/sda",
    "curl | sh",
    "curl | bash",
    "wget | sh",
];

const CONTROL_OPERATORS: &[&str] = &["&&", "||", ";", "|", "`", "$("];

/// Commands that are read-only but still warrant a look, because they
/// can disclose arbitrary file contents (secrets, credentials).
const PLAIN_READ_COMMANDS: &[&str] = &["cat", "head", "tail", "less", "more", "strings"];

pub fn matches_dangerous_pattern(command: &str) -> bool {
    let lower = command.to_lowercase();
    DANGEROUS_SUBSTRINGS
        .iter()
        .any(|pattern| lower.contains(pattern))
}

pub fn contains_control_operator(command: &str) -> bool {
    CONTROL_OPERATORS
        .iter()
        .any(|operator| command.contains(operator))
}

pub fn is_plain_file_read(command: &str) -> bool {
    let first_word = command.split_whitespace().next().unwrap_or("");
    PLAIN_READ_COMMANDS.contains(&first_word)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fork_bomb_is_dangerous() {
        assert!(matches_dangerous_pattern(":(){ :|:& };:"));
    }

    #[test]
    fn simple_ls_has_no_control_operator() {
        assert!(!contains_control_operator("ls -la src/"));
    }

    #[test]
    fn pipe_is_a_control_operator() {
        assert!(contains_control_operator("ls | wc -l"));
    }

    #[test]
    fn tail_is_a_plain_read() {
        assert!(is_plain_file_read("tail -n 50 app.log"));
    }

    #[test]
    fn ls_is_not_a_plain_read() {
        assert!(!is_plain_file_read("ls -la"));
    }
}
