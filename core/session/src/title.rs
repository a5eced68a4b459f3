//! Session title auto-derivation (SPEC_FULL.md supplement).
//!
//! An untitled session derives a display title lazily from the first
//! user message's first 60 characters, trimmed at a word boundary, the
//! way the teacher's `Session::set_title` / `SessionBuilder::title`
//! split explicit-vs-derived title state.

const MAX_LEN: usize = 60;

/// Derive a title from a user message, only while no explicit title has
/// been set. Returns `None` for an empty message.
pub fn derive_title(first_user_message: &str) -> Option<String> {
    let trimmed = first_user_message.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.chars().count() <= MAX_LEN {
        return Some(trimmed.to_string());
    }
    let mut cut = 0;
    for (idx, ch) in trimmed.char_indices() {
        if idx > MAX_LEN {
            break;
        }
        if ch.is_whitespace() {
            cut = idx;
        }
    }
    if cut == 0 {
        cut = trimmed
            .char_indices()
            .take(MAX_LEN)
            .last()
            .map(|(idx, ch)| idx + ch.len_utf8())
            .unwrap_or(trimmed.len());
    }
    Some(trimmed[..cut].trim_end().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_message_is_used_verbatim() {
        assert_eq!(derive_title("fix the bug"), Some("fix the bug".to_string()));
    }

    #[test]
    fn empty_message_has_no_derived_title() {
        assert_eq!(derive_title("   "), None);
    }

    #[test]
    fn long_message_is_trimmed_at_a_word_boundary() {
        let msg = "please help me refactor the authentication middleware so it stops storing raw session tokens";
        let title = derive_title(msg).unwrap();
        assert!(title.chars().count() <= MAX_LEN);
        assert!(!title.ends_with(' '));
        assert!(msg.starts_with(&title));
    }
}
